//! HTTP client for Gemini's `generateContent` REST endpoint.

use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::AssistantError;
use crate::types::{GenerateRequest, GenerateResponse};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/";

/// Client for the Gemini API.
///
/// Use [`GeminiClient::new`] for production or [`GeminiClient::with_base_url`]
/// to point at a mock server in tests.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: Url,
}

impl GeminiClient {
    /// # Errors
    ///
    /// Returns [`AssistantError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, model: &str, timeout_secs: u64) -> Result<Self, AssistantError> {
        Self::with_base_url(api_key, model, timeout_secs, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`AssistantError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`AssistantError::InvalidBaseUrl`] if `base_url` does not
    /// parse.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, AssistantError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("pyp/0.1 (storefront-assistant)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| AssistantError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            base_url,
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one `generateContent` request and return the parsed response.
    ///
    /// # Errors
    ///
    /// - [`AssistantError::Http`] on network failure.
    /// - [`AssistantError::Api`] on a non-2xx status.
    /// - [`AssistantError::Deserialize`] if the body is not the expected shape.
    pub async fn generate(
        &self,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, AssistantError> {
        let url = self.endpoint_url()?;
        let response = self
            .client
            .post(url.clone())
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AssistantError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| AssistantError::Deserialize {
            context: format!("generateContent(model={})", self.model),
            source: e,
        })
    }

    fn endpoint_url(&self) -> Result<Url, AssistantError> {
        let path = format!("v1beta/models/{}:generateContent", self.model);
        self.base_url
            .join(&path)
            .map_err(|e| AssistantError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Gemini errors look like `{"error": {"code": 400, "message": "..."}}`.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_url_includes_model() {
        let client = GeminiClient::with_base_url("k", "gemini-2.5-flash", 30, "http://localhost:9")
            .expect("client");
        assert_eq!(
            client.endpoint_url().expect("url").as_str(),
            "http://localhost:9/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn api_error_message_prefers_structured_message() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid"}}"#;
        assert_eq!(api_error_message(body), "API key not valid");
        assert_eq!(api_error_message("upstream down"), "upstream down");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = GeminiClient::with_base_url("k", "m", 30, "not a url").err();
        assert!(matches!(err, Some(AssistantError::InvalidBaseUrl { .. })));
    }
}

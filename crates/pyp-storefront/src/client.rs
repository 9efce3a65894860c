//! HTTP client for the storefront REST API.
//!
//! Every successful response is an envelope `{"data": ..., "meta": ...}` and
//! every failure `{"error": {"code", "message"}}`; this client unwraps the
//! former and turns the latter into [`StoreError::Api`].

use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use pyp_assistant::ChatTurn;
use pyp_core::{Collection, OtpPurpose, SiteConfig, StorefrontConfig, User};
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::StoreError;

/// Everything but unreserved characters is escaped, so an id always lands in
/// a single path segment. `.` is escaped too so `.`/`..` ids are not
/// treated as dot segments.
const ID_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'~');

fn document_path(collection: Collection, id: &str) -> String {
    format!("api/{collection}/{}", utf8_percent_encode(id, ID_SEGMENT))
}

/// A signed-in user and the bearer token that proves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

/// Direct or OTP-gated signup details.
#[derive(Debug, Clone, Serialize)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ChatBody {
    reply: String,
}

#[derive(Debug, Deserialize)]
struct RecipeBody {
    recipe: String,
}

/// Client for the storefront API.
///
/// Use [`ApiClient::new`] with the loaded configuration, or
/// [`ApiClient::with_base_url`] to point at a mock server in tests.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns [`StoreError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`StoreError::InvalidBaseUrl`] if the configured URL does not parse.
    pub fn new(config: &StorefrontConfig) -> Result<Self, StoreError> {
        Self::with_base_url(&config.api_base_url, config.http_timeout_secs)
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`StoreError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(base_url: &str, timeout_secs: u64) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("pyp/0.1 (storefront)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| StoreError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Attach (or drop) the bearer token sent with every request.
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    #[must_use]
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    // -----------------------------------------------------------------------
    // Collections
    // -----------------------------------------------------------------------

    /// Every document of `collection` that decodes as `T`. Documents that do
    /// not decode are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on network failure, an error envelope, or a
    /// body that is not a JSON array.
    pub async fn list<T: DeserializeOwned>(
        &self,
        collection: Collection,
    ) -> Result<Vec<T>, StoreError> {
        let documents: Vec<Value> = self
            .call(Method::GET, &format!("api/{collection}"), None::<&()>)
            .await?;
        Ok(decode_documents(collection, documents))
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] on network failure or an error envelope.
    pub async fn create<B: Serialize + ?Sized>(
        &self,
        collection: Collection,
        body: &B,
    ) -> Result<Value, StoreError> {
        self.call(Method::POST, &format!("api/{collection}"), Some(body))
            .await
    }

    /// Merge `patch` into the stored document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on network failure or an error envelope.
    pub async fn update<B: Serialize + ?Sized>(
        &self,
        collection: Collection,
        id: &str,
        patch: &B,
    ) -> Result<Value, StoreError> {
        self.call(Method::PUT, &document_path(collection, id), Some(patch))
            .await
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] on network failure or an error envelope.
    pub async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let _: Value = self
            .call(Method::DELETE, &document_path(collection, id), None::<&()>)
            .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] on network failure or an error envelope.
    pub async fn get_config(&self) -> Result<SiteConfig, StoreError> {
        self.call(Method::GET, "api/config", None::<&()>).await
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] on network failure or an error envelope.
    pub async fn save_config(&self, config: &SiteConfig) -> Result<SiteConfig, StoreError> {
        self.call(Method::POST, "api/config", Some(config)).await
    }

    // -----------------------------------------------------------------------
    // Accounts
    // -----------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns [`StoreError::Api`] with status 401 for bad credentials and 403
    /// for a refused admin login.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, StoreError> {
        self.call(
            Method::POST,
            "api/auth/login",
            Some(&json!({ "email": email, "password": password })),
        )
        .await
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] on network failure or an error envelope.
    pub async fn register(&self, form: &SignupForm) -> Result<AuthSession, StoreError> {
        self.call(Method::POST, "api/auth/register", Some(form))
            .await
    }

    /// Ask for a signup OTP. Returns the server's message.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on network failure or an error envelope.
    pub async fn signup_initiate(&self, email: &str) -> Result<String, StoreError> {
        let body: MessageBody = self
            .call(
                Method::POST,
                "api/auth/signup/initiate",
                Some(&json!({ "email": email })),
            )
            .await?;
        Ok(body.message)
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] on network failure or an error envelope.
    pub async fn signup_complete(
        &self,
        form: &SignupForm,
        otp: &str,
    ) -> Result<AuthSession, StoreError> {
        let mut body = serde_json::to_value(form)?;
        if let Value::Object(map) = &mut body {
            map.insert("otp".to_string(), Value::String(otp.to_string()));
        }
        self.call(Method::POST, "api/auth/signup/complete", Some(&body))
            .await
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] on network failure or an error envelope.
    pub async fn send_otp(&self, email: &str, purpose: OtpPurpose) -> Result<String, StoreError> {
        let body: MessageBody = self
            .call(
                Method::POST,
                "api/auth/send-otp",
                Some(&json!({ "email": email, "purpose": purpose })),
            )
            .await?;
        Ok(body.message)
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] on network failure or an error envelope.
    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<String, StoreError> {
        let body: MessageBody = self
            .call(
                Method::POST,
                "api/auth/verify-otp",
                Some(&json!({ "email": email, "otp": otp })),
            )
            .await?;
        Ok(body.message)
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] on network failure or an error envelope.
    pub async fn reset_password(
        &self,
        email: &str,
        otp: &str,
        new_password: &str,
    ) -> Result<String, StoreError> {
        let body: MessageBody = self
            .call(
                Method::POST,
                "api/auth/reset-password",
                Some(&json!({ "email": email, "otp": otp, "newPassword": new_password })),
            )
            .await?;
        Ok(body.message)
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Api`] with status 401 when no valid token is set.
    pub async fn me(&self) -> Result<User, StoreError> {
        self.call(Method::GET, "api/auth/me", None::<&()>).await
    }

    // -----------------------------------------------------------------------
    // Assistant
    // -----------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns [`StoreError::Api`] with status 503 when the assistant is
    /// unavailable.
    pub async fn chat(&self, history: &[ChatTurn], message: &str) -> Result<String, StoreError> {
        let body: ChatBody = self
            .call(
                Method::POST,
                "api/chat",
                Some(&json!({ "history": history, "message": message })),
            )
            .await?;
        Ok(body.reply)
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] on network failure or an error envelope.
    pub async fn recipe(&self, pickle_name: &str) -> Result<String, StoreError> {
        let body: RecipeBody = self
            .call(
                Method::POST,
                "api/recipes",
                Some(&json!({ "pickleName": pickle_name })),
            )
            .await?;
        Ok(body.recipe)
    }

    // -----------------------------------------------------------------------
    // Transport
    // -----------------------------------------------------------------------

    async fn call<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, StoreError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| StoreError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;

        let mut request = self.client.request(method.clone(), url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let (code, message) = error_parts(&text);
            tracing::debug!(%method, path, status = status.as_u16(), code, "API call failed");
            return Err(StoreError::Api {
                status: status.as_u16(),
                code,
                message,
            });
        }

        serde_json::from_str::<Envelope<T>>(&text)
            .map(|e| e.data)
            .map_err(|e| StoreError::Deserialize {
                context: format!("{method} {path}"),
                source: e,
            })
    }
}

fn decode_documents<T: DeserializeOwned>(
    collection: Collection,
    documents: Vec<Value>,
) -> Vec<T> {
    documents
        .into_iter()
        .filter_map(|doc| {
            let id = doc
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned();
            match serde_json::from_value(doc) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    tracing::warn!(%collection, %id, error = %e, "skipping undecodable document");
                    None
                }
            }
        })
        .collect()
}

/// `(code, message)` of an error envelope, or the raw body when the server
/// did not send one.
fn error_parts(body: &str) -> (String, String) {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) => (env.error.code, env.error.message),
        Err(_) => ("http_error".to_string(), body.chars().take(200).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_parts_reads_envelope() {
        let body = r#"{"error":{"code":"conflict","message":"coupon code X already exists"},"meta":{}}"#;
        assert_eq!(
            error_parts(body),
            (
                "conflict".to_string(),
                "coupon code X already exists".to_string()
            )
        );
    }

    #[test]
    fn error_parts_falls_back_to_body() {
        assert_eq!(
            error_parts("Bad Gateway"),
            ("http_error".to_string(), "Bad Gateway".to_string())
        );
    }

    #[test]
    fn document_ids_stay_in_one_segment() {
        assert_eq!(
            document_path(Collection::Products, "lime#1"),
            "api/products/lime%231"
        );
        assert_eq!(
            document_path(Collection::Orders, "ORD-17"),
            "api/orders/ORD-17"
        );
        assert_eq!(
            document_path(Collection::Coupons, "a/b?c"),
            "api/coupons/a%2Fb%3Fc"
        );
    }

    #[test]
    fn undecodable_documents_are_skipped() {
        let docs = vec![
            json!({ "id": "c1", "name": "Pickles", "slug": "pickles" }),
            json!({ "id": "c2" }),
        ];
        let decoded: Vec<pyp_core::CategoryItem> =
            decode_documents(Collection::Categories, docs);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].id, "c1");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = ApiClient::with_base_url("::nope", 5).err();
        assert!(matches!(err, Some(StoreError::InvalidBaseUrl { .. })));
    }
}

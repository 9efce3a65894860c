//! OTP email delivery through an HTTP mail API.
//!
//! The API receives `{from, to, subject, html}` as JSON with basic auth
//! (`EMAIL_USER` / `EMAIL_PASS`). When no API is configured the code is only
//! logged, which is how local development works.

use std::time::Duration;

use pyp_core::{AppConfig, OtpPurpose};
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct Mailer {
    transport: Option<Transport>,
}

#[derive(Clone)]
struct Transport {
    client: reqwest::Client,
    url: String,
    user: String,
    pass: String,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("pass", &"[redacted]")
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct OutgoingEmail<'a> {
    from: String,
    to: &'a str,
    subject: &'static str,
    html: String,
}

impl Mailer {
    /// A mailer that never sends; codes are logged at debug level.
    #[must_use]
    pub fn disabled() -> Self {
        Self { transport: None }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let (Some(url), Some(user), Some(pass)) = (
            config.email_api_url.as_ref(),
            config.email_user.as_ref(),
            config.email_pass.as_ref(),
        ) else {
            tracing::warn!("email API not configured; OTPs will only be logged");
            return Self::disabled();
        };

        match reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
        {
            Ok(client) => Self {
                transport: Some(Transport {
                    client,
                    url: url.clone(),
                    user: user.clone(),
                    pass: pass.clone(),
                }),
            },
            Err(e) => {
                tracing::error!(error = %e, "failed to build email HTTP client");
                Self::disabled()
            }
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Email an OTP. Returns `true` only when the mail API accepted it.
    ///
    /// Failures are logged, never returned.
    pub async fn send_otp(&self, to: &str, otp: &str, purpose: OtpPurpose) -> bool {
        tracing::debug!(email = to, purpose = purpose.as_str(), otp, "generated OTP");

        let Some(transport) = &self.transport else {
            return false;
        };

        let email = OutgoingEmail {
            from: format!("\"Pick Your Pickle\" <{}>", transport.user),
            to,
            subject: purpose.email_subject(),
            html: otp_html(otp),
        };

        let result = transport
            .client
            .post(&transport.url)
            .basic_auth(&transport.user, Some(&transport.pass))
            .json(&email)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status);

        match result {
            Ok(_) => {
                tracing::info!(email = to, "OTP email sent");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, email = to, "OTP email failed");
                false
            }
        }
    }
}

fn otp_html(otp: &str) -> String {
    format!(
        "<div style=\"font-family: Arial, sans-serif; padding: 20px;\">\
         <h2>{otp}</h2>\
         <p>is your One Time Password (OTP) for Pick Your Pickle.</p>\
         <p>This OTP is valid for 10 minutes. Do not share this with anyone.</p>\
         </div>"
    )
}

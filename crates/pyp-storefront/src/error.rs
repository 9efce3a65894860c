use thiserror::Error;

/// Shown for every failure that is not the user's to fix.
pub const GENERIC_FAILURE: &str = "Something went wrong";

/// Errors raised by the storefront.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The request was refused for a reason the user can act on: bad input,
    /// a rejected coupon, an invalid OTP, a 4xx from the API.
    #[error("{0}")]
    Validation(String),

    /// The action needs a signed-in user.
    #[error("please log in first")]
    NotSignedIn,

    /// The API answered with an error envelope.
    #[error("API error ({status} {code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// Reading or writing the local state directory failed.
    #[error("local state error at {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// `true` for failures whose own message should reach the user.
    #[must_use]
    pub fn is_user_facing(&self) -> bool {
        match self {
            Self::Validation(_) | Self::NotSignedIn => true,
            Self::Api { status, .. } => (400..500).contains(status) && *status != 429,
            _ => false,
        }
    }

    /// Notification text: the specific reason for validation failures, a
    /// generic line for everything else.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } if self.is_user_facing() => message.clone(),
            _ if self.is_user_facing() => self.to_string(),
            _ => GENERIC_FAILURE.to_string(),
        }
    }
}

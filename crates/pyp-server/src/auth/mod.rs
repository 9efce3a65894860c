//! Credentials: bcrypt hashing, session tokens and OTP email delivery.

pub mod mailer;
pub mod password;
pub mod token;

use thiserror::Error;

pub use mailer::Mailer;
pub use password::{hash_secret, verify_secret};
pub use token::{Claims, TokenKeys};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("bcrypt failure: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

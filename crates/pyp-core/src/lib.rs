//! Domain types and pure business rules for the Pick Your Pickle storefront.
//!
//! Nothing in this crate performs I/O beyond reading environment variables and
//! the catalog seed file; persistence lives in `pyp-db`, transport in
//! `pyp-server` and `pyp-storefront`.

pub mod app_config;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod documents;
pub mod orders;
pub mod otp;
pub mod pricing;
pub mod reviews;
pub mod users;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, StorefrontConfig};
pub use cart::{Cart, CartItem, CartOutcome};
pub use catalog::{
    fallback_catalog, load_catalog, Banner, CatalogSeed, CategoryItem, Coupon, PaymentMethods,
    Product, SiteConfig,
};
pub use config::{load_app_config, load_app_config_from_env, load_storefront_config};
pub use documents::Collection;
pub use orders::{
    NewOrder, Order, OrderStats, OrderStatus, ReturnAction, Shipment, StatusUpdate,
};
pub use otp::{OtpPurpose, OtpRecord, OtpVerdict};
pub use pricing::AppliedCoupon;
pub use reviews::{RatingSummary, Review};
pub use users::{Role, User};

/// Errors raised while loading configuration or the catalog seed file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read catalog file {path}: {source}")]
    CatalogFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog file: {0}")]
    CatalogFileParse(#[from] serde_yaml::Error),

    #[error("catalog validation failed: {0}")]
    Validation(String),
}

/// Business-rule violations shared by the server and the storefront.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    #[error("{field} {reason}")]
    InvalidField { field: String, reason: String },

    #[error("invalid order status: {0}")]
    InvalidStatus(String),

    #[error("invalid return action: {0}")]
    InvalidReturnAction(String),

    #[error("invalid role: {0}")]
    InvalidRole(String),

    #[error("invalid OTP purpose: {0}")]
    InvalidOtpPurpose(String),
}

impl CoreError {
    pub(crate) fn field(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.to_owned(),
            reason: reason.into(),
        }
    }
}

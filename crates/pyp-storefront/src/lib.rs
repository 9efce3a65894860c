//! Client side of the Pick Your Pickle storefront: an API client, the
//! locally persisted session and cart, and [`Storefront`], which ties them
//! to the catalog and exposes every shop and admin action.

pub mod client;
pub mod error;
pub mod local;
pub mod notify;
pub mod shipping;
pub mod store;

pub use client::{ApiClient, AuthSession, SignupForm};
pub use error::{StoreError, GENERIC_FAILURE};
pub use local::LocalStore;
pub use notify::{Notification, NotificationKind, Notifier, NOTIFICATION_TTL};
pub use shipping::{
    MockShiprocket, Serviceability, ShipmentProvider, TrackingEvent, TrackingStepStatus,
};
pub use store::{Checkout, ReviewDraft, Storefront, CHAT_APOLOGY};

//! Client-side persistence of the session and cart.
//!
//! Both live as JSON files in the state directory (`pyp_user.json`,
//! `pyp_cart.json`) and are rewritten whole on every change. Missing or
//! unreadable files load as "no session" and "empty cart".

use std::path::{Path, PathBuf};

use pyp_core::{Cart, CartItem};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::client::AuthSession;
use crate::error::StoreError;

const USER_FILE: &str = "pyp_user.json";
const CART_FILE: &str = "pyp_cart.json";

#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn load_session(&self) -> Option<AuthSession> {
        self.read::<Option<AuthSession>>(USER_FILE).flatten()
    }

    /// Persist the session; `None` records a logout.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persist`] if the file cannot be written.
    pub fn save_session(&self, session: Option<&AuthSession>) -> Result<(), StoreError> {
        self.write(USER_FILE, &session)
    }

    /// The saved cart, with lines that break the cart invariants dropped.
    #[must_use]
    pub fn load_cart(&self) -> Cart {
        self.read::<Vec<CartItem>>(CART_FILE)
            .map(Cart::from_items)
            .unwrap_or_default()
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Persist`] if the file cannot be written.
    pub fn save_cart(&self, cart: &Cart) -> Result<(), StoreError> {
        self.write(CART_FILE, cart)
    }

    fn read<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let path = self.dir.join(name);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not read local state");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "discarding corrupt local state");
                None
            }
        }
    }

    fn write<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<(), StoreError> {
        let path = self.dir.join(name);
        let persist_err = |source| StoreError::Persist {
            path: path.display().to_string(),
            source,
        };

        std::fs::create_dir_all(&self.dir).map_err(persist_err)?;
        let body = serde_json::to_vec_pretty(value)?;
        std::fs::write(&path, body).map_err(persist_err)
    }
}

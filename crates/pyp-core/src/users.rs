use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::CoreError;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex")
});

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Customer,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Customer => "customer",
        }
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "customer" => Ok(Self::Customer),
            other => Err(CoreError::InvalidRole(other.to_string())),
        }
    }
}

/// The public view of an account. Password hashes never leave the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl User {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Only the privileged address may sign in with the admin role.
#[must_use]
pub fn admin_login_allowed(role: Role, email: &str, privileged_email: &str) -> bool {
    role != Role::Admin || normalize_email(email) == normalize_email(privileged_email)
}

#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Normalise and check an email address.
///
/// # Errors
///
/// Returns [`CoreError::InvalidField`] when the address is not of the form
/// `local@domain.tld`.
pub fn validate_email(email: &str) -> Result<String, CoreError> {
    let email = normalize_email(email);
    if EMAIL_RE.is_match(&email) {
        Ok(email)
    } else {
        Err(CoreError::field("email", "must be a valid email address"))
    }
}

/// # Errors
///
/// Returns [`CoreError::InvalidField`] for passwords shorter than
/// [`MIN_PASSWORD_LEN`].
pub fn validate_password(password: &str) -> Result<(), CoreError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CoreError::field(
            "password",
            format!("must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    Ok(())
}

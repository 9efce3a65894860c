//! Database operations for the `users` table.

use chrono::{DateTime, Utc};
use pyp_core::{Role, User};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{conflict_or, DbError};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub role: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    #[must_use]
    pub fn role(&self) -> Role {
        // The table's CHECK constraint admits only the two known roles.
        self.role.parse().unwrap_or(Role::Customer)
    }

    /// The public view of this account, without the password hash.
    #[must_use]
    pub fn to_user(&self) -> User {
        User {
            id: self.id.to_string(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role(),
            phone: self.phone.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub name: &'a str,
    /// Expected already normalised (trimmed, lowercase).
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
    pub phone: Option<&'a str>,
}

const USER_COLUMNS: &str = "id, name, email, password_hash, role, phone, created_at";

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_user_by_id(pool: &PgPool, id: Uuid) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Insert a new account.
///
/// # Errors
///
/// Returns [`DbError::Conflict`] if the email is already registered, or
/// [`DbError::Sqlx`] on any other failure.
pub async fn create_user(pool: &PgPool, user: NewUser<'_>) -> Result<UserRow, DbError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "INSERT INTO users (id, name, email, password_hash, role, phone) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING {USER_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(user.name)
    .bind(user.email)
    .bind(user.password_hash)
    .bind(user.role.as_str())
    .bind(user.phone)
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_or(e, "User already exists"))?;

    Ok(row)
}

/// Replace the password hash for `email`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no account has this email.
pub async fn update_password(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE email = $1")
        .bind(email)
        .bind(password_hash)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

//! Database operations for the `otps` table.

use chrono::{DateTime, Utc};
use pyp_core::otp::OTP_TTL_MINUTES;
use pyp_core::OtpRecord;
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OtpRow {
    pub id: i64,
    pub email: String,
    pub otp_hash: String,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
}

impl From<OtpRow> for OtpRecord {
    fn from(row: OtpRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            otp_hash: row.otp_hash,
            attempts: row.attempts,
            created_at: row.created_at,
        }
    }
}

/// Store a fresh OTP hash for `email`, deleting any earlier ones.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either statement fails.
pub async fn replace_otp(pool: &PgPool, email: &str, otp_hash: &str) -> Result<OtpRow, DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM otps WHERE email = $1")
        .bind(email)
        .execute(&mut *tx)
        .await?;

    let row = sqlx::query_as::<_, OtpRow>(
        "INSERT INTO otps (email, otp_hash) VALUES ($1, $2) \
         RETURNING id, email, otp_hash, attempts, created_at",
    )
    .bind(email)
    .bind(otp_hash)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row)
}

/// The newest OTP for `email` that is younger than the TTL.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_live_otp(pool: &PgPool, email: &str) -> Result<Option<OtpRow>, DbError> {
    let row = sqlx::query_as::<_, OtpRow>(
        "SELECT id, email, otp_hash, attempts, created_at FROM otps \
         WHERE email = $1 AND created_at > NOW() - make_interval(mins => $2) \
         ORDER BY created_at DESC \
         LIMIT 1",
    )
    .bind(email)
    .bind(ttl_minutes())
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Count one failed attempt against an OTP.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn increment_otp_attempts(pool: &PgPool, id: i64) -> Result<(), DbError> {
    sqlx::query("UPDATE otps SET attempts = attempts + 1 WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_otps_for(pool: &PgPool, email: &str) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM otps WHERE email = $1")
        .bind(email)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Delete every OTP older than the TTL. Returns the number removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn purge_expired_otps(pool: &PgPool) -> Result<u64, DbError> {
    let result =
        sqlx::query("DELETE FROM otps WHERE created_at <= NOW() - make_interval(mins => $1)")
            .bind(ttl_minutes())
            .execute(pool)
            .await?;
    Ok(result.rows_affected())
}

fn ttl_minutes() -> i32 {
    i32::try_from(OTP_TTL_MINUTES).unwrap_or(i32::MAX)
}

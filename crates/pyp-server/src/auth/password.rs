//! bcrypt hashing and comparison, run on the blocking thread pool.

use super::AuthError;

pub const BCRYPT_COST: u32 = 10;

/// Hash a password or OTP code.
///
/// # Errors
///
/// Returns [`AuthError`] if bcrypt fails or the blocking task panics.
pub async fn hash_secret(secret: &str) -> Result<String, AuthError> {
    let secret = secret.to_owned();
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(secret, BCRYPT_COST)).await??;
    Ok(hash)
}

/// Compare a candidate against a stored bcrypt hash.
///
/// A malformed stored hash counts as a mismatch.
///
/// # Errors
///
/// Returns [`AuthError::Join`] if the blocking task panics.
pub async fn verify_secret(candidate: &str, hash: &str) -> Result<bool, AuthError> {
    let candidate = candidate.to_owned();
    let hash = hash.to_owned();
    let matches = tokio::task::spawn_blocking(move || {
        bcrypt::verify(candidate, &hash).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "stored hash is not valid bcrypt");
            false
        })
    })
    .await?;
    Ok(matches)
}

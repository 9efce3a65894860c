//! The single-row `site_config` table.

use pyp_core::SiteConfig;
use serde_json::Value;
use sqlx::PgPool;

use crate::DbError;

/// The stored storefront settings, or `None` if never saved.
///
/// # Errors
///
/// Returns [`DbError::Json`] if the stored document no longer matches
/// [`SiteConfig`], or [`DbError::Sqlx`] if the query fails.
pub async fn get_site_config(pool: &PgPool) -> Result<Option<SiteConfig>, DbError> {
    let body = sqlx::query_scalar::<_, Value>("SELECT body FROM site_config WHERE singleton")
        .fetch_optional(pool)
        .await?;

    body.map(serde_json::from_value)
        .transpose()
        .map_err(DbError::from)
}

/// Insert or replace the storefront settings.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_site_config(pool: &PgPool, config: &SiteConfig) -> Result<SiteConfig, DbError> {
    let body = serde_json::to_value(config)?;

    sqlx::query(
        "INSERT INTO site_config (singleton, body) VALUES (TRUE, $1) \
         ON CONFLICT (singleton) DO UPDATE SET body = EXCLUDED.body, updated_at = NOW()",
    )
    .bind(&body)
    .execute(pool)
    .await?;

    Ok(config.clone())
}

use pyp_core::{CatalogSeed, Collection};
use serde::Serialize;
use serde_json::Value;
use sqlx::{PgPool, Postgres, Transaction};

use crate::DbError;

/// Documents written per collection by [`seed_catalog`]. A collection that
/// already held documents is left alone and reports zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub products: usize,
    pub categories: usize,
    pub coupons: usize,
    pub reviews: usize,
    pub banners: usize,
    pub config: bool,
}

impl SeedReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.products + self.categories + self.coupons + self.reviews + self.banners
    }
}

/// Load the seed catalog into every collection that is still empty.
///
/// All inserts run inside a single transaction; if any fails the whole seed
/// is rolled back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails, or [`DbError::Json`] if
/// a seed record cannot be serialized.
pub async fn seed_catalog(pool: &PgPool, seed: &CatalogSeed) -> Result<SeedReport, DbError> {
    let mut tx = pool.begin().await?;

    let report = SeedReport {
        products: seed_collection(&mut tx, Collection::Products, &seed.products, |p| &p.id)
            .await?,
        categories: seed_collection(&mut tx, Collection::Categories, &seed.categories, |c| {
            &c.id
        })
        .await?,
        coupons: seed_collection(&mut tx, Collection::Coupons, &seed.coupons, |c| &c.id).await?,
        reviews: seed_collection(&mut tx, Collection::Reviews, &seed.reviews, |r| &r.id).await?,
        banners: seed_collection(&mut tx, Collection::Banners, &seed.banners, |b| &b.id).await?,
        config: match &seed.config {
            Some(config) => {
                let body = serde_json::to_value(config)?;
                sqlx::query(
                    "INSERT INTO site_config (singleton, body) VALUES (TRUE, $1) \
                     ON CONFLICT (singleton) DO NOTHING",
                )
                .bind(&body)
                .execute(&mut *tx)
                .await?
                .rows_affected()
                    > 0
            }
            None => false,
        },
    };

    tx.commit().await?;
    Ok(report)
}

async fn seed_collection<T: Serialize>(
    tx: &mut Transaction<'_, Postgres>,
    collection: Collection,
    records: &[T],
    id_of: impl Fn(&T) -> &String,
) -> Result<usize, DbError> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = $1")
        .bind(collection.as_str())
        .fetch_one(&mut **tx)
        .await?;
    if existing > 0 {
        return Ok(0);
    }

    let mut count = 0usize;
    for record in records {
        let body: Value = serde_json::to_value(record)?;
        sqlx::query(
            "INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3) \
             ON CONFLICT (collection, id) DO NOTHING",
        )
        .bind(collection.as_str())
        .bind(id_of(record))
        .bind(&body)
        .execute(&mut **tx)
        .await?;
        count += 1;
    }
    Ok(count)
}

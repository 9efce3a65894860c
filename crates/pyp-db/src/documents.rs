//! Database operations for the schema-less `documents` table.
//!
//! Each storefront collection is a set of JSON objects keyed by `(collection,
//! id)`. The stored body always carries its own `id` field.

use pyp_core::documents::document_id;
use pyp_core::Collection;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{conflict_or, DbError};

/// All documents of `collection`, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_documents(pool: &PgPool, collection: Collection) -> Result<Vec<Value>, DbError> {
    let rows = sqlx::query_scalar::<_, Value>(
        "SELECT body FROM documents \
         WHERE collection = $1 \
         ORDER BY created_at, id",
    )
    .bind(collection.as_str())
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Typed view of [`list_documents`]. Documents that do not decode into `T`
/// are skipped.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_documents_as<T: DeserializeOwned>(
    pool: &PgPool,
    collection: Collection,
) -> Result<Vec<T>, DbError> {
    let docs = list_documents(pool, collection).await?;
    Ok(docs
        .into_iter()
        .filter_map(|doc| serde_json::from_value(doc).ok())
        .collect())
}

/// Returns one document, or `None` if absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_document(
    pool: &PgPool,
    collection: Collection,
    id: &str,
) -> Result<Option<Value>, DbError> {
    let body = sqlx::query_scalar::<_, Value>(
        "SELECT body FROM documents WHERE collection = $1 AND id = $2",
    )
    .bind(collection.as_str())
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(body)
}

/// Store a new document and return it as stored.
///
/// The id comes from the document's `id` field when present (string or
/// number); otherwise a UUID v4 is generated. Either way the stored body's
/// `id` is set to the string id.
///
/// # Errors
///
/// Returns [`DbError::Conflict`] when the id (or, for coupons, the code) is
/// already taken, or [`DbError::Sqlx`] on any other failure.
pub async fn insert_document(
    pool: &PgPool,
    collection: Collection,
    doc: Map<String, Value>,
) -> Result<Value, DbError> {
    let (id, body) = with_id(doc);

    sqlx::query("INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3)")
        .bind(collection.as_str())
        .bind(&id)
        .bind(&body)
        .execute(pool)
        .await
        .map_err(|e| conflict_or(e, duplicate_message(collection, &body)))?;

    Ok(body)
}

/// Shallow-merge `patch` into an existing document and return the result.
///
/// Top-level fields in `patch` replace the stored ones; nested objects are
/// replaced whole. The `id` field cannot be changed.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no document has this id,
/// [`DbError::Conflict`] on a coupon code clash, or [`DbError::Sqlx`].
pub async fn update_document(
    pool: &PgPool,
    collection: Collection,
    id: &str,
    mut patch: Map<String, Value>,
) -> Result<Value, DbError> {
    patch.remove("id");
    let patch = Value::Object(patch);

    let body = sqlx::query_scalar::<_, Value>(
        "UPDATE documents SET body = body || $3, updated_at = NOW() \
         WHERE collection = $1 AND id = $2 \
         RETURNING body",
    )
    .bind(collection.as_str())
    .bind(id)
    .bind(&patch)
    .fetch_optional(pool)
    .await
    .map_err(|e| conflict_or(e, duplicate_message(collection, &patch)))?;

    body.ok_or(DbError::NotFound)
}

/// Delete a document. Returns `false` when nothing matched.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn delete_document(
    pool: &PgPool,
    collection: Collection,
    id: &str,
) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
        .bind(collection.as_str())
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) fn with_id(mut doc: Map<String, Value>) -> (String, Value) {
    let id = document_id(&Value::Object(doc.clone())).unwrap_or_else(|| Uuid::new_v4().to_string());
    doc.insert("id".to_string(), Value::String(id.clone()));
    (id, Value::Object(doc))
}

fn duplicate_message(collection: Collection, body: &Value) -> String {
    match (collection, body.get("code").and_then(Value::as_str)) {
        (Collection::Coupons, Some(code)) => format!("coupon code {code} already exists"),
        _ => format!("{collection} document already exists"),
    }
}

//! Generic CRUD over the storefront collections.
//!
//! Orders are created through [`pyp_db::place_order`] so the stock they
//! consume is decremented atomically, and they can never be deleted.

use std::str::FromStr;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use pyp_core::documents::validate_document;
use pyp_core::Collection;
use serde_json::Value;

use crate::middleware::RequestId;

use super::{map_db_error, validation_error, ApiError, ApiResponse, AppState, MessageResponse};

fn resolve_collection(req_id: &str, name: &str) -> Result<Collection, ApiError> {
    Collection::from_str(name)
        .map_err(|_| ApiError::new(req_id, "not_found", format!("unknown collection '{name}'")))
}

/// GET /api/{collection}
pub(super) async fn list_documents(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(collection): Path<String>,
) -> Result<Json<ApiResponse<Vec<Value>>>, ApiError> {
    let rid = &req_id.0;
    let collection = resolve_collection(rid, &collection)?;

    let docs = pyp_db::list_documents(&state.pool, collection)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(ApiResponse::new(&req_id, docs))
}

/// POST /api/{collection}
pub(super) async fn create_document(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(collection): Path<String>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<ApiResponse<Value>>), ApiError> {
    let rid = &req_id.0;
    let collection = resolve_collection(rid, &collection)?;
    let doc = validate_document(collection, body, false).map_err(|e| validation_error(rid, &e))?;

    let stored = if collection == Collection::Orders {
        pyp_db::place_order(&state.pool, doc).await
    } else {
        pyp_db::insert_document(&state.pool, collection, doc).await
    }
    .map_err(|e| map_db_error(rid.clone(), &e))?;

    tracing::info!(
        collection = collection.as_str(),
        id = stored.get("id").and_then(serde_json::Value::as_str).unwrap_or_default(),
        "document created"
    );

    Ok((StatusCode::CREATED, ApiResponse::new(&req_id, stored)))
}

/// PUT /api/{collection}/{id}
pub(super) async fn update_document(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((collection, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let rid = &req_id.0;
    let collection = resolve_collection(rid, &collection)?;
    let patch = validate_document(collection, body, true).map_err(|e| validation_error(rid, &e))?;

    let updated = pyp_db::update_document(&state.pool, collection, &id, patch)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(ApiResponse::new(&req_id, updated))
}

/// DELETE /api/{collection}/{id}
pub(super) async fn delete_document(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let rid = &req_id.0;
    let collection = resolve_collection(rid, &collection)?;

    if !collection.allows_delete() {
        return Err(ApiError::new(
            rid,
            "method_not_allowed",
            format!("{collection} cannot be deleted"),
        ));
    }

    let deleted = pyp_db::delete_document(&state.pool, collection, &id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    if !deleted {
        return Err(ApiError::new(rid, "not_found", format!("{collection} '{id}' not found")));
    }

    tracing::info!(collection = collection.as_str(), id, "document deleted");
    Ok(ApiResponse::new(&req_id, MessageResponse::new("Deleted")))
}

use axum::{extract::State, Extension, Json};
use pyp_core::SiteConfig;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState};

/// GET /api/config — the stored settings, or the defaults if none were saved.
pub(super) async fn get_config(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<SiteConfig>>, ApiError> {
    let config = pyp_db::get_site_config(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .unwrap_or_default();

    Ok(ApiResponse::new(&req_id, config))
}

/// POST /api/config — replace the settings.
pub(super) async fn save_config(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<SiteConfig>,
) -> Result<Json<ApiResponse<SiteConfig>>, ApiError> {
    let saved = pyp_db::upsert_site_config(&state.pool, &body)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!("site config updated");
    Ok(ApiResponse::new(&req_id, saved))
}

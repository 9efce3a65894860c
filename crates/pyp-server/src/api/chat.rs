//! PickleBot support chat and recipe suggestions, proxied to Gemini so the
//! API key stays on the server.

use axum::{extract::State, http::HeaderMap, Extension, Json};
use pyp_assistant::{build_support_context, ChatTurn, RECIPE_APOLOGY};
use pyp_core::{Collection, Order, Product, User};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::{session_from_headers, RequestId};

use super::{map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RecipeRequest {
    pub pickle_name: String,
}

#[derive(Debug, Serialize)]
pub(super) struct ChatReply {
    pub reply: String,
}

#[derive(Debug, Serialize)]
pub(super) struct RecipeReply {
    pub recipe: String,
}

/// The signed-in user behind an optional bearer token. Unknown or invalid
/// tokens make the caller a guest.
async fn current_user(state: &AppState, headers: &HeaderMap) -> Option<User> {
    let claims = session_from_headers(&state.tokens, headers)?;
    let id = Uuid::parse_str(&claims.sub).ok()?;
    match pyp_db::get_user_by_id(&state.pool, id).await {
        Ok(row) => row.map(|r| r.to_user()),
        Err(e) => {
            tracing::warn!(error = %e, "chat: could not load session user");
            None
        }
    }
}

/// POST /api/chat
pub(super) async fn support_chat(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ApiResponse<ChatReply>>, ApiError> {
    let rid = &req_id.0;
    let Some(client) = state.gemini.clone() else {
        return Err(ApiError::new(
            rid,
            "unavailable",
            "the support assistant is not configured",
        ));
    };

    if body.message.trim().is_empty() {
        return Err(ApiError::new(rid, "validation_error", "message is required"));
    }

    let user = current_user(&state, &headers).await;
    let orders: Vec<Order> = pyp_db::list_documents_as(&state.pool, Collection::Orders)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    let products: Vec<Product> = pyp_db::list_documents_as(&state.pool, Collection::Products)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    let config = pyp_db::get_site_config(&state.pool)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .unwrap_or_default();

    let context = build_support_context(user.as_ref(), &orders, &products, &config);

    let reply = pyp_assistant::support_reply(&client, &body.history, &body.message, &context)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, model = client.model(), "support chat failed");
            ApiError::new(
                rid,
                "unavailable",
                "I'm having trouble connecting to the pickle jar right now. Please try again later.",
            )
        })?;

    Ok(ApiResponse::new(&req_id, ChatReply { reply }))
}

/// POST /api/recipes — always answers; provider trouble becomes an apology.
pub(super) async fn recipe(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<RecipeRequest>,
) -> Result<Json<ApiResponse<RecipeReply>>, ApiError> {
    let name = body.pickle_name.trim();
    if name.is_empty() {
        return Err(ApiError::new(
            &req_id.0,
            "validation_error",
            "pickleName is required",
        ));
    }

    let recipe = match &state.gemini {
        Some(client) => pyp_assistant::recipe_suggestion(client, name).await,
        None => RECIPE_APOLOGY.to_string(),
    };

    Ok(ApiResponse::new(&req_id, RecipeReply { recipe }))
}

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, DefaultBodyLimit, Query, State},
    http::{StatusCode, Uri},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use shared::{
    domain::FilterKey,
    error::{ApiError, ErrorCode},
    protocol::{
        InitialState, ItemPage, MessageResponse, MoveItemRequest, ResetOrderRequest,
        SaveOrderRequest, SaveSelectionRequest, SetActiveSearchTermRequest,
    },
};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{info, warn};
use view_engine::{ResetScope, DEFAULT_PAGE_LIMIT};

use crate::{app_state::AppState, config::Settings, cors::build_cors_layer};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

/// Raw query string of `GET /api/items`. Values are parsed leniently in the handler.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ItemsQuery {
    page: Option<String>,
    limit: Option<String>,
    search: Option<String>,
}

pub(crate) fn build_router(state: Arc<AppState>, settings: &Settings) -> Router {
    let api = Router::new()
        .route("/items", get(list_items))
        .route("/initial-state", get(initial_state))
        .route("/save-order", post(save_order))
        .route("/move-item", post(move_item))
        .route("/reset-sort-order", post(reset_sort_order))
        .route("/save-selection", post(save_selection))
        .route("/set-active-search-term", post(set_active_search_term));

    Router::new()
        .route("/healthz", get(healthz))
        .nest("/api", api)
        .fallback(not_found)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(settings.max_body_bytes))
        .layer(build_cors_layer(settings.cors_origins.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn not_found(uri: Uri) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiError::new(ErrorCode::NotFound, format!("No route for {uri}"))),
    )
}

async fn list_items(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ItemsQuery>,
) -> Json<ItemPage> {
    let page = lenient_int(q.page.as_deref(), 0);
    let limit = lenient_int(q.limit.as_deref(), DEFAULT_PAGE_LIMIT as i64);
    let search = q.search.unwrap_or_default();
    Json(state.engine.query(page, limit, &search).await)
}

async fn initial_state(State(state): State<Arc<AppState>>) -> Json<InitialState> {
    Json(state.engine.initial_state().await)
}

async fn save_order(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SaveOrderRequest>, JsonRejection>,
) -> ApiResult<MessageResponse> {
    let Json(req) = payload.map_err(|e| reject_body("save-order", &e))?;
    state.engine.set_order(&req.search_term, req.order).await;
    Ok(Json(MessageResponse::new("Item order saved successfully.")))
}

async fn move_item(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<MoveItemRequest>, JsonRejection>,
) -> ApiResult<MessageResponse> {
    let Json(req) = payload.map_err(|e| reject_body("move-item", &e))?;
    state
        .engine
        .move_item(&req.search_term, req.dragged_id, req.target_id)
        .await
        .map_err(|e| validation(ApiError::from(e)))?;
    Ok(Json(MessageResponse::new("Item moved successfully.")))
}

/// An empty body resets the global order only, matching clients that send no payload.
async fn reset_sort_order(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<MessageResponse> {
    let req = if body.iter().all(u8::is_ascii_whitespace) {
        ResetOrderRequest::default()
    } else {
        serde_json::from_slice::<ResetOrderRequest>(&body).map_err(|e| {
            warn!(route = "reset-sort-order", error = %e, "rejected request body");
            validation(ApiError::validation(format!("Invalid reset request: {e}")))
        })?
    };

    let (scope, message) = match (req.all, req.search_term) {
        (true, _) => (ResetScope::All, "All sort orders reset successfully.".to_string()),
        (false, None) => (
            ResetScope::Key(FilterKey::global()),
            "Global sort order reset successfully.".to_string(),
        ),
        (false, Some(term)) => {
            let key = FilterKey::normalize(&term);
            let message = if key.is_global() {
                "Global sort order reset successfully.".to_string()
            } else {
                format!("Sort order for \"{}\" reset successfully.", key.as_str())
            };
            (ResetScope::Key(key), message)
        }
    };
    state.engine.reset_order(&scope).await;
    Ok(Json(MessageResponse::new(message)))
}

async fn save_selection(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SaveSelectionRequest>, JsonRejection>,
) -> ApiResult<MessageResponse> {
    let Json(req) = payload.map_err(|e| reject_body("save-selection", &e))?;
    state.engine.save_selection(req.selected_ids).await;
    Ok(Json(MessageResponse::new(
        "Selected items saved successfully.",
    )))
}

async fn set_active_search_term(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SetActiveSearchTermRequest>, JsonRejection>,
) -> ApiResult<MessageResponse> {
    let Json(req) = payload.map_err(|e| reject_body("set-active-search-term", &e))?;
    let key = state.engine.set_active_filter(&req.search_term).await;
    info!(key = %key, "last active search term set");
    Ok(Json(MessageResponse::new(
        "Last active search term updated.",
    )))
}

/// Parses an integer query value, falling back to `default` when absent or malformed.
fn lenient_int(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn validation(error: ApiError) -> (StatusCode, Json<ApiError>) {
    (StatusCode::BAD_REQUEST, Json(error))
}

fn reject_body(route: &'static str, rejection: &JsonRejection) -> (StatusCode, Json<ApiError>) {
    warn!(route, error = %rejection.body_text(), "rejected request body");
    validation(ApiError::validation(format!(
        "Invalid data format for {route}: {}",
        rejection.body_text()
    )))
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;

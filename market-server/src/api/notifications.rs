//! Notification inbox handlers

use axum::{
    Router, middleware,
    extract::{Path, State},
    routing::{get, patch, post},
};
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{NotificationList, NotificationQuery};
use shared::response::{ApiResponse, Pagination};

use super::ApiResult;
use crate::auth::{CurrentUser, require_auth};
use crate::state::AppState;
use crate::validation::ValidatedQuery;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/notifications", get(list))
        .route("/api/notifications/{id}/read", patch(mark_read))
        .route("/api/notifications/read-all", post(mark_all_read))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

#[derive(Debug, Serialize)]
pub struct ReadAllResult {
    pub updated: u64,
}

/// GET /api/notifications
pub async fn list(
    State(state): State<AppState>,
    caller: CurrentUser,
    ValidatedQuery(query): ValidatedQuery<NotificationQuery>,
) -> ApiResult<NotificationList> {
    let page = query.page_params();
    let result = state
        .store
        .list_notifications(&caller.id, query.unread_only, page)
        .await?;
    let unread_count = state.store.count_unread(&caller.id).await?;

    Ok(ApiResponse::ok(NotificationList {
        notifications: result.items,
        unread_count,
        pagination: Pagination::new(page.page, page.limit, result.total),
    }))
}

/// PATCH /api/notifications/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<()> {
    // another user's id reads as absent
    if !state.store.mark_read(&caller.id, &id).await? {
        return Err(AppError::new(ErrorCode::NotificationNotFound));
    }
    Ok(ApiResponse::message("Notification marked as read"))
}

/// POST /api/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    caller: CurrentUser,
) -> ApiResult<ReadAllResult> {
    let updated = state.store.mark_all_read(&caller.id).await?;
    tracing::debug!(user_id = %caller.id, updated, "Notifications marked as read");
    Ok(ApiResponse::ok(ReadAllResult { updated }))
}

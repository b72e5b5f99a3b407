//! Account administration (admin role only)

use axum::{
    Router, middleware,
    extract::{Path, State},
    routing::{get, patch},
};
use shared::error::{AppError, ErrorCode};
use shared::models::{Role, User, UserListQuery, UserStatusRequest};
use shared::response::{ApiResponse, PaginatedResponse};

use super::ApiResult;
use crate::auth::{CurrentUser, require_auth, require_role};
use crate::state::AppState;
use crate::util::now_millis;
use crate::validation::{ValidatedJson, ValidatedQuery};

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users/{id}/status", patch(set_status))
        .route_layer(middleware::from_fn(require_role(Role::Admin)))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<UserListQuery>,
) -> ApiResult<PaginatedResponse<User>> {
    let page = query.page_params();
    let result = state.store.list_users(query.role, page).await?;
    Ok(ApiResponse::ok(PaginatedResponse::new(
        result.items,
        page.page,
        page.limit,
        result.total,
    )))
}

/// PATCH /api/admin/users/{id}/status
pub async fn set_status(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UserStatusRequest>,
) -> ApiResult<User> {
    if id == admin.id && !req.is_active {
        return Err(AppError::with_message(
            ErrorCode::PermissionDenied,
            "Admins cannot deactivate their own account",
        ));
    }

    let mut user = state
        .store
        .find_user(&id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

    user.is_active = req.is_active;
    user.updated_at = now_millis();
    state.store.update_user(&user).await?;

    tracing::info!(
        admin_id = %admin.id,
        user_id = %user.id,
        is_active = user.is_active,
        "Account status changed"
    );
    Ok(ApiResponse::ok_with_message(user, "Account status updated"))
}

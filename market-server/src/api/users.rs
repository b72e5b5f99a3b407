//! Profile handlers

use axum::{
    Router, middleware,
    extract::{Path, State},
    routing::get,
};
use shared::error::{AppError, ErrorCode};
use shared::models::{PublicProfile, User, UserUpdate};
use shared::response::ApiResponse;

use super::ApiResult;
use crate::auth::{CurrentUser, MaybeUser, optional_auth, require_auth};
use crate::state::AppState;
use crate::util::now_millis;
use crate::validation::ValidatedJson;

pub fn router(state: &AppState) -> Router<AppState> {
    let own = Router::new()
        .route("/api/users/me", get(me).patch(update_me).delete(delete_me))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let public = Router::new()
        .route("/api/users/{id}", get(public_profile))
        .route_layer(middleware::from_fn_with_state(state.clone(), optional_auth));

    own.merge(public)
}

async fn load_self(state: &AppState, caller: &CurrentUser) -> Result<User, AppError> {
    state
        .store
        .find_user(&caller.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))
}

/// GET /api/users/me
pub async fn me(State(state): State<AppState>, caller: CurrentUser) -> ApiResult<User> {
    let now = now_millis();
    state.store.touch_last_seen(&caller.id, now).await?;

    let mut user = load_self(&state, &caller).await?;
    user.last_seen_at = Some(now);
    Ok(ApiResponse::ok(user))
}

/// PATCH /api/users/me
pub async fn update_me(
    State(state): State<AppState>,
    caller: CurrentUser,
    ValidatedJson(req): ValidatedJson<UserUpdate>,
) -> ApiResult<User> {
    let mut user = load_self(&state, &caller).await?;
    if req.has_artisan_fields() && !user.is_artisan() {
        return Err(AppError::invalid_field(
            "skills",
            "Only artisans can list skills",
        ));
    }

    req.apply(&mut user);
    user.updated_at = now_millis();
    state.store.update_user(&user).await?;

    tracing::info!(user_id = %user.id, "Profile updated");
    Ok(ApiResponse::ok_with_message(user, "Profile updated"))
}

/// DELETE /api/users/me
///
/// Soft delete: the account is deactivated and its tokens revoked.
pub async fn delete_me(State(state): State<AppState>, caller: CurrentUser) -> ApiResult<()> {
    let mut user = load_self(&state, &caller).await?;
    let now = now_millis();
    user.is_active = false;
    user.tokens_valid_after = now + 1;
    user.updated_at = now;
    state.store.update_user(&user).await?;

    tracing::info!(user_id = %user.id, "Account deactivated by owner");
    Ok(ApiResponse::message("Account deleted"))
}

/// GET /api/users/{id}
///
/// Deactivated accounts are hidden from everyone but admins.
pub async fn public_profile(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<String>,
) -> ApiResult<PublicProfile> {
    let user = state
        .store
        .find_user(&id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

    let is_admin = viewer.as_ref().is_some_and(CurrentUser::is_admin);
    if !user.is_active && !is_admin {
        return Err(AppError::new(ErrorCode::UserNotFound));
    }
    Ok(ApiResponse::ok(user.public_profile()))
}

//! Account authentication handlers
//!
//! - `POST /api/auth/register`: create a customer or artisan account
//! - `POST /api/auth/login`: exchange credentials for a token
//! - `POST /api/auth/logout`: revoke every outstanding token of the caller

use axum::{Router, extract::State, middleware, routing::post};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    ArtisanProfile, AuthResponse, LoginRequest, RegisterRequest, Role, User,
};
use shared::response::ApiResponse;

use super::ApiResult;
use crate::auth::rate_limit::{login_rate_limit, register_rate_limit};
use crate::auth::CurrentUser;
use crate::db::StoreError;
use crate::error::internal_error;
use crate::state::AppState;
use crate::util::{hash_password, new_id, now_millis, verify_password};
use crate::validation::ValidatedJson;

pub fn router(state: &AppState) -> Router<AppState> {
    let register_routes = Router::new()
        .route("/api/auth/register", post(register))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            register_rate_limit,
        ));

    let login_routes = Router::new()
        .route("/api/auth/login", post(login))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            login_rate_limit,
        ));

    Router::new()
        .merge(register_routes)
        .merge(login_routes)
        .route("/api/auth/logout", post(logout))
}

fn issue(state: &AppState, user: User) -> Result<AuthResponse, AppError> {
    let issued = state.identity.issue(&user)?;
    Ok(AuthResponse {
        user,
        token: issued.token,
        expires_in: issued.expires_in,
    })
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<AuthResponse> {
    if req.role == Role::Admin {
        return Err(AppError::with_message(
            ErrorCode::RoleNotAllowed,
            "Admin accounts cannot be self-registered",
        ));
    }

    let email = req.email.to_lowercase();
    if state.store.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::new(ErrorCode::EmailAlreadyRegistered));
    }

    let password_hash = hash_password(&req.password).map_err(|e| {
        tracing::error!(error = %e, "Password hashing failed");
        internal_error(ErrorCode::InternalError, e)
    })?;

    let now = now_millis();
    let user = User {
        id: new_id(),
        email,
        role: req.role,
        display_name: req.display_name,
        phone: None,
        bio: None,
        location: None,
        avatar_url: None,
        is_active: true,
        artisan: (req.role == Role::Artisan).then(ArtisanProfile::default),
        last_seen_at: None,
        created_at: now,
        updated_at: now,
        password_hash,
        tokens_valid_after: 0,
    };

    state.store.insert_user(&user).await.map_err(|e| match e {
        // lost a race against a concurrent registration
        StoreError::Conflict(_) => AppError::new(ErrorCode::EmailAlreadyRegistered),
        other => other.into(),
    })?;

    tracing::info!(user_id = %user.id, role = %user.role, "Account registered");

    Ok(ApiResponse::ok_with_message(
        issue(&state, user)?,
        "Account created",
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<AuthResponse> {
    let email = req.email.to_lowercase();

    // Same error for unknown email and wrong password
    let user = match state.store.find_user_by_email(&email).await? {
        Some(user) if verify_password(&req.password, &user.password_hash) => user,
        _ => {
            tracing::warn!(email = %email, "Login failed - invalid credentials");
            return Err(AppError::new(ErrorCode::InvalidCredentials));
        }
    };

    if !user.is_active {
        return Err(AppError::new(ErrorCode::AccountDisabled));
    }

    tracing::info!(user_id = %user.id, "Login succeeded");
    Ok(ApiResponse::ok_with_message(
        issue(&state, user)?,
        "Login successful",
    ))
}

/// POST /api/auth/logout
pub async fn logout(State(state): State<AppState>, caller: CurrentUser) -> ApiResult<()> {
    let mut user = state
        .store
        .find_user(&caller.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

    let now = now_millis();
    // +1 so a token minted in this same millisecond is also revoked
    user.tokens_valid_after = now + 1;
    user.updated_at = now;
    state.store.update_user(&user).await?;

    tracing::info!(user_id = %user.id, "Tokens revoked");
    Ok(ApiResponse::message("Logged out"))
}

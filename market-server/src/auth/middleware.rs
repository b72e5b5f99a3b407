//! Authentication middleware
//!
//! Axum middleware for identity resolution and role gates.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::error::{AppError, ErrorCode};
use shared::models::Role;

use super::identity::CurrentUser;
use super::jwt::JwtService;
use crate::state::AppState;

/// Pull the bearer token out of a request's headers
///
/// `Ok(None)` when no `Authorization` header is present, `Err` when it is
/// present but not a bearer token.
pub(crate) fn bearer_token(headers: &http::HeaderMap) -> Result<Option<&str>, AppError> {
    let Some(header) = headers.get(http::header::AUTHORIZATION) else {
        return Ok(None);
    };
    header
        .to_str()
        .ok()
        .and_then(JwtService::extract_from_header)
        .map(Some)
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::NotAuthenticated, "Invalid authorization header")
        })
}

/// Resolve the caller from request headers
pub(crate) async fn authenticate(
    state: &AppState,
    headers: &http::HeaderMap,
) -> Result<CurrentUser, AppError> {
    let token = bearer_token(headers)?.ok_or_else(AppError::unauthorized)?;
    state.identity.resolve(token).await.map_err(|e| {
        tracing::warn!(error = %e, "Authentication failed");
        AppError::from(e)
    })
}

/// Require an authenticated caller
///
/// Reads `Authorization: Bearer <token>`, resolves it through the identity
/// provider and inserts [`CurrentUser`] into request extensions.
///
/// | Failure | Status |
/// |---------|--------|
/// | header missing or not bearer | 401 NotAuthenticated |
/// | token expired | 401 TokenExpired |
/// | token revoked | 401 TokenRevoked |
/// | bad signature or claims | 401 TokenInvalid |
/// | user record gone | 404 UserNotFound |
/// | account deactivated | 401 AccountDisabled |
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let user = authenticate(&state, req.headers()).await?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Marks a request that [`optional_auth`] already settled as anonymous
#[derive(Debug, Clone, Copy)]
pub(crate) struct Anonymous;

/// Attach the caller when a valid token is present, stay anonymous otherwise
pub async fn optional_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let has_token = matches!(bearer_token(req.headers()), Ok(Some(_)));
    let resolved = if has_token {
        authenticate(&state, req.headers())
            .await
            .inspect_err(|e| tracing::debug!(code = %e.code, "Ignoring invalid optional credentials"))
            .ok()
    } else {
        None
    };
    if let Some(user) = resolved {
        req.extensions_mut().insert(user);
    } else {
        req.extensions_mut().insert(Anonymous);
    }
    next.run(req).await
}

/// Role gate; layer inside [`require_auth`]
///
/// ```ignore
/// Router::new()
///     .route("/api/products", post(products::create))
///     .layer(middleware::from_fn(require_role(Role::Artisan)))
///     .layer(middleware::from_fn_with_state(state.clone(), require_auth));
/// ```
pub fn require_role(
    role: Role,
) -> impl Fn(
    Request,
    Next,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AppError>> + Send>>
+ Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let user = req
                .extensions()
                .get::<CurrentUser>()
                .ok_or_else(AppError::unauthorized)?;

            if let Err(e) = user.require(role) {
                tracing::warn!(
                    user_id = %user.id,
                    user_role = %user.role,
                    required_role = %role,
                    "Role check failed"
                );
                return Err(e);
            }

            Ok(next.run(req).await)
        })
    }
}

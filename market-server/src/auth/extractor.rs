//! Identity extractors
//!
//! Handlers take [`CurrentUser`] or [`MaybeUser`] as arguments. Both reuse
//! an identity already placed in extensions by the middleware and resolve
//! the token themselves otherwise. `MaybeUser` also trusts an anonymous
//! verdict from `optional_auth` instead of resolving a rejected token again.

use axum::{extract::FromRequestParts, http::request::Parts};
use shared::error::AppError;

use super::identity::CurrentUser;
use super::middleware::{Anonymous, authenticate, bearer_token};
use crate::state::AppState;

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let user = authenticate(state, &parts.headers).await?;
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

/// Caller identity when present
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(MaybeUser(Some(user.clone())));
        }
        if parts.extensions.get::<Anonymous>().is_some() {
            return Ok(MaybeUser(None));
        }
        if !matches!(bearer_token(&parts.headers), Ok(Some(_))) {
            return Ok(MaybeUser(None));
        }
        Ok(MaybeUser(authenticate(state, &parts.headers).await.ok()))
    }
}

//! Identity resolution
//!
//! [`IdentityProvider`] turns a bearer token into the [`CurrentUser`] of a
//! request. The JWT provider checks the token itself, then the user record
//! for existence, activation and revocation.

use std::sync::Arc;

use async_trait::async_trait;
use shared::error::{AppError, ErrorCode};
use shared::models::{Role, User};
use thiserror::Error;

use super::jwt::{IssuedToken, JwtError, JwtService};
use crate::db::{MarketStore, StoreError};

/// Authenticated caller attached to a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Reject unless the caller holds `role`
    pub fn require(&self, role: Role) -> Result<(), AppError> {
        if self.role == role {
            return Ok(());
        }
        let code = match role {
            Role::Artisan => ErrorCode::ArtisanRequired,
            Role::Admin => ErrorCode::AdminRequired,
            Role::Customer => ErrorCode::CustomerRequired,
        };
        Err(AppError::new(code))
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("token expired")]
    Expired,

    #[error("token invalid: {0}")]
    Invalid(String),

    #[error("token revoked")]
    Revoked,

    #[error("user not found")]
    UserNotFound,

    #[error("account disabled")]
    Disabled,

    #[error("token issuance failed: {0}")]
    Issue(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<JwtError> for IdentityError {
    fn from(e: JwtError) -> Self {
        match e {
            JwtError::ExpiredToken => IdentityError::Expired,
            JwtError::GenerationFailed(msg) => IdentityError::Issue(msg),
            other => IdentityError::Invalid(other.to_string()),
        }
    }
}

impl From<IdentityError> for AppError {
    fn from(e: IdentityError) -> Self {
        match e {
            IdentityError::Expired => AppError::token_expired(),
            IdentityError::Invalid(_) => AppError::invalid_token("Invalid token"),
            IdentityError::Revoked => AppError::token_revoked(),
            IdentityError::UserNotFound => AppError::new(ErrorCode::UserNotFound),
            IdentityError::Disabled => AppError::new(ErrorCode::AccountDisabled),
            IdentityError::Issue(msg) => {
                tracing::error!(error = %msg, "Token issuance failed");
                crate::error::internal_error(ErrorCode::InternalError, msg)
            }
            IdentityError::Store(e) => e.into(),
        }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify a bearer token and load the caller
    async fn resolve(&self, token: &str) -> Result<CurrentUser, IdentityError>;

    /// Issue a token for an authenticated user
    fn issue(&self, user: &User) -> Result<IssuedToken, IdentityError>;
}

pub struct JwtIdentityProvider {
    jwt: JwtService,
    store: Arc<dyn MarketStore>,
}

impl JwtIdentityProvider {
    pub fn new(jwt: JwtService, store: Arc<dyn MarketStore>) -> Self {
        Self { jwt, store }
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn resolve(&self, token: &str) -> Result<CurrentUser, IdentityError> {
        let claims = self.jwt.validate_token(token)?;

        let user = self
            .store
            .find_user(&claims.sub)
            .await?
            .ok_or(IdentityError::UserNotFound)?;

        if claims.iat_ms < user.tokens_valid_after {
            return Err(IdentityError::Revoked);
        }
        if !user.is_active {
            return Err(IdentityError::Disabled);
        }

        // Role comes from the record so demotions apply immediately
        Ok(CurrentUser::from(&user))
    }

    fn issue(&self, user: &User) -> Result<IssuedToken, IdentityError> {
        Ok(self.jwt.generate_token(&user.id, &user.email, user.role)?)
    }
}

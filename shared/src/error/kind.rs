//! Error kind classification
//!
//! The kind is the coarse taxonomy clients see in the `error` field of the
//! failure envelope. It is derived from the code, never set by hand.

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Coarse error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed or out-of-bounds input (400)
    ValidationError,
    /// Missing, expired or revoked credential (401)
    AuthenticationError,
    /// Role or ownership mismatch (403)
    AuthorizationError,
    /// Referenced entity absent (404)
    NotFoundError,
    /// Invalid state transition, insufficient stock, duplicate action
    BusinessRuleError,
    /// Client exceeded its request budget (429)
    RateLimited,
    /// Upstream provider or store unreachable (503)
    UpstreamServiceError,
    /// Unanticipated failure (500)
    InternalError,
}

impl ErrorKind {
    /// Name used in the `error` field of the response envelope
    pub fn name(&self) -> &'static str {
        match self {
            Self::ValidationError => "ValidationError",
            Self::AuthenticationError => "AuthenticationError",
            Self::AuthorizationError => "AuthorizationError",
            Self::NotFoundError => "NotFoundError",
            Self::BusinessRuleError => "BusinessRuleError",
            Self::RateLimited => "RateLimited",
            Self::UpstreamServiceError => "UpstreamServiceError",
            Self::InternalError => "InternalError",
        }
    }

    /// 5xx-class kinds carry generic messages in production
    pub fn is_server_fault(&self) -> bool {
        matches!(self, Self::UpstreamServiceError | Self::InternalError)
    }
}

impl ErrorCode {
    /// Get the kind for this error code
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ValidationFailed | Self::InvalidFormat | Self::OrderEmpty => {
                ErrorKind::ValidationError
            }

            Self::NotAuthenticated
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenInvalid
            | Self::TokenRevoked
            | Self::AccountDisabled => ErrorKind::AuthenticationError,

            Self::PermissionDenied
            | Self::ArtisanRequired
            | Self::AdminRequired
            | Self::CustomerRequired
            | Self::NotOrderParticipant
            | Self::NotProductOwner
            | Self::RoleNotAllowed => ErrorKind::AuthorizationError,

            Self::NotFound
            | Self::UserNotFound
            | Self::OrderNotFound
            | Self::ProductNotFound
            | Self::NotificationNotFound => ErrorKind::NotFoundError,

            Self::AlreadyExists
            | Self::EmailAlreadyRegistered
            | Self::InvalidTransition
            | Self::OrderNotCancellable
            | Self::OrderAlreadyReviewed
            | Self::OrderNotDelivered
            | Self::ProductUnavailable
            | Self::InsufficientStock => ErrorKind::BusinessRuleError,

            Self::TooManyRequests => ErrorKind::RateLimited,

            Self::ServiceUnavailable => ErrorKind::UpstreamServiceError,

            Self::InternalError | Self::DatabaseError => ErrorKind::InternalError,
        }
    }
}

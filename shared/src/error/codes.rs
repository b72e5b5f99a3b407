//! Unified error codes for the marketplace API
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Account errors
//! - 4xxx: Order errors
//! - 6xxx: Product errors
//! - 7xxx: Notification errors
//! - 8xxx: Upstream service errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so clients can switch on
/// them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid format
    InvalidFormat = 6,
    /// Too many requests from the same client
    TooManyRequests = 9,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Token was revoked
    TokenRevoked = 1005,
    /// Account is disabled
    AccountDisabled = 1006,
    /// Verified identity has no user record
    UserNotFound = 1007,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Artisan role required
    ArtisanRequired = 2002,
    /// Admin role required
    AdminRequired = 2003,
    /// Customer role required
    CustomerRequired = 2004,
    /// Caller is not a party to the order
    NotOrderParticipant = 2005,
    /// Caller does not own the product
    NotProductOwner = 2006,

    // ==================== 3xxx: Account ====================
    /// Email is already registered
    EmailAlreadyRegistered = 3001,
    /// Role cannot be self-assigned
    RoleNotAllowed = 3003,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Status change not allowed by the transition graph
    InvalidTransition = 4002,
    /// Order has no items
    OrderEmpty = 4003,
    /// Order can no longer be cancelled
    OrderNotCancellable = 4004,
    /// Order has already been reviewed
    OrderAlreadyReviewed = 4005,
    /// Order has not been delivered
    OrderNotDelivered = 4006,

    // ==================== 6xxx: Product ====================
    /// Product not found
    ProductNotFound = 6001,
    /// Product is not available for sale
    ProductUnavailable = 6002,
    /// Not enough stock
    InsufficientStock = 6003,

    // ==================== 7xxx: Notification ====================
    /// Notification not found
    NotificationNotFound = 7001,

    // ==================== 8xxx: Upstream ====================
    /// Upstream service unavailable
    ServiceUnavailable = 8001,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::TooManyRequests => "Too many requests, try again later",

            // Auth
            ErrorCode::NotAuthenticated => "Authentication required",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::TokenRevoked => "Authentication token has been revoked",
            ErrorCode::AccountDisabled => "Account is disabled",
            ErrorCode::UserNotFound => "User not found",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::ArtisanRequired => "Artisan role is required",
            ErrorCode::AdminRequired => "Administrator role is required",
            ErrorCode::CustomerRequired => "Customer role is required",
            ErrorCode::NotOrderParticipant => "You are not a party to this order",
            ErrorCode::NotProductOwner => "You do not own this product",

            // Account
            ErrorCode::EmailAlreadyRegistered => "Email is already registered",
            ErrorCode::RoleNotAllowed => "Role cannot be assigned at registration",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::InvalidTransition => "Order status transition is not allowed",
            ErrorCode::OrderEmpty => "Order must contain at least one item",
            ErrorCode::OrderNotCancellable => "Order can no longer be cancelled",
            ErrorCode::OrderAlreadyReviewed => "Order has already been reviewed",
            ErrorCode::OrderNotDelivered => "Only delivered orders can be reviewed",

            // Product
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::ProductUnavailable => "Product is not available",
            ErrorCode::InsufficientStock => "Insufficient stock",

            // Notification
            ErrorCode::NotificationNotFound => "Notification not found",

            // Upstream
            ErrorCode::ServiceUnavailable => "Service temporarily unavailable",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            6 => Ok(ErrorCode::InvalidFormat),
            9 => Ok(ErrorCode::TooManyRequests),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1005 => Ok(ErrorCode::TokenRevoked),
            1006 => Ok(ErrorCode::AccountDisabled),
            1007 => Ok(ErrorCode::UserNotFound),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::ArtisanRequired),
            2003 => Ok(ErrorCode::AdminRequired),
            2004 => Ok(ErrorCode::CustomerRequired),
            2005 => Ok(ErrorCode::NotOrderParticipant),
            2006 => Ok(ErrorCode::NotProductOwner),

            // Account
            3001 => Ok(ErrorCode::EmailAlreadyRegistered),
            3003 => Ok(ErrorCode::RoleNotAllowed),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::InvalidTransition),
            4003 => Ok(ErrorCode::OrderEmpty),
            4004 => Ok(ErrorCode::OrderNotCancellable),
            4005 => Ok(ErrorCode::OrderAlreadyReviewed),
            4006 => Ok(ErrorCode::OrderNotDelivered),

            // Product
            6001 => Ok(ErrorCode::ProductNotFound),
            6002 => Ok(ErrorCode::ProductUnavailable),
            6003 => Ok(ErrorCode::InsufficientStock),

            // Notification
            7001 => Ok(ErrorCode::NotificationNotFound),

            // Upstream
            8001 => Ok(ErrorCode::ServiceUnavailable),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

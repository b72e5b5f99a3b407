//! Unified error system for the marketplace API
//!
//! - [`ErrorCode`]: Standardized numeric error codes
//! - [`ErrorKind`]: Coarse taxonomy exposed in the `error` envelope field
//! - [`AppError`]: Rich error type with code, message, and field details
//! - [`ErrorBody`]: The JSON failure envelope
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode};
//!
//! let err = AppError::new(ErrorCode::InsufficientStock);
//! assert_eq!(err.kind().name(), "BusinessRuleError");
//!
//! let err = AppError::with_message(ErrorCode::ValidationFailed, "Invalid input").with_detail("email", "invalid format");
//! assert_eq!(err.details.len(), 1);
//! ```

mod codes;
mod http;
mod kind;
mod types;

pub use codes::{ErrorCode, InvalidErrorCode};
pub use kind::ErrorKind;
pub use types::{AppError, AppResult, ErrorBody, ErrorDetail};

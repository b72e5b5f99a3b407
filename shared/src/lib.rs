//! Shared types for the artisan marketplace
//!
//! Domain models, request payloads, error codes and response envelopes
//! used by the server and by API clients.

pub mod error;
pub mod models;
pub mod request;
pub mod response;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, AppResult, ErrorCode, ErrorKind};
pub use response::{ApiResponse, PaginatedResponse, Pagination};

//! Unified service-layer error type
//!
//! `ServiceError` bridges storage failures and the API-layer `AppError`, so
//! handlers and the order manager can propagate both with `?`.

use std::sync::OnceLock;

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};

use crate::db::StoreError;

static EXPOSE_INTERNAL: OnceLock<bool> = OnceLock::new();

/// Attach underlying error text to 5xx responses (set once at startup)
pub fn set_expose_internal(expose: bool) {
    let _ = EXPOSE_INTERNAL.set(expose);
}

fn expose_internal() -> bool {
    EXPOSE_INTERNAL.get().copied().unwrap_or(false)
}

/// Build a 5xx error, carrying `cause` in details when exposure is enabled
pub fn internal_error(code: ErrorCode, cause: impl std::fmt::Display) -> AppError {
    let err = AppError::new(code);
    if expose_internal() {
        err.with_detail("internal", cause.to_string())
    } else {
        err
    }
}

/// Service-layer error
///
/// - `Store`: persistence failure (logged once, mapped by kind)
/// - `App`: business-rule error (passed through to the client)
#[derive(Debug)]
pub enum ServiceError {
    Store(StoreError),
    App(AppError),
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        ServiceError::Store(e)
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => AppError::new(ErrorCode::NotFound),
            StoreError::Conflict(msg) => AppError::with_message(ErrorCode::AlreadyExists, msg),
            StoreError::InsufficientStock { product_id } => {
                AppError::new(ErrorCode::InsufficientStock).with_detail("product_id", product_id)
            }
            StoreError::Unavailable(msg) => {
                tracing::error!(error = %msg, "Store unavailable");
                internal_error(ErrorCode::ServiceUnavailable, msg)
            }
            StoreError::Backend(msg) => {
                tracing::error!(error = %msg, "Store backend error");
                internal_error(ErrorCode::DatabaseError, msg)
            }
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Store(store_err) => store_err.into(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

/// Convenience type alias for service-layer results
pub type ServiceResult<T> = Result<T, ServiceError>;

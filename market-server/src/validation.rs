//! Validating extractors
//!
//! [`ValidatedJson`] and [`ValidatedQuery`] deserialize the request (serde
//! defaults, trimming, unknown fields dropped) and run the DTO's `validator`
//! rules. Any failure becomes a 400 `ValidationFailed` with one detail per
//! offending field, using dotted paths for nested values
//! (`items[0].quantity`, `shipping_address.city`).

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, OptionalFromRequest, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use shared::error::{AppError, ErrorCode, ErrorDetail};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// JSON body that passed its validation rules
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

/// Query string that passed its validation rules
#[derive(Debug, Clone)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = <Json<T> as FromRequest<S>>::from_request(req, state)
            .await
            .map_err(json_rejection)?;
        value.validate().map_err(validation_error)?;
        Ok(ValidatedJson(value))
    }
}

/// Bodies are optional only when no `Content-Type` was sent
impl<T, S> OptionalFromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        if !req.headers().contains_key(http::header::CONTENT_TYPE) {
            return Ok(None);
        }
        <Self as FromRequest<S>>::from_request(req, state)
            .await
            .map(Some)
    }
}

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(query_rejection)?;
        value.validate().map_err(validation_error)?;
        Ok(ValidatedQuery(value))
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    let code = match rejection {
        JsonRejection::MissingJsonContentType(_) | JsonRejection::JsonSyntaxError(_) => {
            ErrorCode::InvalidFormat
        }
        _ => ErrorCode::ValidationFailed,
    };
    AppError::with_message(code, "Request body is invalid").with_detail("body", rejection.body_text())
}

fn query_rejection(rejection: QueryRejection) -> AppError {
    AppError::with_message(ErrorCode::ValidationFailed, "Query string is invalid")
        .with_detail("query", rejection.body_text())
}

/// Convert `validator` output into a `ValidationFailed` error
pub fn validation_error(errors: ValidationErrors) -> AppError {
    let mut details = Vec::new();
    flatten(&errors, "", &mut details);
    details.sort_by(|a, b| a.field.cmp(&b.field));

    let mut err = AppError::with_message(ErrorCode::ValidationFailed, "Validation failed");
    err.details = details;
    err
}

fn flatten(errors: &ValidationErrors, prefix: &str, out: &mut Vec<ErrorDetail>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                for e in list {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value ({})", e.code));
                    out.push(ErrorDetail {
                        field: path.clone(),
                        message,
                    });
                }
            }
            ValidationErrorsKind::Struct(inner) => flatten(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    flatten(inner, &format!("{path}[{index}]"), out);
                }
            }
        }
    }
}

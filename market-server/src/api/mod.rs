//! HTTP routes for market-server
//!
//! # Structure
//!
//! - [`health`] - liveness check
//! - [`auth`] - registration, login, logout
//! - [`users`] - own profile and public profiles
//! - [`admin`] - account administration
//! - [`products`] - catalog
//! - [`orders`] - order lifecycle
//! - [`notifications`] - per-user inbox

pub mod admin;
pub mod auth;
pub mod health;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod users;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use http::{HeaderName, HeaderValue, Method};
use shared::error::AppError;
use shared::response::ApiResponse;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::AppState;

/// Handler result wrapped in the success envelope
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

const MAX_BODY_BYTES: usize = 1024 * 1024;

const REQUEST_ID: &str = "x-request-id";

/// Request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// All routes, without tower-http middleware or state
pub fn build_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router(state))
        .merge(users::router(state))
        .merge(admin::router(state))
        .merge(products::router(state))
        .merge(orders::router(state))
        .merge(notifications::router(state))
}

/// Fully configured application
///
/// Layers run top to bottom: request id, trace, CORS, body limit.
pub fn build_app(state: AppState, config: &Config) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID),
            XRequestId,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID,
        )))
        .layer(cors_layer(&config.cors_origins))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES));

    build_router(&state).layer(middleware).with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([http::header::AUTHORIZATION, http::header::CONTENT_TYPE]);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

#[cfg(test)]
mod tests;

//! Order handlers
//!
//! Thin adapters over [`OrderManager`](crate::orders::OrderManager); all
//! lifecycle rules live there.

use axum::{
    Router, middleware,
    extract::{Path, State},
    routing::{get, patch, post},
};
use shared::models::{
    CancelOrderRequest, CreateOrderRequest, Order, OrderListQuery, ReviewOrderRequest, Role,
    UpdateStatusRequest,
};
use shared::response::{ApiResponse, PaginatedResponse};

use super::ApiResult;
use crate::auth::{CurrentUser, require_auth, require_role};
use crate::state::AppState;
use crate::validation::{ValidatedJson, ValidatedQuery};

pub fn router(state: &AppState) -> Router<AppState> {
    let create = Router::new()
        .route("/api/orders/create", post(create))
        .route_layer(middleware::from_fn(require_role(Role::Customer)));

    Router::new()
        .merge(create)
        .route("/api/orders/list", get(list))
        .route("/api/orders/{id}", get(get_by_id))
        .route("/api/orders/{id}/status", patch(update_status))
        .route("/api/orders/{id}/cancel", post(cancel))
        .route("/api/orders/{id}/review", post(review))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

/// POST /api/orders/create
pub async fn create(
    State(state): State<AppState>,
    customer: CurrentUser,
    ValidatedJson(req): ValidatedJson<CreateOrderRequest>,
) -> ApiResult<Order> {
    let order = state.orders.create_order(&customer, req).await?;
    Ok(ApiResponse::ok_with_message(order, "Order created"))
}

/// GET /api/orders/list
pub async fn list(
    State(state): State<AppState>,
    caller: CurrentUser,
    ValidatedQuery(query): ValidatedQuery<OrderListQuery>,
) -> ApiResult<PaginatedResponse<Order>> {
    Ok(ApiResponse::ok(state.orders.list(&caller, &query).await?))
}

/// GET /api/orders/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Order> {
    Ok(ApiResponse::ok(state.orders.get(&caller, &id).await?))
}

/// PATCH /api/orders/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateStatusRequest>,
) -> ApiResult<Order> {
    let order = state.orders.transition(&caller, &id, req).await?;
    let message = format!("Order is now {}", order.status);
    Ok(ApiResponse::ok_with_message(order, message))
}

/// POST /api/orders/{id}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<String>,
    req: Option<ValidatedJson<CancelOrderRequest>>,
) -> ApiResult<Order> {
    let req = req.map(|ValidatedJson(r)| r).unwrap_or_default();
    let order = state.orders.cancel(&caller, &id, req).await?;
    Ok(ApiResponse::ok_with_message(order, "Order cancelled"))
}

/// POST /api/orders/{id}/review
pub async fn review(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<ReviewOrderRequest>,
) -> ApiResult<Order> {
    let order = state.orders.review(&caller, &id, req).await?;
    Ok(ApiResponse::ok_with_message(order, "Review submitted"))
}

//! OrdersManager - order lifecycle
//!
//! Turns validated requests into store batches:
//!
//! ```text
//! request ──► authorize ──► check graph/rules ──► build next state
//!                                                     │
//!                   notify (post-commit) ◄── commit batch (CAS on status)
//! ```
//!
//! The manager never mutates a record in place; it loads, computes the next
//! state and hands it to one atomic store call. A lost compare-and-set
//! surfaces as the business error of the operation.

use std::sync::Arc;

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    CancelOrderRequest, CreateOrderRequest, LineItem, MAX_LINE_QUANTITY, Order, OrderListQuery,
    OrderReview, OrderStatus, ReviewOrderRequest, Role, UpdateStatusRequest,
};
use shared::response::PaginatedResponse;

use super::notify::{self, Notifier};
use crate::auth::CurrentUser;
use crate::db::{MarketStore, OrderScope, StoreError, TransitionEffect};
use crate::error::{ServiceError, ServiceResult};
use crate::util::{generate_order_number, new_id, now_millis};

#[derive(Clone)]
pub struct OrderManager {
    store: Arc<dyn MarketStore>,
    notifier: Notifier,
}

impl OrderManager {
    pub fn new(store: Arc<dyn MarketStore>) -> Self {
        Self {
            notifier: Notifier::new(store.clone()),
            store,
        }
    }

    async fn load(&self, order_id: &str) -> ServiceResult<Order> {
        self.store
            .find_order(order_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound).into())
    }

    // ========================================================================
    // Create
    // ========================================================================

    /// Place an order for the calling customer
    pub async fn create_order(
        &self,
        customer: &CurrentUser,
        req: CreateOrderRequest,
    ) -> ServiceResult<Order> {
        customer.require(Role::Customer)?;

        let cart = req.merged_items();
        if cart.is_empty() {
            return Err(AppError::new(ErrorCode::OrderEmpty).into());
        }
        if let Some(entry) = cart.iter().find(|e| e.quantity > MAX_LINE_QUANTITY) {
            return Err(AppError::invalid_field(
                "items",
                format!(
                    "Quantity of product {} must not exceed {MAX_LINE_QUANTITY}",
                    entry.product_id
                ),
            )
            .into());
        }

        let mut items = Vec::with_capacity(cart.len());
        let mut currency: Option<String> = None;

        for entry in &cart {
            let product = self
                .store
                .find_product(&entry.product_id)
                .await?
                .ok_or_else(|| {
                    AppError::new(ErrorCode::ProductNotFound)
                        .with_detail("product_id", entry.product_id.clone())
                })?;

            if !product.is_active {
                return Err(AppError::new(ErrorCode::ProductUnavailable)
                    .with_detail("product_id", product.id)
                    .into());
            }
            if entry.quantity > product.stock_quantity {
                return Err(AppError::with_message(
                    ErrorCode::InsufficientStock,
                    format!(
                        "Only {} of {} left in stock",
                        product.stock_quantity, product.name
                    ),
                )
                .with_detail("product_id", product.id)
                .into());
            }
            match &currency {
                None => currency = Some(product.currency.clone()),
                Some(c) if *c != product.currency => {
                    return Err(AppError::invalid_field(
                        "items",
                        "All items in an order must share one currency",
                    )
                    .into());
                }
                Some(_) => {}
            }

            items.push(LineItem {
                thumbnail: product.thumbnail(),
                line_total: product.price * Decimal::from(entry.quantity),
                product_id: product.id,
                artisan_id: product.artisan_id,
                name: product.name,
                price: product.price,
                quantity: entry.quantity,
            });
        }

        let now = now_millis();
        let order = Order {
            id: new_id(),
            order_number: generate_order_number(now),
            customer_id: customer.id.clone(),
            total_amount: Order::sum_line_totals(&items),
            artisan_ids: Order::collect_artisan_ids(&items),
            items,
            currency: currency.unwrap_or_else(|| "USD".to_string()),
            shipping_address: req.shipping_address,
            payment_method: req.payment_method,
            status: OrderStatus::Pending,
            tracking_number: None,
            cancellation_reason: None,
            notes: req.notes,
            review: None,
            created_at: now,
            confirmed_at: None,
            processing_at: None,
            shipped_at: None,
            delivered_at: None,
            cancelled_at: None,
            updated_at: now,
        };

        self.store.place_order(&order).await?;

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            customer_id = %order.customer_id,
            total = %order.total_amount,
            items = order.items.len(),
            "Order placed"
        );

        self.notifier.dispatch(notify::order_placed(&order)).await;
        Ok(order)
    }

    // ========================================================================
    // Status transitions
    // ========================================================================

    /// Drive the state machine as a participating artisan or an admin
    pub async fn transition(
        &self,
        actor: &CurrentUser,
        order_id: &str,
        req: UpdateStatusRequest,
    ) -> ServiceResult<Order> {
        let order = self.load(order_id).await?;

        match actor.role {
            Role::Admin => {}
            Role::Artisan if order.has_artisan(&actor.id) => {}
            Role::Artisan => return Err(AppError::new(ErrorCode::NotOrderParticipant).into()),
            Role::Customer => return Err(AppError::new(ErrorCode::ArtisanRequired).into()),
        }

        let from = order.status;
        let to = req.status;
        if !from.can_transition_to(to) {
            return Err(invalid_transition(from, to).into());
        }

        let mut next = order;
        let effect = match to {
            OrderStatus::Shipped => {
                let tracking = req.tracking_number.ok_or_else(|| {
                    AppError::invalid_field(
                        "tracking_number",
                        "Tracking number is required when shipping",
                    )
                })?;
                next.tracking_number = Some(tracking);
                TransitionEffect::None
            }
            OrderStatus::Cancelled => {
                next.cancellation_reason = req.reason;
                TransitionEffect::Restock
            }
            OrderStatus::Delivered => TransitionEffect::CreditArtisans,
            _ => TransitionEffect::None,
        };
        next.apply_status(to, now_millis());

        self.store
            .commit_transition(&next, from, effect)
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => invalid_transition(from, to).into(),
                other => ServiceError::from(other),
            })?;

        tracing::info!(
            order_id = %next.id,
            actor_id = %actor.id,
            from = %from,
            to = %to,
            "Order status changed"
        );

        self.notifier
            .dispatch(vec![notify::status_changed(&next, from)])
            .await;
        Ok(next)
    }

    /// Cancel as the placing customer
    pub async fn cancel(
        &self,
        customer: &CurrentUser,
        order_id: &str,
        req: CancelOrderRequest,
    ) -> ServiceResult<Order> {
        let order = self.load(order_id).await?;
        if !order.is_customer(&customer.id) {
            return Err(AppError::new(ErrorCode::NotOrderParticipant).into());
        }

        let from = order.status;
        if !from.is_customer_cancellable() {
            return Err(not_cancellable(from).into());
        }

        let mut next = order;
        next.cancellation_reason = req.reason;
        next.apply_status(OrderStatus::Cancelled, now_millis());

        self.store
            .commit_transition(&next, from, TransitionEffect::Restock)
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => not_cancellable(from).into(),
                other => ServiceError::from(other),
            })?;

        tracing::info!(order_id = %next.id, customer_id = %customer.id, "Order cancelled by customer");

        self.notifier
            .dispatch(notify::cancelled_by_customer(&next))
            .await;
        Ok(next)
    }

    /// Review a delivered order once
    pub async fn review(
        &self,
        customer: &CurrentUser,
        order_id: &str,
        req: ReviewOrderRequest,
    ) -> ServiceResult<Order> {
        let order = self.load(order_id).await?;
        if !order.is_customer(&customer.id) {
            return Err(AppError::new(ErrorCode::NotOrderParticipant).into());
        }
        if order.status != OrderStatus::Delivered {
            return Err(AppError::new(ErrorCode::OrderNotDelivered).into());
        }
        if order.review.is_some() {
            return Err(AppError::new(ErrorCode::OrderAlreadyReviewed).into());
        }

        let now = now_millis();
        let mut next = order;
        next.review = Some(OrderReview {
            rating: req.rating,
            comment: req.comment,
            created_at: now,
        });
        next.updated_at = now;

        self.store.commit_review(&next).await.map_err(|e| match e {
            StoreError::Conflict(_) => AppError::new(ErrorCode::OrderAlreadyReviewed).into(),
            other => ServiceError::from(other),
        })?;

        tracing::info!(order_id = %next.id, rating = req.rating, "Order reviewed");

        self.notifier.dispatch(notify::reviewed(&next)).await;
        Ok(next)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Fetch one order as a participant or admin
    pub async fn get(&self, actor: &CurrentUser, order_id: &str) -> ServiceResult<Order> {
        let order = self.load(order_id).await?;
        if actor.is_admin() || order.is_customer(&actor.id) || order.has_artisan(&actor.id) {
            Ok(order)
        } else {
            Err(AppError::new(ErrorCode::NotOrderParticipant).into())
        }
    }

    /// Orders visible to the caller, newest first
    pub async fn list(
        &self,
        actor: &CurrentUser,
        query: &OrderListQuery,
    ) -> ServiceResult<PaginatedResponse<Order>> {
        let scope = match actor.role {
            Role::Customer => OrderScope::Customer(actor.id.clone()),
            Role::Artisan => OrderScope::Artisan(actor.id.clone()),
            Role::Admin => OrderScope::All,
        };
        let page = query.page_params();
        let result = self.store.list_orders(&scope, query.status, page).await?;
        Ok(PaginatedResponse::new(
            result.items,
            page.page,
            page.limit,
            result.total,
        ))
    }
}

fn invalid_transition(from: OrderStatus, to: OrderStatus) -> AppError {
    AppError::with_message(
        ErrorCode::InvalidTransition,
        format!("Cannot move order from {from} to {to}"),
    )
}

fn not_cancellable(status: OrderStatus) -> AppError {
    AppError::with_message(
        ErrorCode::OrderNotCancellable,
        format!("Order cannot be cancelled once {status}"),
    )
}

#[cfg(test)]
mod tests;

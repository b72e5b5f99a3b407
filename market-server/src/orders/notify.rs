//! Order notifications
//!
//! Builders for the notification emitted by each order event, and the
//! post-commit [`Notifier`] that stores them. Delivery failures are logged
//! and never surface to the caller.

use std::sync::Arc;

use serde_json::json;
use shared::models::{Notification, NotificationKind, Order, OrderStatus};

use crate::db::MarketStore;
use crate::util::{new_id, now_millis};

fn build(user_id: &str, kind: NotificationKind, message: String, order: &Order) -> Notification {
    Notification {
        id: new_id(),
        user_id: user_id.to_string(),
        kind,
        message,
        payload: json!({
            "order_id": order.id,
            "order_number": order.order_number,
            "status": order.status,
        }),
        is_read: false,
        created_at: now_millis(),
    }
}

/// One per distinct artisan of a new order
pub fn order_placed(order: &Order) -> Vec<Notification> {
    let shares = order.artisan_shares();
    order
        .artisan_ids
        .iter()
        .map(|artisan_id| {
            let quantity = shares.get(artisan_id).map(|s| s.quantity).unwrap_or(0);
            build(
                artisan_id,
                NotificationKind::OrderPlaced,
                format!(
                    "New order {} includes {} of your item(s)",
                    order.order_number, quantity
                ),
                order,
            )
        })
        .collect()
}

/// To the customer after an artisan or admin moved the order
pub fn status_changed(order: &Order, from: OrderStatus) -> Notification {
    let kind = if order.status == OrderStatus::Cancelled {
        NotificationKind::OrderCancelled
    } else {
        NotificationKind::OrderStatusChanged
    };
    let message = match (order.status, &order.tracking_number) {
        (OrderStatus::Shipped, Some(tracking)) => format!(
            "Order {} has shipped (tracking {})",
            order.order_number, tracking
        ),
        (OrderStatus::Cancelled, _) => format!("Order {} was cancelled by the seller", order.order_number),
        (to, _) => format!("Order {} moved from {} to {}", order.order_number, from, to),
    };
    build(&order.customer_id, kind, message, order)
}

/// To every artisan after the customer cancelled
pub fn cancelled_by_customer(order: &Order) -> Vec<Notification> {
    order
        .artisan_ids
        .iter()
        .map(|artisan_id| {
            build(
                artisan_id,
                NotificationKind::OrderCancelled,
                format!("Order {} was cancelled by the customer", order.order_number),
                order,
            )
        })
        .collect()
}

/// To every artisan after the customer reviewed
pub fn reviewed(order: &Order) -> Vec<Notification> {
    let rating = order.review.as_ref().map(|r| r.rating).unwrap_or_default();
    order
        .artisan_ids
        .iter()
        .map(|artisan_id| {
            let mut n = build(
                artisan_id,
                NotificationKind::OrderReviewed,
                format!("Order {} received a {}-star review", order.order_number, rating),
                order,
            );
            n.payload["rating"] = json!(rating);
            n
        })
        .collect()
}

/// Post-commit notification sink
#[derive(Clone)]
pub struct Notifier {
    store: Arc<dyn MarketStore>,
}

impl Notifier {
    pub fn new(store: Arc<dyn MarketStore>) -> Self {
        Self { store }
    }

    /// Store a batch; failures are logged and swallowed
    pub async fn dispatch(&self, batch: Vec<Notification>) {
        if batch.is_empty() {
            return;
        }
        let count = batch.len();
        if let Err(e) = self.store.insert_notifications(&batch).await {
            tracing::error!(error = %e, count, "Failed to store notifications");
        } else {
            tracing::debug!(count, "Notifications stored");
        }
    }
}

//! Order Model
//!
//! Orders carry snapshotted line items and move through a fixed status
//! graph:
//!
//! ```text
//! pending -> confirmed | cancelled
//! confirmed -> processing | cancelled
//! processing -> shipped | cancelled
//! shipped -> delivered
//! ```
//!
//! `delivered` and `cancelled` are terminal.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::request::{PageParams, default_page, trimmed, trimmed_opt};

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Statuses reachable in one step
    pub fn next_statuses(&self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Pending => &[Confirmed, Cancelled],
            Confirmed => &[Processing, Cancelled],
            Processing => &[Shipped, Cancelled],
            Shipped => &[Delivered],
            Delivered | Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        self.next_statuses().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        self.next_statuses().is_empty()
    }

    /// Whether the placing customer may still cancel
    pub fn is_customer_cancellable(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    /// Parse from database string value (lowercase)
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "processing" => Some(Self::Processing),
            "shipped" => Some(Self::Shipped),
            "delivered" => Some(Self::Delivered),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Database string representation (lowercase)
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db())
    }
}

/// Payment method chosen at checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    CashOnDelivery,
    BankTransfer,
    Upi,
}

impl PaymentMethod {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "card" => Some(Self::Card),
            "cash_on_delivery" => Some(Self::CashOnDelivery),
            "bank_transfer" => Some(Self::BankTransfer),
            "upi" => Some(Self::Upi),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::CashOnDelivery => "cash_on_delivery",
            Self::BankTransfer => "bank_transfer",
            Self::Upi => "upi",
        }
    }
}

/// Delivery address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ShippingAddress {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 100, message = "Full name is required"))]
    pub full_name: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 200, message = "Street is required"))]
    pub street: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 100, message = "City is required"))]
    pub city: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 100, message = "State is required"))]
    pub state: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 3, max = 12, message = "Postal code must be 3-12 characters"))]
    pub postal_code: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 2, max = 56, message = "Country is required"))]
    pub country: String,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 30, message = "Phone must be at most 30 characters"))]
    pub phone: Option<String>,
}

/// Snapshot of one product inside an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: String,
    pub artisan_id: String,
    pub name: String,
    pub thumbnail: Option<String>,
    /// Unit price at order time
    pub price: Decimal,
    pub quantity: i32,
    /// `price * quantity`, frozen at creation
    pub line_total: Decimal,
}

/// Customer review attached to a delivered order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReview {
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: i64,
}

/// Per-artisan aggregate of an order's items
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtisanShare {
    pub quantity: i64,
    pub revenue: Decimal,
}

/// Order entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    /// Human-readable number, e.g. `ORD-LX3K9Q2A-7F3KQZ`
    pub order_number: String,
    pub customer_id: String,
    pub items: Vec<LineItem>,
    pub total_amount: Decimal,
    pub currency: String,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    /// Distinct artisans owning at least one line item (sorted)
    pub artisan_ids: Vec<String>,
    pub tracking_number: Option<String>,
    pub cancellation_reason: Option<String>,
    pub notes: Option<String>,
    pub review: Option<OrderReview>,
    pub created_at: i64,
    pub confirmed_at: Option<i64>,
    pub processing_at: Option<i64>,
    pub shipped_at: Option<i64>,
    pub delivered_at: Option<i64>,
    pub cancelled_at: Option<i64>,
    pub updated_at: i64,
}

impl Order {
    /// Distinct, sorted artisan ids of a set of line items
    pub fn collect_artisan_ids(items: &[LineItem]) -> Vec<String> {
        let mut ids: Vec<String> = items.iter().map(|i| i.artisan_id.clone()).collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Sum of line totals
    pub fn sum_line_totals(items: &[LineItem]) -> Decimal {
        items.iter().map(|i| i.line_total).sum()
    }

    pub fn has_artisan(&self, user_id: &str) -> bool {
        self.artisan_ids.iter().any(|id| id == user_id)
    }

    pub fn is_customer(&self, user_id: &str) -> bool {
        self.customer_id == user_id
    }

    /// Quantity and revenue per artisan
    pub fn artisan_shares(&self) -> BTreeMap<String, ArtisanShare> {
        let mut shares: BTreeMap<String, ArtisanShare> = BTreeMap::new();
        for item in &self.items {
            let share = shares.entry(item.artisan_id.clone()).or_default();
            share.quantity += item.quantity as i64;
            share.revenue += item.line_total;
        }
        shares
    }

    /// Set the status and stamp its transition time
    pub fn apply_status(&mut self, status: OrderStatus, now: i64) {
        self.status = status;
        self.updated_at = now;
        match status {
            OrderStatus::Pending => {}
            OrderStatus::Confirmed => self.confirmed_at = Some(now),
            OrderStatus::Processing => self.processing_at = Some(now),
            OrderStatus::Shipped => self.shipped_at = Some(now),
            OrderStatus::Delivered => self.delivered_at = Some(now),
            OrderStatus::Cancelled => self.cancelled_at = Some(now),
        }
    }
}

/// Upper bound on one product's quantity in an order, after merging
pub const MAX_LINE_QUANTITY: i32 = 100;

/// One cart entry of a create request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CartItem {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 64, message = "Product id is required"))]
    pub product_id: String,
    #[validate(range(min = 1, max = 100, message = "Quantity must be between 1 and 100"))]
    pub quantity: i32,
}

/// Create order payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(
        length(min = 1, max = 50, message = "Order must contain 1-50 items"),
        nested
    )]
    pub items: Vec<CartItem>,
    #[validate(nested)]
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 500, message = "Notes must be at most 500 characters"))]
    pub notes: Option<String>,
}

impl CreateOrderRequest {
    /// Cart with duplicate product ids merged, first-seen order kept
    pub fn merged_items(&self) -> Vec<CartItem> {
        let mut merged: Vec<CartItem> = Vec::with_capacity(self.items.len());
        for item in &self.items {
            match merged.iter_mut().find(|m| m.product_id == item.product_id) {
                Some(existing) => existing.quantity += item.quantity,
                None => merged.push(item.clone()),
            }
        }
        merged
    }
}

/// Status update payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 100, message = "Tracking number must be at most 100 characters"))]
    pub tracking_number: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 500, message = "Reason must be at most 500 characters"))]
    pub reason: Option<String>,
}

/// Customer cancellation payload
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CancelOrderRequest {
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 500, message = "Reason must be at most 500 characters"))]
    pub reason: Option<String>,
}

/// Review payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReviewOrderRequest {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: u8,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 2000, message = "Comment must be at most 2000 characters"))]
    pub comment: Option<String>,
}

/// Order listing query
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OrderListQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: u32,
    #[serde(default = "default_order_limit")]
    #[validate(range(min = 1, max = 50, message = "Limit must be between 1 and 50"))]
    pub limit: u32,
    pub status: Option<OrderStatus>,
}

fn default_order_limit() -> u32 {
    10
}

impl OrderListQuery {
    pub fn page_params(&self) -> PageParams {
        PageParams::new(self.page, self.limit)
    }
}

//! Notification Model

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::request::{PageParams, default_page};

/// What triggered the notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    OrderPlaced,
    OrderStatusChanged,
    OrderCancelled,
    OrderReviewed,
}

impl NotificationKind {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "order_placed" => Some(Self::OrderPlaced),
            "order_status_changed" => Some(Self::OrderStatusChanged),
            "order_cancelled" => Some(Self::OrderCancelled),
            "order_reviewed" => Some(Self::OrderReviewed),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::OrderPlaced => "order_placed",
            Self::OrderStatusChanged => "order_status_changed",
            Self::OrderCancelled => "order_cancelled",
            Self::OrderReviewed => "order_reviewed",
        }
    }
}

/// In-app notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    /// Recipient
    pub user_id: String,
    pub kind: NotificationKind,
    pub message: String,
    pub payload: serde_json::Value,
    pub is_read: bool,
    pub created_at: i64,
}

/// Notification listing query
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NotificationQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: u32,
    #[serde(default = "default_notification_limit")]
    #[validate(range(min = 1, max = 50, message = "Limit must be between 1 and 50"))]
    pub limit: u32,
    #[serde(default)]
    pub unread_only: bool,
}

fn default_notification_limit() -> u32 {
    20
}

impl NotificationQuery {
    pub fn page_params(&self) -> PageParams {
        PageParams::new(self.page, self.limit)
    }
}

/// Listing result with the unread badge count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationList {
    pub notifications: Vec<Notification>,
    pub unread_count: u64,
    pub pagination: crate::response::Pagination,
}

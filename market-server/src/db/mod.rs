//! Persistence layer
//!
//! [`MarketStore`] is the single seam between the service and its storage.
//! Every method that touches more than one record is atomic: the PostgreSQL
//! store runs it inside one transaction, the in-memory store under one lock
//! acquisition.

pub mod memory;
pub mod pg;

use async_trait::async_trait;
use shared::models::{
    Notification, Order, OrderStatus, Product, ProductQuery, ProductUpdate, Role, User,
};
use shared::request::PageParams;
use thiserror::Error;

pub use memory::MemoryStore;
pub use pg::PgStore;

/// Storage failure taxonomy
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    /// Unique key violation or a lost compare-and-set
    #[error("conflict: {0}")]
    Conflict(String),

    /// A conditional stock decrement matched no row
    #[error("insufficient stock for product {product_id}")]
    InsufficientStock { product_id: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Which orders a listing may see
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderScope {
    Customer(String),
    Artisan(String),
    All,
}

impl OrderScope {
    pub fn admits(&self, order: &Order) -> bool {
        match self {
            Self::Customer(id) => order.is_customer(id),
            Self::Artisan(id) => order.has_artisan(id),
            Self::All => true,
        }
    }
}

/// Side effect committed together with a status change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionEffect {
    None,
    /// Return each item's quantity to stock and take it off the sales count
    Restock,
    /// Add each artisan's quantity and line-total sum to their profile
    CreditArtisans,
}

/// One page of records plus the unpaged total
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

#[async_trait]
pub trait MarketStore: Send + Sync {
    // ── Users ──

    /// Insert a new user; `Conflict` if the email is taken
    async fn insert_user(&self, user: &User) -> StoreResult<()>;
    async fn find_user(&self, id: &str) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Overwrite the mutable columns of an existing user
    async fn update_user(&self, user: &User) -> StoreResult<()>;
    async fn touch_last_seen(&self, user_id: &str, now: i64) -> StoreResult<()>;
    async fn list_users(&self, role: Option<Role>, page: PageParams) -> StoreResult<Page<User>>;

    // ── Products ──

    async fn insert_product(&self, product: &Product) -> StoreResult<()>;
    async fn find_product(&self, id: &str) -> StoreResult<Option<Product>>;
    /// Write only the fields `patch` sets and return the stored product.
    /// Stock reserved by orders in the meantime is kept unless the patch
    /// sets `stock_quantity`.
    async fn update_product(
        &self,
        id: &str,
        patch: &ProductUpdate,
        now: i64,
    ) -> StoreResult<Product>;
    async fn increment_views(&self, product_id: &str) -> StoreResult<()>;
    async fn list_products(&self, query: &ProductQuery) -> StoreResult<Page<Product>>;

    // ── Orders ──

    /// Insert the order and, per item, decrement stock and raise the sales
    /// count only where `stock_quantity >= quantity`. Any miss rolls the
    /// whole batch back with `InsufficientStock`.
    async fn place_order(&self, order: &Order) -> StoreResult<()>;
    async fn find_order(&self, id: &str) -> StoreResult<Option<Order>>;
    async fn list_orders(
        &self,
        scope: &OrderScope,
        status: Option<OrderStatus>,
        page: PageParams,
    ) -> StoreResult<Page<Order>>;
    /// Persist `order`'s status columns if the stored status still equals
    /// `expected`, applying `effect` in the same batch. `Conflict` when the
    /// stored status moved.
    async fn commit_transition(
        &self,
        order: &Order,
        expected: OrderStatus,
        effect: TransitionEffect,
    ) -> StoreResult<()>;
    /// Store `order.review` if none exists yet and fold its rating into each
    /// distinct product of the order. `Conflict` when already reviewed.
    async fn commit_review(&self, order: &Order) -> StoreResult<()>;

    // ── Notifications ──

    async fn insert_notifications(&self, batch: &[Notification]) -> StoreResult<()>;
    async fn list_notifications(
        &self,
        user_id: &str,
        unread_only: bool,
        page: PageParams,
    ) -> StoreResult<Page<Notification>>;
    async fn count_unread(&self, user_id: &str) -> StoreResult<u64>;
    /// Returns `false` if no notification with that id belongs to the user
    async fn mark_read(&self, user_id: &str, id: &str) -> StoreResult<bool>;
    /// Returns the number of notifications flipped
    async fn mark_all_read(&self, user_id: &str) -> StoreResult<u64>;
}

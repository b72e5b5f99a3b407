//! PostgreSQL store
//!
//! Query functions live per table and take `&PgPool` (or a transaction);
//! [`PgStore`] wires them into [`MarketStore`].

pub mod notifications;
pub mod orders;
pub mod products;
pub mod users;

use async_trait::async_trait;
use shared::models::{
    Notification, Order, OrderStatus, Product, ProductQuery, ProductUpdate, Role, User,
};
use shared::request::PageParams;
use sqlx::PgPool;

use super::{MarketStore, OrderScope, Page, StoreError, StoreResult, TransitionEffect};

/// Postgres unique_violation
const UNIQUE_VIOLATION: &str = "23505";

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(e.to_string())
            }
            sqlx::Error::Database(ref db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                StoreError::Conflict(db.message().to_string())
            }
            other => StoreError::Backend(other.to_string()),
        }
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and run embedded migrations
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPool::connect(database_url).await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl MarketStore for PgStore {
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        users::insert(&self.pool, user).await
    }

    async fn find_user(&self, id: &str) -> StoreResult<Option<User>> {
        users::find_by_id(&self.pool, id).await
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        users::find_by_email(&self.pool, email).await
    }

    async fn update_user(&self, user: &User) -> StoreResult<()> {
        users::update(&self.pool, user).await
    }

    async fn touch_last_seen(&self, user_id: &str, now: i64) -> StoreResult<()> {
        users::touch_last_seen(&self.pool, user_id, now).await
    }

    async fn list_users(&self, role: Option<Role>, page: PageParams) -> StoreResult<Page<User>> {
        users::list(&self.pool, role, page).await
    }

    async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        products::insert(&self.pool, product).await
    }

    async fn find_product(&self, id: &str) -> StoreResult<Option<Product>> {
        products::find_by_id(&self.pool, id).await
    }

    async fn update_product(
        &self,
        id: &str,
        patch: &ProductUpdate,
        now: i64,
    ) -> StoreResult<Product> {
        products::update(&self.pool, id, patch, now).await
    }

    async fn increment_views(&self, product_id: &str) -> StoreResult<()> {
        products::increment_views(&self.pool, product_id).await
    }

    async fn list_products(&self, query: &ProductQuery) -> StoreResult<Page<Product>> {
        products::list(&self.pool, query).await
    }

    async fn place_order(&self, order: &Order) -> StoreResult<()> {
        orders::place(&self.pool, order).await
    }

    async fn find_order(&self, id: &str) -> StoreResult<Option<Order>> {
        orders::find_by_id(&self.pool, id).await
    }

    async fn list_orders(
        &self,
        scope: &OrderScope,
        status: Option<OrderStatus>,
        page: PageParams,
    ) -> StoreResult<Page<Order>> {
        orders::list(&self.pool, scope, status, page).await
    }

    async fn commit_transition(
        &self,
        order: &Order,
        expected: OrderStatus,
        effect: TransitionEffect,
    ) -> StoreResult<()> {
        orders::commit_transition(&self.pool, order, expected, effect).await
    }

    async fn commit_review(&self, order: &Order) -> StoreResult<()> {
        orders::commit_review(&self.pool, order).await
    }

    async fn insert_notifications(&self, batch: &[Notification]) -> StoreResult<()> {
        notifications::insert_batch(&self.pool, batch).await
    }

    async fn list_notifications(
        &self,
        user_id: &str,
        unread_only: bool,
        page: PageParams,
    ) -> StoreResult<Page<Notification>> {
        notifications::list(&self.pool, user_id, unread_only, page).await
    }

    async fn count_unread(&self, user_id: &str) -> StoreResult<u64> {
        notifications::count_unread(&self.pool, user_id).await
    }

    async fn mark_read(&self, user_id: &str, id: &str) -> StoreResult<bool> {
        notifications::mark_read(&self.pool, user_id, id).await
    }

    async fn mark_all_read(&self, user_id: &str) -> StoreResult<u64> {
        notifications::mark_all_read(&self.pool, user_id).await
    }
}

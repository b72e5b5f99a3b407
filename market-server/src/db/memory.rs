//! In-memory store
//!
//! Backs `STORE_BACKEND=memory` and the test suites. All state sits behind
//! one mutex so every batch is applied under a single lock acquisition.

use std::collections::HashMap;

use async_trait::async_trait;
use shared::models::{
    Notification, Order, OrderStatus, Product, ProductQuery, ProductUpdate, Role, User,
};
use shared::request::PageParams;
use tokio::sync::Mutex;

use super::{MarketStore, OrderScope, Page, StoreError, StoreResult, TransitionEffect};

#[derive(Default)]
struct Inner {
    users: HashMap<String, User>,
    products: Vec<Product>,
    orders: Vec<Order>,
    notifications: Vec<Notification>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    #[cfg(test)]
    fail_notifications: std::sync::atomic::AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every notification insert fail
    #[cfg(test)]
    pub fn fail_notifications(&self, fail: bool) {
        self.fail_notifications
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    #[cfg(test)]
    fn notifications_offline(&self) -> bool {
        self.fail_notifications
            .load(std::sync::atomic::Ordering::SeqCst)
    }

    #[cfg(not(test))]
    fn notifications_offline(&self) -> bool {
        false
    }
}

/// Slice one page out of an already ordered list
fn paginate<T: Clone>(items: Vec<&T>, page: PageParams) -> Page<T> {
    let total = items.len() as u64;
    let items = items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit as usize)
        .cloned()
        .collect();
    Page { items, total }
}

#[async_trait]
impl MarketStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!("email {} exists", user.email)));
        }
        inner.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn find_user(&self, id: &str) -> StoreResult<Option<User>> {
        Ok(self.inner.lock().await.users.get(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, user: &User) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        let slot = inner.users.get_mut(&user.id).ok_or(StoreError::NotFound)?;
        // Sales aggregates and last_seen_at belong to other writers
        slot.display_name = user.display_name.clone();
        slot.phone = user.phone.clone();
        slot.bio = user.bio.clone();
        slot.location = user.location.clone();
        slot.avatar_url = user.avatar_url.clone();
        slot.is_active = user.is_active;
        slot.tokens_valid_after = user.tokens_valid_after;
        slot.updated_at = user.updated_at;
        if let (Some(stored), Some(incoming)) = (slot.artisan.as_mut(), user.artisan.as_ref()) {
            stored.skills = incoming.skills.clone();
        }
        Ok(())
    }

    async fn touch_last_seen(&self, user_id: &str, now: i64) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        let user = inner.users.get_mut(user_id).ok_or(StoreError::NotFound)?;
        user.last_seen_at = Some(now);
        Ok(())
    }

    async fn list_users(&self, role: Option<Role>, page: PageParams) -> StoreResult<Page<User>> {
        let inner = self.inner.lock().await;
        let mut users: Vec<&User> = inner
            .users
            .values()
            .filter(|u| role.is_none_or(|r| u.role == r))
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(paginate(users, page))
    }

    async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        if inner.products.iter().any(|p| p.id == product.id) {
            return Err(StoreError::Conflict(format!("product {} exists", product.id)));
        }
        inner.products.push(product.clone());
        Ok(())
    }

    async fn find_product(&self, id: &str) -> StoreResult<Option<Product>> {
        let inner = self.inner.lock().await;
        Ok(inner.products.iter().find(|p| p.id == id).cloned())
    }

    async fn update_product(
        &self,
        id: &str,
        patch: &ProductUpdate,
        now: i64,
    ) -> StoreResult<Product> {
        let mut inner = self.inner.lock().await;
        let slot = inner
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StoreError::NotFound)?;
        patch.apply(slot);
        slot.updated_at = now;
        Ok(slot.clone())
    }

    async fn increment_views(&self, product_id: &str) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        if let Some(p) = inner.products.iter_mut().find(|p| p.id == product_id) {
            p.views += 1;
        }
        Ok(())
    }

    async fn list_products(&self, query: &ProductQuery) -> StoreResult<Page<Product>> {
        let inner = self.inner.lock().await;
        let matching: Vec<&Product> = inner
            .products
            .iter()
            .rev()
            .filter(|p| query.matches(p))
            .collect();
        Ok(paginate(matching, query.page_params()))
    }

    async fn place_order(&self, order: &Order) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;

        // Check every decrement before applying any
        for item in &order.items {
            let available = inner
                .products
                .iter()
                .find(|p| p.id == item.product_id)
                .map(|p| p.stock_quantity)
                .ok_or(StoreError::NotFound)?;
            if available < item.quantity {
                return Err(StoreError::InsufficientStock {
                    product_id: item.product_id.clone(),
                });
            }
        }

        for item in &order.items {
            if let Some(p) = inner.products.iter_mut().find(|p| p.id == item.product_id) {
                p.stock_quantity -= item.quantity;
                p.sales_count += item.quantity as i64;
                p.updated_at = order.created_at;
            }
        }
        inner.orders.push(order.clone());
        Ok(())
    }

    async fn find_order(&self, id: &str) -> StoreResult<Option<Order>> {
        let inner = self.inner.lock().await;
        Ok(inner.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn list_orders(
        &self,
        scope: &OrderScope,
        status: Option<OrderStatus>,
        page: PageParams,
    ) -> StoreResult<Page<Order>> {
        let inner = self.inner.lock().await;
        let matching: Vec<&Order> = inner
            .orders
            .iter()
            .rev()
            .filter(|o| scope.admits(o))
            .filter(|o| status.is_none_or(|s| o.status == s))
            .collect();
        Ok(paginate(matching, page))
    }

    async fn commit_transition(
        &self,
        order: &Order,
        expected: OrderStatus,
        effect: TransitionEffect,
    ) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        let Inner {
            users,
            products,
            orders,
            ..
        } = &mut *inner;

        let stored = orders
            .iter_mut()
            .find(|o| o.id == order.id)
            .ok_or(StoreError::NotFound)?;
        if stored.status != expected {
            return Err(StoreError::Conflict(format!(
                "order {} is {}, expected {}",
                order.id, stored.status, expected
            )));
        }

        match effect {
            TransitionEffect::None => {}
            TransitionEffect::Restock => {
                for item in &order.items {
                    if let Some(p) = products.iter_mut().find(|p| p.id == item.product_id) {
                        p.stock_quantity += item.quantity;
                        p.sales_count -= item.quantity as i64;
                        p.updated_at = order.updated_at;
                    }
                }
            }
            TransitionEffect::CreditArtisans => {
                for (artisan_id, share) in order.artisan_shares() {
                    if let Some(profile) = users
                        .get_mut(&artisan_id)
                        .and_then(|u| u.artisan.as_mut())
                    {
                        profile.total_sales += share.quantity;
                        profile.total_revenue += share.revenue;
                    }
                }
            }
        }

        *stored = order.clone();
        Ok(())
    }

    async fn commit_review(&self, order: &Order) -> StoreResult<()> {
        let Some(review) = &order.review else {
            return Err(StoreError::Backend("order carries no review".into()));
        };

        let mut inner = self.inner.lock().await;
        let Inner {
            products, orders, ..
        } = &mut *inner;

        let stored = orders
            .iter_mut()
            .find(|o| o.id == order.id)
            .ok_or(StoreError::NotFound)?;
        if stored.review.is_some() {
            return Err(StoreError::Conflict(format!("order {} already reviewed", order.id)));
        }
        stored.review = Some(review.clone());
        stored.updated_at = order.updated_at;

        let mut seen: Vec<&str> = Vec::new();
        for item in &order.items {
            if seen.contains(&item.product_id.as_str()) {
                continue;
            }
            seen.push(&item.product_id);
            if let Some(p) = products.iter_mut().find(|p| p.id == item.product_id) {
                p.add_rating(review.rating);
            }
        }
        Ok(())
    }

    async fn insert_notifications(&self, batch: &[Notification]) -> StoreResult<()> {
        if self.notifications_offline() {
            return Err(StoreError::Unavailable("notification sink offline".into()));
        }

        let mut inner = self.inner.lock().await;
        inner.notifications.extend_from_slice(batch);
        Ok(())
    }

    async fn list_notifications(
        &self,
        user_id: &str,
        unread_only: bool,
        page: PageParams,
    ) -> StoreResult<Page<Notification>> {
        let inner = self.inner.lock().await;
        let matching: Vec<&Notification> = inner
            .notifications
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.is_read))
            .collect();
        Ok(paginate(matching, page))
    }

    async fn count_unread(&self, user_id: &str) -> StoreResult<u64> {
        let inner = self.inner.lock().await;
        Ok(inner
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as u64)
    }

    async fn mark_read(&self, user_id: &str, id: &str) -> StoreResult<bool> {
        let mut inner = self.inner.lock().await;
        match inner
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
        {
            Some(n) => {
                n.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_read(&self, user_id: &str) -> StoreResult<u64> {
        let mut inner = self.inner.lock().await;
        let mut flipped = 0;
        for n in inner
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.is_read)
        {
            n.is_read = true;
            flipped += 1;
        }
        Ok(flipped)
    }
}

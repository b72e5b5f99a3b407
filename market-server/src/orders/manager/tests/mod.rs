use super::*;
use crate::db::MemoryStore;
use shared::models::{
    ArtisanProfile, CartItem, Notification, NotificationKind, PaymentMethod, Product,
    ProductUpdate, ShippingAddress, User,
};
use shared::request::PageParams;

mod test_queries;

// ========================================================================
// Fixture
// ========================================================================

struct Fixture {
    store: Arc<MemoryStore>,
    manager: OrderManager,
    customer: CurrentUser,
    other_customer: CurrentUser,
    artisan_a: CurrentUser,
    artisan_b: CurrentUser,
    admin: CurrentUser,
}

fn user(id: &str, role: Role) -> User {
    User {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        role,
        display_name: id.to_string(),
        phone: None,
        bio: None,
        location: None,
        avatar_url: None,
        is_active: true,
        artisan: (role == Role::Artisan).then(ArtisanProfile::default),
        last_seen_at: None,
        created_at: 0,
        updated_at: 0,
        password_hash: String::new(),
        tokens_valid_after: 0,
    }
}

async fn create_test_fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let mut identities = Vec::new();
    for (id, role) in [
        ("cust-1", Role::Customer),
        ("cust-2", Role::Customer),
        ("art-a", Role::Artisan),
        ("art-b", Role::Artisan),
        ("admin-1", Role::Admin),
    ] {
        let u = user(id, role);
        store.insert_user(&u).await.unwrap();
        identities.push(CurrentUser::from(&u));
    }
    let mut it = identities.into_iter();
    Fixture {
        manager: OrderManager::new(store.clone()),
        store,
        customer: it.next().unwrap(),
        other_customer: it.next().unwrap(),
        artisan_a: it.next().unwrap(),
        artisan_b: it.next().unwrap(),
        admin: it.next().unwrap(),
    }
}

impl Fixture {
    async fn add_product(&self, id: &str, artisan_id: &str, price: i64, stock: i32) {
        let product = Product {
            id: id.to_string(),
            artisan_id: artisan_id.to_string(),
            name: format!("Product {id}"),
            description: String::new(),
            category: "Pottery".to_string(),
            price: Decimal::from(price),
            currency: "USD".to_string(),
            stock_quantity: stock,
            images: vec![format!("https://img.example.com/{id}.jpg")],
            tags: vec![],
            views: 0,
            sales_count: 0,
            rating: 0.0,
            review_count: 0,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        };
        self.store.insert_product(&product).await.unwrap();
    }

    async fn product(&self, id: &str) -> Product {
        self.store.find_product(id).await.unwrap().unwrap()
    }

    async fn stock(&self, id: &str) -> i32 {
        self.product(id).await.stock_quantity
    }

    async fn stored_order(&self, id: &str) -> Order {
        self.store.find_order(id).await.unwrap().unwrap()
    }

    async fn artisan_profile(&self, id: &str) -> ArtisanProfile {
        self.store
            .find_user(id)
            .await
            .unwrap()
            .unwrap()
            .artisan
            .unwrap()
    }

    async fn notifications_for(&self, user_id: &str) -> Vec<Notification> {
        self.store
            .list_notifications(user_id, false, PageParams::new(1, 50))
            .await
            .unwrap()
            .items
    }

    /// Standard two-artisan order: A x2 @100 (art-a), B x1 @50 (art-b)
    async fn place_standard_order(&self) -> Order {
        self.add_product("A", "art-a", 100, 10).await;
        self.add_product("B", "art-b", 50, 5).await;
        self.manager
            .create_order(&self.customer, cart(&[("A", 2), ("B", 1)]))
            .await
            .unwrap()
    }

    async fn advance(&self, order_id: &str, actor: &CurrentUser, to: OrderStatus) -> Order {
        let tracking = (to == OrderStatus::Shipped).then(|| "TRACK-123".to_string());
        self.manager
            .transition(actor, order_id, status_req(to, tracking))
            .await
            .unwrap()
    }

    /// Walk an order to delivered through artisan A
    async fn deliver(&self, order_id: &str) -> Order {
        for to in [
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            self.advance(order_id, &self.artisan_a, to).await;
        }
        self.stored_order(order_id).await
    }
}

// ========================================================================
// Request helpers
// ========================================================================

fn address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Ana Customer".to_string(),
        street: "1 Main St".to_string(),
        city: "Springfield".to_string(),
        state: "IL".to_string(),
        postal_code: "62701".to_string(),
        country: "US".to_string(),
        phone: None,
    }
}

fn cart(items: &[(&str, i32)]) -> CreateOrderRequest {
    CreateOrderRequest {
        items: items
            .iter()
            .map(|(id, qty)| CartItem {
                product_id: id.to_string(),
                quantity: *qty,
            })
            .collect(),
        shipping_address: address(),
        payment_method: PaymentMethod::Card,
        notes: None,
    }
}

fn status_req(status: OrderStatus, tracking_number: Option<String>) -> UpdateStatusRequest {
    UpdateStatusRequest {
        status,
        tracking_number,
        reason: None,
    }
}

fn app_error(err: ServiceError) -> AppError {
    AppError::from(err)
}

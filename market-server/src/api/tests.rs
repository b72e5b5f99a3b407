use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::body::Body;
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use shared::models::{ArtisanProfile, Role, User};
use tower::ServiceExt;

use super::build_app;
use crate::auth::identity::{CurrentUser, IdentityError, IdentityProvider};
use crate::auth::jwt::IssuedToken;
use crate::auth::jwt::tests::{expired_token, test_service};
use crate::config::{Config, StoreBackend};
use crate::db::{MarketStore, MemoryStore};
use crate::state::AppState;

// ========================================================================
// Harness
// ========================================================================

struct TestApp {
    state: AppState,
    store: Arc<MemoryStore>,
    app: axum::Router,
}

fn test_config() -> Config {
    Config {
        database_url: None,
        http_port: 0,
        environment: "test".into(),
        jwt_secret: "unused-because-the-state-is-prebuilt".into(),
        jwt_expiration_minutes: 60,
        jwt_issuer: "market-server".into(),
        jwt_audience: "market-clients".into(),
        cors_origins: vec![],
        expose_internal_errors: false,
        store_backend: StoreBackend::Memory,
        log_json: false,
    }
}

fn create_test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::with_parts(store.clone(), test_service());
    TestApp {
        app: build_app(state.clone(), &test_config()),
        state,
        store,
    }
}

impl TestApp {
    /// Insert an active user directly and return a token for it
    async fn seed_user(&self, id: &str, role: Role) -> String {
        let user = User {
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
        };
        self.store.insert_user(&user).await.unwrap();
        self.state.identity.issue(&user).unwrap().token
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create_product(&self, token: &str, name: &str, price: f64, stock: i32) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/products",
                Some(token),
                Some(json!({
                    "name": name,
                    "category": "Pottery",
                    "price": price,
                    "stock_quantity": stock,
                    "images": [format!("https://img.example.com/{name}.jpg")]
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["data"]["id"].as_str().unwrap().to_string()
    }
}

fn order_body(items: Value) -> Value {
    json!({
        "items": items,
        "shipping_address": {
            "full_name": "Ana Customer",
            "street": "1 Main St",
            "city": "Springfield",
            "state": "IL",
            "postal_code": "62701",
            "country": "US"
        },
        "payment_method": "card"
    })
}

fn decimal(value: &Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}

// ========================================================================
// Identity resolution
// ========================================================================

#[tokio::test]
async fn test_health_is_public() {
    let t = create_test_app();
    let (status, body) = t.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "market-server");
}

#[tokio::test]
async fn test_missing_token_is_401() {
    let t = create_test_app();
    let (status, body) = t.send(Method::GET, "/api/orders/list", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "AuthenticationError");
    assert_eq!(body["code"], 1001);
}

#[tokio::test]
async fn test_non_bearer_scheme_is_401() {
    let t = create_test_app();
    let request = Request::builder()
        .uri("/api/users/me")
        .header(http::header::AUTHORIZATION, "Basic dXNlcjpwdw==")
        .body(Body::empty())
        .unwrap();
    let response = t.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let t = create_test_app();
    t.seed_user("cust-1", Role::Customer).await;
    let token = expired_token(&test_service(), "cust-1", Role::Customer);

    let (status, body) = t.send(Method::GET, "/api/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1003);

    // the profile handler never ran
    let user = t.store.find_user("cust-1").await.unwrap().unwrap();
    assert!(user.last_seen_at.is_none());
}

#[tokio::test]
async fn test_garbage_token_is_invalid() {
    let t = create_test_app();
    let (status, body) = t
        .send(Method::GET, "/api/users/me", Some("not.a.jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1004);
}

#[tokio::test]
async fn test_token_for_deleted_record_is_404() {
    let t = create_test_app();
    let ghost = User {
        id: "ghost".into(),
        email: "ghost@example.com".into(),
        role: Role::Customer,
        display_name: "Ghost".into(),
        phone: None,
        bio: None,
        location: None,
        avatar_url: None,
        is_active: true,
        artisan: None,
        last_seen_at: None,
        created_at: 0,
        updated_at: 0,
        password_hash: String::new(),
        tokens_valid_after: 0,
    };
    let token = t.state.identity.issue(&ghost).unwrap().token;

    let (status, body) = t.send(Method::GET, "/api/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 1007);
}

#[tokio::test]
async fn test_me_updates_last_seen() {
    let t = create_test_app();
    let token = t.seed_user("cust-1", Role::Customer).await;

    let (status, body) = t.send(Method::GET, "/api/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["id"], "cust-1");
    assert!(body["data"]["last_seen_at"].is_i64());
    assert!(body["data"].get("password_hash").is_none());
}

// ========================================================================
// Role gates
// ========================================================================

#[tokio::test]
async fn test_role_gate_is_403_but_missing_identity_is_401() {
    let t = create_test_app();
    let customer = t.seed_user("cust-1", Role::Customer).await;
    let product = json!({"name": "Pot", "category": "Pottery", "price": 10});

    let (status, body) = t
        .send(Method::POST, "/api/products", Some(&customer), Some(product.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "AuthorizationError");
    assert_eq!(body["code"], 2002);

    let (status, _) = t
        .send(Method::POST, "/api/products", None, Some(product))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes() {
    let t = create_test_app();
    let artisan = t.seed_user("art-a", Role::Artisan).await;
    let admin = t.seed_user("admin-1", Role::Admin).await;
    t.seed_user("cust-1", Role::Customer).await;

    let (status, body) = t
        .send(Method::GET, "/api/admin/users", Some(&artisan), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 2003);

    let (status, body) = t
        .send(Method::GET, "/api/admin/users?role=customer", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pagination"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["id"], "cust-1");
}

#[tokio::test]
async fn test_deactivated_account_is_locked_out() {
    let t = create_test_app();
    let admin = t.seed_user("admin-1", Role::Admin).await;
    let customer = t.seed_user("cust-1", Role::Customer).await;

    let (status, body) = t
        .send(
            Method::PATCH,
            "/api/admin/users/cust-1/status",
            Some(&admin),
            Some(json!({"is_active": false})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], false);

    let (status, body) = t.send(Method::GET, "/api/users/me", Some(&customer), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1006);
}

// ========================================================================
// Validation
// ========================================================================

#[tokio::test]
async fn test_validation_failure_lists_fields() {
    let t = create_test_app();
    let customer = t.seed_user("cust-1", Role::Customer).await;

    let mut body = order_body(json!([{"product_id": "p1", "quantity": 0}]));
    body["shipping_address"]["city"] = json!("   ");

    let (status, body) = t
        .send(Method::POST, "/api/orders/create", Some(&customer), Some(body))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ValidationError");
    assert_eq!(body["code"], 2);
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["items[0].quantity", "shipping_address.city"]);
}

#[tokio::test]
async fn test_empty_cart_and_bad_json() {
    let t = create_test_app();
    let customer = t.seed_user("cust-1", Role::Customer).await;

    let (status, body) = t
        .send(
            Method::POST,
            "/api/orders/create",
            Some(&customer),
            Some(order_body(json!([]))),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "items");

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/orders/create")
        .header(http::header::AUTHORIZATION, format!("Bearer {customer}"))
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = t.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_query_bounds_are_validated() {
    let t = create_test_app();
    let customer = t.seed_user("cust-1", Role::Customer).await;

    let (status, body) = t
        .send(Method::GET, "/api/orders/list?limit=500", Some(&customer), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "limit");

    let (status, _) = t
        .send(Method::GET, "/api/orders/list?status=lost", Some(&customer), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ========================================================================
// Accounts
// ========================================================================

#[tokio::test]
async fn test_register_login_logout() {
    let t = create_test_app();

    let (status, body) = t
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "email": " Ana@Example.com ",
                "password": "correct horse",
                "display_name": "Ana",
                "role": "artisan"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["user"]["email"], "ana@example.com");
    assert_eq!(body["data"]["user"]["role"], "artisan");
    assert!(body["data"]["user"]["artisan"].is_object());

    let (status, body) = t
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "email": "ana@example.com",
                "password": "another one",
                "display_name": "Ana Again"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 3001);

    let (status, body) = t
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "ana@example.com", "password": "wrong password"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1002);

    let (status, body) = t
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "ANA@example.com", "password": "correct horse"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["token"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["expires_in"], 3600);

    let (status, _) = t
        .send(Method::POST, "/api/auth/logout", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = t.send(Method::GET, "/api/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1005);
}

#[tokio::test]
async fn test_admin_cannot_self_register() {
    let t = create_test_app();
    let (status, body) = t
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "email": "boss@example.com",
                "password": "long enough",
                "display_name": "Boss",
                "role": "admin"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 3003);
}

#[tokio::test]
async fn test_login_is_rate_limited() {
    let t = create_test_app();
    let attempt = json!({"email": "nobody@example.com", "password": "whatever"});

    for _ in 0..5 {
        let (status, _) = t
            .send(Method::POST, "/api/auth/login", None, Some(attempt.clone()))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    let (status, body) = t
        .send(Method::POST, "/api/auth/login", None, Some(attempt))
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "RateLimited");
}

#[tokio::test]
async fn test_skills_are_artisan_only() {
    let t = create_test_app();
    let customer = t.seed_user("cust-1", Role::Customer).await;
    let artisan = t.seed_user("art-a", Role::Artisan).await;
    let patch = json!({"skills": ["glazing", " throwing "], "bio": "Potter"});

    let (status, body) = t
        .send(Method::PATCH, "/api/users/me", Some(&customer), Some(patch.clone()))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "skills");

    let (status, body) = t
        .send(Method::PATCH, "/api/users/me", Some(&artisan), Some(patch))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["artisan"]["skills"], json!(["glazing", "throwing"]));
    assert_eq!(body["data"]["bio"], "Potter");

    let (status, body) = t.send(Method::GET, "/api/users/art-a", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["display_name"], "art-a");
    assert!(body["data"].get("email").is_none());
}

// ========================================================================
// Products
// ========================================================================

#[tokio::test]
async fn test_inactive_products_hidden_from_others() {
    let t = create_test_app();
    let owner = t.seed_user("art-a", Role::Artisan).await;
    let other = t.seed_user("art-b", Role::Artisan).await;
    let id = t.create_product(&owner, "Vase", 40.0, 3).await;

    let (status, body) = t
        .send(Method::DELETE, &format!("/api/products/{id}"), Some(&other), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 2006);

    let (status, _) = t
        .send(Method::DELETE, &format!("/api/products/{id}"), Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/api/products/{id}");
    let (status, _) = t.send(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = t.send(Method::GET, &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], false);

    let (_, body) = t.send(Method::GET, "/api/products", None, None).await;
    assert_eq!(body["data"]["pagination"]["total"], 0);
}

#[tokio::test]
async fn test_browse_filters_and_views() {
    let t = create_test_app();
    let artisan = t.seed_user("art-a", Role::Artisan).await;
    let bowl = t.create_product(&artisan, "Blue Bowl", 25.0, 5).await;
    t.create_product(&artisan, "Red Vase", 80.0, 5).await;

    let (status, body) = t
        .send(Method::GET, "/api/products?search=bowl&max_price=50", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pagination"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["id"], bowl.as_str());

    let (status, _) = t
        .send(Method::GET, "/api/products?min_price=50&max_price=10", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!("/api/products/{bowl}");
    t.send(Method::GET, &uri, None, None).await;
    let (_, body) = t.send(Method::GET, &uri, None, None).await;
    assert_eq!(body["data"]["views"], 2);
}

// ========================================================================
// Order flow
// ========================================================================

#[tokio::test]
async fn test_full_order_flow() {
    let t = create_test_app();
    let customer = t.seed_user("cust-1", Role::Customer).await;
    let artisan_a = t.seed_user("art-a", Role::Artisan).await;
    let artisan_b = t.seed_user("art-b", Role::Artisan).await;
    let a = t.create_product(&artisan_a, "A", 100.0, 10).await;
    let b = t.create_product(&artisan_b, "B", 50.0, 5).await;

    // create
    let (status, body) = t
        .send(
            Method::POST,
            "/api/orders/create",
            Some(&customer),
            Some(order_body(json!([
                {"product_id": a, "quantity": 2},
                {"product_id": b, "quantity": 1}
            ]))),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Order created");
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(decimal(&body["data"]["total_amount"]), Decimal::from(250));
    let order_id = body["data"]["id"].as_str().unwrap().to_string();

    let stock_a = t.store.find_product(&a).await.unwrap().unwrap().stock_quantity;
    assert_eq!(stock_a, 8);

    // artisans can only act on orders they take part in
    let outsider = t.seed_user("art-c", Role::Artisan).await;
    let status_uri = format!("/api/orders/{order_id}/status");
    let (status, _) = t
        .send(
            Method::PATCH,
            &status_uri,
            Some(&outsider),
            Some(json!({"status": "confirmed"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = t
        .send(
            Method::PATCH,
            &status_uri,
            Some(&artisan_a),
            Some(json!({"status": "shipped", "tracking_number": "T1"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "BusinessRuleError");

    for step in [
        json!({"status": "confirmed"}),
        json!({"status": "processing"}),
        json!({"status": "shipped", "tracking_number": "1Z999"}),
        json!({"status": "delivered"}),
    ] {
        let (status, body) = t
            .send(Method::PATCH, &status_uri, Some(&artisan_a), Some(step))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    // both artisans see it in their lists
    let (_, body) = t
        .send(Method::GET, "/api/orders/list", Some(&artisan_b), None)
        .await;
    assert_eq!(body["data"]["pagination"]["total"], 1);

    let profile_b = t.store.find_user("art-b").await.unwrap().unwrap();
    let profile_b = profile_b.artisan.unwrap();
    assert_eq!(profile_b.total_sales, 1);
    assert_eq!(profile_b.total_revenue, Decimal::from(50));

    // review
    let review_uri = format!("/api/orders/{order_id}/review");
    let (status, body) = t
        .send(
            Method::POST,
            &review_uri,
            Some(&customer),
            Some(json!({"rating": 5, "comment": "Beautiful"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["review"]["rating"], 5);

    let (status, body) = t
        .send(
            Method::POST,
            &review_uri,
            Some(&customer),
            Some(json!({"rating": 6})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "rating");

    // customer inbox: one message per transition
    let (status, body) = t
        .send(Method::GET, "/api/notifications", Some(&customer), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["unread_count"], 4);
    let first_id = body["data"]["notifications"][0]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let (status, _) = t
        .send(
            Method::PATCH,
            &format!("/api/notifications/{first_id}/read"),
            Some(&customer),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = t
        .send(
            Method::PATCH,
            &format!("/api/notifications/{first_id}/read"),
            Some(&artisan_a),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 7001);

    let (_, body) = t
        .send(Method::POST, "/api/notifications/read-all", Some(&customer), None)
        .await;
    assert_eq!(body["data"]["updated"], 3);

    let (_, body) = t
        .send(
            Method::GET,
            "/api/notifications?unread_only=true",
            Some(&customer),
            None,
        )
        .await;
    assert_eq!(body["data"]["unread_count"], 0);
    assert_eq!(body["data"]["notifications"], json!([]));
}

#[tokio::test]
async fn test_cancel_without_body() {
    let t = create_test_app();
    let customer = t.seed_user("cust-1", Role::Customer).await;
    let artisan = t.seed_user("art-a", Role::Artisan).await;
    let a = t.create_product(&artisan, "A", 10.0, 3).await;

    let (_, body) = t
        .send(
            Method::POST,
            "/api/orders/create",
            Some(&customer),
            Some(order_body(json!([{"product_id": a, "quantity": 3}]))),
        )
        .await;
    let order_id = body["data"]["id"].as_str().unwrap().to_string();
    let cancel_uri = format!("/api/orders/{order_id}/cancel");

    let (status, body) = t.send(Method::POST, &cancel_uri, Some(&customer), None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "cancelled");

    let (status, body) = t.send(Method::POST, &cancel_uri, Some(&customer), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 4004);

    let stock = t.store.find_product(&a).await.unwrap().unwrap().stock_quantity;
    assert_eq!(stock, 3);
}

#[tokio::test]
async fn test_only_customers_create_orders() {
    let t = create_test_app();
    let artisan = t.seed_user("art-a", Role::Artisan).await;
    let (status, body) = t
        .send(
            Method::POST,
            "/api/orders/create",
            Some(&artisan),
            Some(order_body(json!([{"product_id": "x", "quantity": 1}]))),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 2004);
}

#[tokio::test]
async fn test_sub_cent_price_is_rejected() {
    let t = create_test_app();
    let artisan = t.seed_user("art-a", Role::Artisan).await;
    let (status, body) = t
        .send(
            Method::POST,
            "/api/products",
            Some(&artisan),
            Some(json!({"name": "Pin", "category": "Jewelry", "price": 0.001})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "price");

    let (_, body) = t.send(Method::GET, "/api/products", None, None).await;
    assert_eq!(body["data"]["pagination"]["total"], 0);
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let t = create_test_app();
    let artisan = t.seed_user("art-a", Role::Artisan).await;
    let (status, body) = t
        .send(
            Method::POST,
            "/api/products",
            Some(&artisan),
            Some(json!({
                "name": "Tapestry",
                "category": "Textiles",
                "price": 10,
                "description": "x".repeat(2 * 1024 * 1024)
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "body");
}

#[tokio::test]
async fn test_product_rename_keeps_reserved_stock() {
    let t = create_test_app();
    let customer = t.seed_user("cust-1", Role::Customer).await;
    let artisan = t.seed_user("art-a", Role::Artisan).await;
    let id = t.create_product(&artisan, "Mug", 12.0, 5).await;

    let (status, _) = t
        .send(
            Method::POST,
            "/api/orders/create",
            Some(&customer),
            Some(order_body(json!([{"product_id": id, "quantity": 3}]))),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = t
        .send(
            Method::PATCH,
            &format!("/api/products/{id}"),
            Some(&artisan),
            Some(json!({"name": "Glazed Mug"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["name"], "Glazed Mug");
    assert_eq!(body["data"]["stock_quantity"], 2);
    assert_eq!(body["data"]["sales_count"], 3);
}

/// Forwards to the real provider and counts token resolutions
struct CountingIdentity {
    inner: Arc<dyn IdentityProvider>,
    resolves: AtomicUsize,
}

#[async_trait::async_trait]
impl IdentityProvider for CountingIdentity {
    async fn resolve(&self, token: &str) -> Result<CurrentUser, IdentityError> {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        self.inner.resolve(token).await
    }

    fn issue(&self, user: &User) -> Result<IssuedToken, IdentityError> {
        self.inner.issue(user)
    }
}

#[tokio::test]
async fn test_optional_auth_resolves_a_bad_token_once() {
    let mut t = create_test_app();
    let artisan = t.seed_user("art-a", Role::Artisan).await;
    let id = t.create_product(&artisan, "Bowl", 20.0, 1).await;

    let counting = Arc::new(CountingIdentity {
        inner: t.state.identity.clone(),
        resolves: AtomicUsize::new(0),
    });
    let identity: Arc<dyn IdentityProvider> = counting.clone();
    t.state.identity = identity;
    t.app = build_app(t.state.clone(), &test_config());

    let uri = format!("/api/products/{id}");
    let (status, _) = t.send(Method::GET, &uri, Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(counting.resolves.load(Ordering::SeqCst), 1);

    let (status, _) = t.send(Method::GET, &uri, Some(&artisan), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(counting.resolves.load(Ordering::SeqCst), 2);
}

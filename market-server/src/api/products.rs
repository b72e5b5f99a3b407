//! Product catalog handlers
//!
//! Browsing is open to anonymous callers; inactive products are only
//! visible to their owner and admins. Writes require the owning artisan
//! (or an admin), creation requires the artisan role.

use axum::{
    Router, middleware,
    extract::{Path, State},
    routing::{get, post},
};
use shared::error::{AppError, ErrorCode};
use shared::models::{Product, ProductCreate, ProductQuery, ProductUpdate, Role};
use shared::response::{ApiResponse, PaginatedResponse};

use super::ApiResult;
use crate::auth::{CurrentUser, MaybeUser, optional_auth, require_auth, require_role};
use crate::state::AppState;
use crate::util::{new_id, now_millis};
use crate::validation::{ValidatedJson, ValidatedQuery};

pub fn router(state: &AppState) -> Router<AppState> {
    let create = Router::new()
        .route("/api/products", post(create))
        .route_layer(middleware::from_fn(require_role(Role::Artisan)))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let manage = Router::new()
        .route("/api/products/{id}", axum::routing::patch(update).delete(delete))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let browse = Router::new()
        .route("/api/products", get(list))
        .route("/api/products/{id}", get(get_by_id))
        .route_layer(middleware::from_fn_with_state(state.clone(), optional_auth));

    create.merge(manage).merge(browse)
}

async fn load(state: &AppState, id: &str) -> Result<Product, AppError> {
    state
        .store
        .find_product(id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound))
}

fn can_manage(caller: &CurrentUser, product: &Product) -> bool {
    caller.is_admin() || product.artisan_id == caller.id
}

/// POST /api/products
pub async fn create(
    State(state): State<AppState>,
    artisan: CurrentUser,
    ValidatedJson(req): ValidatedJson<ProductCreate>,
) -> ApiResult<Product> {
    let now = now_millis();
    let product = Product {
        id: new_id(),
        artisan_id: artisan.id.clone(),
        name: req.name,
        description: req.description,
        category: req.category,
        price: req.price,
        currency: req.currency,
        stock_quantity: req.stock_quantity,
        images: req.images,
        tags: req.tags,
        views: 0,
        sales_count: 0,
        rating: 0.0,
        review_count: 0,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    state.store.insert_product(&product).await?;

    tracing::info!(product_id = %product.id, artisan_id = %artisan.id, "Product created");
    Ok(ApiResponse::ok_with_message(product, "Product created"))
}

/// GET /api/products
pub async fn list(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<ProductQuery>,
) -> ApiResult<PaginatedResponse<Product>> {
    if let (Some(min), Some(max)) = (query.min_price, query.max_price)
        && min > max
    {
        return Err(AppError::invalid_field(
            "min_price",
            "min_price must not exceed max_price",
        ));
    }

    let page = query.page_params();
    let result = state.store.list_products(&query).await?;
    Ok(ApiResponse::ok(PaginatedResponse::new(
        result.items,
        page.page,
        page.limit,
        result.total,
    )))
}

/// GET /api/products/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<String>,
) -> ApiResult<Product> {
    let mut product = load(&state, &id).await?;
    if !product.is_active && !viewer.as_ref().is_some_and(|v| can_manage(v, &product)) {
        return Err(AppError::new(ErrorCode::ProductNotFound));
    }

    state.store.increment_views(&product.id).await?;
    product.views += 1;
    Ok(ApiResponse::ok(product))
}

/// PATCH /api/products/{id}
pub async fn update(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<ProductUpdate>,
) -> ApiResult<Product> {
    let product = load(&state, &id).await?;
    if !can_manage(&caller, &product) {
        return Err(AppError::new(ErrorCode::NotProductOwner));
    }

    let product = state.store.update_product(&id, &req, now_millis()).await?;

    tracing::info!(product_id = %product.id, user_id = %caller.id, "Product updated");
    Ok(ApiResponse::ok_with_message(product, "Product updated"))
}

/// DELETE /api/products/{id}
pub async fn delete(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let product = load(&state, &id).await?;
    if !can_manage(&caller, &product) {
        return Err(AppError::new(ErrorCode::NotProductOwner));
    }

    state
        .store
        .update_product(&product.id, &ProductUpdate::deactivate(), now_millis())
        .await?;

    tracing::info!(product_id = %product.id, user_id = %caller.id, "Product deactivated");
    Ok(ApiResponse::message("Product deleted"))
}

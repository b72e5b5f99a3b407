use rust_decimal::Decimal;
use shared::models::{LineItem, Order, OrderReview, OrderStatus, PaymentMethod, ShippingAddress};
use shared::request::PageParams;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};

use crate::db::{OrderScope, Page, StoreError, StoreResult, TransitionEffect};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: String,
    order_number: String,
    customer_id: String,
    items: Json<Vec<LineItem>>,
    total_amount: Decimal,
    currency: String,
    shipping_address: Json<ShippingAddress>,
    payment_method: String,
    status: String,
    artisan_ids: Vec<String>,
    tracking_number: Option<String>,
    cancellation_reason: Option<String>,
    notes: Option<String>,
    review: Option<Json<OrderReview>>,
    created_at: i64,
    confirmed_at: Option<i64>,
    processing_at: Option<i64>,
    shipped_at: Option<i64>,
    delivered_at: Option<i64>,
    cancelled_at: Option<i64>,
    updated_at: i64,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = OrderStatus::from_db(&row.status)
            .ok_or_else(|| StoreError::Backend(format!("unknown order status: {}", row.status)))?;
        let payment_method = PaymentMethod::from_db(&row.payment_method).ok_or_else(|| {
            StoreError::Backend(format!("unknown payment method: {}", row.payment_method))
        })?;
        Ok(Order {
            id: row.id,
            order_number: row.order_number,
            customer_id: row.customer_id,
            items: row.items.0,
            total_amount: row.total_amount,
            currency: row.currency,
            shipping_address: row.shipping_address.0,
            payment_method,
            status,
            artisan_ids: row.artisan_ids,
            tracking_number: row.tracking_number,
            cancellation_reason: row.cancellation_reason,
            notes: row.notes,
            review: row.review.map(|r| r.0),
            created_at: row.created_at,
            confirmed_at: row.confirmed_at,
            processing_at: row.processing_at,
            shipped_at: row.shipped_at,
            delivered_at: row.delivered_at,
            cancelled_at: row.cancelled_at,
            updated_at: row.updated_at,
        })
    }
}

/// Insert the order and take its stock in one transaction
pub async fn place(pool: &PgPool, order: &Order) -> StoreResult<()> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO orders (id, order_number, customer_id, items, total_amount, currency,
             shipping_address, payment_method, status, artisan_ids, notes, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
    )
    .bind(&order.id)
    .bind(&order.order_number)
    .bind(&order.customer_id)
    .bind(Json(&order.items))
    .bind(order.total_amount)
    .bind(&order.currency)
    .bind(Json(&order.shipping_address))
    .bind(order.payment_method.as_db())
    .bind(order.status.as_db())
    .bind(&order.artisan_ids)
    .bind(&order.notes)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut *tx)
    .await?;

    for item in &order.items {
        let result = sqlx::query(
            "UPDATE products
             SET stock_quantity = stock_quantity - $1, sales_count = sales_count + $1,
                 updated_at = $3
             WHERE id = $2 AND stock_quantity >= $1",
        )
        .bind(item.quantity)
        .bind(&item.product_id)
        .bind(order.created_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Dropping the transaction rolls it back
            return Err(StoreError::InsufficientStock {
                product_id: item.product_id.clone(),
            });
        }
    }

    tx.commit().await?;
    Ok(())
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> StoreResult<Option<Order>> {
    let row: Option<OrderRow> = sqlx::query_as("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(Order::try_from).transpose()
}

pub async fn list(
    pool: &PgPool,
    scope: &OrderScope,
    status: Option<OrderStatus>,
    page: PageParams,
) -> StoreResult<Page<Order>> {
    let (customer, artisan) = match scope {
        OrderScope::Customer(id) => (Some(id.as_str()), None),
        OrderScope::Artisan(id) => (None, Some(id.as_str())),
        OrderScope::All => (None, None),
    };
    let status = status.map(|s| s.as_db());

    const FILTER: &str = "($1::TEXT IS NULL OR customer_id = $1)
         AND ($2::TEXT IS NULL OR $2 = ANY(artisan_ids))
         AND ($3::TEXT IS NULL OR status = $3)";

    let count_sql = format!("SELECT COUNT(*) FROM orders WHERE {FILTER}");
    let (total,): (i64,) = sqlx::query_as(&count_sql)
        .bind(customer)
        .bind(artisan)
        .bind(status)
        .fetch_one(pool)
        .await?;

    let list_sql = format!(
        "SELECT * FROM orders WHERE {FILTER} ORDER BY created_at DESC, id LIMIT $4 OFFSET $5"
    );
    let rows: Vec<OrderRow> = sqlx::query_as(&list_sql)
        .bind(customer)
        .bind(artisan)
        .bind(status)
        .bind(page.limit as i64)
        .bind(page.offset() as i64)
        .fetch_all(pool)
        .await?;

    let items = rows
        .into_iter()
        .map(Order::try_from)
        .collect::<StoreResult<Vec<_>>>()?;
    Ok(Page {
        items,
        total: total as u64,
    })
}

/// Status write guarded by the expected previous status, plus its effect
pub async fn commit_transition(
    pool: &PgPool,
    order: &Order,
    expected: OrderStatus,
    effect: TransitionEffect,
) -> StoreResult<()> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "UPDATE orders
         SET status = $3, tracking_number = $4, cancellation_reason = $5,
             confirmed_at = $6, processing_at = $7, shipped_at = $8, delivered_at = $9,
             cancelled_at = $10, updated_at = $11
         WHERE id = $1 AND status = $2",
    )
    .bind(&order.id)
    .bind(expected.as_db())
    .bind(order.status.as_db())
    .bind(&order.tracking_number)
    .bind(&order.cancellation_reason)
    .bind(order.confirmed_at)
    .bind(order.processing_at)
    .bind(order.shipped_at)
    .bind(order.delivered_at)
    .bind(order.cancelled_at)
    .bind(order.updated_at)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::Conflict(format!(
            "order {} is no longer {}",
            order.id, expected
        )));
    }

    match effect {
        TransitionEffect::None => {}
        TransitionEffect::Restock => restock(&mut tx, order).await?,
        TransitionEffect::CreditArtisans => credit_artisans(&mut tx, order).await?,
    }

    tx.commit().await?;
    Ok(())
}

async fn restock(tx: &mut Transaction<'_, Postgres>, order: &Order) -> StoreResult<()> {
    for item in &order.items {
        sqlx::query(
            "UPDATE products
             SET stock_quantity = stock_quantity + $1, sales_count = sales_count - $1,
                 updated_at = $3
             WHERE id = $2",
        )
        .bind(item.quantity)
        .bind(&item.product_id)
        .bind(order.updated_at)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

async fn credit_artisans(tx: &mut Transaction<'_, Postgres>, order: &Order) -> StoreResult<()> {
    for (artisan_id, share) in order.artisan_shares() {
        sqlx::query(
            "UPDATE users
             SET total_sales = total_sales + $1, total_revenue = total_revenue + $2
             WHERE id = $3",
        )
        .bind(share.quantity)
        .bind(share.revenue)
        .bind(&artisan_id)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

/// Attach the review once and fold its rating into the reviewed products
pub async fn commit_review(pool: &PgPool, order: &Order) -> StoreResult<()> {
    let Some(review) = &order.review else {
        return Err(StoreError::Backend("order carries no review".into()));
    };

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "UPDATE orders SET review = $2, updated_at = $3 WHERE id = $1 AND review IS NULL",
    )
    .bind(&order.id)
    .bind(Json(review))
    .bind(order.updated_at)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::Conflict(format!(
            "order {} already reviewed",
            order.id
        )));
    }

    let mut product_ids: Vec<&str> = order.items.iter().map(|i| i.product_id.as_str()).collect();
    product_ids.sort_unstable();
    product_ids.dedup();

    for product_id in product_ids {
        sqlx::query(
            "UPDATE products
             SET rating = (rating * review_count + $1) / (review_count + 1),
                 review_count = review_count + 1
             WHERE id = $2",
        )
        .bind(review.rating as f64)
        .bind(product_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

use shared::models::{Product, ProductQuery, ProductUpdate};
use sqlx::PgPool;

use crate::db::{Page, StoreError, StoreResult};

pub async fn insert(pool: &PgPool, p: &Product) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO products (id, artisan_id, name, description, category, price, currency,
             stock_quantity, images, tags, views, sales_count, rating, review_count, is_active,
             created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
    )
    .bind(&p.id)
    .bind(&p.artisan_id)
    .bind(&p.name)
    .bind(&p.description)
    .bind(&p.category)
    .bind(p.price)
    .bind(&p.currency)
    .bind(p.stock_quantity)
    .bind(&p.images)
    .bind(&p.tags)
    .bind(p.views)
    .bind(p.sales_count)
    .bind(p.rating)
    .bind(p.review_count)
    .bind(p.is_active)
    .bind(p.created_at)
    .bind(p.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> StoreResult<Option<Product>> {
    Ok(sqlx::query_as("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

/// Writes only the columns the patch sets. Counters are owned by the order
/// batches.
pub async fn update(
    pool: &PgPool,
    id: &str,
    patch: &ProductUpdate,
    now: i64,
) -> StoreResult<Product> {
    sqlx::query_as::<_, Product>(
        "UPDATE products SET name = COALESCE($2, name),
             description = COALESCE($3, description), category = COALESCE($4, category),
             price = COALESCE($5, price), currency = COALESCE($6, currency),
             stock_quantity = COALESCE($7, stock_quantity), images = COALESCE($8, images),
             tags = COALESCE($9, tags), is_active = COALESCE($10, is_active), updated_at = $11
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(&patch.name)
    .bind(&patch.description)
    .bind(&patch.category)
    .bind(patch.price)
    .bind(&patch.currency)
    .bind(patch.stock_quantity)
    .bind(&patch.images)
    .bind(&patch.tags)
    .bind(patch.is_active)
    .bind(now)
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::NotFound)
}

pub async fn increment_views(pool: &PgPool, id: &str) -> StoreResult<()> {
    sqlx::query("UPDATE products SET views = views + 1 WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Escape LIKE wildcards in user input
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

const BROWSE_FILTER: &str = "is_active
     AND ($1::TEXT IS NULL OR lower(category) = lower($1))
     AND ($2::TEXT IS NULL OR artisan_id = $2)
     AND ($3::TEXT IS NULL OR name ILIKE $3)
     AND ($4::NUMERIC IS NULL OR price >= $4)
     AND ($5::NUMERIC IS NULL OR price <= $5)";

pub async fn list(pool: &PgPool, query: &ProductQuery) -> StoreResult<Page<Product>> {
    let page = query.page_params();
    let search = query.search.as_deref().map(like_pattern);

    let count_sql = format!("SELECT COUNT(*) FROM products WHERE {BROWSE_FILTER}");
    let (total,): (i64,) = sqlx::query_as(&count_sql)
        .bind(&query.category)
        .bind(&query.artisan_id)
        .bind(&search)
        .bind(query.min_price)
        .bind(query.max_price)
        .fetch_one(pool)
        .await?;

    let list_sql = format!(
        "SELECT * FROM products WHERE {BROWSE_FILTER}
         ORDER BY created_at DESC, id LIMIT $6 OFFSET $7"
    );
    let items: Vec<Product> = sqlx::query_as(&list_sql)
        .bind(&query.category)
        .bind(&query.artisan_id)
        .bind(&search)
        .bind(query.min_price)
        .bind(query.max_price)
        .bind(page.limit as i64)
        .bind(page.offset() as i64)
        .fetch_all(pool)
        .await?;

    Ok(Page {
        items,
        total: total as u64,
    })
}

use rust_decimal::Decimal;
use shared::models::{ArtisanProfile, Role, User};
use shared::request::PageParams;
use sqlx::PgPool;

use crate::db::{Page, StoreError, StoreResult};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    email: String,
    password_hash: String,
    role: String,
    display_name: String,
    phone: Option<String>,
    bio: Option<String>,
    location: Option<String>,
    avatar_url: Option<String>,
    is_active: bool,
    skills: Vec<String>,
    rating: f64,
    total_sales: i64,
    total_revenue: Decimal,
    tokens_valid_after: i64,
    last_seen_at: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::from_db(&row.role)
            .ok_or_else(|| StoreError::Backend(format!("unknown role: {}", row.role)))?;
        let artisan = (role == Role::Artisan).then(|| ArtisanProfile {
            skills: row.skills,
            rating: row.rating,
            total_sales: row.total_sales,
            total_revenue: row.total_revenue,
        });
        Ok(User {
            id: row.id,
            email: row.email,
            role,
            display_name: row.display_name,
            phone: row.phone,
            bio: row.bio,
            location: row.location,
            avatar_url: row.avatar_url,
            is_active: row.is_active,
            artisan,
            last_seen_at: row.last_seen_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
            password_hash: row.password_hash,
            tokens_valid_after: row.tokens_valid_after,
        })
    }
}

fn decode(row: Option<UserRow>) -> StoreResult<Option<User>> {
    row.map(User::try_from).transpose()
}

pub async fn insert(pool: &PgPool, user: &User) -> StoreResult<()> {
    let profile = user.artisan.clone().unwrap_or_default();
    sqlx::query(
        "INSERT INTO users (id, email, password_hash, role, display_name, phone, bio, location,
             avatar_url, is_active, skills, rating, total_sales, total_revenue,
             tokens_valid_after, last_seen_at, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)",
    )
    .bind(&user.id)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role.as_db())
    .bind(&user.display_name)
    .bind(&user.phone)
    .bind(&user.bio)
    .bind(&user.location)
    .bind(&user.avatar_url)
    .bind(user.is_active)
    .bind(&profile.skills)
    .bind(profile.rating)
    .bind(profile.total_sales)
    .bind(profile.total_revenue)
    .bind(user.tokens_valid_after)
    .bind(user.last_seen_at)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> StoreResult<Option<User>> {
    let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    decode(row)
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> StoreResult<Option<User>> {
    let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    decode(row)
}

/// Writes profile, activation and revocation columns. Sales aggregates are
/// owned by the order transition batch and left untouched.
pub async fn update(pool: &PgPool, user: &User) -> StoreResult<()> {
    let skills = user
        .artisan
        .as_ref()
        .map(|a| a.skills.clone())
        .unwrap_or_default();
    let result = sqlx::query(
        "UPDATE users SET display_name = $2, phone = $3, bio = $4, location = $5,
             avatar_url = $6, is_active = $7, skills = $8, tokens_valid_after = $9,
             updated_at = $10
         WHERE id = $1",
    )
    .bind(&user.id)
    .bind(&user.display_name)
    .bind(&user.phone)
    .bind(&user.bio)
    .bind(&user.location)
    .bind(&user.avatar_url)
    .bind(user.is_active)
    .bind(&skills)
    .bind(user.tokens_valid_after)
    .bind(user.updated_at)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

pub async fn touch_last_seen(pool: &PgPool, user_id: &str, now: i64) -> StoreResult<()> {
    sqlx::query("UPDATE users SET last_seen_at = $1 WHERE id = $2")
        .bind(now)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn list(pool: &PgPool, role: Option<Role>, page: PageParams) -> StoreResult<Page<User>> {
    let role = role.map(|r| r.as_db());

    let (total,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM users WHERE ($1::TEXT IS NULL OR role = $1)")
            .bind(role)
            .fetch_one(pool)
            .await?;

    let rows: Vec<UserRow> = sqlx::query_as(
        "SELECT * FROM users WHERE ($1::TEXT IS NULL OR role = $1)
         ORDER BY created_at DESC, id LIMIT $2 OFFSET $3",
    )
    .bind(role)
    .bind(page.limit as i64)
    .bind(page.offset() as i64)
    .fetch_all(pool)
    .await?;

    let items = rows
        .into_iter()
        .map(User::try_from)
        .collect::<StoreResult<Vec<_>>>()?;
    Ok(Page {
        items,
        total: total as u64,
    })
}

//! Product Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::request::{PageParams, default_page, trimmed, trimmed_opt};

/// Product entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: String,
    /// Owning artisan (user id)
    pub artisan_id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: Decimal,
    /// ISO 4217 code
    pub currency: String,
    pub stock_quantity: i32,
    pub images: Vec<String>,
    pub tags: Vec<String>,
    pub views: i64,
    pub sales_count: i64,
    /// Running average of review ratings
    pub rating: f64,
    pub review_count: i64,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Product {
    /// First image, used as the line-item thumbnail
    pub fn thumbnail(&self) -> Option<String> {
        self.images.first().cloned()
    }

    /// Fold one more rating into the running average
    pub fn add_rating(&mut self, rating: u8) {
        let total = self.rating * self.review_count as f64 + rating as f64;
        self.review_count += 1;
        self.rating = total / self.review_count as f64;
    }
}

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() || price.is_zero() {
        return Err(ValidationError::new("price").with_message("Price must be positive".into()));
    }
    if price.normalize().scale() > 2 {
        return Err(ValidationError::new("price")
            .with_message("Price must have at most 2 decimal places".into()));
    }
    Ok(())
}

fn validate_currency(code: &str) -> Result<(), ValidationError> {
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(ValidationError::new("currency")
            .with_message("Currency must be a 3-letter ISO code".into()))
    }
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Create product payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProductCreate {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 100, message = "Category must be 1-100 characters"))]
    pub category: String,
    #[validate(custom(function = "validate_price"))]
    pub price: Decimal,
    #[serde(default = "default_currency")]
    #[validate(custom(function = "validate_currency"))]
    pub currency: String,
    #[serde(default)]
    #[validate(range(min = 0, max = 1_000_000, message = "Stock must be 0-1000000"))]
    pub stock_quantity: i32,
    #[serde(default)]
    #[validate(length(max = 10, message = "At most 10 images"))]
    pub images: Vec<String>,
    #[serde(default)]
    #[validate(length(max = 20, message = "At most 20 tags"))]
    pub tags: Vec<String>,
}

/// Update product payload (partial)
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProductUpdate {
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, max = 100, message = "Category must be 1-100 characters"))]
    pub category: Option<String>,
    #[validate(custom(function = "validate_price"))]
    pub price: Option<Decimal>,
    #[validate(custom(function = "validate_currency"))]
    pub currency: Option<String>,
    #[validate(range(min = 0, max = 1_000_000, message = "Stock must be 0-1000000"))]
    pub stock_quantity: Option<i32>,
    #[validate(length(max = 10, message = "At most 10 images"))]
    pub images: Option<Vec<String>>,
    #[validate(length(max = 20, message = "At most 20 tags"))]
    pub tags: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

impl ProductUpdate {
    /// Apply the present fields onto an existing product
    pub fn apply(&self, product: &mut Product) {
        if let Some(v) = &self.name {
            product.name = v.clone();
        }
        if let Some(v) = &self.description {
            product.description = v.clone();
        }
        if let Some(v) = &self.category {
            product.category = v.clone();
        }
        if let Some(v) = self.price {
            product.price = v;
        }
        if let Some(v) = &self.currency {
            product.currency = v.clone();
        }
        if let Some(v) = self.stock_quantity {
            product.stock_quantity = v;
        }
        if let Some(v) = &self.images {
            product.images = v.clone();
        }
        if let Some(v) = &self.tags {
            product.tags = v.clone();
        }
        if let Some(v) = self.is_active {
            product.is_active = v;
        }
    }

    /// Patch that only flips the active flag
    pub fn deactivate() -> Self {
        Self {
            is_active: Some(false),
            ..Default::default()
        }
    }
}

/// Product browse query
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProductQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: u32,
    #[serde(default = "default_product_limit")]
    #[validate(range(min = 1, max = 50, message = "Limit must be between 1 and 50"))]
    pub limit: u32,
    #[serde(default, deserialize_with = "trimmed_opt")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    pub artisan_id: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 100, message = "Search must be at most 100 characters"))]
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

fn default_product_limit() -> u32 {
    20
}

impl ProductQuery {
    pub fn page_params(&self) -> PageParams {
        PageParams::new(self.page, self.limit)
    }

    /// Whether a product passes the non-paging filters
    pub fn matches(&self, product: &Product) -> bool {
        if !product.is_active {
            return false;
        }
        if let Some(category) = &self.category
            && !product.category.eq_ignore_ascii_case(category)
        {
            return false;
        }
        if let Some(artisan_id) = &self.artisan_id
            && &product.artisan_id != artisan_id
        {
            return false;
        }
        if let Some(search) = &self.search
            && !product
                .name
                .to_lowercase()
                .contains(&search.to_lowercase())
        {
            return false;
        }
        if let Some(min) = self.min_price
            && product.price < min
        {
            return false;
        }
        if let Some(max) = self.max_price
            && product.price > max
        {
            return false;
        }
        true
    }
}

//! User Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::request::{PageParams, default_page, trimmed, trimmed_opt};

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Customer,
    Artisan,
    Admin,
}

impl Role {
    /// Parse from database string value (lowercase)
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "customer" => Some(Self::Customer),
            "artisan" => Some(Self::Artisan),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Database string representation (lowercase)
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Artisan => "artisan",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db())
    }
}

/// Seller sub-profile, present only for artisans
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtisanProfile {
    pub skills: Vec<String>,
    /// Average rating across reviewed orders
    pub rating: f64,
    /// Units delivered
    pub total_sales: i64,
    /// Revenue of delivered line items
    pub total_revenue: Decimal,
}

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub display_name: String,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub avatar_url: Option<String>,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artisan: Option<ArtisanProfile>,
    pub last_seen_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    /// Argon2 PHC string
    #[serde(skip)]
    pub password_hash: String,
    /// Tokens issued (epoch millis) before this instant are revoked
    #[serde(skip)]
    pub tokens_valid_after: i64,
}

impl User {
    pub fn is_artisan(&self) -> bool {
        self.role == Role::Artisan
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Reduced view served to other users
    pub fn public_profile(&self) -> PublicProfile {
        PublicProfile {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            role: self.role,
            bio: self.bio.clone(),
            location: self.location.clone(),
            avatar_url: self.avatar_url.clone(),
            artisan: self.artisan.clone(),
            created_at: self.created_at,
        }
    }
}

/// Public profile view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicProfile {
    pub id: String,
    pub display_name: String,
    pub role: Role,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artisan: Option<ArtisanProfile>,
    pub created_at: i64,
}

/// Registration payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(email(message = "Must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 100, message = "Display name must be 1-100 characters"))]
    pub display_name: String,
    #[serde(default)]
    pub role: Role,
}

/// Login payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(email(message = "Must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Profile update payload (partial)
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UserUpdate {
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, max = 100, message = "Display name must be 1-100 characters"))]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 30, message = "Phone must be at most 30 characters"))]
    pub phone: Option<String>,
    #[serde(default)]
    #[validate(length(max = 1000, message = "Bio must be at most 1000 characters"))]
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 200, message = "Location must be at most 200 characters"))]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(url(message = "Avatar must be a valid URL"))]
    pub avatar_url: Option<String>,
    #[serde(default)]
    #[validate(length(max = 20, message = "At most 20 skills"))]
    pub skills: Option<Vec<String>>,
}

impl UserUpdate {
    /// Whether the payload touches artisan-only fields
    pub fn has_artisan_fields(&self) -> bool {
        self.skills.is_some()
    }

    /// Apply the present fields onto an existing user
    pub fn apply(self, user: &mut User) {
        if let Some(v) = self.display_name {
            user.display_name = v;
        }
        if let Some(v) = self.phone {
            user.phone = Some(v);
        }
        if let Some(v) = self.bio {
            user.bio = Some(v);
        }
        if let Some(v) = self.location {
            user.location = Some(v);
        }
        if let Some(v) = self.avatar_url {
            user.avatar_url = Some(v);
        }
        if let (Some(skills), Some(profile)) = (self.skills, user.artisan.as_mut()) {
            profile.skills = skills
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
    }
}

/// Register/login result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
}

/// Admin user listing query
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UserListQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: u32,
    #[serde(default = "default_user_limit")]
    #[validate(range(min = 1, max = 50, message = "Limit must be between 1 and 50"))]
    pub limit: u32,
    pub role: Option<Role>,
}

fn default_user_limit() -> u32 {
    20
}

impl UserListQuery {
    pub fn page_params(&self) -> PageParams {
        PageParams::new(self.page, self.limit)
    }
}

/// Admin activation toggle
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UserStatusRequest {
    pub is_active: bool,
}

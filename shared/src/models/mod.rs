//! Data models
//!
//! Typed records shared by the server and API clients, plus the validated
//! request payloads for each resource. Product rows decode directly with
//! `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`; the others go
//! through row types in the server's db layer.

pub mod notification;
pub mod order;
pub mod product;
pub mod user;

// Re-exports
pub use notification::*;
pub use order::*;
pub use product::*;
pub use user::*;

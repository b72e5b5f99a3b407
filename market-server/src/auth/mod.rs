//! Authentication and authorization
//!
//! - [`JwtService`] issues and validates access tokens
//! - [`IdentityProvider`] resolves a token to a [`CurrentUser`]
//! - [`require_auth`], [`optional_auth`], [`require_role`] middleware
//! - [`MaybeUser`] extractor for optionally authenticated routes

pub mod extractor;
pub mod identity;
pub mod jwt;
pub mod middleware;
pub mod rate_limit;

pub use extractor::MaybeUser;
pub use identity::{CurrentUser, IdentityError, IdentityProvider, JwtIdentityProvider};
pub use jwt::{JwtConfig, JwtService};
pub use middleware::{optional_auth, require_auth, require_role};

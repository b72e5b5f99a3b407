//! Order lifecycle
//!
//! - [`OrderManager`] validates and commits order operations
//! - [`notify`] builds and dispatches the resulting notifications

pub mod manager;
pub mod notify;

pub use manager::OrderManager;

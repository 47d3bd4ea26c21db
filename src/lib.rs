//! Product Catalog - a cached REST API over a product document store
//!
//! Paged listing and filtered search backed by a TTL + LRU response cache
//! that is cleared on every write.

pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod tasks;

pub use api::{create_router, AppState};
pub use config::Config;
pub use error::{ApiError, Result};
pub use tasks::spawn_cleanup_task;

//! Request and Response models for the catalog API
//!
//! Product records, write payloads, raw query parameters and response bodies.

pub mod product;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use product::{NewProduct, Product, ProductUpdate};
pub use requests::{ListParams, SearchParams};
pub use responses::{
    DeleteResponse, HealthResponse, MemoryUsage, ProductPage, ProductResponse, StatsResponse,
};

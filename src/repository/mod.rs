//! Product Repository
//!
//! Data-access interface over the document store, with a MongoDB
//! implementation and an in-memory one.

mod memory;
mod mongo;

use async_trait::async_trait;

use crate::catalog::{FilterSpec, SortSpec};
use crate::error::Result;
use crate::models::{NewProduct, Product, ProductUpdate};

pub use memory::InMemoryProductRepository;
pub use mongo::{connect, MongoProductRepository};

/// A page of records plus the number of records matching overall.
pub type ProductSlice = (Vec<Product>, u64);

/// Persistence interface for products.
///
/// Reads return the projected fields (name, price, rating, image,
/// description) plus id and timestamps. Ids are 24-character hex strings;
/// a malformed id is a validation error, an unknown one is not found.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// One page of all products.
    async fn list(&self, skip: u64, limit: u64, sort: SortSpec) -> Result<ProductSlice>;

    /// One page of products matching `filter`.
    async fn search(
        &self,
        filter: &FilterSpec,
        sort: SortSpec,
        skip: u64,
        limit: u64,
    ) -> Result<ProductSlice>;

    async fn find_by_id(&self, id: &str) -> Result<Product>;

    /// Stores a validated product, assigning id and timestamps.
    async fn create(&self, input: NewProduct) -> Result<Product>;

    /// Applies a partial update, returning the record after the change.
    async fn update_by_id(&self, id: &str, update: ProductUpdate) -> Result<Product>;

    /// Removes a product, returning the removed record.
    async fn delete_by_id(&self, id: &str) -> Result<Product>;
}

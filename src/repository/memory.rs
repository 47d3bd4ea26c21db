//! In-memory implementation of ProductRepository
//!
//! Backs the `memory` store backend and the router tests. Keeps a count of
//! read queries so callers can tell whether a response came from the cache.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;
use tracing::{info, instrument};
use validator::Validate;

use crate::catalog::{FilterSpec, SortSpec};
use crate::error::{ApiError, Result};
use crate::models::{NewProduct, Product, ProductUpdate};
use crate::repository::mongo::parse_object_id;
use crate::repository::{ProductRepository, ProductSlice};

#[derive(Debug, Default)]
pub struct InMemoryProductRepository {
    products: RwLock<Vec<Product>>,
    reads: AtomicUsize,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of list, search and find calls served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.products.read().await.len()
    }

    fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::SeqCst);
    }

    fn page(
        products: &[Product],
        filter: &FilterSpec,
        sort: SortSpec,
        skip: u64,
        limit: u64,
    ) -> ProductSlice {
        let mut matching: Vec<&Product> = products.iter().filter(|p| filter.matches(p)).collect();
        matching.sort_by(|a, b| sort.compare(a, b));

        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect();
        (page, total)
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn list(&self, skip: u64, limit: u64, sort: SortSpec) -> Result<ProductSlice> {
        self.record_read();
        let products = self.products.read().await;
        Ok(Self::page(&products, &FilterSpec::default(), sort, skip, limit))
    }

    async fn search(
        &self,
        filter: &FilterSpec,
        sort: SortSpec,
        skip: u64,
        limit: u64,
    ) -> Result<ProductSlice> {
        self.record_read();
        let products = self.products.read().await;
        Ok(Self::page(&products, filter, sort, skip, limit))
    }

    async fn find_by_id(&self, id: &str) -> Result<Product> {
        parse_object_id(id)?;
        self.record_read();
        self.products
            .read()
            .await
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(id.to_string()))
    }

    #[instrument(skip(self, input), fields(product_name = %input.name))]
    async fn create(&self, input: NewProduct) -> Result<Product> {
        input.validate()?;

        let product = Product::new(ObjectId::new().to_hex(), input, Utc::now());
        self.products.write().await.push(product.clone());

        info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    #[instrument(skip(self, update))]
    async fn update_by_id(&self, id: &str, update: ProductUpdate) -> Result<Product> {
        parse_object_id(id)?;
        update.validate()?;

        let mut products = self.products.write().await;
        let product = products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ApiError::NotFound(id.to_string()))?;
        product.apply_update(update, Utc::now());

        info!(product_id = %id, "Product updated");
        Ok(product.clone())
    }

    #[instrument(skip(self))]
    async fn delete_by_id(&self, id: &str) -> Result<Product> {
        parse_object_id(id)?;

        let mut products = self.products.write().await;
        let index = products
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| ApiError::NotFound(id.to_string()))?;

        info!(product_id = %id, "Product deleted");
        Ok(products.remove(index))
    }
}

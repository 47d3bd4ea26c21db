//! MongoDB implementation of ProductRepository

use std::time::Duration;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{self, doc, oid::ObjectId, Document},
    options::{ClientOptions, IndexOptions, ReturnDocument},
    Client, Collection, Database, IndexModel,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use validator::Validate;

use crate::catalog::{FilterSpec, SortOrder, SortSpec};
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::models::{NewProduct, Product, ProductUpdate};
use crate::repository::{ProductRepository, ProductSlice};

/// Stored shape of a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    /// Description as written by earlier deployments. Read only; updates
    /// write `description`, which takes precedence.
    #[serde(rename = "desc", default, skip_serializing)]
    legacy_desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    price: Option<f64>,
    created_at: bson::DateTime,
    updated_at: bson::DateTime,
}

impl From<ProductDocument> for Product {
    fn from(doc: ProductDocument) -> Self {
        Product {
            id: doc.id.to_hex(),
            name: doc.name,
            image: doc.image,
            rating: doc.rating,
            description: doc.description.or(doc.legacy_desc),
            price: doc.price,
            created_at: to_chrono(doc.created_at),
            updated_at: to_chrono(doc.updated_at),
        }
    }
}

fn to_chrono(dt: bson::DateTime) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::from_timestamp_millis(dt.timestamp_millis()).unwrap_or_default()
}

/// Parses a client-supplied id.
pub(crate) fn parse_object_id(id: &str) -> Result<ObjectId> {
    ObjectId::parse_str(id)
        .map_err(|_| ApiError::Validation(format!("'{}' is not a valid product id", id)))
}

/// Fields returned by read queries.
fn projection() -> Document {
    doc! {
        "name": 1,
        "price": 1,
        "rating": 1,
        "image": 1,
        "description": 1,
        "desc": 1,
        "createdAt": 1,
        "updatedAt": 1,
    }
}

/// Opens a pooled client and verifies the server answers a ping.
pub async fn connect(config: &Config) -> std::result::Result<Database, mongodb::error::Error> {
    info!("Connecting to MongoDB at {}", config.mongo_url);

    let mut options = ClientOptions::parse(&config.mongo_url).await?;
    options.app_name = Some(env!("CARGO_PKG_NAME").to_string());
    options.max_pool_size = Some(10);
    options.server_selection_timeout = Some(Duration::from_secs(5));

    let client = Client::with_options(options)?;
    let db = client.database(&config.mongo_database);
    db.run_command(doc! { "ping": 1 }).await?;

    info!(database = %config.mongo_database, "MongoDB connected");
    Ok(db)
}

/// MongoDB implementation of the ProductRepository
pub struct MongoProductRepository {
    collection: Collection<ProductDocument>,
}

impl MongoProductRepository {
    pub fn new(db: &Database, collection_name: &str) -> Self {
        Self {
            collection: db.collection(collection_name),
        }
    }

    /// Creates the indexes the read paths rely on.
    ///
    /// The text index on name and description (either field name) backs the
    /// `$text` search.
    pub async fn ensure_indexes(&self) -> Result<()> {
        let single = |keys: Document| IndexModel::builder().keys(keys).build();
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "name": "text", "description": "text", "desc": "text" })
                .options(IndexOptions::builder().name("product_text".to_string()).build())
                .build(),
            single(doc! { "name": 1 }),
            single(doc! { "rating": 1 }),
            single(doc! { "price": 1 }),
            single(doc! { "createdAt": -1 }),
            single(doc! { "name": 1, "price": 1 }),
            single(doc! { "rating": 1, "price": 1 }),
        ];

        self.collection.create_indexes(indexes).await?;
        info!("Product indexes ensured");
        Ok(())
    }

    /// Builds a MongoDB filter document from a FilterSpec
    fn filter_document(filter: &FilterSpec) -> Document {
        let mut doc = Document::new();

        if let Some(term) = &filter.search {
            doc.insert("$text", doc! { "$search": term.as_str() });
        }

        if let Some(min) = filter.min_rating {
            doc.insert("rating", doc! { "$gte": min });
        }

        let mut price = Document::new();
        if let Some(min) = filter.min_price {
            price.insert("$gte", min);
        }
        if let Some(max) = filter.max_price {
            price.insert("$lte", max);
        }
        if !price.is_empty() {
            doc.insert("price", price);
        }

        doc
    }

    fn sort_document(sort: SortSpec) -> Document {
        let direction = match sort.order {
            SortOrder::Asc => 1,
            SortOrder::Desc => -1,
        };
        let mut doc = Document::new();
        doc.insert(sort.field.as_str(), direction);
        doc
    }

    /// `$set` for the provided fields plus a never-decreasing `updatedAt`.
    fn update_document(update: ProductUpdate, now: bson::DateTime) -> Document {
        let mut set = Document::new();
        if let Some(name) = update.name {
            set.insert("name", name);
        }
        if let Some(image) = update.image {
            set.insert("image", image);
        }
        if let Some(rating) = update.rating {
            set.insert("rating", rating);
        }
        if let Some(description) = update.description {
            set.insert("description", description);
        }
        if let Some(price) = update.price {
            set.insert("price", price);
        }

        let mut doc = doc! { "$max": { "updatedAt": now } };
        if !set.is_empty() {
            doc.insert("$set", set);
        }
        doc
    }

    async fn find_page(
        &self,
        filter: Document,
        sort: SortSpec,
        skip: u64,
        limit: u64,
    ) -> Result<ProductSlice> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let find = async {
            self.collection
                .find(filter.clone())
                .projection(projection())
                .sort(Self::sort_document(sort))
                .skip(skip)
                .limit(limit)
                .await?
                .try_collect::<Vec<_>>()
                .await
        };
        let count = async { self.collection.count_documents(filter.clone()).await };

        let (docs, total) = tokio::try_join!(find, count)?;
        Ok((docs.into_iter().map(Product::from).collect(), total))
    }
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    #[instrument(skip(self))]
    async fn list(&self, skip: u64, limit: u64, sort: SortSpec) -> Result<ProductSlice> {
        self.find_page(Document::new(), sort, skip, limit).await
    }

    #[instrument(skip(self))]
    async fn search(
        &self,
        filter: &FilterSpec,
        sort: SortSpec,
        skip: u64,
        limit: u64,
    ) -> Result<ProductSlice> {
        self.find_page(Self::filter_document(filter), sort, skip, limit)
            .await
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> Result<Product> {
        let oid = parse_object_id(id)?;
        self.collection
            .find_one(doc! { "_id": oid })
            .projection(projection())
            .await?
            .map(Product::from)
            .ok_or_else(|| ApiError::NotFound(id.to_string()))
    }

    #[instrument(skip(self, input), fields(product_name = %input.name))]
    async fn create(&self, input: NewProduct) -> Result<Product> {
        input.validate()?;

        let now = bson::DateTime::now();
        let doc = ProductDocument {
            id: ObjectId::new(),
            name: input.name,
            image: input.image,
            rating: input.rating,
            description: input.description,
            legacy_desc: None,
            price: input.price,
            created_at: now,
            updated_at: now,
        };
        self.collection.insert_one(&doc).await?;

        info!(product_id = %doc.id, "Product created");
        Ok(doc.into())
    }

    #[instrument(skip(self, update))]
    async fn update_by_id(&self, id: &str, update: ProductUpdate) -> Result<Product> {
        let oid = parse_object_id(id)?;
        update.validate()?;

        let updated = self
            .collection
            .find_one_and_update(
                doc! { "_id": oid },
                Self::update_document(update, bson::DateTime::now()),
            )
            .return_document(ReturnDocument::After)
            .projection(projection())
            .await?
            .ok_or_else(|| ApiError::NotFound(id.to_string()))?;

        info!(product_id = %id, "Product updated");
        Ok(updated.into())
    }

    #[instrument(skip(self))]
    async fn delete_by_id(&self, id: &str) -> Result<Product> {
        let oid = parse_object_id(id)?;

        let deleted = self
            .collection
            .find_one_and_delete(doc! { "_id": oid })
            .await?
            .ok_or_else(|| ApiError::NotFound(id.to_string()))?;

        info!(product_id = %id, "Product deleted");
        Ok(deleted.into())
    }
}

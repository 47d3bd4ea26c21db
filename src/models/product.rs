//! Product records and the payloads that create or modify them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// A product as returned to clients.
///
/// `id` is assigned by the store on creation and never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /products`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate)]
pub struct NewProduct {
    #[validate(length(max = 200), custom(function = "not_blank"))]
    pub name: String,
    pub image: Option<String>,
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: Option<f64>,
    #[serde(alias = "desc")]
    pub description: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
}

/// Body of `PATCH /products/:id`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate)]
pub struct ProductUpdate {
    #[validate(length(max = 200), custom(function = "not_blank"))]
    pub name: Option<String>,
    pub image: Option<String>,
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: Option<f64>,
    #[serde(alias = "desc")]
    pub description: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

impl Product {
    /// Builds a stored record from a validated payload.
    pub fn new(id: String, input: NewProduct, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: input.name,
            image: input.image,
            rating: input.rating,
            description: input.description,
            price: input.price,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a partial update and bumps `updated_at`.
    ///
    /// `updated_at` never moves backwards, even if the clock does.
    pub fn apply_update(&mut self, update: ProductUpdate, now: DateTime<Utc>) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(image) = update.image {
            self.image = Some(image);
        }
        if let Some(rating) = update.rating {
            self.rating = Some(rating);
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(price) = update.price {
            self.price = Some(price);
        }
        self.updated_at = self.updated_at.max(now);
    }
}

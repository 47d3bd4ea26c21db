//! Query Builder
//!
//! Turns search parameters into a filter and a sort the repository can run.

use std::cmp::Ordering;

use serde::Serialize;

use crate::error::{ApiError, Result};
use crate::models::{Product, SearchParams};

/// Conjunction of optional predicates. Any subset may be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    /// Free-text term, matched by the store's text search
    pub search: Option<String>,
    /// `rating >= min_rating`
    pub min_rating: Option<i64>,
    /// `price >= min_price`
    pub min_price: Option<f64>,
    /// `price <= max_price`
    pub max_price: Option<f64>,
}

impl FilterSpec {
    pub fn is_empty(&self) -> bool {
        self.search.is_none()
            && self.min_rating.is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
    }

    /// Evaluates the filter against a record.
    ///
    /// Text search is approximated as a case-insensitive substring match on
    /// name and description. A record without a rating or price never
    /// satisfies a bound on that field.
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            let in_name = product.name.to_lowercase().contains(&term);
            let in_description = product
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&term));
            if !in_name && !in_description {
                return false;
            }
        }
        if let Some(min) = self.min_rating {
            if !product.rating.is_some_and(|r| r >= min as f64) {
                return false;
            }
        }
        if let Some(min) = self.min_price {
            if !product.price.is_some_and(|p| p >= min) {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if !product.price.is_some_and(|p| p <= max) {
                return false;
            }
        }
        true
    }
}

/// Fields a client may sort by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Name,
    Price,
    Rating,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "name" => Ok(SortField::Name),
            "price" => Ok(SortField::Price),
            "rating" => Ok(SortField::Rating),
            "createdAt" => Ok(SortField::CreatedAt),
            "updatedAt" => Ok(SortField::UpdatedAt),
            other => Err(ApiError::Validation(format!(
                "sortField must be one of name, price, rating, createdAt, updatedAt; got '{}'",
                other
            ))),
        }
    }

    /// Field name as stored in the document.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Price => "price",
            SortField::Rating => "rating",
            SortField::CreatedAt => "createdAt",
            SortField::UpdatedAt => "updatedAt",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SortSpec {
    pub field: SortField,
    pub order: SortOrder,
}

impl Default for SortSpec {
    /// Newest first.
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            order: SortOrder::Desc,
        }
    }
}

impl SortSpec {
    /// Orders two records; missing values sort before present ones ascending.
    pub fn compare(&self, a: &Product, b: &Product) -> Ordering {
        let ordering = match self.field {
            SortField::Name => a.name.cmp(&b.name),
            SortField::Price => cmp_optional(a.price, b.price),
            SortField::Rating => cmp_optional(a.rating, b.rating),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        };
        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

fn cmp_optional(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Builds the filter and sort for a search request.
///
/// Empty parameters count as absent. Non-numeric `rating`, `priceMin` or
/// `priceMax`, a non-integer `rating`, and a `sortField` outside the
/// allow-list are rejected. `sortOrder` other than `desc` means ascending.
pub fn build_query(params: &SearchParams) -> Result<(FilterSpec, SortSpec)> {
    let filter = FilterSpec {
        search: non_empty(&params.search).map(String::from),
        min_rating: non_empty(&params.rating)
            .map(|raw| {
                raw.parse::<i64>().map_err(|_| {
                    ApiError::Validation(format!("rating must be an integer, got '{}'", raw))
                })
            })
            .transpose()?,
        min_price: parse_price("priceMin", &params.price_min)?,
        max_price: parse_price("priceMax", &params.price_max)?,
    };

    let sort = match non_empty(&params.sort_field) {
        Some(field) => SortSpec {
            field: SortField::parse(field)?,
            order: if non_empty(&params.sort_order) == Some("desc") {
                SortOrder::Desc
            } else {
                SortOrder::Asc
            },
        },
        None => SortSpec::default(),
    };

    Ok((filter, sort))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_price(name: &str, raw: &Option<String>) -> Result<Option<f64>> {
    let Some(raw) = non_empty(raw) else {
        return Ok(None);
    };
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(ApiError::Validation(format!(
            "{} must be a finite number, got '{}'",
            name, raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use proptest::prelude::*;

    fn product(name: &str, price: Option<f64>, rating: Option<f64>) -> Product {
        let now = Utc::now();
        Product {
            id: format!("id-{}", name),
            name: name.to_string(),
            image: None,
            rating,
            description: None,
            price,
            created_at: now,
            updated_at: now,
        }
    }

    fn params(pairs: &[(&str, &str)]) -> SearchParams {
        let map: serde_json::Map<String, serde_json::Value> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect();
        serde_json::from_value(serde_json::Value::Object(map)).unwrap()
    }

    #[test]
    fn test_empty_params() {
        let (filter, sort) = build_query(&SearchParams::default()).unwrap();
        assert!(filter.is_empty());
        assert_eq!(sort, SortSpec::default());
        assert_eq!(sort.order, SortOrder::Desc);
        assert_eq!(sort.field, SortField::CreatedAt);
    }

    #[test]
    fn test_all_predicates() {
        let (filter, _) = build_query(&params(&[
            ("search", "lamp"),
            ("rating", "4"),
            ("priceMin", "10"),
            ("priceMax", "50.5"),
        ]))
        .unwrap();

        assert_eq!(filter.search.as_deref(), Some("lamp"));
        assert_eq!(filter.min_rating, Some(4));
        assert_eq!(filter.min_price, Some(10.0));
        assert_eq!(filter.max_price, Some(50.5));
    }

    #[test]
    fn test_empty_strings_are_absent() {
        let (filter, sort) =
            build_query(&params(&[("search", ""), ("rating", " "), ("sortField", "")])).unwrap();
        assert!(filter.is_empty());
        assert_eq!(sort, SortSpec::default());
    }

    #[test]
    fn test_rejects_non_numeric() {
        for pairs in [
            vec![("rating", "high")],
            vec![("rating", "4.5")],
            vec![("priceMin", "cheap")],
            vec![("priceMax", "NaN")],
            vec![("priceMax", "inf")],
        ] {
            let result = build_query(&params(&pairs));
            assert!(
                matches!(result, Err(ApiError::Validation(_))),
                "{:?} should be rejected",
                pairs
            );
        }
    }

    #[test]
    fn test_sort_order() {
        let (_, sort) = build_query(&params(&[("sortField", "price")])).unwrap();
        assert_eq!(sort, SortSpec { field: SortField::Price, order: SortOrder::Asc });

        let (_, sort) =
            build_query(&params(&[("sortField", "rating"), ("sortOrder", "desc")])).unwrap();
        assert_eq!(sort, SortSpec { field: SortField::Rating, order: SortOrder::Desc });

        let (_, sort) =
            build_query(&params(&[("sortField", "name"), ("sortOrder", "sideways")])).unwrap();
        assert_eq!(sort.order, SortOrder::Asc);
    }

    #[test]
    fn test_sort_field_allow_list() {
        let result = build_query(&params(&[("sortField", "$where")]));
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_price_and_rating_composition() {
        let (filter, _) = build_query(&params(&[
            ("priceMin", "10"),
            ("priceMax", "50"),
            ("rating", "4"),
        ]))
        .unwrap();

        assert!(filter.matches(&product("a", Some(10.0), Some(4.0))));
        assert!(filter.matches(&product("b", Some(50.0), Some(5.0))));
        assert!(!filter.matches(&product("c", Some(9.99), Some(5.0))));
        assert!(!filter.matches(&product("d", Some(50.01), Some(5.0))));
        assert!(!filter.matches(&product("e", Some(30.0), Some(3.9))));
        assert!(!filter.matches(&product("f", None, Some(5.0))));
        assert!(!filter.matches(&product("g", Some(30.0), None)));
    }

    #[test]
    fn test_search_matches_name_and_description() {
        let filter = FilterSpec {
            search: Some("LAMP".to_string()),
            ..Default::default()
        };
        let mut described = product("Shade", None, None);
        described.description = Some("fits any lamp".to_string());

        assert!(filter.matches(&product("Desk Lamp", None, None)));
        assert!(filter.matches(&described));
        assert!(!filter.matches(&product("Chair", None, None)));
    }

    #[test]
    fn test_compare() {
        let mut older = product("b", Some(2.0), None);
        let newer = product("a", None, Some(1.0));
        older.created_at = newer.created_at - Duration::seconds(10);

        assert_eq!(SortSpec::default().compare(&newer, &older), Ordering::Less);

        let by_price = SortSpec { field: SortField::Price, order: SortOrder::Asc };
        assert_eq!(by_price.compare(&newer, &older), Ordering::Less, "missing price first");

        let by_name = SortSpec { field: SortField::Name, order: SortOrder::Desc };
        assert_eq!(by_name.compare(&older, &newer), Ordering::Less);
    }

    proptest! {
        #[test]
        fn prop_filter_matches_bounds(
            min in 0.0f64..500.0,
            span in 0.0f64..500.0,
            rating in 0i64..=5,
            price in 0.0f64..1_000.0,
            product_rating in 0.0f64..=5.0,
        ) {
            let filter = FilterSpec {
                search: None,
                min_rating: Some(rating),
                min_price: Some(min),
                max_price: Some(min + span),
            };
            let expected = price >= min && price <= min + span && product_rating >= rating as f64;

            prop_assert_eq!(
                filter.matches(&product("p", Some(price), Some(product_rating))),
                expected
            );
        }
    }
}

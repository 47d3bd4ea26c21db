//! Raw query parameters for the read endpoints
//!
//! Everything arrives as text; [`crate::catalog`] turns these into typed
//! queries and rejects malformed numbers.

use serde::Deserialize;

/// Query string of `GET /products`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Query string of `GET /products/search`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub search: Option<String>,
    pub rating: Option<String>,
    pub price_min: Option<String>,
    pub price_max: Option<String>,
    pub sort_field: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_params_camel_case() {
        let params: SearchParams = serde_json::from_str(
            r#"{"search": "lamp", "priceMin": "10", "priceMax": "50", "sortField": "price", "sortOrder": "desc"}"#,
        )
        .unwrap();

        assert_eq!(params.search.as_deref(), Some("lamp"));
        assert_eq!(params.price_min.as_deref(), Some("10"));
        assert_eq!(params.price_max.as_deref(), Some("50"));
        assert_eq!(params.sort_field.as_deref(), Some("price"));
        assert_eq!(params.sort_order.as_deref(), Some("desc"));
        assert!(params.page.is_none());
    }

    #[test]
    fn test_list_params_ignore_unknown() {
        let params: ListParams =
            serde_json::from_str(r#"{"page": "2", "limit": "5", "extra": "x"}"#).unwrap();
        assert_eq!(params.page.as_deref(), Some("2"));
        assert_eq!(params.limit.as_deref(), Some("5"));
    }
}

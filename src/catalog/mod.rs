//! Catalog Query Module
//!
//! Search query construction and pagination for the product read endpoints.

mod pagination;
mod query;

pub use pagination::{paginate, PageRequest, PaginationMeta};
pub use query::{build_query, FilterSpec, SortField, SortOrder, SortSpec};

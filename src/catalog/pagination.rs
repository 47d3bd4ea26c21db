//! Pagination Calculator
//!
//! Page/limit parsing and the metadata attached to every product page.

use serde::{Deserialize, Serialize};

use crate::config::PaginationConfig;
use crate::error::{ApiError, Result};

/// A validated page request: `page >= 1`, `1 <= limit <= max_limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    pub fn new(page: u64, limit: u64) -> Result<Self> {
        if page == 0 {
            return Err(ApiError::Validation("page must be at least 1".to_string()));
        }
        if limit == 0 {
            return Err(ApiError::Validation("limit must be at least 1".to_string()));
        }
        // Stores take the offset as a signed 64-bit integer
        let in_range = (page - 1)
            .checked_mul(limit)
            .is_some_and(|skip| i64::try_from(skip).is_ok());
        if !in_range {
            return Err(ApiError::Validation(format!(
                "page {} is out of range for limit {}",
                page, limit
            )));
        }
        Ok(Self { page, limit })
    }

    /// Parses raw `page`/`limit` query values.
    ///
    /// Missing or empty values fall back to the configured defaults,
    /// non-numeric or zero values are rejected, and a limit above the
    /// configured maximum is clamped down to it.
    pub fn from_params(
        page: Option<&str>,
        limit: Option<&str>,
        config: &PaginationConfig,
    ) -> Result<Self> {
        let page = parse_positive("page", page)?.unwrap_or(config.default_page);
        let limit = parse_positive("limit", limit)?.unwrap_or(config.default_limit);
        Self::new(page, limit.min(config.max_limit.max(1)))
    }

    /// Number of records to skip before this page.
    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

fn parse_positive(name: &str, raw: Option<&str>) -> Result<Option<u64>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    match raw.parse::<u64>() {
        Ok(0) | Err(_) => Err(ApiError::Validation(format!(
            "{} must be a positive integer, got '{}'",
            name, raw
        ))),
        Ok(value) => Ok(Some(value)),
    }
}

/// Derived page metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

/// Computes page metadata. A zero `limit` or `page` is a validation error.
pub fn paginate(page: u64, limit: u64, total_items: u64) -> Result<PaginationMeta> {
    let request = PageRequest::new(page, limit)?;
    Ok(request.metadata(total_items))
}

impl PageRequest {
    pub fn metadata(&self, total_items: u64) -> PaginationMeta {
        PaginationMeta {
            current_page: self.page,
            total_pages: total_items.div_ceil(self.limit),
            total_items,
            has_next: self.page.saturating_mul(self.limit) < total_items,
            has_prev: self.page > 1,
        }
    }
}

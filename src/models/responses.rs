//! Response DTOs for the catalog API
//!
//! Defines the structure of outgoing HTTP response bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::CacheStats;
use crate::catalog::PaginationMeta;
use crate::models::Product;

/// Body of the list and search endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub pagination: PaginationMeta,
}

/// Body returned after a create or update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductResponse {
    pub msg: String,
    pub product: Product,
}

impl ProductResponse {
    pub fn created(product: Product) -> Self {
        Self {
            msg: "Product created successfully".to_string(),
            product,
        }
    }

    pub fn updated(product: Product) -> Self {
        Self {
            msg: "Product updated successfully".to_string(),
            product,
        }
    }
}

/// Body returned after a delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub msg: String,
    pub id: String,
}

impl DeleteResponse {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            msg: "Product deleted successfully".to_string(),
            id: id.into(),
        }
    }
}

/// Response body for `GET /cache/stats`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            stats,
        }
    }
}

/// Resident memory of the process in MiB.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    pub rss_mb: f64,
}

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    /// Seconds since startup, two decimals
    pub uptime: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryUsage>,
    pub environment: String,
    pub version: String,
}

impl HealthResponse {
    pub fn healthy(uptime_secs: f64, environment: impl Into<String>) -> Self {
        Self {
            status: "OK".to_string(),
            timestamp: Utc::now(),
            uptime: (uptime_secs * 100.0).round() / 100.0,
            memory: MemoryUsage::current(),
            environment: environment.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl MemoryUsage {
    /// Reads the resident set size from procfs where available.
    #[cfg(target_os = "linux")]
    pub fn current() -> Option<Self> {
        let status = std::fs::read_to_string("/proc/self/status").ok()?;
        let kib: f64 = status
            .lines()
            .find_map(|line| line.strip_prefix("VmRSS:"))?
            .trim()
            .trim_end_matches("kB")
            .trim()
            .parse()
            .ok()?;
        Some(Self {
            rss_mb: (kib / 1024.0 * 100.0).round() / 100.0,
        })
    }

    #[cfg(not(target_os = "linux"))]
    pub fn current() -> Option<Self> {
        None
    }
}

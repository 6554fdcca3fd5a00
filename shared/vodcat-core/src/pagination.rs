//! Pagination math
//!
//! Page counts are always recomputed from the backend's total so that every listing rounds the
//! same way, whatever page count the backend reports.

use crate::{CatalogError, Result};
use serde::{Deserialize, Serialize};

/// 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Result<Self> {
        if page == 0 {
            return Err(CatalogError::InvalidRequest(
                "page numbers start at 1".to_string(),
            ));
        }
        if page_size == 0 {
            return Err(CatalogError::InvalidRequest(
                "page size must be positive".to_string(),
            ));
        }
        Ok(Self { page, page_size })
    }

    pub fn first(page_size: u32) -> Result<Self> {
        Self::new(1, page_size)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn total_pages(&self, total: u64) -> u32 {
        total_pages(total, self.page_size)
    }

    /// True when this page lies past the last page for `total` items
    pub fn is_beyond(&self, total: u64) -> bool {
        self.page > self.total_pages(total)
    }
}

/// `ceil(total / page_size)`; zero when `page_size` is zero
pub fn total_pages(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = total.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

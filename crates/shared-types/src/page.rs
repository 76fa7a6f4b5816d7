//! Pagination request/result shapes for listing operations.

use serde::{Deserialize, Serialize};

/// First page requested when the caller gives none.
pub const DEFAULT_PAGE: u32 = 1;
/// Page size used when the caller gives none.
pub const DEFAULT_LIMIT: u32 = 20;

/// Page window for a listing call. Zero or absent values normalize to the
/// defaults, so a decoded request is always usable as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }.normalized()
    }

    /// Replace zeroes with the defaults.
    pub fn normalized(self) -> Self {
        Self {
            page: if self.page == 0 { DEFAULT_PAGE } else { self.page },
            limit: if self.limit == 0 {
                DEFAULT_LIMIT
            } else {
                self.limit
            },
        }
    }

    /// Index of the first record in this window.
    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }
}

/// One page of results plus the bookkeeping the caller needs to page on.
///
/// `pages` is always `ceil(total / limit)` at the moment of computation;
/// `page` and `limit` echo the request unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub pages: u64,
}

impl<T> PageResult<T> {
    pub fn new(data: Vec<T>, total: u64, request: PageRequest) -> Self {
        let request = request.normalized();
        Self {
            data,
            total,
            page: request.page,
            limit: request.limit,
            pages: total.div_ceil(request.limit as u64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count_rounds_up() {
        let result = PageResult::new(vec![0u8; 20], 45, PageRequest::new(1, 20));
        assert_eq!(result.pages, 3);
        assert_eq!(result.page, 1);
        assert_eq!(result.limit, 20);
    }

    #[test]
    fn test_empty_listing_has_zero_pages() {
        let result = PageResult::<u8>::new(vec![], 0, PageRequest::default());
        assert_eq!(result.pages, 0);
        assert_eq!(result.total, 0);
    }

    #[test]
    fn test_exact_multiple_does_not_add_a_page() {
        let result = PageResult::<u8>::new(vec![], 40, PageRequest::new(2, 20));
        assert_eq!(result.pages, 2);
        assert_eq!(result.page, 2);
    }

    #[test]
    fn test_zero_values_normalize_to_defaults() {
        let request = PageRequest::new(0, 0);
        assert_eq!(request.page, DEFAULT_PAGE);
        assert_eq!(request.limit, DEFAULT_LIMIT);
        assert_eq!(request.offset(), 0);
    }

    #[test]
    fn test_offset_steps_by_limit() {
        assert_eq!(PageRequest::new(3, 10).offset(), 20);
    }

    #[test]
    fn test_missing_fields_decode_to_defaults() {
        let request: PageRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request, PageRequest::default());
    }
}

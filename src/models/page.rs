//! Pagination primitives shared by the stores and the API

use serde::Deserialize;

pub const DEFAULT_PER_PAGE: i64 = 20;
pub const MAX_PER_PAGE: i64 = 100;

/// 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    /// Build a request from optional query values, clamping out-of-range input
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE),
        }
    }

    /// Rows to skip; saturates so far-out pages come back empty
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    /// Cut the requested window out of an already filtered, ordered list
    pub fn slice<T: Clone>(&self, all: &[T]) -> Page<T> {
        let start = usize::try_from(self.offset()).unwrap_or(usize::MAX).min(all.len());
        let end = start.saturating_add(self.per_page as usize).min(all.len());
        Page {
            items: all[start..end].to_vec(),
            total: all.len() as i64,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results plus the total number of matches
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_bad_input() {
        let req = PageRequest::new(Some(0), Some(1_000));
        assert_eq!(req.page, 1);
        assert_eq!(req.per_page, MAX_PER_PAGE);
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn slice_past_the_end_is_empty() {
        let req = PageRequest::new(Some(3), Some(2));
        let page = req.slice(&[1, 2, 3, 4, 5]);
        assert_eq!(page.items, vec![5]);
        assert_eq!(page.total, 5);

        let page = PageRequest::new(Some(9), Some(2)).slice(&[1, 2, 3]);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 3);
    }

    #[test]
    fn huge_page_is_empty_instead_of_overflowing() {
        let req = PageRequest::new(Some(i64::MAX), None);
        assert_eq!(req.offset(), i64::MAX);

        let page = req.slice(&[1, 2, 3]);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 3);
    }
}

//! Pagination state.

use std::ops::Range;

use serde::Deserialize;
use serde::Serialize;

/// Default page size when pagination is enabled without one.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Page bookkeeping.
///
/// `total_pages` is always `max(1, ceil(total_rows / page_size))` and
/// `current_page` is always clamped into `0..total_pages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationState {
    /// Whether rows are paginated at all.
    pub enabled: bool,
    /// Rows per page (never zero).
    pub page_size: usize,
    /// Zero-based current page.
    pub current_page: usize,
    /// Rows available before slicing.
    pub total_rows: usize,
    /// Number of pages.
    pub total_pages: usize,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new(false, DEFAULT_PAGE_SIZE)
    }
}

impl PaginationState {
    /// Creates pagination with no rows.
    pub fn new(enabled: bool, page_size: usize) -> Self {
        Self {
            enabled,
            page_size: page_size.max(1),
            current_page: 0,
            total_rows: 0,
            total_pages: 1,
        }
    }

    /// Updates the row count and re-clamps the current page.
    pub fn set_total_rows(&mut self, total_rows: usize) {
        self.total_rows = total_rows;
        self.total_pages = total_rows.div_ceil(self.page_size).max(1);
        self.clamp();
    }

    /// Moves to a page, clamped into range.
    pub fn set_page(&mut self, page: usize) {
        self.current_page = page;
        self.clamp();
    }

    /// Changes the page size; zero is treated as one.
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.set_total_rows(self.total_rows);
    }

    /// Returns the slice of the row list shown on the current page.
    ///
    /// Disabled pagination shows every row.
    pub fn page_range(&self) -> Range<usize> {
        if !self.enabled {
            return 0..self.total_rows;
        }
        let start = (self.current_page * self.page_size).min(self.total_rows);
        let end = (start + self.page_size).min(self.total_rows);
        start..end
    }

    fn clamp(&mut self) {
        self.current_page = self.current_page.min(self.total_pages - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_minimum_one() {
        let mut state = PaginationState::new(true, 10);
        state.set_total_rows(0);
        assert_eq!(state.total_pages, 1);
        state.set_total_rows(21);
        assert_eq!(state.total_pages, 3);
    }

    #[test]
    fn test_current_page_clamped() {
        let mut state = PaginationState::new(true, 10);
        state.set_total_rows(25);
        state.set_page(9);
        assert_eq!(state.current_page, 2);
        state.set_total_rows(5);
        assert_eq!(state.current_page, 0);
    }

    #[test]
    fn test_page_range() {
        let mut state = PaginationState::new(true, 10);
        state.set_total_rows(25);
        state.set_page(2);
        assert_eq!(state.page_range(), 20..25);
        state.enabled = false;
        assert_eq!(state.page_range(), 0..25);
    }

    #[test]
    fn test_zero_page_size() {
        let mut state = PaginationState::new(true, 0);
        state.set_total_rows(3);
        assert_eq!(state.page_size, 1);
        assert_eq!(state.total_pages, 3);
    }
}

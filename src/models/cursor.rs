//! Offset cursor driving result-set pagination.

use serde::Serialize;

/// Pagination metadata reported by the server with every results page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    /// Total number of listings matching the query.
    pub total_count: u64,
    /// Number of listings the server puts on one page.
    pub page_size: u64,
}

/// Position within the result set, as known after a page was read.
///
/// Values are only ever produced from the previous cursor and fresh
/// [`PageMeta`]; nothing mutates a cursor in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageCursor {
    pub start_position: u64,
    pub page_size: u64,
    pub total_count: u64,
}

impl PageCursor {
    /// Cursor for a page fetched at `start_position` that reported `meta`.
    pub fn new(start_position: u64, meta: PageMeta) -> Self {
        Self {
            start_position,
            page_size: meta.page_size,
            total_count: meta.total_count,
        }
    }

    /// Start position of the page after this one.
    pub fn next_position(&self) -> u64 {
        self.start_position.saturating_add(self.page_size)
    }

    /// Whether the page at [`next_position`](Self::next_position) is still requested.
    ///
    /// The bound is inclusive, so a result set whose size is an exact multiple of
    /// the page size ends with one request past the last listing.
    pub fn has_next(&self) -> bool {
        self.page_size > 0 && self.next_position() <= self.total_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(total_count: u64, page_size: u64) -> PageMeta {
        PageMeta {
            total_count,
            page_size,
        }
    }

    #[test]
    fn test_next_position_adds_page_size() {
        let cursor = PageCursor::new(40, meta(100, 20));
        assert_eq!(cursor.next_position(), 60);
    }

    #[test]
    fn test_has_next_is_inclusive_of_total() {
        assert!(PageCursor::new(50, meta(100, 50)).has_next());
        assert!(!PageCursor::new(100, meta(100, 50)).has_next());
    }

    #[test]
    fn test_zero_page_size_never_continues() {
        assert!(!PageCursor::new(0, meta(100, 0)).has_next());
    }
}

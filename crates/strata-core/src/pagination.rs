//! Page descriptors for named-query execution.
//!
//! A page request asks for `result_limit` rows starting at `first_result`.
//! When the requested size is within bounds, one extra row is fetched so the
//! caller can tell whether another page follows: if more than `result_limit`
//! rows come back, there is a next page. Out-of-range sizes fall back to a
//! full page of [`MAX_PAGE_SIZE`] rows without the extra row.

use serde::{Deserialize, Serialize};

/// Upper bound on the number of rows a single named query may return.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Clamps a requested page size to the row limit actually sent to storage.
///
/// `<= 0` and `> MAX_PAGE_SIZE` become `MAX_PAGE_SIZE`; anything else gets one
/// extra lookahead row.
#[must_use]
pub const fn effective_limit(result_limit: i64) -> i64 {
    if result_limit <= 0 || result_limit > MAX_PAGE_SIZE {
        MAX_PAGE_SIZE
    } else {
        result_limit + 1
    }
}

/// The `(first_result, result_limit)` pair describing a sub-range of an
/// ordered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDescriptor {
    /// Zero-based offset of the first row.
    pub first_result: u64,
    /// Requested number of rows. Zero or negative means "a full page".
    pub result_limit: i64,
}

impl PageDescriptor {
    /// Creates a page descriptor.
    #[must_use]
    pub const fn new(first_result: u64, result_limit: i64) -> Self {
        Self {
            first_result,
            result_limit,
        }
    }

    /// A full page from the first row.
    #[must_use]
    pub const fn first() -> Self {
        Self::new(0, 0)
    }

    /// Returns the row limit sent to storage.
    #[must_use]
    pub const fn limit(&self) -> i64 {
        effective_limit(self.result_limit)
    }

    /// Returns the offset sent to storage.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.first_result
    }

    /// Whether the limit includes the extra has-next lookahead row.
    #[must_use]
    pub const fn has_lookahead_row(&self) -> bool {
        self.result_limit > 0 && self.result_limit <= MAX_PAGE_SIZE
    }

    /// Descriptor for the page that follows `returned` rows of this one.
    #[must_use]
    pub const fn next(&self, returned: usize) -> Self {
        Self::new(
            self.first_result.saturating_add(returned as u64),
            self.result_limit,
        )
    }
}

impl Default for PageDescriptor {
    fn default() -> Self {
        Self::first()
    }
}

/// A page of results with the lookahead row already consumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slice<T> {
    /// The rows of this page.
    pub content: Vec<T>,
    /// Offset of the first row of this page.
    pub first_result: u64,
    /// Whether another page follows.
    ///
    /// Exact when the request carried a lookahead row. For full-page requests it
    /// is `true` whenever the page came back full.
    pub has_next: bool,
}

impl<T> Slice<T> {
    /// Builds a slice from rows fetched with `page`, dropping the lookahead row.
    #[must_use]
    pub fn from_lookahead(mut rows: Vec<T>, page: PageDescriptor) -> Self {
        let has_next = if page.has_lookahead_row() {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let requested = page.result_limit as usize;
            let more = rows.len() > requested;
            rows.truncate(requested);
            more
        } else {
            i64::try_from(rows.len()).is_ok_and(|n| n >= MAX_PAGE_SIZE)
        };

        Self {
            content: rows,
            first_result: page.first_result,
            has_next,
        }
    }

    /// Returns the number of rows on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Returns true if the page is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Maps the page content to a different type.
    #[must_use]
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Slice<U> {
        Slice {
            content: self.content.into_iter().map(f).collect(),
            first_result: self.first_result,
            has_next: self.has_next,
        }
    }
}

impl<T> IntoIterator for Slice<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.content.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_positive_limit_is_full_page() {
        for requested in [0, -1, -100, i64::MIN] {
            assert_eq!(effective_limit(requested), MAX_PAGE_SIZE);
        }
    }

    #[test]
    fn test_in_range_limit_gets_lookahead_row() {
        for requested in 1..=MAX_PAGE_SIZE {
            assert_eq!(effective_limit(requested), requested + 1);
        }
    }

    #[test]
    fn test_oversized_limit_is_full_page() {
        for requested in [MAX_PAGE_SIZE + 1, 1_000, i64::MAX] {
            assert_eq!(effective_limit(requested), MAX_PAGE_SIZE);
        }
    }

    #[test]
    fn test_page_descriptor_defaults() {
        let page = PageDescriptor::default();
        assert_eq!(page.offset(), 0);
        assert_eq!(page.limit(), MAX_PAGE_SIZE);
        assert!(!page.has_lookahead_row());
    }

    #[test]
    fn test_page_descriptor_next() {
        let page = PageDescriptor::new(20, 10);
        let next = page.next(10);
        assert_eq!(next.first_result, 30);
        assert_eq!(next.result_limit, 10);
    }

    #[test]
    fn test_page_descriptor_next_saturates() {
        let page = PageDescriptor::new(u64::MAX - 3, 10);
        assert_eq!(page.next(10).first_result, u64::MAX);
    }

    #[test]
    fn test_slice_consumes_lookahead_row() {
        let rows: Vec<i32> = (0..11).collect();
        let slice = Slice::from_lookahead(rows, PageDescriptor::new(0, 10));
        assert_eq!(slice.len(), 10);
        assert!(slice.has_next);
        assert_eq!(slice.content.last(), Some(&9));
    }

    #[test]
    fn test_slice_last_page() {
        let rows: Vec<i32> = (0..5).collect();
        let slice = Slice::from_lookahead(rows, PageDescriptor::new(10, 10));
        assert_eq!(slice.len(), 5);
        assert!(!slice.has_next);
        assert_eq!(slice.first_result, 10);
    }

    #[test]
    fn test_slice_full_page_without_lookahead() {
        let rows: Vec<i64> = (0..MAX_PAGE_SIZE).collect();
        let slice = Slice::from_lookahead(rows, PageDescriptor::first());
        assert!(slice.has_next);

        let slice = Slice::from_lookahead(vec![1, 2, 3], PageDescriptor::first());
        assert!(!slice.has_next);
    }

    #[test]
    fn test_slice_map() {
        let slice =
            Slice::from_lookahead(vec![1, 2, 3], PageDescriptor::new(0, 2)).map(|x| x * 10);
        assert_eq!(slice.content, vec![10, 20]);
        assert!(slice.has_next);
    }
}

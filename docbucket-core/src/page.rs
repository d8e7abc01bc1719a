//! Serializable result pages.
//!
//! A [`Page`] is the response shape for a paginated query: the matched items, how
//! many there are, and the pagination cursor to pass as `skip` on the next call.

use serde::{Deserialize, Serialize};

/// A single page of query results.
///
/// `next` counts records *visited* by the scan that produced this page, not
/// records matched, so feeding it back as the next query's `skip` resumes exactly
/// where this page stopped.
///
/// # Example
///
/// ```ignore
/// use docbucket::page::Page;
///
/// let page: Page<String> = Page::builder(vec!["Pineapple".to_string()])
///     .with_next(4)
///     .build();
///
/// assert_eq!(page.count, 1);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// The items contained in this page.
    pub result: Vec<T>,
    /// Number of items in this page.
    pub count: usize,
    /// Pagination cursor for the following page.
    pub next: usize,
}

impl<T> Page<T> {
    /// Creates a new builder for constructing a page.
    pub fn builder(items: Vec<T>) -> PageBuilder<T> {
        PageBuilder::new(items)
    }

    /// Returns `true` if the page holds no items.
    pub fn is_empty(&self) -> bool {
        self.result.is_empty()
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self { result: Vec::new(), count: 0, next: 0 }
    }
}

/// Builder for constructing [`Page`] instances.
pub struct PageBuilder<T> {
    items: Vec<T>,
    next: usize,
}

impl<T> PageBuilder<T> {
    /// Creates a new builder with the given items.
    pub fn new(items: Vec<T>) -> Self {
        Self { items, next: 0 }
    }

    /// Sets the pagination cursor.
    pub fn with_next(mut self, next: usize) -> Self {
        self.next = next;
        self
    }

    /// Builds the page. An empty page always reports `next = 0`.
    pub fn build(self) -> Page<T> {
        if self.items.is_empty() {
            return Page::default();
        }
        Page { count: self.items.len(), result: self.items, next: self.next }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_items_and_keeps_cursor() {
        let page = Page::builder(vec![1, 2, 3]).with_next(7).build();
        assert_eq!(page.count, 3);
        assert_eq!(page.next, 7);
    }

    #[test]
    fn empty_pages_reset_cursor() {
        let page = Page::<u8>::builder(Vec::new()).with_next(7).build();
        assert_eq!(page, Page::default());
    }

    #[test]
    fn serializes_as_response_shape() {
        let page = Page::builder(vec!["Pineapple"]).with_next(4).build();
        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(value, serde_json::json!({ "result": ["Pineapple"], "count": 1, "next": 4 }));
    }
}

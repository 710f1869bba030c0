//! Page requests and page results
//!
//! A [`PageRequest`] describes which slice of an ordered result set a caller
//! wants. Stores answer with their own page type implementing [`NativePage`],
//! which [`Page::from_native`] copies into the store-independent [`Page`].
//!
//! # Example
//!
//! ```rust
//! use data_repository::repository::{Direction, Page, PageRequest, Slice, Sort};
//!
//! let request = PageRequest::of(2, 20, Sort::by(Direction::Ascending, ["id"]));
//! assert_eq!(request.offset(), 40);
//! assert_eq!(request.limit(), 20);
//!
//! let native = Slice::new(vec!["a", "b"], &PageRequest::of(0, 2, Sort::unsorted()), 5);
//! let page = Page::from_native(native);
//! assert_eq!(page.total_pages, 3);
//! assert!(page.has_next());
//! ```

use serde::{Deserialize, Serialize};

use super::sort::Sort;

/// Request for one page of an ordered result set
///
/// Page numbers start at zero. The request is a plain descriptor; stores
/// reject page sizes they cannot serve.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    /// Zero-based page index
    pub page_number: u64,
    /// Maximum number of records per page
    pub page_size: u64,
    /// Ordering applied before slicing
    #[serde(default)]
    pub sort: Sort,
}

impl PageRequest {
    /// Create a page request
    ///
    /// ```rust
    /// use data_repository::repository::{PageRequest, Sort};
    ///
    /// let first = PageRequest::of(0, 25, Sort::unsorted());
    /// assert_eq!(first.offset(), 0);
    /// ```
    #[must_use]
    pub const fn of(page_number: u64, page_size: u64, sort: Sort) -> Self {
        Self {
            page_number,
            page_size,
            sort,
        }
    }

    /// Number of records to skip
    pub const fn offset(&self) -> u64 {
        self.page_number.saturating_mul(self.page_size)
    }

    /// Maximum number of records to return
    pub const fn limit(&self) -> u64 {
        self.page_size
    }

    /// Request for the following page, same size and sort
    #[must_use]
    pub fn next(&self) -> Self {
        Self {
            page_number: self.page_number.saturating_add(1),
            page_size: self.page_size,
            sort: self.sort.clone(),
        }
    }
}

/// A page in a store's own representation
pub trait NativePage<V> {
    /// Records of this page, in order
    fn content(self) -> Vec<V>;
    /// Zero-based index of this page
    fn number(&self) -> u64;
    /// Requested page size
    fn size(&self) -> u64;
    /// Number of records across all pages
    fn total_elements(&self) -> u64;
    /// Number of pages, as computed by the store
    fn total_pages(&self) -> u64;
}

/// A bounded slice of an ordered result set plus its metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<V> {
    /// Records of this page, at most `page_size` of them
    pub content: Vec<V>,
    /// Zero-based index of this page
    pub page_number: u64,
    /// Requested page size
    pub page_size: u64,
    /// Number of records across all pages
    pub total_elements: u64,
    /// Number of pages
    pub total_pages: u64,
}

impl<V> Page<V> {
    /// Copy a store's native page.
    ///
    /// Every field is taken from the native page as-is; nothing is
    /// recomputed.
    pub fn from_native<P: NativePage<V>>(native: P) -> Self {
        let page_number = native.number();
        let page_size = native.size();
        let total_elements = native.total_elements();
        let total_pages = native.total_pages();
        Self {
            content: native.content(),
            page_number,
            page_size,
            total_elements,
            total_pages,
        }
    }

    /// An empty page answering `request`
    pub fn empty(request: &PageRequest) -> Self {
        Self {
            content: Vec::new(),
            page_number: request.page_number,
            page_size: request.page_size,
            total_elements: 0,
            total_pages: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.page_number.saturating_add(1) < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page_number > 0
    }

    /// Transform the records, keeping the metadata
    pub fn map<U, F: FnMut(V) -> U>(self, f: F) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page_number: self.page_number,
            page_size: self.page_size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }

    pub fn into_content(self) -> Vec<V> {
        self.content
    }
}

impl<V> NativePage<V> for Page<V> {
    fn content(self) -> Vec<V> {
        self.content
    }

    fn number(&self) -> u64 {
        self.page_number
    }

    fn size(&self) -> u64 {
        self.page_size
    }

    fn total_elements(&self) -> u64 {
        self.total_elements
    }

    fn total_pages(&self) -> u64 {
        self.total_pages
    }
}

/// Native page of offset-based stores
///
/// Computes `total_pages` as `ceil(total_elements / page_size)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slice<V> {
    content: Vec<V>,
    number: u64,
    size: u64,
    total_elements: u64,
}

impl<V> Slice<V> {
    pub fn new(content: Vec<V>, request: &PageRequest, total_elements: u64) -> Self {
        Self {
            content,
            number: request.page_number,
            size: request.page_size,
            total_elements,
        }
    }
}

impl<V> NativePage<V> for Slice<V> {
    fn content(self) -> Vec<V> {
        self.content
    }

    fn number(&self) -> u64 {
        self.number
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn total_elements(&self) -> u64 {
        self.total_elements
    }

    fn total_pages(&self) -> u64 {
        if self.size == 0 {
            0
        } else {
            self.total_elements.div_ceil(self.size)
        }
    }
}

//! Generic repository adaptor over pluggable persistence stores
//!
//! This module turns a store's native capabilities into a uniform,
//! store-agnostic repository interface.
//!
//! # Features
//!
//! - **Uniform CRUD**: [`DataRepository`] with find, insert, update and delete
//! - **Sorting**: [`Sort`] built from field names and a [`Direction`], with
//!   configured default fields, and [`build_comparator`] for stores that sort
//!   in memory
//! - **Pagination**: [`PageRequest`] in, [`Page`] out, whatever the store's
//!   native page looks like ([`NativePage`])
//! - **Query filtering**: [`QueryParser`] implementations plugged in through
//!   [`QueryPredicateAdapter`]
//! - **All-or-nothing batch delete**: [`DataRepositoryAdaptor::delete_all`]
//!   runs inside a [`StoreTransaction`]
//! - **Versioned saves**: [`VersionedSave`] for append-only records
//!
//! # Example
//!
//! ```rust,ignore
//! use data_repository::repository::{DataRepository, DataRepositoryAdaptor, Direction};
//!
//! let users = DataRepositoryAdaptor::new(PgUserStore::new(pool), ["id"]);
//!
//! let page = users
//!     .find_where_paged("status=active", 0, 20, &["last_name"], Direction::Ascending)
//!     .await?;
//! for user in page.content {
//!     println!("{}", user.last_name);
//! }
//!
//! // Removes all three or none of them
//! let removed = users.delete_all(&[id1, id2, id3]).await?;
//! ```

mod accessor;
mod adaptor;
mod comparator;
mod crud;
mod error;
mod pagination;
mod query;
mod sort;
mod store;
mod versioned;

// Re-export all public types
pub use accessor::{Accessor, Accessors, FieldValue};
pub use adaptor::{DataRepository, DataRepositoryAdaptor};
pub use comparator::{build_comparator, Comparator};
pub use crud::CrudRepositoryAdaptor;
pub use error::{
    RepositoryError, RepositoryResult, StoreError, StoreErrorKind, StoreOperation,
};
pub use pagination::{NativePage, Page, PageRequest, Slice};
pub use query::{Predicate, QueryParseError, QueryParser, QueryPredicateAdapter};
pub use sort::{build_sort, Direction, Order, ParseDirectionError, Sort};
pub use store::{Identifiable, PagingStore, StoreResult, StoreTransaction, TransactionalStore};
pub use versioned::{RecordVersion, Versioned, VersionedRecord, VersionedSave};

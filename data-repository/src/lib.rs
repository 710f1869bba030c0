//! # data-repository
//!
//! Generic data-access adaptor: one repository interface for CRUD, paging,
//! sorting and query filtering over any persistence store that implements the
//! store capability traits.
//!
//! ## Features
//!
//! - **Store-agnostic repository**: [`DataRepository`](repository::DataRepository)
//!   implemented by [`DataRepositoryAdaptor`](repository::DataRepositoryAdaptor)
//!   for any [`TransactionalStore`](repository::TransactionalStore)
//! - **Multi-key sorting**: field names plus one direction, with default sort
//!   fields from configuration
//! - **Pagination**: zero-based page requests and a uniform [`Page`](repository::Page)
//! - **Pluggable query languages**: [`QueryParser`](repository::QueryParser)
//! - **All-or-nothing batch delete** inside a store transaction
//! - **Versioned saves** for append-only records
//! - **In-memory store** (`memory` feature, on by default)
//!
//! ## Example
//!
//! ```rust,no_run
//! use data_repository::prelude::*;
//!
//! #[derive(Clone, Debug)]
//! struct Book { isbn: String, title: String }
//!
//! impl Identifiable<String> for Book {
//!     fn identity(&self) -> String { self.isbn.clone() }
//! }
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     // Load configuration
//!     let config = Config::load()?;
//!
//!     // Initialize tracing
//!     init_tracing(&config.logging)?;
//!
//!     // Build the repository
//!     let accessors = Accessors::new(Accessor::new("isbn", |b: &Book| b.isbn.as_str().into()))
//!         .field("title", |b| b.title.as_str().into());
//!     let books: DataRepositoryAdaptor<_, Book, String> =
//!         DataRepositoryAdaptor::from_config(InMemoryStore::new(accessors), &config.repository);
//!
//!     books.insert(Book { isbn: "978-0441013593".into(), title: "Dune".into() }).await?;
//!     let first_page = books.find_all_paged(0, 10, &["title"], Direction::Ascending).await?;
//!     println!("{} of {} books", first_page.len(), first_page.total_elements);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod observability;
pub mod repository;

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(test)]
mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{Config, LoggingConfig, RepositoryConfig};
    pub use crate::error::{Error, Result};
    pub use crate::observability::init_tracing;

    pub use crate::repository::{
        Accessor, Accessors, CrudRepositoryAdaptor, DataRepository, DataRepositoryAdaptor,
        Direction, FieldValue, Identifiable, Page, PageRequest, PagingStore, QueryParser,
        RepositoryError, RepositoryResult, Sort, StoreError, StoreTransaction,
        TransactionalStore, Versioned, VersionedRecord, VersionedSave,
    };

    #[cfg(feature = "memory")]
    pub use crate::memory::InMemoryStore;
}

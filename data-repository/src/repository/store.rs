//! Persistence store capabilities
//!
//! These traits describe what a backing store must offer for
//! [`DataRepositoryAdaptor`](super::DataRepositoryAdaptor) to drive it. They
//! use RPITIT (Return Position Impl Trait In Traits) for async methods, so no
//! `async_trait` boxing is involved and implementations can use `async fn`.
//!
//! # Example
//!
//! ```rust,ignore
//! use data_repository::repository::{PagingStore, PageRequest, Slice, Sort, StoreResult};
//!
//! impl PagingStore<User, UserId> for PgUserStore {
//!     type Page = Slice<User>;
//!
//!     async fn find_by_id(&self, id: &UserId) -> StoreResult<Option<User>> {
//!         sqlx::query_as!(User, "SELECT * FROM users WHERE id = $1", id.as_str())
//!             .fetch_optional(&self.pool)
//!             .await
//!             .map_err(into_store_error)
//!     }
//!
//!     async fn find_all_paged(&self, request: &PageRequest) -> StoreResult<Slice<User>> {
//!         // ORDER BY from request.sort, LIMIT request.limit() OFFSET request.offset()
//!         todo!()
//!     }
//!
//!     // ... other methods
//! }
//! ```

use std::future::Future;

use super::error::StoreError;
use super::pagination::{NativePage, PageRequest};
use super::sort::Sort;

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A store offering identity lookup, sorted and paged reads, query filtering
/// and writes
///
/// The batch writes have default implementations looping over the
/// single-record operation. Stores with a native bulk statement should
/// override them.
pub trait PagingStore<V, ID>: Send + Sync {
    /// The store's own page representation
    type Page: NativePage<V> + Send;

    /// Find a record by identity, `None` when absent
    fn find_by_id(&self, id: &ID) -> impl Future<Output = StoreResult<Option<V>>> + Send;

    /// All records in `sort` order; store order when `sort` is empty
    fn find_all(&self, sort: &Sort) -> impl Future<Output = StoreResult<Vec<V>>> + Send;

    /// One page of all records
    fn find_all_paged(
        &self,
        request: &PageRequest,
    ) -> impl Future<Output = StoreResult<Self::Page>> + Send;

    /// The records whose identity is in `ids`; missing identities are skipped
    fn find_all_by_id(&self, ids: &[ID]) -> impl Future<Output = StoreResult<Vec<V>>> + Send;

    /// The records matching `query`, in `sort` order
    fn find_where(
        &self,
        query: &str,
        sort: &Sort,
    ) -> impl Future<Output = StoreResult<Vec<V>>> + Send;

    /// One page of the records matching `query`
    fn find_where_paged(
        &self,
        query: &str,
        request: &PageRequest,
    ) -> impl Future<Output = StoreResult<Self::Page>> + Send;

    /// Insert or replace a record, returning the persisted state
    fn save(&self, value: V) -> impl Future<Output = StoreResult<V>> + Send;

    /// Insert or replace every record of `values`
    fn save_all(&self, values: Vec<V>) -> impl Future<Output = StoreResult<Vec<V>>> + Send
    where
        V: Send,
    {
        async move {
            let mut saved = Vec::with_capacity(values.len());
            for value in values {
                saved.push(self.save(value).await?);
            }
            Ok(saved)
        }
    }

    /// Remove a record
    fn delete(&self, value: &V) -> impl Future<Output = StoreResult<()>> + Send;

    /// Remove every record of `values`
    fn delete_all(&self, values: &[V]) -> impl Future<Output = StoreResult<()>> + Send
    where
        V: Sync,
    {
        async move {
            for value in values {
                self.delete(value).await?;
            }
            Ok(())
        }
    }

    /// Remove the record with identity `id`, if any
    fn delete_by_id(&self, id: &ID) -> impl Future<Output = StoreResult<()>> + Send;

    /// Remove the records with an identity in `ids`
    fn delete_all_by_id(&self, ids: &[ID]) -> impl Future<Output = StoreResult<()>> + Send
    where
        ID: Sync,
    {
        async move {
            for id in ids {
                self.delete_by_id(id).await?;
            }
            Ok(())
        }
    }
}

/// A store that can group operations into a transaction
pub trait TransactionalStore<V, ID>: PagingStore<V, ID> {
    /// The unit of work returned by [`begin`](Self::begin)
    type Transaction: StoreTransaction<V, ID>;

    /// Open a transaction.
    ///
    /// Operations on the returned transaction are isolated from concurrent
    /// transactions until [`commit`](StoreTransaction::commit).
    fn begin(&self) -> impl Future<Output = StoreResult<Self::Transaction>> + Send;
}

/// An open unit of work
///
/// Reads and writes go through the [`PagingStore`] methods. Dropping a
/// transaction without committing it discards its writes.
pub trait StoreTransaction<V, ID>: PagingStore<V, ID> + Sized {
    /// Make the transaction's writes durable and visible
    fn commit(self) -> impl Future<Output = StoreResult<()>> + Send;

    /// Discard the transaction's writes
    fn rollback(self) -> impl Future<Output = StoreResult<()>> + Send;
}

/// A record that knows its own identity
///
/// Stores that keep records themselves, such as
/// [`InMemoryStore`](crate::memory::InMemoryStore), use this to match records
/// against requested identities.
pub trait Identifiable<ID> {
    fn identity(&self) -> ID;
}

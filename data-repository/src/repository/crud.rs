//! Pass-through adaptor for stores without transactions

use std::fmt;
use std::marker::PhantomData;

use tracing::debug;

use super::error::{RepositoryError, RepositoryResult};
use super::pagination::{Page, PageRequest};
use super::sort::{build_sort, Direction, Sort};
use super::store::PagingStore;
use crate::config::RepositoryConfig;

/// Repository over a plain [`PagingStore`]
///
/// Reads, inserts and updates behave exactly like
/// [`DataRepositoryAdaptor`](super::DataRepositoryAdaptor). Deletes are
/// forwarded to the store's identity deletes without looking records up, so
/// they report nothing and a batch delete is only as atomic as the store's
/// `delete_all_by_id`.
pub struct CrudRepositoryAdaptor<S, V, ID> {
    store: S,
    default_sort: Vec<String>,
    _records: PhantomData<fn() -> (V, ID)>,
}

impl<S, V, ID> CrudRepositoryAdaptor<S, V, ID>
where
    S: PagingStore<V, ID>,
    V: Send + Sync,
    ID: Send + Sync,
{
    pub fn new<I, F>(store: S, default_sort: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        Self {
            store,
            default_sort: default_sort.into_iter().map(Into::into).collect(),
            _records: PhantomData,
        }
    }

    pub fn from_config(store: S, config: &RepositoryConfig) -> Self {
        Self::new(store, config.default_sort.iter().cloned())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn sort(&self, fields: &[&str], direction: Direction) -> Sort {
        build_sort(fields, direction, &self.default_sort)
    }

    pub async fn find(&self, id: &ID) -> RepositoryResult<Option<V>> {
        self.store
            .find_by_id(id)
            .await
            .map_err(RepositoryError::find)
    }

    pub async fn find_all(&self, sort: &[&str], direction: Direction) -> RepositoryResult<Vec<V>> {
        let sort = self.sort(sort, direction);
        self.store
            .find_all(&sort)
            .await
            .map_err(RepositoryError::find)
    }

    pub async fn find_all_paged(
        &self,
        page_number: u64,
        page_size: u64,
        sort: &[&str],
        direction: Direction,
    ) -> RepositoryResult<Page<V>> {
        let request = PageRequest::of(page_number, page_size, self.sort(sort, direction));
        self.store
            .find_all_paged(&request)
            .await
            .map(Page::from_native)
            .map_err(RepositoryError::find)
    }

    pub async fn find_all_by_id(&self, ids: &[ID]) -> RepositoryResult<Vec<V>> {
        self.store
            .find_all_by_id(ids)
            .await
            .map_err(RepositoryError::find)
    }

    pub async fn find_where(
        &self,
        query: &str,
        sort: &[&str],
        direction: Direction,
    ) -> RepositoryResult<Vec<V>> {
        let sort = self.sort(sort, direction);
        self.store
            .find_where(query, &sort)
            .await
            .map_err(RepositoryError::find)
    }

    pub async fn find_where_paged(
        &self,
        query: &str,
        page_number: u64,
        page_size: u64,
        sort: &[&str],
        direction: Direction,
    ) -> RepositoryResult<Page<V>> {
        let request = PageRequest::of(page_number, page_size, self.sort(sort, direction));
        self.store
            .find_where_paged(query, &request)
            .await
            .map(Page::from_native)
            .map_err(RepositoryError::find)
    }

    pub async fn insert(&self, value: V) -> RepositoryResult<V> {
        self.store.save(value).await.map_err(RepositoryError::insert)
    }

    pub async fn insert_all(&self, values: Vec<V>) -> RepositoryResult<Vec<V>> {
        self.store
            .save_all(values)
            .await
            .map_err(RepositoryError::insert)
    }

    pub async fn update(&self, value: V) -> RepositoryResult<V> {
        self.store.save(value).await.map_err(RepositoryError::update)
    }

    pub async fn update_all(&self, values: Vec<V>) -> RepositoryResult<Vec<V>> {
        self.store
            .save_all(values)
            .await
            .map_err(RepositoryError::update)
    }

    /// Delete by identity; unknown identities are not reported
    pub async fn delete(&self, id: &ID) -> RepositoryResult<()> {
        self.store
            .delete_by_id(id)
            .await
            .map_err(RepositoryError::delete)
    }

    /// Delete every identity in `ids` through the store's batch delete
    pub async fn delete_all(&self, ids: &[ID]) -> RepositoryResult<()> {
        debug!(count = ids.len(), "delete_all_by_id");
        self.store
            .delete_all_by_id(ids)
            .await
            .map_err(RepositoryError::delete)
    }
}

impl<S: Clone, V, ID> Clone for CrudRepositoryAdaptor<S, V, ID> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            default_sort: self.default_sort.clone(),
            _records: PhantomData,
        }
    }
}

impl<S: fmt::Debug, V, ID> fmt::Debug for CrudRepositoryAdaptor<S, V, ID> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrudRepositoryAdaptor")
            .field("store", &self.store)
            .field("default_sort", &self.default_sort)
            .finish()
    }
}

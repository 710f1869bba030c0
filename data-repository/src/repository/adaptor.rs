//! The caller-facing repository contract and its store adaptor

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::marker::PhantomData;

use tracing::{debug, warn};

use super::error::{RepositoryError, RepositoryResult};
use super::pagination::{Page, PageRequest};
use super::sort::{build_sort, Direction, Sort};
use super::store::{PagingStore, StoreTransaction, TransactionalStore};
use crate::config::RepositoryConfig;

/// Uniform CRUD, paging, sorting and query-filtering over records `V`
/// identified by `ID`
///
/// Sort arguments are field names applied left to right as primary key and
/// tie-breaks, all in the one `direction` given. An empty list means the
/// repository's default sort fields.
///
/// Absence is never an error: `find` returns `None`, `delete` returns `None`
/// for an unknown identity, and `delete_all` returns an empty list when any
/// requested identity is unknown.
pub trait DataRepository<V, ID>: Send + Sync {
    /// Find a record by identity
    fn find(&self, id: &ID) -> impl Future<Output = RepositoryResult<Option<V>>> + Send;

    /// All records in the requested order
    fn find_all(
        &self,
        sort: &[&str],
        direction: Direction,
    ) -> impl Future<Output = RepositoryResult<Vec<V>>> + Send;

    /// One page of all records
    fn find_all_paged(
        &self,
        page_number: u64,
        page_size: u64,
        sort: &[&str],
        direction: Direction,
    ) -> impl Future<Output = RepositoryResult<Page<V>>> + Send;

    /// The records with an identity in `ids`, in store order
    fn find_all_by_id(&self, ids: &[ID]) -> impl Future<Output = RepositoryResult<Vec<V>>> + Send;

    /// The records matching `query`, in the requested order
    fn find_where(
        &self,
        query: &str,
        sort: &[&str],
        direction: Direction,
    ) -> impl Future<Output = RepositoryResult<Vec<V>>> + Send;

    /// One page of the records matching `query`
    fn find_where_paged(
        &self,
        query: &str,
        page_number: u64,
        page_size: u64,
        sort: &[&str],
        direction: Direction,
    ) -> impl Future<Output = RepositoryResult<Page<V>>> + Send;

    /// Persist a new record
    fn insert(&self, value: V) -> impl Future<Output = RepositoryResult<V>> + Send;

    /// Persist several new records
    fn insert_all(&self, values: Vec<V>) -> impl Future<Output = RepositoryResult<Vec<V>>> + Send;

    /// Persist changes to a record
    fn update(&self, value: V) -> impl Future<Output = RepositoryResult<V>> + Send;

    /// Persist changes to several records
    fn update_all(&self, values: Vec<V>) -> impl Future<Output = RepositoryResult<Vec<V>>> + Send;

    /// Remove a record, returning it, or `None` if no record has `id`
    fn delete(&self, id: &ID) -> impl Future<Output = RepositoryResult<Option<V>>> + Send;

    /// Remove every record in `ids`, or none of them.
    ///
    /// Returns the removed records. If any identity has no record nothing is
    /// removed and the result is empty. Repeated identities count once.
    fn delete_all(&self, ids: &[ID]) -> impl Future<Output = RepositoryResult<Vec<V>>> + Send;
}

/// [`DataRepository`] over a [`TransactionalStore`]
///
/// Reads and writes translate directly to the store. Deletes look records up
/// first and run inside a single store transaction.
///
/// # Example
///
/// ```rust
/// use data_repository::memory::InMemoryStore;
/// use data_repository::repository::{
///     Accessor, Accessors, DataRepository, DataRepositoryAdaptor, Direction, Identifiable,
/// };
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Task { id: u32, title: String }
///
/// impl Identifiable<u32> for Task {
///     fn identity(&self) -> u32 { self.id }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), data_repository::repository::RepositoryError> {
/// let accessors = Accessors::new(Accessor::new("id", |t: &Task| t.id.into()))
///     .field("title", |t| t.title.as_str().into());
/// let repository: DataRepositoryAdaptor<_, Task, u32> =
///     DataRepositoryAdaptor::new(InMemoryStore::new(accessors), ["id"]);
///
/// repository.insert(Task { id: 1, title: "write".into() }).await?;
/// repository.insert(Task { id: 2, title: "review".into() }).await?;
///
/// let by_title = repository.find_all(&["title"], Direction::Ascending).await?;
/// assert_eq!(by_title[0].title, "review");
///
/// // One unknown id aborts the whole batch
/// assert!(repository.delete_all(&[1, 3]).await?.is_empty());
/// assert_eq!(repository.delete_all(&[1, 2]).await?.len(), 2);
/// # Ok(())
/// # }
/// ```
pub struct DataRepositoryAdaptor<S, V, ID> {
    store: S,
    default_sort: Vec<String>,
    _records: PhantomData<fn() -> (V, ID)>,
}

impl<S, V, ID> DataRepositoryAdaptor<S, V, ID> {
    /// Create an adaptor sorting by `default_sort` when callers name no fields
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

    /// Create an adaptor using the configured default sort
    pub fn from_config(store: S, config: &RepositoryConfig) -> Self {
        Self::new(store, config.default_sort.iter().cloned())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn default_sort(&self) -> &[String] {
        &self.default_sort
    }

    pub(crate) fn sort(&self, fields: &[&str], direction: Direction) -> Sort {
        build_sort(fields, direction, &self.default_sort)
    }
}

impl<S: Clone, V, ID> Clone for DataRepositoryAdaptor<S, V, ID> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            default_sort: self.default_sort.clone(),
            _records: PhantomData,
        }
    }
}

impl<S: fmt::Debug, V, ID> fmt::Debug for DataRepositoryAdaptor<S, V, ID> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataRepositoryAdaptor")
            .field("store", &self.store)
            .field("default_sort", &self.default_sort)
            .finish()
    }
}

impl<S, V, ID> DataRepository<V, ID> for DataRepositoryAdaptor<S, V, ID>
where
    S: TransactionalStore<V, ID>,
    V: Send + Sync,
    ID: Clone + Eq + Hash + Send + Sync,
{
    async fn find(&self, id: &ID) -> RepositoryResult<Option<V>> {
        self.store
            .find_by_id(id)
            .await
            .map_err(RepositoryError::find)
    }

    async fn find_all(&self, sort: &[&str], direction: Direction) -> RepositoryResult<Vec<V>> {
        let sort = self.sort(sort, direction);
        debug!(%sort, "find_all");
        self.store
            .find_all(&sort)
            .await
            .map_err(RepositoryError::find)
    }

    async fn find_all_paged(
        &self,
        page_number: u64,
        page_size: u64,
        sort: &[&str],
        direction: Direction,
    ) -> RepositoryResult<Page<V>> {
        let request = PageRequest::of(page_number, page_size, self.sort(sort, direction));
        debug!(page_number, page_size, sort = %request.sort, "find_all_paged");
        self.store
            .find_all_paged(&request)
            .await
            .map(Page::from_native)
            .map_err(RepositoryError::find)
    }

    async fn find_all_by_id(&self, ids: &[ID]) -> RepositoryResult<Vec<V>> {
        self.store
            .find_all_by_id(ids)
            .await
            .map_err(RepositoryError::find)
    }

    async fn find_where(
        &self,
        query: &str,
        sort: &[&str],
        direction: Direction,
    ) -> RepositoryResult<Vec<V>> {
        let sort = self.sort(sort, direction);
        debug!(query, %sort, "find_where");
        self.store
            .find_where(query, &sort)
            .await
            .map_err(RepositoryError::find)
    }

    async fn find_where_paged(
        &self,
        query: &str,
        page_number: u64,
        page_size: u64,
        sort: &[&str],
        direction: Direction,
    ) -> RepositoryResult<Page<V>> {
        let request = PageRequest::of(page_number, page_size, self.sort(sort, direction));
        debug!(query, page_number, page_size, sort = %request.sort, "find_where_paged");
        self.store
            .find_where_paged(query, &request)
            .await
            .map(Page::from_native)
            .map_err(RepositoryError::find)
    }

    async fn insert(&self, value: V) -> RepositoryResult<V> {
        self.store.save(value).await.map_err(RepositoryError::insert)
    }

    async fn insert_all(&self, values: Vec<V>) -> RepositoryResult<Vec<V>> {
        debug!(count = values.len(), "insert_all");
        self.store
            .save_all(values)
            .await
            .map_err(RepositoryError::insert)
    }

    async fn update(&self, value: V) -> RepositoryResult<V> {
        self.store.save(value).await.map_err(RepositoryError::update)
    }

    async fn update_all(&self, values: Vec<V>) -> RepositoryResult<Vec<V>> {
        debug!(count = values.len(), "update_all");
        self.store
            .save_all(values)
            .await
            .map_err(RepositoryError::update)
    }

    async fn delete(&self, id: &ID) -> RepositoryResult<Option<V>> {
        let tx = self.store.begin().await.map_err(RepositoryError::delete)?;

        let Some(record) = tx.find_by_id(id).await.map_err(RepositoryError::delete)? else {
            tx.rollback().await.map_err(RepositoryError::delete)?;
            return Ok(None);
        };

        tx.delete(&record).await.map_err(RepositoryError::delete)?;
        tx.commit().await.map_err(RepositoryError::delete)?;
        Ok(Some(record))
    }

    async fn delete_all(&self, ids: &[ID]) -> RepositoryResult<Vec<V>> {
        let distinct = distinct_ids(ids);
        let tx = self.store.begin().await.map_err(RepositoryError::delete)?;

        let records = tx
            .find_all_by_id(&distinct)
            .await
            .map_err(RepositoryError::delete)?;
        if records.len() != distinct.len() {
            warn!(
                requested = distinct.len(),
                found = records.len(),
                "delete_all aborted, not every identity has a record"
            );
            tx.rollback().await.map_err(RepositoryError::delete)?;
            return Ok(Vec::new());
        }

        tx.delete_all(&records)
            .await
            .map_err(RepositoryError::delete)?;
        tx.commit().await.map_err(RepositoryError::delete)?;
        debug!(count = records.len(), "delete_all");
        Ok(records)
    }
}

/// `ids` without repeats, first occurrence order
fn distinct_ids<ID: Clone + Eq + Hash>(ids: &[ID]) -> Vec<ID> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().filter(|id| seen.insert(*id)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::error::{StoreError, StoreErrorKind};
    use crate::repository::pagination::Slice;
    use crate::testing::{person, Call, Person, RecordingStore};

    fn repository(store: &RecordingStore) -> DataRepositoryAdaptor<RecordingStore, Person, i64> {
        DataRepositoryAdaptor::new(store.clone(), ["id"])
    }

    fn seeded() -> RecordingStore {
        RecordingStore::with(vec![
            person(1, "Grace", "Hopper", 85),
            person(2, "Ada", "Lovelace", 36),
            person(3, "Alan", "Turing", 41),
        ])
    }

    #[tokio::test]
    async fn test_find_present_and_absent() {
        let store = seeded();
        let repo = repository(&store);

        assert_eq!(repo.find(&2).await.unwrap(), Some(person(2, "Ada", "Lovelace", 36)));
        assert_eq!(repo.find(&9).await.unwrap(), None);
        assert_eq!(store.calls(), vec![Call::FindById(2), Call::FindById(9)]);
    }

    #[tokio::test]
    async fn test_find_all_passes_requested_sort() {
        let store = seeded();
        let repo = repository(&store);

        repo.find_all(&["last_name", "first_name"], Direction::Descending)
            .await
            .unwrap();

        assert_eq!(
            store.calls(),
            vec![Call::FindAll(Sort::by(
                Direction::Descending,
                ["last_name", "first_name"]
            ))]
        );
    }

    #[tokio::test]
    async fn test_find_all_without_fields_uses_default_sort() {
        let store = seeded();
        let repo: DataRepositoryAdaptor<_, Person, i64> =
            DataRepositoryAdaptor::new(store.clone(), ["age", "id"]);

        repo.find_all(&[], Direction::Descending).await.unwrap();

        assert_eq!(
            store.calls(),
            vec![Call::FindAll(Sort::by(Direction::Descending, ["age", "id"]))]
        );
    }

    #[tokio::test]
    async fn test_find_all_paged_builds_page_request() {
        let store = seeded();
        let repo = repository(&store);

        let page = repo
            .find_all_paged(1, 2, &["first_name"], Direction::Ascending)
            .await
            .unwrap();

        assert_eq!(
            store.calls(),
            vec![Call::FindAllPaged(PageRequest::of(
                1,
                2,
                Sort::by(Direction::Ascending, ["first_name"])
            ))]
        );
        assert_eq!(page.page_number, 1);
        assert_eq!(page.page_size, 2);
        assert_eq!(page.total_elements, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.len(), 1);
    }

    #[tokio::test]
    async fn test_paged_result_is_copied_from_store_page() {
        let store = seeded();
        let native = Slice::new(
            vec![person(7, "Edsger", "Dijkstra", 72)],
            &PageRequest::of(4, 1, Sort::unsorted()),
            40,
        );
        store.respond_with_page(native);
        let repo = repository(&store);

        let page = repo
            .find_where_paged("age=72", 4, 1, &[], Direction::Ascending)
            .await
            .unwrap();

        assert_eq!(page.content, vec![person(7, "Edsger", "Dijkstra", 72)]);
        assert_eq!(page.page_number, 4);
        assert_eq!(page.total_elements, 40);
        assert_eq!(page.total_pages, 40);
    }

    #[tokio::test]
    async fn test_find_all_by_id_returns_store_result() {
        let store = seeded();
        let repo = repository(&store);

        let found = repo.find_all_by_id(&[3, 1, 8]).await.unwrap();

        assert_eq!(found.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(store.calls(), vec![Call::FindAllById(vec![3, 1, 8])]);
    }

    #[tokio::test]
    async fn test_find_where_passes_query_and_sort() {
        let store = seeded();
        let repo = repository(&store);

        let found = repo
            .find_where("age=36", &["last_name"], Direction::Ascending)
            .await
            .unwrap();

        assert_eq!(found, vec![person(2, "Ada", "Lovelace", 36)]);
        assert_eq!(
            store.calls(),
            vec![Call::FindWhere(
                "age=36".to_string(),
                Sort::by(Direction::Ascending, ["last_name"])
            )]
        );
    }

    #[tokio::test]
    async fn test_insert_and_update_both_save() {
        let store = RecordingStore::default();
        let repo = repository(&store);

        let inserted = repo.insert(person(4, "Edsger", "Dijkstra", 72)).await.unwrap();
        let updated = repo.update(person(4, "Edsger", "Dijkstra", 73)).await.unwrap();

        assert_eq!(inserted.age, 72);
        assert_eq!(updated.age, 73);
        assert_eq!(store.calls(), vec![Call::Save(4), Call::Save(4)]);
    }

    #[tokio::test]
    async fn test_insert_then_find_round_trips() {
        let store = RecordingStore::default();
        let repo = repository(&store);

        let inserted = repo.insert(person(5, "Barbara", "Liskov", 36)).await.unwrap();

        assert_eq!(repo.find(&5).await.unwrap(), Some(inserted));
    }

    #[tokio::test]
    async fn test_insert_all_and_update_all_save_all() {
        let store = RecordingStore::default();
        let repo = repository(&store);

        let people = vec![person(1, "Grace", "Hopper", 85), person(2, "Ada", "Lovelace", 36)];
        assert_eq!(repo.insert_all(people.clone()).await.unwrap(), people);
        assert_eq!(repo.update_all(people.clone()).await.unwrap(), people);

        assert_eq!(
            store.calls(),
            vec![Call::SaveAll(vec![1, 2]), Call::SaveAll(vec![1, 2])]
        );
    }

    #[tokio::test]
    async fn test_delete_present_record_in_one_transaction() {
        let store = seeded();
        let repo = repository(&store);

        let deleted = repo.delete(&1).await.unwrap();

        assert_eq!(deleted, Some(person(1, "Grace", "Hopper", 85)));
        assert_eq!(
            store.calls(),
            vec![Call::Begin, Call::FindById(1), Call::Delete(1), Call::Commit]
        );
        assert_eq!(repo.find(&1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_missing_record_issues_no_delete() {
        let store = seeded();
        let repo = repository(&store);

        assert_eq!(repo.delete(&42).await.unwrap(), None);

        assert_eq!(
            store.calls(),
            vec![Call::Begin, Call::FindById(42), Call::Rollback]
        );
        assert_eq!(store.records().len(), 3);
    }

    #[tokio::test]
    async fn test_delete_all_removes_every_record() {
        let store = seeded();
        let repo = repository(&store);

        let deleted = repo.delete_all(&[1, 3]).await.unwrap();

        assert_eq!(deleted.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(
            store.calls(),
            vec![
                Call::Begin,
                Call::FindAllById(vec![1, 3]),
                Call::DeleteAll(vec![1, 3]),
                Call::Commit,
            ]
        );
        assert_eq!(store.records(), vec![person(2, "Ada", "Lovelace", 36)]);
    }

    #[tokio::test]
    async fn test_delete_all_with_unknown_identity_deletes_nothing() {
        let store = seeded();
        let repo = repository(&store);

        let deleted = repo.delete_all(&[1, 2, 99]).await.unwrap();

        assert!(deleted.is_empty());
        assert_eq!(
            store.calls(),
            vec![Call::Begin, Call::FindAllById(vec![1, 2, 99]), Call::Rollback]
        );
        assert_eq!(store.records().len(), 3);
    }

    #[tokio::test]
    async fn test_delete_all_counts_distinct_identities() {
        let store = seeded();
        let repo = repository(&store);

        let deleted = repo.delete_all(&[2, 2, 3]).await.unwrap();

        assert_eq!(deleted.len(), 2);
        assert_eq!(store.records(), vec![person(1, "Grace", "Hopper", 85)]);
        assert_eq!(store.calls()[1], Call::FindAllById(vec![2, 3]));
    }

    #[tokio::test]
    async fn test_delete_all_repeated_identity_cannot_mask_missing_one() {
        let store = seeded();
        store.answer_row_per_id();
        let repo = repository(&store);

        let deleted = repo.delete_all(&[1, 1, 99]).await.unwrap();

        assert!(deleted.is_empty());
        assert_eq!(store.records().len(), 3);
        assert_eq!(
            store.calls(),
            vec![Call::Begin, Call::FindAllById(vec![1, 99]), Call::Rollback]
        );
    }

    #[tokio::test]
    async fn test_delete_all_repeated_identity_returns_record_once() {
        let store = seeded();
        store.answer_row_per_id();
        let repo = repository(&store);

        let deleted = repo.delete_all(&[2, 2]).await.unwrap();

        assert_eq!(deleted, vec![person(2, "Ada", "Lovelace", 36)]);
        assert_eq!(store.records().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_failure_rolls_back() {
        let store = seeded();
        store.fail_when(
            |call| matches!(call, Call::DeleteAll(_)),
            StoreError::connection_failed("connection reset"),
        );
        let repo = repository(&store);

        let err = repo.delete_all(&[1, 2]).await.unwrap_err();

        assert!(matches!(err, RepositoryError::Delete(ref e) if e.kind == StoreErrorKind::ConnectionFailed));
        assert!(err.is_retriable());
        assert_eq!(store.records().len(), 3);
        assert_eq!(
            store.calls(),
            vec![Call::Begin, Call::FindAllById(vec![1, 2]), Call::DeleteAll(vec![1, 2])]
        );
    }

    #[tokio::test]
    async fn test_store_errors_map_to_operation_family() {
        let store = seeded();
        let repo = repository(&store);

        store.fail_next(StoreError::timeout(
            crate::repository::StoreOperation::FindAll,
            "slow",
        ));
        assert!(matches!(
            repo.find_all(&[], Direction::Ascending).await,
            Err(RepositoryError::Find(_))
        ));

        store.fail_next(StoreError::already_exists("1"));
        assert!(matches!(
            repo.insert(person(1, "Grace", "Hopper", 85)).await,
            Err(RepositoryError::Insert(_))
        ));

        store.fail_next(StoreError::constraint_violation(
            crate::repository::StoreOperation::Save,
            "age must be positive",
        ));
        assert!(matches!(
            repo.update(person(1, "Grace", "Hopper", -1)).await,
            Err(RepositoryError::Update(_))
        ));
    }

    #[tokio::test]
    async fn test_sort_and_query_errors_surface_directly() {
        let store = seeded();
        let repo = repository(&store);

        store.fail_next(StoreError::unknown_sort_field("shoe_size"));
        assert_eq!(
            repo.find_all(&["shoe_size"], Direction::Ascending).await,
            Err(RepositoryError::UnknownSortField {
                field: "shoe_size".to_string()
            })
        );

        store.fail_next(StoreError::invalid_query("age>", "no such operator"));
        assert_eq!(
            repo.find_where("age>", &[], Direction::Ascending).await,
            Err(RepositoryError::InvalidQuery {
                query: "age>".to_string(),
                message: "no such operator".to_string(),
            })
        );
    }

    #[test]
    fn test_from_config_uses_default_sort() {
        let config = RepositoryConfig {
            default_sort: vec!["created_at".to_string(), "id".to_string()],
        };
        let repo: DataRepositoryAdaptor<_, Person, i64> =
            DataRepositoryAdaptor::from_config(RecordingStore::default(), &config);
        assert_eq!(repo.default_sort(), ["created_at", "id"]);
    }
}

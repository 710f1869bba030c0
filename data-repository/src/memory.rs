//! In-memory store
//!
//! [`InMemoryStore`] keeps records in insertion order behind a
//! `tokio::sync::RwLock`. Sorting goes through
//! [`build_comparator`](crate::repository::build_comparator) and query
//! filtering through a [`QueryPredicateAdapter`], so any accessor registry
//! and [`QueryParser`] can be plugged in.
//!
//! A transaction holds the store's write lock from [`begin`] until it is
//! committed, rolled back or dropped, and stages its writes on a private
//! copy. Other readers and writers wait for it, so a find-then-delete inside a
//! transaction cannot interleave with another one.
//!
//! [`begin`]: TransactionalStore::begin

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;

use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use tracing::debug;

use crate::repository::{
    build_comparator, Accessors, Identifiable, PageRequest, PagingStore, QueryParser,
    QueryPredicateAdapter, Slice, Sort, StoreError, StoreResult, StoreTransaction,
    TransactionalStore,
};

/// Field accessors and query parser shared by a store and its transactions
struct Catalog<V> {
    accessors: Accessors<V>,
    queries: Option<QueryPredicateAdapter<V>>,
}

impl<V: Clone + 'static> Catalog<V> {
    fn sorted(&self, mut records: Vec<V>, sort: &Sort) -> StoreResult<Vec<V>> {
        if sort.is_empty() {
            return Ok(records);
        }
        let compare = build_comparator(&self.accessors, sort)?;
        records.sort_by(|a, b| compare(a, b));
        Ok(records)
    }

    fn matching(&self, records: &[V], query: &str) -> StoreResult<Vec<V>> {
        let Some(queries) = &self.queries else {
            return Err(StoreError::invalid_query(query, "no query parser configured"));
        };
        let predicate = queries.to_predicate(query)?;
        Ok(records.iter().filter(|r| predicate(r)).cloned().collect())
    }
}

fn paginate<V>(records: Vec<V>, request: &PageRequest) -> StoreResult<Slice<V>> {
    if request.page_size == 0 {
        return Err(StoreError::invalid_page_request("page size must be at least 1"));
    }
    let total = records.len() as u64;
    let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(request.limit()).unwrap_or(usize::MAX);
    let content = records.into_iter().skip(offset).take(limit).collect();
    Ok(Slice::new(content, request, total))
}

/// Records plus the catalog to query them with
struct Table<V, ID> {
    rows: Arc<RwLock<Vec<V>>>,
    catalog: Arc<Catalog<V>>,
    _id: PhantomData<fn() -> ID>,
}

impl<V, ID> Table<V, ID>
where
    V: Identifiable<ID> + Clone + Send + Sync + 'static,
    ID: Eq + Hash,
{
    async fn find_by_id(&self, id: &ID) -> Option<V> {
        let rows = self.rows.read().await;
        rows.iter().find(|r| r.identity() == *id).cloned()
    }

    async fn find_all(&self, sort: &Sort) -> StoreResult<Vec<V>> {
        let records = self.rows.read().await.to_vec();
        self.catalog.sorted(records, sort)
    }

    async fn find_all_by_id(&self, ids: &[ID]) -> Vec<V> {
        let wanted: HashSet<&ID> = ids.iter().collect();
        let rows = self.rows.read().await;
        rows.iter()
            .filter(|r| wanted.contains(&r.identity()))
            .cloned()
            .collect()
    }

    async fn find_where(&self, query: &str, sort: &Sort) -> StoreResult<Vec<V>> {
        let records = self.catalog.matching(&self.rows.read().await, query)?;
        self.catalog.sorted(records, sort)
    }

    async fn save(&self, value: V) -> V {
        let mut rows = self.rows.write().await;
        let id = value.identity();
        match rows.iter_mut().find(|r| r.identity() == id) {
            Some(existing) => *existing = value.clone(),
            None => rows.push(value.clone()),
        }
        value
    }

    async fn save_all(&self, values: Vec<V>) -> Vec<V> {
        let mut rows = self.rows.write().await;
        for value in &values {
            let id = value.identity();
            match rows.iter_mut().find(|r| r.identity() == id) {
                Some(existing) => *existing = value.clone(),
                None => rows.push(value.clone()),
            }
        }
        values
    }

    async fn remove(&self, ids: HashSet<ID>) {
        self.rows
            .write()
            .await
            .retain(|r| !ids.contains(&r.identity()));
    }
}

impl<V, ID> Clone for Table<V, ID> {
    fn clone(&self) -> Self {
        Self {
            rows: Arc::clone(&self.rows),
            catalog: Arc::clone(&self.catalog),
            _id: PhantomData,
        }
    }
}

/// Insertion-ordered store held in memory
///
/// Clones share the same records.
pub struct InMemoryStore<V, ID> {
    table: Table<V, ID>,
}

impl<V, ID> InMemoryStore<V, ID>
where
    V: Identifiable<ID> + Clone + Send + Sync + 'static,
    ID: Eq + Hash,
{
    /// Create an empty store without a query parser.
    ///
    /// Query reads fail with `InvalidQuery` until a parser is set with
    /// [`with_parser`](Self::with_parser).
    pub fn new(accessors: Accessors<V>) -> Self {
        Self {
            table: Table {
                rows: Arc::new(RwLock::new(Vec::new())),
                catalog: Arc::new(Catalog {
                    accessors,
                    queries: None,
                }),
                _id: PhantomData,
            },
        }
    }

    /// Use `parser` for `find_where` and `find_where_paged`
    #[must_use]
    pub fn with_parser<P>(self, parser: P) -> Self
    where
        P: QueryParser<V> + 'static,
    {
        let accessors = self.table.catalog.accessors.clone();
        let queries = QueryPredicateAdapter::new(Arc::new(parser), accessors.clone());
        Self {
            table: Table {
                rows: self.table.rows,
                catalog: Arc::new(Catalog {
                    accessors,
                    queries: Some(queries),
                }),
                _id: PhantomData,
            },
        }
    }

    /// Seed the store with `records`, replacing its contents
    #[must_use]
    pub fn with_records(self, records: Vec<V>) -> Self {
        Self {
            table: Table {
                rows: Arc::new(RwLock::new(records)),
                catalog: self.table.catalog,
                _id: PhantomData,
            },
        }
    }

    pub async fn len(&self) -> usize {
        self.table.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.table.rows.read().await.is_empty()
    }

    /// Copy of every record in insertion order
    pub async fn snapshot(&self) -> Vec<V> {
        self.table.rows.read().await.to_vec()
    }
}

impl<V, ID> Clone for InMemoryStore<V, ID> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
        }
    }
}

impl<V, ID> fmt::Debug for InMemoryStore<V, ID> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("accessors", &self.table.catalog.accessors)
            .field("queries", &self.table.catalog.queries.is_some())
            .finish_non_exhaustive()
    }
}

impl<V, ID> PagingStore<V, ID> for InMemoryStore<V, ID>
where
    V: Identifiable<ID> + Clone + Send + Sync + 'static,
    ID: Eq + Hash + Send + Sync + 'static,
{
    type Page = Slice<V>;

    async fn find_by_id(&self, id: &ID) -> StoreResult<Option<V>> {
        Ok(self.table.find_by_id(id).await)
    }

    async fn find_all(&self, sort: &Sort) -> StoreResult<Vec<V>> {
        self.table.find_all(sort).await
    }

    async fn find_all_paged(&self, request: &PageRequest) -> StoreResult<Slice<V>> {
        paginate(self.table.find_all(&request.sort).await?, request)
    }

    async fn find_all_by_id(&self, ids: &[ID]) -> StoreResult<Vec<V>> {
        Ok(self.table.find_all_by_id(ids).await)
    }

    async fn find_where(&self, query: &str, sort: &Sort) -> StoreResult<Vec<V>> {
        self.table.find_where(query, sort).await
    }

    async fn find_where_paged(&self, query: &str, request: &PageRequest) -> StoreResult<Slice<V>> {
        paginate(self.table.find_where(query, &request.sort).await?, request)
    }

    async fn save(&self, value: V) -> StoreResult<V> {
        Ok(self.table.save(value).await)
    }

    async fn save_all(&self, values: Vec<V>) -> StoreResult<Vec<V>>
    where
        V: Send,
    {
        Ok(self.table.save_all(values).await)
    }

    async fn delete(&self, value: &V) -> StoreResult<()> {
        self.table.remove(HashSet::from([value.identity()])).await;
        Ok(())
    }

    async fn delete_all(&self, values: &[V]) -> StoreResult<()>
    where
        V: Sync,
    {
        self.table
            .remove(values.iter().map(|v| v.identity()).collect())
            .await;
        Ok(())
    }

    async fn delete_by_id(&self, id: &ID) -> StoreResult<()> {
        let rows = &self.table.rows;
        rows.write().await.retain(|r| r.identity() != *id);
        Ok(())
    }
}

impl<V, ID> TransactionalStore<V, ID> for InMemoryStore<V, ID>
where
    V: Identifiable<ID> + Clone + Send + Sync + 'static,
    ID: Eq + Hash + Send + Sync + 'static,
{
    type Transaction = InMemoryTransaction<V, ID>;

    async fn begin(&self) -> StoreResult<InMemoryTransaction<V, ID>> {
        let guard = Arc::clone(&self.table.rows).write_owned().await;
        let staged = Table {
            rows: Arc::new(RwLock::new(guard.to_vec())),
            catalog: Arc::clone(&self.table.catalog),
            _id: PhantomData,
        };
        debug!(records = guard.len(), "transaction started");
        Ok(InMemoryTransaction { staged, guard })
    }
}

/// Open transaction on an [`InMemoryStore`]
///
/// Holds the store's write lock. Writes are staged and published on
/// [`commit`](StoreTransaction::commit); dropping the transaction discards
/// them and releases the lock.
pub struct InMemoryTransaction<V, ID> {
    staged: Table<V, ID>,
    guard: OwnedRwLockWriteGuard<Vec<V>>,
}

impl<V, ID> fmt::Debug for InMemoryTransaction<V, ID> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryTransaction")
            .field("records", &self.guard.len())
            .finish_non_exhaustive()
    }
}

impl<V, ID> PagingStore<V, ID> for InMemoryTransaction<V, ID>
where
    V: Identifiable<ID> + Clone + Send + Sync + 'static,
    ID: Eq + Hash + Send + Sync + 'static,
{
    type Page = Slice<V>;

    async fn find_by_id(&self, id: &ID) -> StoreResult<Option<V>> {
        Ok(self.staged.find_by_id(id).await)
    }

    async fn find_all(&self, sort: &Sort) -> StoreResult<Vec<V>> {
        self.staged.find_all(sort).await
    }

    async fn find_all_paged(&self, request: &PageRequest) -> StoreResult<Slice<V>> {
        paginate(self.staged.find_all(&request.sort).await?, request)
    }

    async fn find_all_by_id(&self, ids: &[ID]) -> StoreResult<Vec<V>> {
        Ok(self.staged.find_all_by_id(ids).await)
    }

    async fn find_where(&self, query: &str, sort: &Sort) -> StoreResult<Vec<V>> {
        self.staged.find_where(query, sort).await
    }

    async fn find_where_paged(&self, query: &str, request: &PageRequest) -> StoreResult<Slice<V>> {
        paginate(self.staged.find_where(query, &request.sort).await?, request)
    }

    async fn save(&self, value: V) -> StoreResult<V> {
        Ok(self.staged.save(value).await)
    }

    async fn save_all(&self, values: Vec<V>) -> StoreResult<Vec<V>>
    where
        V: Send,
    {
        Ok(self.staged.save_all(values).await)
    }

    async fn delete(&self, value: &V) -> StoreResult<()> {
        self.staged.remove(HashSet::from([value.identity()])).await;
        Ok(())
    }

    async fn delete_all(&self, values: &[V]) -> StoreResult<()>
    where
        V: Sync,
    {
        self.staged
            .remove(values.iter().map(|v| v.identity()).collect())
            .await;
        Ok(())
    }

    async fn delete_by_id(&self, id: &ID) -> StoreResult<()> {
        let rows = &self.staged.rows;
        rows.write().await.retain(|r| r.identity() != *id);
        Ok(())
    }
}

impl<V, ID> StoreTransaction<V, ID> for InMemoryTransaction<V, ID>
where
    V: Identifiable<ID> + Clone + Send + Sync + 'static,
    ID: Eq + Hash + Send + Sync + 'static,
{
    async fn commit(self) -> StoreResult<()> {
        let Self { staged, mut guard } = self;
        let records = std::mem::take(&mut *staged.rows.write().await);
        debug!(records = records.len(), "transaction committed");
        *guard = records;
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        debug!("transaction rolled back");
        Ok(())
    }
}

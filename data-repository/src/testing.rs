//! Shared test fixtures

use std::sync::{Arc, Mutex};

use crate::repository::{
    build_comparator, Accessor, Accessors, Identifiable, PageRequest, PagingStore, Predicate,
    QueryParseError, QueryParser, QueryPredicateAdapter, Slice, Sort, StoreError, StoreResult,
    StoreTransaction, TransactionalStore,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub age: i64,
}

impl Identifiable<i64> for Person {
    fn identity(&self) -> i64 {
        self.id
    }
}

pub fn person(id: i64, first_name: &str, last_name: &str, age: i64) -> Person {
    Person {
        id,
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        age,
    }
}

pub fn person_accessors() -> Accessors<Person> {
    Accessors::new(Accessor::new("id", |p: &Person| p.id.into()))
        .field("first_name", |p| p.first_name.as_str().into())
        .field("last_name", |p| p.last_name.as_str().into())
        .field("age", |p| p.age.into())
}

/// Parses `field=value` clauses joined by `&`; a clause matches when the
/// field's rendered value equals `value`
pub struct EqualsParser;

impl<V: 'static> QueryParser<V> for EqualsParser {
    fn parse(&self, query: &str, accessors: &Accessors<V>) -> Result<Predicate<V>, QueryParseError> {
        let mut clauses = Vec::new();
        let mut offset = 0;
        for clause in query.split('&') {
            let Some((field, value)) = clause.split_once('=') else {
                return Err(QueryParseError::new("expected 'field=value'").at(offset));
            };
            let field = field.trim();
            let accessor = accessors
                .get(field)
                .cloned()
                .ok_or_else(|| QueryParseError::new(format!("unknown field '{field}'")).at(offset))?;
            clauses.push((accessor, value.trim().to_string()));
            offset += clause.len() + 1;
        }
        Ok(Box::new(move |record: &V| {
            clauses
                .iter()
                .all(|(accessor, value)| accessor.get(record).to_string() == *value)
        }))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Begin,
    Commit,
    Rollback,
    FindById(i64),
    FindAll(Sort),
    FindAllPaged(PageRequest),
    FindAllById(Vec<i64>),
    FindWhere(String, Sort),
    FindWherePaged(String, PageRequest),
    Save(i64),
    SaveAll(Vec<i64>),
    Delete(i64),
    DeleteAll(Vec<i64>),
    DeleteById(i64),
    DeleteAllById(Vec<i64>),
}

type FailWhen = Box<dyn Fn(&Call) -> bool + Send + Sync>;

#[derive(Default)]
struct Shared {
    records: Mutex<Vec<Person>>,
    calls: Mutex<Vec<Call>>,
    failure: Mutex<Option<(FailWhen, StoreError)>>,
    page: Mutex<Option<Slice<Person>>>,
    row_per_id: Mutex<bool>,
}

/// Store recording every call, backed by a plain vector of people
///
/// Transactions stage writes on a copy that `commit` publishes.
#[derive(Clone, Default)]
pub struct RecordingStore {
    shared: Arc<Shared>,
}

impl RecordingStore {
    pub fn with(records: Vec<Person>) -> Self {
        let store = Self::default();
        *store.shared.records.lock().unwrap() = records;
        store
    }

    pub fn calls(&self) -> Vec<Call> {
        self.shared.calls.lock().unwrap().clone()
    }

    pub fn records(&self) -> Vec<Person> {
        self.shared.records.lock().unwrap().clone()
    }

    /// Fail the next call of any kind with `error`
    pub fn fail_next(&self, error: StoreError) {
        self.fail_when(|_| true, error);
    }

    /// Fail the first call matching `when` with `error`
    pub fn fail_when(&self, when: impl Fn(&Call) -> bool + Send + Sync + 'static, error: StoreError) {
        *self.shared.failure.lock().unwrap() = Some((Box::new(when), error));
    }

    /// Answer the next paged read with `page`
    pub fn respond_with_page(&self, page: Slice<Person>) {
        *self.shared.page.lock().unwrap() = Some(page);
    }

    /// Answer `find_all_by_id` with one row per requested identity, repeats
    /// included, the way a store looping `find_by_id` would
    pub fn answer_row_per_id(&self) {
        *self.shared.row_per_id.lock().unwrap() = true;
    }

    fn lookup(&self, rows: &Mutex<Vec<Person>>, ids: &[i64]) -> Vec<Person> {
        if !*self.shared.row_per_id.lock().unwrap() {
            return by_ids(rows, ids);
        }
        ids.iter()
            .flat_map(|id| by_ids(rows, std::slice::from_ref(id)))
            .collect()
    }

    fn record(&self, call: Call) -> StoreResult<()> {
        let mut failure = self.shared.failure.lock().unwrap();
        let fails = failure.as_ref().is_some_and(|(when, _)| when(&call));
        self.shared.calls.lock().unwrap().push(call);
        match failure.take() {
            Some((_, error)) if fails => Err(error),
            other => {
                *failure = other;
                Ok(())
            }
        }
    }

    fn paged(&self, records: Vec<Person>, request: &PageRequest) -> Slice<Person> {
        if let Some(page) = self.shared.page.lock().unwrap().take() {
            return page;
        }
        let total = records.len() as u64;
        let content = records
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.limit() as usize)
            .collect();
        Slice::new(content, request, total)
    }
}

fn sorted(rows: &Mutex<Vec<Person>>, sort: &Sort) -> StoreResult<Vec<Person>> {
    let compare = build_comparator(&person_accessors(), sort)?;
    let mut records = rows.lock().unwrap().clone();
    records.sort_by(|a, b| compare(a, b));
    Ok(records)
}

fn matching(rows: &Mutex<Vec<Person>>, query: &str, sort: &Sort) -> StoreResult<Vec<Person>> {
    let predicate =
        QueryPredicateAdapter::new(Arc::new(EqualsParser), person_accessors()).to_predicate(query)?;
    Ok(sorted(rows, sort)?
        .into_iter()
        .filter(|p| predicate(p))
        .collect())
}

fn by_ids(rows: &Mutex<Vec<Person>>, ids: &[i64]) -> Vec<Person> {
    rows.lock()
        .unwrap()
        .iter()
        .filter(|p| ids.contains(&p.id))
        .cloned()
        .collect()
}

fn upsert(rows: &Mutex<Vec<Person>>, value: Person) {
    let mut rows = rows.lock().unwrap();
    match rows.iter_mut().find(|p| p.id == value.id) {
        Some(existing) => *existing = value,
        None => rows.push(value),
    }
}

fn remove(rows: &Mutex<Vec<Person>>, ids: &[i64]) {
    rows.lock().unwrap().retain(|p| !ids.contains(&p.id));
}

fn ids_of(values: &[Person]) -> Vec<i64> {
    values.iter().map(|p| p.id).collect()
}

impl PagingStore<Person, i64> for RecordingStore {
    type Page = Slice<Person>;

    async fn find_by_id(&self, id: &i64) -> StoreResult<Option<Person>> {
        self.record(Call::FindById(*id))?;
        Ok(by_ids(&self.shared.records, &[*id]).pop())
    }

    async fn find_all(&self, sort: &Sort) -> StoreResult<Vec<Person>> {
        self.record(Call::FindAll(sort.clone()))?;
        sorted(&self.shared.records, sort)
    }

    async fn find_all_paged(&self, request: &PageRequest) -> StoreResult<Slice<Person>> {
        self.record(Call::FindAllPaged(request.clone()))?;
        Ok(self.paged(sorted(&self.shared.records, &request.sort)?, request))
    }

    async fn find_all_by_id(&self, ids: &[i64]) -> StoreResult<Vec<Person>> {
        self.record(Call::FindAllById(ids.to_vec()))?;
        Ok(self.lookup(&self.shared.records, ids))
    }

    async fn find_where(&self, query: &str, sort: &Sort) -> StoreResult<Vec<Person>> {
        self.record(Call::FindWhere(query.to_string(), sort.clone()))?;
        matching(&self.shared.records, query, sort)
    }

    async fn find_where_paged(&self, query: &str, request: &PageRequest) -> StoreResult<Slice<Person>> {
        self.record(Call::FindWherePaged(query.to_string(), request.clone()))?;
        Ok(self.paged(matching(&self.shared.records, query, &request.sort)?, request))
    }

    async fn save(&self, value: Person) -> StoreResult<Person> {
        self.record(Call::Save(value.id))?;
        upsert(&self.shared.records, value.clone());
        Ok(value)
    }

    async fn save_all(&self, values: Vec<Person>) -> StoreResult<Vec<Person>> {
        self.record(Call::SaveAll(ids_of(&values)))?;
        for value in &values {
            upsert(&self.shared.records, value.clone());
        }
        Ok(values)
    }

    async fn delete(&self, value: &Person) -> StoreResult<()> {
        self.record(Call::Delete(value.id))?;
        remove(&self.shared.records, &[value.id]);
        Ok(())
    }

    async fn delete_all(&self, values: &[Person]) -> StoreResult<()> {
        self.record(Call::DeleteAll(ids_of(values)))?;
        remove(&self.shared.records, &ids_of(values));
        Ok(())
    }

    async fn delete_by_id(&self, id: &i64) -> StoreResult<()> {
        self.record(Call::DeleteById(*id))?;
        remove(&self.shared.records, &[*id]);
        Ok(())
    }

    async fn delete_all_by_id(&self, ids: &[i64]) -> StoreResult<()> {
        self.record(Call::DeleteAllById(ids.to_vec()))?;
        remove(&self.shared.records, ids);
        Ok(())
    }
}

impl TransactionalStore<Person, i64> for RecordingStore {
    type Transaction = RecordingTransaction;

    async fn begin(&self) -> StoreResult<RecordingTransaction> {
        self.record(Call::Begin)?;
        Ok(RecordingTransaction {
            staged: Mutex::new(self.records()),
            store: self.clone(),
        })
    }
}

pub struct RecordingTransaction {
    store: RecordingStore,
    staged: Mutex<Vec<Person>>,
}

impl PagingStore<Person, i64> for RecordingTransaction {
    type Page = Slice<Person>;

    async fn find_by_id(&self, id: &i64) -> StoreResult<Option<Person>> {
        self.store.record(Call::FindById(*id))?;
        Ok(by_ids(&self.staged, &[*id]).pop())
    }

    async fn find_all(&self, sort: &Sort) -> StoreResult<Vec<Person>> {
        self.store.record(Call::FindAll(sort.clone()))?;
        sorted(&self.staged, sort)
    }

    async fn find_all_paged(&self, request: &PageRequest) -> StoreResult<Slice<Person>> {
        self.store.record(Call::FindAllPaged(request.clone()))?;
        Ok(self.store.paged(sorted(&self.staged, &request.sort)?, request))
    }

    async fn find_all_by_id(&self, ids: &[i64]) -> StoreResult<Vec<Person>> {
        self.store.record(Call::FindAllById(ids.to_vec()))?;
        Ok(self.store.lookup(&self.staged, ids))
    }

    async fn find_where(&self, query: &str, sort: &Sort) -> StoreResult<Vec<Person>> {
        self.store.record(Call::FindWhere(query.to_string(), sort.clone()))?;
        matching(&self.staged, query, sort)
    }

    async fn find_where_paged(&self, query: &str, request: &PageRequest) -> StoreResult<Slice<Person>> {
        self.store
            .record(Call::FindWherePaged(query.to_string(), request.clone()))?;
        Ok(self
            .store
            .paged(matching(&self.staged, query, &request.sort)?, request))
    }

    async fn save(&self, value: Person) -> StoreResult<Person> {
        self.store.record(Call::Save(value.id))?;
        upsert(&self.staged, value.clone());
        Ok(value)
    }

    async fn delete(&self, value: &Person) -> StoreResult<()> {
        self.store.record(Call::Delete(value.id))?;
        remove(&self.staged, &[value.id]);
        Ok(())
    }

    async fn delete_all(&self, values: &[Person]) -> StoreResult<()> {
        self.store.record(Call::DeleteAll(ids_of(values)))?;
        remove(&self.staged, &ids_of(values));
        Ok(())
    }

    async fn delete_by_id(&self, id: &i64) -> StoreResult<()> {
        self.store.record(Call::DeleteById(*id))?;
        remove(&self.staged, &[*id]);
        Ok(())
    }
}

impl StoreTransaction<Person, i64> for RecordingTransaction {
    async fn commit(self) -> StoreResult<()> {
        self.store.record(Call::Commit)?;
        let staged = self.staged.into_inner().unwrap();
        *self.store.shared.records.lock().unwrap() = staged;
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        self.store.record(Call::Rollback)
    }
}

//! Named field accessors
//!
//! An [`Accessor`] extracts a comparable [`FieldValue`] from a record. The
//! comparator factory and query parsers resolve sort and filter field names
//! against an [`Accessors`] registry, which always contains the identity
//! accessor.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A comparable value extracted from a record
///
/// Values of the same variant compare naturally. Values of different variants
/// compare by variant in declaration order, so `Null` sorts before everything
/// else.
///
/// ```rust
/// use data_repository::repository::FieldValue;
///
/// let name: FieldValue = "Ada".into();
/// let age: FieldValue = 36_i64.into();
/// let missing: FieldValue = None::<i64>.into();
///
/// assert!(missing < age);
/// assert!(FieldValue::from(2.5) < FieldValue::from(10.0));
/// assert_eq!(name.as_str(), Some("Ada"));
/// ```
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// Absent value
    Null,
    /// Boolean value
    Boolean(bool),
    /// 64-bit integer value
    Integer(i64),
    /// 64-bit floating point value, ordered with `f64::total_cmp`
    Float(f64),
    /// String value
    Text(String),
    /// UUID value
    Uuid(Uuid),
    /// UTC timestamp
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Boolean(_) => 1,
            Self::Integer(_) => 2,
            Self::Float(_) => 3,
            Self::Text(_) => 4,
            Self::Uuid(_) => 5,
            Self::Timestamp(_) => 6,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FieldValue {}

impl PartialOrd for FieldValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FieldValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Boolean(a), Self::Boolean(b)) => a.cmp(b),
            (Self::Integer(a), Self::Integer(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Uuid(a), Self::Uuid(b)) => a.cmp(b),
            (Self::Timestamp(a), Self::Timestamp(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Integer(n) => write!(f, "{}", n),
            Self::Float(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
            Self::Uuid(id) => write!(f, "{}", id),
            Self::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&String> for FieldValue {
    fn from(s: &String) -> Self {
        Self::Text(s.clone())
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<u32> for FieldValue {
    fn from(n: u32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<Uuid> for FieldValue {
    fn from(id: Uuid) -> Self {
        Self::Uuid(id)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::Timestamp(ts)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

type Extractor<V> = Arc<dyn Fn(&V) -> FieldValue + Send + Sync>;

/// A named function extracting a comparable value from a record
pub struct Accessor<V> {
    name: String,
    extract: Extractor<V>,
}

impl<V> Accessor<V> {
    /// Create an accessor
    ///
    /// ```rust
    /// use data_repository::repository::{Accessor, FieldValue};
    ///
    /// struct Book { title: String }
    ///
    /// let title = Accessor::new("title", |b: &Book| b.title.as_str().into());
    /// let book = Book { title: "Dune".to_string() };
    /// assert_eq!(title.get(&book), FieldValue::from("Dune"));
    /// ```
    pub fn new<F>(name: impl Into<String>, extract: F) -> Self
    where
        F: Fn(&V) -> FieldValue + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            extract: Arc::new(extract),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Extract this field's value from `record`
    pub fn get(&self, record: &V) -> FieldValue {
        (self.extract)(record)
    }
}

impl<V> Clone for Accessor<V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            extract: Arc::clone(&self.extract),
        }
    }
}

impl<V> fmt::Debug for Accessor<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor").field("name", &self.name).finish()
    }
}

/// Registry of the accessors available for a record type
///
/// The registry is built from the identity accessor, so the identity field
/// can always be sorted and filtered on. Adding an accessor under an existing
/// name replaces it.
///
/// ```rust
/// use data_repository::repository::{Accessor, Accessors};
///
/// struct Book { isbn: String, pages: i64 }
///
/// let accessors = Accessors::new(Accessor::new("isbn", |b: &Book| b.isbn.as_str().into()))
///     .with(Accessor::new("pages", |b: &Book| b.pages.into()));
///
/// assert_eq!(accessors.identity().name(), "isbn");
/// assert!(accessors.get("pages").is_some());
/// assert!(accessors.get("author").is_none());
/// ```
pub struct Accessors<V> {
    identity: Accessor<V>,
    fields: HashMap<String, Accessor<V>>,
}

impl<V> Accessors<V> {
    /// Create a registry holding only the identity accessor
    pub fn new(identity: Accessor<V>) -> Self {
        Self {
            identity,
            fields: HashMap::new(),
        }
    }

    /// Add an accessor, replacing any accessor with the same name
    #[must_use]
    pub fn with(mut self, accessor: Accessor<V>) -> Self {
        self.insert(accessor);
        self
    }

    /// Shorthand for `with(Accessor::new(name, extract))`
    #[must_use]
    pub fn field<F>(self, name: impl Into<String>, extract: F) -> Self
    where
        F: Fn(&V) -> FieldValue + Send + Sync + 'static,
    {
        self.with(Accessor::new(name, extract))
    }

    pub fn insert(&mut self, accessor: Accessor<V>) {
        if accessor.name == self.identity.name {
            tracing::debug!(field = %accessor.name, "replacing identity accessor");
            self.identity = accessor;
        } else {
            self.fields.insert(accessor.name.clone(), accessor);
        }
    }

    /// Drop the accessor named `name`, hiding the field from sorting and
    /// queries. The identity accessor is never removed.
    #[must_use]
    pub fn without(mut self, name: &str) -> Self {
        self.fields.remove(name);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Accessor<V>> {
        if name == self.identity.name {
            Some(&self.identity)
        } else {
            self.fields.get(name)
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// The identity accessor
    pub fn identity(&self) -> &Accessor<V> {
        &self.identity
    }

    /// Registered field names, identity first, the rest in no particular order
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        std::iter::once(self.identity.name()).chain(self.fields.keys().map(String::as_str))
    }

    /// Number of accessors, the identity included
    pub fn len(&self) -> usize {
        self.fields.len() + 1
    }

    /// Always `false`: the identity accessor is always registered
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl<V> Clone for Accessors<V> {
    fn clone(&self) -> Self {
        Self {
            identity: self.identity.clone(),
            fields: self.fields.clone(),
        }
    }
}

impl<V> fmt::Debug for Accessors<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.fields.keys().collect();
        names.sort_unstable();
        f.debug_struct("Accessors")
            .field("identity", &self.identity.name)
            .field("fields", &names)
            .finish()
    }
}

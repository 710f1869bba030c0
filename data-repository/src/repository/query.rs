//! Query-string filtering
//!
//! The query grammar belongs to the [`QueryParser`] implementation. This
//! module only fixes how a parser is consumed: it receives the query string
//! together with the full accessor registry and returns a [`Predicate`].

use std::fmt;
use std::sync::Arc;

use super::accessor::Accessors;
use super::error::StoreError;

/// Boolean filter over records of type `V`
pub type Predicate<V> = Box<dyn Fn(&V) -> bool + Send + Sync>;

/// Error reported by a [`QueryParser`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct QueryParseError {
    /// Description of the problem
    pub message: String,
    /// Byte offset in the query where the problem was found
    pub position: Option<usize>,
}

impl QueryParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: None,
        }
    }

    #[must_use]
    pub fn at(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }
}

/// Turns a query string into a predicate over records
///
/// # Example
///
/// ```rust
/// use data_repository::repository::{
///     Accessor, Accessors, Predicate, QueryParseError, QueryParser,
/// };
///
/// /// Matches records whose identity renders as the query string
/// struct IdEquals;
///
/// impl<V: 'static> QueryParser<V> for IdEquals {
///     fn parse(&self, query: &str, accessors: &Accessors<V>) -> Result<Predicate<V>, QueryParseError> {
///         if query.is_empty() {
///             return Err(QueryParseError::new("empty query"));
///         }
///         let id = accessors.identity().clone();
///         let wanted = query.to_string();
///         Ok(Box::new(move |record: &V| id.get(record).to_string() == wanted))
///     }
/// }
///
/// let accessors = Accessors::new(Accessor::new("id", |n: &i64| (*n).into()));
/// let predicate = IdEquals.parse("7", &accessors).unwrap();
/// assert!(predicate(&7));
/// assert!(!predicate(&8));
/// ```
pub trait QueryParser<V>: Send + Sync {
    /// Parse `query`, resolving field names through `accessors`
    fn parse(&self, query: &str, accessors: &Accessors<V>) -> Result<Predicate<V>, QueryParseError>;
}

impl<V, P: QueryParser<V> + ?Sized> QueryParser<V> for Arc<P> {
    fn parse(&self, query: &str, accessors: &Accessors<V>) -> Result<Predicate<V>, QueryParseError> {
        (**self).parse(query, accessors)
    }
}

/// Binds a [`QueryParser`] to the accessor registry of a record type
pub struct QueryPredicateAdapter<V> {
    parser: Arc<dyn QueryParser<V>>,
    accessors: Accessors<V>,
}

impl<V> QueryPredicateAdapter<V> {
    pub fn new(parser: Arc<dyn QueryParser<V>>, accessors: Accessors<V>) -> Self {
        Self { parser, accessors }
    }

    pub fn accessors(&self) -> &Accessors<V> {
        &self.accessors
    }

    /// Translate a query string into a predicate.
    ///
    /// The parser sees every registered accessor, the identity accessor
    /// included.
    ///
    /// # Errors
    ///
    /// Parser failures are returned as a [`StoreError`] of kind
    /// `InvalidQuery` carrying the query and the parser's message.
    pub fn to_predicate(&self, query: &str) -> Result<Predicate<V>, StoreError> {
        self.parser
            .parse(query, &self.accessors)
            .map_err(|err| StoreError::invalid_query(query, err.message))
    }
}

impl<V> Clone for QueryPredicateAdapter<V> {
    fn clone(&self) -> Self {
        Self {
            parser: Arc::clone(&self.parser),
            accessors: self.accessors.clone(),
        }
    }
}

impl<V> fmt::Debug for QueryPredicateAdapter<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryPredicateAdapter")
            .field("accessors", &self.accessors)
            .finish_non_exhaustive()
    }
}

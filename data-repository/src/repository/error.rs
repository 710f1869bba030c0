//! Repository error types
//!
//! Two layers of errors are used:
//!
//! - [`StoreError`] is raised by stores, the comparator factory and the query
//!   predicate adapter. It carries the store operation, a category and the
//!   entity, sort field or query involved.
//! - [`RepositoryError`] is what [`DataRepository`](super::DataRepository)
//!   callers see. Store failures are wrapped per operation family, while sort
//!   and query failures surface as their own variants.
//!
//! # Example
//!
//! ```rust
//! use data_repository::repository::{RepositoryError, StoreError, StoreErrorKind};
//!
//! let error = StoreError::unknown_sort_field("nickname");
//! assert!(matches!(error.kind, StoreErrorKind::UnknownSortField));
//!
//! let lifted = RepositoryError::find(error);
//! assert_eq!(
//!     lifted,
//!     RepositoryError::UnknownSortField { field: "nickname".to_string() }
//! );
//! ```

use std::fmt;

use thiserror::Error;

/// Result type for repository operations
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Store operation being performed when the error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    /// Finding a single record by identity
    FindById,
    /// Finding all records, sorted or paged
    FindAll,
    /// Finding the records matching a list of identities
    FindAllById,
    /// Finding the records matching a query string
    FindWhere,
    /// Persisting one or more records
    Save,
    /// Removing one or more records
    Delete,
    /// Opening a transaction
    Begin,
    /// Committing a transaction
    Commit,
    /// Rolling a transaction back
    Rollback,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FindById => write!(f, "find_by_id"),
            Self::FindAll => write!(f, "find_all"),
            Self::FindAllById => write!(f, "find_all_by_id"),
            Self::FindWhere => write!(f, "find_where"),
            Self::Save => write!(f, "save"),
            Self::Delete => write!(f, "delete"),
            Self::Begin => write!(f, "begin"),
            Self::Commit => write!(f, "commit"),
            Self::Rollback => write!(f, "rollback"),
        }
    }
}

/// Category of store error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreErrorKind {
    /// Record was not found where one was required
    NotFound,
    /// Record already exists (duplicate identity)
    AlreadyExists,
    /// Store constraint violation
    ConstraintViolation,
    /// Failed to reach the store
    ConnectionFailed,
    /// Operation timed out
    Timeout,
    /// A sort field has no accessor
    UnknownSortField,
    /// The query string could not be parsed
    InvalidQuery,
    /// Page size or page number rejected by the store
    InvalidPageRequest,
    /// Begin, commit or rollback failed
    TransactionFailed,
    /// Other unclassified error
    Other,
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::AlreadyExists => write!(f, "already_exists"),
            Self::ConstraintViolation => write!(f, "constraint_violation"),
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::Timeout => write!(f, "timeout"),
            Self::UnknownSortField => write!(f, "unknown_sort_field"),
            Self::InvalidQuery => write!(f, "invalid_query"),
            Self::InvalidPageRequest => write!(f, "invalid_page_request"),
            Self::TransactionFailed => write!(f, "transaction_failed"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Structured store error with operation context
///
/// # Example
///
/// ```rust
/// use data_repository::repository::{StoreError, StoreOperation};
///
/// let error = StoreError::connection_failed("connection refused")
///     .with_operation(StoreOperation::Save);
/// assert!(error.is_retriable());
/// assert_eq!(
///     error.to_string(),
///     "Store connection_failed error during save: connection refused"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    /// The operation being performed when the error occurred
    pub operation: StoreOperation,
    /// The category of error
    pub kind: StoreErrorKind,
    /// Human-readable error message
    pub message: String,
    /// The identity of the record involved
    pub entity_id: Option<String>,
    /// The sort field involved
    pub field: Option<String>,
    /// The query string involved
    pub query: Option<String>,
}

impl StoreError {
    /// Create a new store error
    pub fn new(operation: StoreOperation, kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            entity_id: None,
            field: None,
            query: None,
        }
    }

    /// Create a "not found" error for the given identity
    pub fn not_found(entity_id: impl Into<String>) -> Self {
        Self::new(
            StoreOperation::FindById,
            StoreErrorKind::NotFound,
            "Record not found",
        )
        .with_entity(entity_id)
    }

    /// Create an "already exists" error for the given identity
    pub fn already_exists(entity_id: impl Into<String>) -> Self {
        Self::new(
            StoreOperation::Save,
            StoreErrorKind::AlreadyExists,
            "Record already exists",
        )
        .with_entity(entity_id)
    }

    /// Create a constraint violation error
    pub fn constraint_violation(operation: StoreOperation, message: impl Into<String>) -> Self {
        Self::new(operation, StoreErrorKind::ConstraintViolation, message)
    }

    /// Create a connection failed error
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::new(
            StoreOperation::FindById,
            StoreErrorKind::ConnectionFailed,
            message,
        )
    }

    /// Create a timeout error
    pub fn timeout(operation: StoreOperation, message: impl Into<String>) -> Self {
        Self::new(operation, StoreErrorKind::Timeout, message)
    }

    /// Create an error for a sort field that has no accessor
    ///
    /// # Example
    ///
    /// ```rust
    /// use data_repository::repository::StoreError;
    ///
    /// let error = StoreError::unknown_sort_field("shoe_size");
    /// assert_eq!(error.field.as_deref(), Some("shoe_size"));
    /// ```
    pub fn unknown_sort_field(field: impl Into<String>) -> Self {
        let field = field.into();
        let mut error = Self::new(
            StoreOperation::FindAll,
            StoreErrorKind::UnknownSortField,
            format!("Unknown sort field '{}'", field),
        );
        error.field = Some(field);
        error
    }

    /// Create an error for a query string the parser rejected
    pub fn invalid_query(query: impl Into<String>, message: impl Into<String>) -> Self {
        let mut error = Self::new(
            StoreOperation::FindWhere,
            StoreErrorKind::InvalidQuery,
            message,
        );
        error.query = Some(query.into());
        error
    }

    /// Create an error for a page request the store cannot serve
    pub fn invalid_page_request(message: impl Into<String>) -> Self {
        Self::new(
            StoreOperation::FindAll,
            StoreErrorKind::InvalidPageRequest,
            message,
        )
    }

    /// Create a transaction failure
    pub fn transaction_failed(operation: StoreOperation, message: impl Into<String>) -> Self {
        Self::new(operation, StoreErrorKind::TransactionFailed, message)
    }

    /// Create an unclassified error
    pub fn other(operation: StoreOperation, message: impl Into<String>) -> Self {
        Self::new(operation, StoreErrorKind::Other, message)
    }

    /// Add the identity of the record involved
    #[must_use]
    pub fn with_entity(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Set the operation that caused the error
    #[must_use]
    pub fn with_operation(mut self, operation: StoreOperation) -> Self {
        self.operation = operation;
        self
    }

    /// Check if this error is transient and may succeed on retry
    pub fn is_retriable(&self) -> bool {
        matches!(
            self.kind,
            StoreErrorKind::ConnectionFailed | StoreErrorKind::Timeout
        )
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Store {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let Some(ref entity_id) = self.entity_id {
            write!(f, " [{}]", entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for StoreError {}

/// Error returned by [`DataRepository`](super::DataRepository) operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// A read operation failed in the store
    #[error("find failed: {0}")]
    Find(StoreError),

    /// An insert failed in the store
    #[error("insert failed: {0}")]
    Insert(StoreError),

    /// An update failed in the store
    #[error("update failed: {0}")]
    Update(StoreError),

    /// A delete failed in the store
    #[error("delete failed: {0}")]
    Delete(StoreError),

    /// A requested sort field has no accessor
    #[error("unknown sort field '{field}'")]
    UnknownSortField { field: String },

    /// The query string was rejected by the parser
    #[error("invalid query '{query}': {message}")]
    InvalidQuery { query: String, message: String },
}

impl RepositoryError {
    /// Wrap a store failure raised by a read
    pub fn find(err: StoreError) -> Self {
        Self::lift(err, Self::Find)
    }

    /// Wrap a store failure raised by an insert
    pub fn insert(err: StoreError) -> Self {
        Self::lift(err, Self::Insert)
    }

    /// Wrap a store failure raised by an update
    pub fn update(err: StoreError) -> Self {
        Self::lift(err, Self::Update)
    }

    /// Wrap a store failure raised by a delete
    pub fn delete(err: StoreError) -> Self {
        Self::lift(err, Self::Delete)
    }

    fn lift(err: StoreError, wrap: fn(StoreError) -> Self) -> Self {
        match err.kind {
            StoreErrorKind::UnknownSortField => Self::UnknownSortField {
                field: err.field.unwrap_or(err.message),
            },
            StoreErrorKind::InvalidQuery => Self::InvalidQuery {
                query: err.query.unwrap_or_default(),
                message: err.message,
            },
            _ => wrap(err),
        }
    }

    /// The underlying store error, if this error wraps one
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::Find(err) | Self::Insert(err) | Self::Update(err) | Self::Delete(err) => {
                Some(err)
            }
            Self::UnknownSortField { .. } | Self::InvalidQuery { .. } => None,
        }
    }

    /// Check if the underlying store error is transient
    pub fn is_retriable(&self) -> bool {
        self.store_error().is_some_and(StoreError::is_retriable)
    }
}

//! Append-only versioned records
//!
//! A versioned record is never updated in place. Saving a change means
//! computing the record's successor with [`Versioned::next_version`] and
//! inserting it next to the versions already stored.
//!
//! # Example
//!
//! ```rust
//! use data_repository::repository::{Versioned, VersionedRecord};
//!
//! let v1 = VersionedRecord::new("policy-7", "draft".to_string());
//! let v2 = v1.next_version_with(|_| "approved".to_string());
//!
//! assert_eq!(v1.version(), 1);
//! assert_eq!(v2.version(), 2);
//! assert_eq!(v2.key(), v1.key());
//! assert_eq!(v2.data(), "approved");
//! ```

use std::future::Future;

use serde::{Deserialize, Serialize};

use super::adaptor::DataRepository;
use super::error::RepositoryResult;
use super::store::Identifiable;

/// A record with a successor state
pub trait Versioned: Sized {
    /// The successor of this record.
    ///
    /// Must not modify `self` and must return a distinct record whose
    /// identity differs from this one's.
    fn next_version(&self) -> Self;
}

/// Identity of one version of a [`VersionedRecord`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordVersion<K> {
    pub key: K,
    pub version: u64,
}

/// A keyed payload with a monotonically increasing version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedRecord<K, T> {
    key: K,
    version: u64,
    data: T,
}

impl<K, T> VersionedRecord<K, T> {
    /// First version of a record
    pub fn new(key: K, data: T) -> Self {
        Self {
            key,
            version: 1,
            data,
        }
    }

    /// A record at a specific version, e.g. when loading from storage
    pub fn at_version(key: K, version: u64, data: T) -> Self {
        Self { key, version, data }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn into_data(self) -> T {
        self.data
    }

    /// The successor of this record with a transformed payload
    #[must_use]
    pub fn next_version_with<F>(&self, f: F) -> Self
    where
        K: Clone,
        F: FnOnce(&T) -> T,
    {
        Self {
            key: self.key.clone(),
            version: self.version + 1,
            data: f(&self.data),
        }
    }
}

impl<K: Clone, T: Clone> Versioned for VersionedRecord<K, T> {
    fn next_version(&self) -> Self {
        self.next_version_with(T::clone)
    }
}

impl<K: Clone, T> Identifiable<RecordVersion<K>> for VersionedRecord<K, T> {
    fn identity(&self) -> RecordVersion<K> {
        RecordVersion {
            key: self.key.clone(),
            version: self.version,
        }
    }
}

/// Saving the successor of a versioned record
pub trait VersionedSave<V: Versioned, ID> {
    /// Insert `entity.next_version()` and return the persisted successor.
    ///
    /// `entity` itself is left untouched and is not persisted again. Earlier
    /// versions stay in the store as they are.
    fn save_next_version(&self, entity: &V) -> impl Future<Output = RepositoryResult<V>> + Send;
}

impl<R, V, ID> VersionedSave<V, ID> for R
where
    R: DataRepository<V, ID>,
    V: Versioned,
{
    fn save_next_version(&self, entity: &V) -> impl Future<Output = RepositoryResult<V>> + Send {
        self.insert(entity.next_version())
    }
}

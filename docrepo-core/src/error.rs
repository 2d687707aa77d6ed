//! Error types and result types for repository operations.
//!
//! Every fallible operation in this crate returns [`DocumentStoreResult<T>`]. Errors are never
//! retried or reinterpreted by the core; they are handed back to the caller as they occurred.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use std::error::Error as StdError;
use thiserror::Error;

/// Represents all possible errors that can occur when working with a document store.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// A logical field name has no declared storage key on the entity.
    ///
    /// Always raised before any I/O takes place.
    #[error("could not find struct field {field} for entity {entity}")]
    UnmappedField {
        /// The logical field name the caller used.
        field: String,
        /// The name of the entity shape it was looked up on.
        entity: String,
    },
    /// Failure to build, open or verify a connection to the store.
    #[error("Connection error: {0}")]
    Connection(String),
    /// Serialization/deserialization error when converting between entities and BSON.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// No document matched the filter of a single-document lookup.
    /// The first argument is the rendered filter, the second is the collection name.
    #[error("Document not found for {0} in collection {1}")]
    DocumentNotFound(String, String),
    /// The document or the request violates a structural requirement.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// An error reported by the underlying store or driver, kept as its source.
    #[error("Backend error: {0}")]
    Backend(#[source] Box<dyn StdError + Send + Sync>),
    /// The caller's context was cancelled while the operation was pending.
    #[error("operation cancelled")]
    Cancelled,
    /// The caller's context deadline passed while the operation was pending.
    #[error("operation deadline exceeded")]
    DeadlineExceeded,
}

impl DocumentStoreError {
    /// Wraps a driver or store error without altering its message.
    pub fn backend<E>(err: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        DocumentStoreError::Backend(err.into())
    }

    /// Returns `true` if this error reports a missing document.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DocumentStoreError::DocumentNotFound(..))
    }
}

/// A specialized `Result` type for document store operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl From<BsonError> for DocumentStoreError {
    fn from(err: BsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for DocumentStoreError {
    fn from(err: SerdeJsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

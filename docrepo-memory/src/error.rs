//! Failures raised by the in-memory store itself.
//!
//! These surface through [`DocumentStoreError::Backend`](docrepo_core::error::DocumentStoreError::Backend)
//! the same way driver errors do for a real server.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemoryStoreError {
    #[error("duplicate key error collection: {collection} index: {index} dup key: {{ {key}: {value} }}")]
    DuplicateKey {
        collection: String,
        index: String,
        key: String,
        value: String,
    },

    #[error("text index required for $text query")]
    TextIndexRequired,

    #[error("query requires text score metadata, but it is not available")]
    TextScoreUnavailable,

    #[error("cannot apply $inc to field '{0}' with non-numeric value")]
    NonNumericIncrement(String),

    #[error("integer overflow incrementing field '{0}'")]
    IncrementOverflow(String),

    #[error("the (immutable) field '_id' was found to have been altered to _id: {requested} from {existing}")]
    ImmutableId {
        existing: String,
        requested: String,
    },

    #[error("an index named '{0}' already exists with different options")]
    IndexConflict(String),
}

//! Storage backend abstraction.
//!
//! [`StoreBackend`] is the seam between the typed [`Helper`](crate::helper::Helper) and a
//! concrete document store. It speaks in raw BSON documents and the query values of
//! [`crate::query`]; field resolution and entity decoding happen above it.
//!
//! # Thread Safety
//!
//! Implementations must be `Send + Sync` and support concurrent use from many tasks without
//! external locking. Connection pooling is the implementation's concern.
//!
//! # Error Handling
//!
//! Store and driver failures are returned as
//! [`DocumentStoreError::Backend`](crate::error::DocumentStoreError::Backend) with the original
//! error kept as the source. Implementations never retry.

use async_trait::async_trait;
use bson::{Bson, Document};
use futures::stream::BoxStream;
use std::fmt::Debug;

use crate::{
    error::DocumentStoreResult,
    query::{Filter, FindOneAndUpdateOptions, FindOptions, IndexSpec, ReplaceOptions, Update},
};

/// A stream of raw documents produced by a find request.
///
/// Errors discovered while streaming are yielded as items and must reach the caller.
pub type DocumentStream = BoxStream<'static, DocumentStoreResult<Document>>;

/// Abstract interface for document storage backends.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Verifies that the store is reachable.
    async fn ping(&self) -> DocumentStoreResult<()>;

    /// Inserts a document and returns its identifier.
    ///
    /// Documents without an `_id` are assigned one by the store.
    async fn insert_one(&self, collection: &str, document: Document) -> DocumentStoreResult<Bson>;

    /// Inserts documents and returns their identifiers in input order.
    ///
    /// A failure part way through leaves earlier documents in place.
    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> DocumentStoreResult<Vec<Bson>>;

    /// Returns the first document matching `filter`, if any.
    async fn find_one(&self, collection: &str, filter: Filter) -> DocumentStoreResult<Option<Document>>;

    /// Opens a cursor over every document matching `filter`.
    async fn find(
        &self,
        collection: &str,
        filter: Filter,
        options: FindOptions,
    ) -> DocumentStoreResult<DocumentStream>;

    /// Replaces the first document matching `filter` and returns the matched count.
    async fn replace_one(
        &self,
        collection: &str,
        filter: Filter,
        replacement: Document,
        options: ReplaceOptions,
    ) -> DocumentStoreResult<u64>;

    /// Deletes the first document matching `filter` and returns the deleted count.
    async fn delete_one(&self, collection: &str, filter: Filter) -> DocumentStoreResult<u64>;

    /// Deletes every document matching `filter` and returns the deleted count.
    async fn delete_many(&self, collection: &str, filter: Filter) -> DocumentStoreResult<u64>;

    /// Atomically applies `update` to the first document matching `filter`.
    ///
    /// Returns the document before or after the update depending on `options`, or `None` if
    /// nothing matched and `options.upsert` is off.
    async fn find_one_and_update(
        &self,
        collection: &str,
        filter: Filter,
        update: Update,
        options: FindOneAndUpdateOptions,
    ) -> DocumentStoreResult<Option<Document>>;

    /// Creates an index and returns its name.
    ///
    /// If an equivalent index already exists its name is returned instead.
    async fn create_index(&self, collection: &str, index: IndexSpec) -> DocumentStoreResult<String>;

    /// Drops a collection with its documents and indexes.
    async fn drop_collection(&self, collection: &str) -> DocumentStoreResult<()>;

    /// Releases the connection and every resource held by the backend.
    async fn shutdown(self) -> DocumentStoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// Factory trait for creating backend instances.
#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> DocumentStoreResult<Self::Backend>;
}

//! The connection handle shared by every repository helper.
//!
//! A [`DocumentStore`] owns one backend, typically one live client connection bound to a
//! database. It is created once, handed out by reference to any number of
//! [`Helper`]s, and shut down explicitly.
//!
//! ```ignore
//! let store = DocumentStore::new(MongoDbStore::connect(&ctx, &config).await?);
//! let counters = store.helper::<Counter>("counters");
//! let next = counters.find_one_and_increment_field(&ctx, "name", "orders", "seq", 1).await?;
//! store.shutdown().await?;
//! ```

use tracing::info;

use crate::{
    backend::StoreBackend,
    context::Context,
    entity::Entity,
    error::DocumentStoreResult,
    helper::Helper,
};

/// A document store bound to a specific backend implementation.
#[derive(Debug)]
pub struct DocumentStore<B: StoreBackend> {
    backend: B,
}

impl<B: StoreBackend> DocumentStore<B> {
    /// Creates a new document store over the given backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Returns the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Creates a helper for entities of type `T` stored in `collection`.
    ///
    /// This performs no I/O.
    pub fn helper<'a, T: Entity>(&'a self, collection: &str) -> Helper<'a, B, T> {
        Helper::new(&self.backend, collection)
    }

    /// Checks that the store is reachable.
    ///
    /// # Errors
    ///
    /// Returns the backend error, or a context error if `ctx` fires first.
    pub async fn ping(&self, ctx: &Context) -> DocumentStoreResult<()> {
        ctx.run(self.backend.ping()).await
    }

    /// Drops a collection with all of its documents and indexes.
    ///
    /// # Errors
    ///
    /// Returns the backend error, or a context error if `ctx` fires first.
    pub async fn drop_collection(&self, ctx: &Context, collection: &str) -> DocumentStoreResult<()> {
        ctx.run(self.backend.drop_collection(collection)).await
    }

    /// Shuts down the backend, releasing its connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to shut down cleanly.
    pub async fn shutdown(self) -> DocumentStoreResult<()> {
        info!("shutting down document store");

        self.backend.shutdown().await
    }
}

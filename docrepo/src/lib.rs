//! Typed repositories over a document store, addressed by Rust field names.
//!
//! This crate is the primary entry point of the docrepo project. It re-exports the core types
//! from the sub-crates and gives access to the storage backends.
//!
//! Records are plain serde structs deriving [`Entity`]. A [`Helper`](helper::Helper) bound to
//! one collection runs CRUD, search and iteration operations, taking logical field names that
//! it resolves to storage keys from the entity's declared field table. Referencing a field
//! without a declared key fails before any request is sent.
//!
//! # Quick Start
//!
//! ```ignore
//! use docrepo::{prelude::*, memory::InMemoryStore};
//! use bson::oid::ObjectId;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize, Entity)]
//! pub struct TestData {
//!     #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
//!     pub id: Option<ObjectId>,
//!     #[serde(rename = "name")]
//!     pub name: String,
//!     #[serde(rename = "seq", default)]
//!     pub seq: i64,
//! }
//!
//! #[tokio::main]
//! async fn main() -> DocumentStoreResult<()> {
//!     let ctx = Context::background();
//!     let store = DocumentStore::new(InMemoryStore::builder().build().await?);
//!     let helper = store.helper::<TestData>("testdata");
//!
//!     helper.insert_one(&ctx, &TestData { id: None, name: "test1".into(), seq: 0 }).await?;
//!
//!     let next = helper.find_one_and_increment_field(&ctx, "name", "test1", "seq", 1).await?;
//!     assert_eq!(next.seq, 1);
//!
//!     store.shutdown().await
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - In-memory storage for development and testing
//! - [`mongodb`] - MongoDB backend (requires the `mongodb` feature)

pub mod prelude;

pub use docrepo_core::{backend, config, context, entity, error, helper, query, store};
pub use docrepo_macros::Entity;

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use docrepo_memory::{InMemoryStore, InMemoryStoreBuilder, MemoryStoreError};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docrepo_mongodb::{MongoDbStore, MongoDbStoreBuilder};
}

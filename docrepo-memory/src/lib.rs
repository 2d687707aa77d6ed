//! In-memory document storage backend for docrepo.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It behaves like a single document store server closely enough to run every repository
//! helper against it, which makes it the backend of choice for tests and local development.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Store-assigned identifiers** - Documents without `_id` receive an ObjectId
//! - **Index constraints** - Unique indexes reject duplicates, text indexes enable text search
//! - **Atomic find-and-modify** - Increments and sets with upsert under a single lock
//!
//! # Quick Start
//!
//! ```ignore
//! use docrepo::prelude::*;
//! use docrepo::memory::InMemoryStore;
//!
//! let store = DocumentStore::new(InMemoryStore::builder().build().await?);
//! let helper = store.helper::<TestData>("testdata");
//!
//! helper.insert_one(&Context::background(), &record).await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docrepo_memory;

pub mod error;
pub mod store;
mod evaluator;

pub use error::MemoryStoreError;
pub use store::{InMemoryStore, InMemoryStoreBuilder};

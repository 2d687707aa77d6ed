//! MongoDB backend implementation for docrepo.
//!
//! This crate provides a MongoDB-based implementation of the `StoreBackend` trait on top of
//! the official async driver. Filters, sorts and updates are rendered into the server's query
//! language; cursors are streamed back to the repository helpers as they arrive.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! docrepo = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Connection
//!
//! Connections are opened from a [`ConnectionConfig`](docrepo_core::config::ConnectionConfig)
//! or a raw connection string. Opening a connection pings the server, so an unreachable
//! cluster is reported immediately as a connection error.
//!
//! # Example
//!
//! ```ignore
//! use docrepo::{config::ConnectionConfig, context::Context, mongodb::MongoDbStore};
//!
//! let config = ConnectionConfig::new("localhost", "MongoTest").with_port(27017);
//! let store = MongoDbStore::connect(&Context::background(), &config).await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docrepo_mongodb;

pub mod store;

pub use store::{MongoDbStore, MongoDbStoreBuilder};

//! Typed repositories over a document store, addressed by Rust field names.
//!
//! This crate is the core of the docrepo project and provides:
//!
//! - **Entity shapes** ([`entity`]) - Declared field tables and logical field name resolution
//! - **Query construction** ([`query`]) - Filter, sort, update and index values and their documents
//! - **Store backend abstraction** ([`backend`]) - The trait every storage implementation provides
//! - **Connection handle** ([`store`]) - Owns one backend and hands out helpers
//! - **Repository helpers** ([`helper`]) - The typed CRUD, search and iteration operations
//! - **Cancellation** ([`context`]) - Deadlines and cancellation threaded through every call
//! - **Configuration** ([`config`]) - Connection settings and connection strings
//! - **Error handling** ([`error`]) - Error types and result types
//!
//! # Example
//!
//! ```ignore
//! use docrepo::prelude::*;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize, Entity)]
//! pub struct TestData {
//!     #[serde(rename = "name")]
//!     pub name: String,
//!     #[serde(rename = "seq")]
//!     pub seq: i64,
//! }
//!
//! let helper = store.helper::<TestData>("testdata");
//! let record = helper.find_one(&Context::background(), "name", "test1").await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docrepo_core;

pub mod backend;
pub mod config;
pub mod context;
pub mod entity;
pub mod error;
pub mod helper;
pub mod query;
pub mod store;

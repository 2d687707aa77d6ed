//! Convenient re-exports of commonly used types from docrepo.
//!
//! ```ignore
//! use docrepo::prelude::*;
//! ```

pub use docrepo_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    config::ConnectionConfig,
    context::{CancelHandle, Context},
    entity::{Entity, EntityExt, FieldMapping},
    error::{DocumentStoreError, DocumentStoreResult},
    helper::Helper,
    query::{Filter, Sort, SortDirection, Update},
    store::DocumentStore,
};
pub use docrepo_macros::Entity;

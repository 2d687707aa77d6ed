//! Entity shapes and logical field name resolution.
//!
//! An entity declares, once per type, how each of its fields is named inside a persisted
//! document. Callers then address fields by their Rust identifiers and the [`resolve`]
//! function turns those into storage keys.
//!
//! The mapping table is usually produced by `#[derive(Entity)]`, but it can be written by hand:
//!
//! ```ignore
//! use docrepo::entity::{Entity, FieldMapping};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Counter {
//!     #[serde(rename = "name")]
//!     pub name: String,
//!     #[serde(rename = "seq")]
//!     pub seq: i64,
//! }
//!
//! impl Entity for Counter {
//!     fn entity_name() -> &'static str {
//!         "Counter"
//!     }
//!
//!     fn field_mappings() -> &'static [FieldMapping] {
//!         const MAPPINGS: &[FieldMapping] =
//!             &[FieldMapping::new("name", "name"), FieldMapping::new("seq", "seq,omitempty")];
//!         MAPPINGS
//!     }
//! }
//! ```

use bson::{Bson, Document, de::deserialize_from_bson, ser::serialize_to_bson};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// A single logical field name and the raw storage tag declared for it.
///
/// The tag may carry a trailing option suffix (`"name,omitempty"`); only the part before the
/// first comma is the storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    /// The field identifier as written in Rust.
    pub field: &'static str,
    /// The declared storage tag, possibly empty.
    pub tag: &'static str,
}

impl FieldMapping {
    /// Creates a new mapping entry.
    pub const fn new(field: &'static str, tag: &'static str) -> Self {
        Self { field, tag }
    }

    /// Returns the storage key, or `None` if the declared tag has no key part.
    pub fn key(&self) -> Option<&'static str> {
        let key = match self.tag.split_once(',') {
            Some((key, _options)) => key,
            None => self.tag,
        };

        (!key.is_empty()).then_some(key)
    }
}

/// Core trait for every record type stored through a [`Helper`](crate::helper::Helper).
///
/// The serialized shape produced by `Serialize` must use the same keys as
/// [`field_mappings`](Entity::field_mappings) declares, otherwise filters built from the
/// mapping will not match stored documents.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + Unpin + 'static {
    /// Returns the name of the entity shape, used in error messages and logs.
    fn entity_name() -> &'static str;

    /// Returns the declared field table of this entity.
    fn field_mappings() -> &'static [FieldMapping];
}

/// Resolves a logical field name of `E` to its storage key.
///
/// # Errors
///
/// Returns [`DocumentStoreError::UnmappedField`] if `E` does not declare `field`, or declares it
/// with an empty storage key.
pub fn resolve<E: Entity>(field: &str) -> DocumentStoreResult<&'static str> {
    E::field_mappings()
        .iter()
        .find(|mapping| mapping.field == field)
        .and_then(FieldMapping::key)
        .ok_or_else(|| DocumentStoreError::UnmappedField {
            field: field.to_string(),
            entity: E::entity_name().to_string(),
        })
}

/// Resolves a logical field name using a value of the entity only for its type.
///
/// The value's contents are never inspected.
pub fn resolve_for<E: Entity>(_sample: &E, field: &str) -> DocumentStoreResult<&'static str> {
    resolve::<E>(field)
}

/// Extension trait providing BSON conversion for entities.
///
/// Automatically implemented for all types that implement [`Entity`].
pub trait EntityExt: Entity {
    /// Serializes this entity into a BSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the entity does not serialize to a document.
    fn to_document(&self) -> DocumentStoreResult<Document>;

    /// Decodes an entity from a stored document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not match the entity shape.
    fn from_document(document: Document) -> DocumentStoreResult<Self>;
}

impl<E: Entity> EntityExt for E {
    fn to_document(&self) -> DocumentStoreResult<Document> {
        match serialize_to_bson(self)? {
            Bson::Document(document) => Ok(document),
            other => Err(DocumentStoreError::InvalidDocument(format!(
                "entity {} serialized to {:?}, expected a document",
                E::entity_name(),
                other.element_type(),
            ))),
        }
    }

    fn from_document(document: Document) -> DocumentStoreResult<Self> {
        Ok(deserialize_from_bson(Bson::Document(document))?)
    }
}

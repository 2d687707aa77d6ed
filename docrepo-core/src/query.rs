//! Query construction for repository operations.
//!
//! Every value in this module is built from already resolved storage keys and is a pure
//! description of a request: nothing here performs I/O. Backends either render the values
//! into MongoDB documents with the `to_document` methods or evaluate them directly through
//! the [`FilterVisitor`] trait.
//!
//! The rendered shapes are:
//!
//! - Equality filter: `{key: value}`
//! - Range filter: `{key: {"$gte": start, "$lte": end}}`
//! - Text filter: `{"$text": {"$search": term}}`
//! - Field sort: `{key: 1}` or `{key: -1}`
//! - Relevance sort: `{"score": {"$meta": "textScore"}}`
//! - Increment update: `{"$inc": {key: amount}}`
//! - Set update: `{"$set": {key: value}}`
//! - Index keys: `{key: kind}`

use bson::{Bson, Document, doc};
use std::convert::Infallible;

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Ascending order (A to Z, 0 to 9, earliest to latest).
    #[default]
    Ascending,
    /// Descending order (Z to A, 9 to 0, latest to earliest).
    Descending,
}

impl SortDirection {
    /// Returns the store's numeric form of this direction.
    pub fn as_i32(self) -> i32 {
        match self {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }
}

/// A filter selecting documents in a collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document.
    All,
    /// Field equals value.
    Eq {
        /// The storage key to compare.
        key: String,
        /// The value to compare against.
        value: Bson,
    },
    /// Field lies in `[start, end]`, both bounds inclusive.
    Range {
        /// The storage key to compare.
        key: String,
        /// Inclusive lower bound.
        start: Bson,
        /// Inclusive upper bound.
        end: Bson,
    },
    /// Full text search over the collection's text index.
    Text {
        /// The search term.
        term: String,
    },
}

impl Filter {
    /// Creates an equality filter.
    pub fn eq(key: impl Into<String>, value: impl Into<Bson>) -> Self {
        Filter::Eq { key: key.into(), value: value.into() }
    }

    /// Creates an inclusive range filter.
    pub fn range(key: impl Into<String>, start: impl Into<Bson>, end: impl Into<Bson>) -> Self {
        Filter::Range { key: key.into(), start: start.into(), end: end.into() }
    }

    /// Creates a text search filter.
    pub fn text(term: impl Into<String>) -> Self {
        Filter::Text { term: term.into() }
    }

    /// Renders this filter as a query document.
    pub fn to_document(&self) -> Document {
        match FilterRenderer.visit_filter(self) {
            Ok(document) => document,
            Err(never) => match never {},
        }
    }
}

/// A sort specification for find requests.
#[derive(Debug, Clone, PartialEq)]
pub enum Sort {
    /// Sort by a stored field.
    Field {
        /// The storage key to sort on.
        key: String,
        /// The sort direction.
        direction: SortDirection,
    },
    /// Sort by text search relevance, best match first.
    TextScore,
}

impl Sort {
    /// Creates a field sort.
    pub fn field(key: impl Into<String>, direction: SortDirection) -> Self {
        Sort::Field { key: key.into(), direction }
    }

    /// Renders this sort specification as a document.
    pub fn to_document(&self) -> Document {
        match self {
            Sort::Field { key, direction } => doc! { key.as_str(): direction.as_i32() },
            Sort::TextScore => doc! { "score": { "$meta": "textScore" } },
        }
    }
}

/// An atomic single-field update.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// Adds `amount` to the field; a missing field counts as zero.
    Increment {
        /// The storage key to increment.
        key: String,
        /// The amount to add, may be negative.
        amount: i64,
    },
    /// Overwrites the field with `value`.
    Set {
        /// The storage key to set.
        key: String,
        /// The new value.
        value: Bson,
    },
}

impl Update {
    /// Creates an increment update.
    pub fn increment(key: impl Into<String>, amount: i64) -> Self {
        Update::Increment { key: key.into(), amount }
    }

    /// Creates a set update.
    pub fn set(key: impl Into<String>, value: impl Into<Bson>) -> Self {
        Update::Set { key: key.into(), value: value.into() }
    }

    /// Renders this update as an update document.
    pub fn to_document(&self) -> Document {
        match self {
            Update::Increment { key, amount } => doc! { "$inc": { key.as_str(): *amount } },
            Update::Set { key, value } => doc! { "$set": { key.as_str(): value.clone() } },
        }
    }
}

/// The index type tag stored in an index key document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// Ascending single-field index (`1`).
    Ascending,
    /// Descending single-field index (`-1`).
    Descending,
    /// Text index (`"text"`), enables text search.
    Text,
    /// Hashed index (`"hashed"`).
    Hashed,
}

impl IndexKind {
    /// Returns the value used for this kind in an index key document.
    pub fn as_bson(self) -> Bson {
        match self {
            IndexKind::Ascending => Bson::Int32(1),
            IndexKind::Descending => Bson::Int32(-1),
            IndexKind::Text => Bson::String("text".to_string()),
            IndexKind::Hashed => Bson::String("hashed".to_string()),
        }
    }
}

/// A single-field index definition.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSpec {
    /// The requested index name.
    pub name: String,
    /// The storage key to index.
    pub key: String,
    /// The index type.
    pub kind: IndexKind,
    /// Whether the index enforces unique values.
    pub unique: bool,
}

impl IndexSpec {
    /// Creates a new index definition.
    pub fn new(name: impl Into<String>, key: impl Into<String>, kind: IndexKind, unique: bool) -> Self {
        Self { name: name.into(), key: key.into(), kind, unique }
    }

    /// Renders the index key document.
    pub fn keys_document(&self) -> Document {
        doc! { self.key.as_str(): self.kind.as_bson() }
    }
}

/// Options for multi-document find requests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    /// Optional sort specification; store-defined order when absent.
    pub sort: Option<Sort>,
}

impl FindOptions {
    /// Options sorting by the given specification.
    pub fn sorted(sort: Sort) -> Self {
        Self { sort: Some(sort) }
    }
}

/// Options for whole-document replacement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceOptions {
    /// Insert the replacement if nothing matches.
    pub upsert: bool,
}

/// Which version of a document a find-and-modify request returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnDocument {
    /// The document as it was before the update.
    Before,
    /// The document as it is after the update.
    #[default]
    After,
}

/// Options for find-and-modify requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindOneAndUpdateOptions {
    /// Create the document if nothing matches.
    pub upsert: bool,
    /// Which version of the document to return.
    pub return_document: ReturnDocument,
}

impl Default for FindOneAndUpdateOptions {
    fn default() -> Self {
        Self { upsert: true, return_document: ReturnDocument::After }
    }
}

/// Visitor over [`Filter`] variants.
///
/// Backends implement this to translate or evaluate filters.
pub trait FilterVisitor {
    type Output;
    type Error;

    fn visit_all(&mut self) -> Result<Self::Output, Self::Error>;
    fn visit_eq(&mut self, key: &str, value: &Bson) -> Result<Self::Output, Self::Error>;
    fn visit_range(
        &mut self,
        key: &str,
        start: &Bson,
        end: &Bson,
    ) -> Result<Self::Output, Self::Error>;
    fn visit_text(&mut self, term: &str) -> Result<Self::Output, Self::Error>;

    fn visit_filter(&mut self, filter: &Filter) -> Result<Self::Output, Self::Error> {
        match filter {
            Filter::All => self.visit_all(),
            Filter::Eq { key, value } => self.visit_eq(key, value),
            Filter::Range { key, start, end } => self.visit_range(key, start, end),
            Filter::Text { term } => self.visit_text(term),
        }
    }
}

struct FilterRenderer;

impl FilterVisitor for FilterRenderer {
    type Output = Document;
    type Error = Infallible;

    fn visit_all(&mut self) -> Result<Self::Output, Self::Error> {
        Ok(doc! {})
    }

    fn visit_eq(&mut self, key: &str, value: &Bson) -> Result<Self::Output, Self::Error> {
        Ok(doc! { key: value.clone() })
    }

    fn visit_range(&mut self, key: &str, start: &Bson, end: &Bson) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            key: {
                "$gte": start.clone(),
                "$lte": end.clone(),
            },
        })
    }

    fn visit_text(&mut self, term: &str) -> Result<Self::Output, Self::Error> {
        Ok(doc! { "$text": { "$search": term } })
    }
}

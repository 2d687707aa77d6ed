//! In-memory storage implementation for document stores.
//!
//! Collections are kept as insertion-ordered vectors of BSON documents behind an async-aware
//! read-write lock, together with the index definitions created on them.

use async_trait::async_trait;
use bson::{Bson, Document, doc, oid::ObjectId};
use futures::{StreamExt, stream};
use mea::rwlock::RwLock;
use std::{collections::HashMap, sync::Arc};
use tracing::debug;

use docrepo_core::{
    backend::{DocumentStream, StoreBackend, StoreBackendBuilder},
    error::{DocumentStoreError, DocumentStoreResult},
    query::{
        Filter, FindOneAndUpdateOptions, FindOptions, IndexKind, IndexSpec, ReplaceOptions,
        ReturnDocument, Sort, SortDirection, Update,
    },
};

use crate::{
    error::MemoryStoreError,
    evaluator::{Comparable, DocumentEvaluator, text_score},
};

const ID_KEY: &str = "_id";
const ID_INDEX: &str = "_id_";

#[derive(Debug, Default)]
struct CollectionState {
    documents: Vec<Document>,
    indexes: Vec<IndexSpec>,
}

type StoreMap = HashMap<String, CollectionState>;

impl CollectionState {
    fn text_keys(&self) -> Vec<String> {
        self.indexes
            .iter()
            .filter(|index| index.kind == IndexKind::Text)
            .map(|index| index.key.clone())
            .collect()
    }

    /// Positions of every document matching `filter`, in natural order.
    fn positions(&self, filter: &Filter) -> DocumentStoreResult<Vec<usize>> {
        let text_keys = self.text_keys();

        if matches!(filter, Filter::Text { .. }) && text_keys.is_empty() {
            return Err(DocumentStoreError::backend(MemoryStoreError::TextIndexRequired));
        }

        let mut positions = Vec::new();

        for (position, document) in self.documents.iter().enumerate() {
            if DocumentEvaluator::new(document, &text_keys).evaluate(filter)? {
                positions.push(position);
            }
        }

        Ok(positions)
    }

    fn first_position(&self, filter: &Filter) -> DocumentStoreResult<Option<usize>> {
        Ok(self.positions(filter)?.into_iter().next())
    }

    /// Rejects `document` if it collides with another document on `_id` or a unique index.
    ///
    /// The document at `skip` is the one being replaced and is ignored.
    fn check_unique(
        &self,
        collection: &str,
        document: &Document,
        skip: Option<usize>,
    ) -> DocumentStoreResult<()> {
        let unique_keys = std::iter::once((ID_INDEX, ID_KEY)).chain(
            self.indexes
                .iter()
                .filter(|index| index.unique)
                .map(|index| (index.name.as_str(), index.key.as_str())),
        );

        for (index, key) in unique_keys {
            let value = document.get(key).unwrap_or(&Bson::Null);
            let wanted = Comparable::from(value);

            let collides = self
                .documents
                .iter()
                .enumerate()
                .filter(|(position, _)| Some(*position) != skip)
                .any(|(_, other)| Comparable::from(other.get(key).unwrap_or(&Bson::Null)) == wanted);

            if collides {
                return Err(DocumentStoreError::backend(MemoryStoreError::DuplicateKey {
                    collection: collection.to_string(),
                    index: index.to_string(),
                    key: key.to_string(),
                    value: value.to_string(),
                }));
            }
        }

        Ok(())
    }

    /// Assigns an `_id` if missing, checks uniqueness and appends the document.
    fn insert(&mut self, collection: &str, document: Document) -> DocumentStoreResult<Bson> {
        let document = with_id(document);
        self.check_unique(collection, &document, None)?;

        let id = document.get(ID_KEY).cloned().unwrap_or(Bson::Null);
        self.documents.push(document);

        Ok(id)
    }
}

/// Returns `document` with an `_id`, generating an ObjectId as the first field when absent.
fn with_id(document: Document) -> Document {
    if document.contains_key(ID_KEY) {
        return document;
    }

    let mut with_id = doc! { ID_KEY: ObjectId::new() };
    with_id.extend(document);
    with_id
}

/// The fields an upserted document starts from.
fn upsert_seed(filter: &Filter) -> Document {
    match filter {
        Filter::Eq { key, value } => doc! { key.as_str(): value.clone() },
        _ => Document::new(),
    }
}

fn apply_update(document: &mut Document, update: &Update) -> DocumentStoreResult<()> {
    match update {
        Update::Increment { key, amount } => {
            let next = match document.get(key) {
                None | Some(Bson::Null) => Bson::Int64(*amount),
                Some(Bson::Int32(value)) => Bson::Int64(
                    (*value as i64)
                        .checked_add(*amount)
                        .ok_or_else(|| overflow(key))?,
                ),
                Some(Bson::Int64(value)) => Bson::Int64(
                    value
                        .checked_add(*amount)
                        .ok_or_else(|| overflow(key))?,
                ),
                Some(Bson::Double(value)) => Bson::Double(value + *amount as f64),
                Some(_) => {
                    return Err(DocumentStoreError::backend(MemoryStoreError::NonNumericIncrement(
                        key.clone(),
                    )));
                }
            };

            document.insert(key.as_str(), next);
        }
        Update::Set { key, value } => {
            document.insert(key.as_str(), value.clone());
        }
    }

    Ok(())
}

fn overflow(key: &str) -> DocumentStoreError {
    DocumentStoreError::backend(MemoryStoreError::IncrementOverflow(key.to_string()))
}

/// Thread-safe in-memory document storage backend.
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, so clones share the
/// same collections. Every operation runs under a single lock acquisition, which makes
/// find-and-modify requests atomic with respect to each other.
///
/// Filters scan the whole collection. Indexes are kept for their constraints: unique indexes
/// reject duplicates and text indexes define the fields text search looks at.
///
/// # Example
///
/// ```ignore
/// use docrepo_memory::InMemoryStore;
/// use docrepo_core::{backend::StoreBackend, query::Filter};
/// use bson::doc;
///
/// let store = InMemoryStore::new();
/// store.insert_one("users", doc! { "name": "Alice" }).await?;
///
/// let alice = store.find_one("users", Filter::eq("name", "Alice")).await?;
/// assert!(alice.is_some());
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// collection name -> documents and indexes
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    /// Creates a builder for constructing an `InMemoryStore`.
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder
    }
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn ping(&self) -> DocumentStoreResult<()> {
        Ok(())
    }

    async fn insert_one(&self, collection: &str, document: Document) -> DocumentStoreResult<Bson> {
        let mut store = self.store.write().await;

        store
            .entry(collection.to_string())
            .or_default()
            .insert(collection, document)
    }

    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> DocumentStoreResult<Vec<Bson>> {
        let mut store = self.store.write().await;
        let state = store.entry(collection.to_string()).or_default();

        documents
            .into_iter()
            .map(|document| state.insert(collection, document))
            .collect()
    }

    async fn find_one(&self, collection: &str, filter: Filter) -> DocumentStoreResult<Option<Document>> {
        let store = self.store.read().await;
        let empty = CollectionState::default();
        let state = store.get(collection).unwrap_or(&empty);

        Ok(
            state
                .first_position(&filter)?
                .map(|position| state.documents[position].clone())
        )
    }

    async fn find(
        &self,
        collection: &str,
        filter: Filter,
        options: FindOptions,
    ) -> DocumentStoreResult<DocumentStream> {
        let store = self.store.read().await;
        let empty = CollectionState::default();
        let state = store.get(collection).unwrap_or(&empty);

        let mut matched = state
            .positions(&filter)?
            .into_iter()
            .map(|position| state.documents[position].clone())
            .collect::<Vec<_>>();

        match &options.sort {
            Some(Sort::Field { key, direction }) => {
                matched.sort_by(|a, b| {
                    let left = a.get(key).map(Comparable::from).unwrap_or(Comparable::Null);
                    let right = b.get(key).map(Comparable::from).unwrap_or(Comparable::Null);

                    match direction {
                        SortDirection::Ascending => left.sort_cmp(&right),
                        SortDirection::Descending => right.sort_cmp(&left),
                    }
                });
            }
            Some(Sort::TextScore) => {
                let Filter::Text { term } = &filter else {
                    return Err(DocumentStoreError::backend(MemoryStoreError::TextScoreUnavailable));
                };
                let text_keys = state.text_keys();

                let mut scored = matched
                    .into_iter()
                    .map(|document| (text_score(&document, &text_keys, term), document))
                    .collect::<Vec<_>>();
                scored.sort_by(|(a, _), (b, _)| b.total_cmp(a));

                matched = scored.into_iter().map(|(_, document)| document).collect();
            }
            None => {}
        }

        debug!(collection, matched = matched.len(), "in-memory find");

        Ok(stream::iter(matched.into_iter().map(Ok)).boxed())
    }

    async fn replace_one(
        &self,
        collection: &str,
        filter: Filter,
        replacement: Document,
        options: ReplaceOptions,
    ) -> DocumentStoreResult<u64> {
        let mut store = self.store.write().await;
        let state = store.entry(collection.to_string()).or_default();

        match state.first_position(&filter)? {
            Some(position) => {
                let mut replacement = replacement;
                let existing_id = state.documents[position]
                    .get(ID_KEY)
                    .cloned()
                    .unwrap_or(Bson::Null);

                if let Some(requested) = replacement.get(ID_KEY) {
                    if Comparable::from(requested) != Comparable::from(&existing_id) {
                        return Err(DocumentStoreError::backend(MemoryStoreError::ImmutableId {
                            existing: existing_id.to_string(),
                            requested: requested.to_string(),
                        }));
                    }
                }

                replacement.insert(ID_KEY, existing_id);
                state.check_unique(collection, &replacement, Some(position))?;
                state.documents[position] = replacement;

                Ok(1)
            }
            None if options.upsert => {
                let mut seeded = upsert_seed(&filter);
                seeded.extend(replacement);
                state.insert(collection, seeded)?;

                Ok(0)
            }
            None => Ok(0),
        }
    }

    async fn delete_one(&self, collection: &str, filter: Filter) -> DocumentStoreResult<u64> {
        let mut store = self.store.write().await;
        let Some(state) = store.get_mut(collection) else {
            return Ok(0);
        };

        match state.first_position(&filter)? {
            Some(position) => {
                state.documents.remove(position);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_many(&self, collection: &str, filter: Filter) -> DocumentStoreResult<u64> {
        let mut store = self.store.write().await;
        let Some(state) = store.get_mut(collection) else {
            return Ok(0);
        };

        let positions = state.positions(&filter)?;

        // Highest first so earlier positions stay valid.
        for position in positions.iter().rev() {
            state.documents.remove(*position);
        }

        Ok(positions.len() as u64)
    }

    async fn find_one_and_update(
        &self,
        collection: &str,
        filter: Filter,
        update: Update,
        options: FindOneAndUpdateOptions,
    ) -> DocumentStoreResult<Option<Document>> {
        let mut store = self.store.write().await;
        let state = store.entry(collection.to_string()).or_default();

        match state.first_position(&filter)? {
            Some(position) => {
                let before = state.documents[position].clone();
                let mut after = before.clone();

                apply_update(&mut after, &update)?;
                state.check_unique(collection, &after, Some(position))?;
                state.documents[position] = after.clone();

                Ok(Some(match options.return_document {
                    ReturnDocument::Before => before,
                    ReturnDocument::After => after,
                }))
            }
            None if options.upsert => {
                let mut created = with_id(upsert_seed(&filter));
                apply_update(&mut created, &update)?;
                state.insert(collection, created.clone())?;

                debug!(collection, "in-memory upsert created document");

                Ok(match options.return_document {
                    ReturnDocument::Before => None,
                    ReturnDocument::After => Some(created),
                })
            }
            None => Ok(None),
        }
    }

    async fn create_index(&self, collection: &str, index: IndexSpec) -> DocumentStoreResult<String> {
        let mut store = self.store.write().await;
        let state = store.entry(collection.to_string()).or_default();

        if let Some(existing) = state
            .indexes
            .iter()
            .find(|existing| existing.key == index.key && existing.kind == index.kind)
        {
            return Ok(existing.name.clone());
        }

        if state.indexes.iter().any(|existing| existing.name == index.name) {
            return Err(DocumentStoreError::backend(MemoryStoreError::IndexConflict(index.name)));
        }

        if index.unique {
            for (position, document) in state.documents.iter().enumerate() {
                let value = document.get(&index.key).unwrap_or(&Bson::Null);
                let wanted = Comparable::from(value);

                let collides = state.documents[position + 1..]
                    .iter()
                    .any(|other| Comparable::from(other.get(&index.key).unwrap_or(&Bson::Null)) == wanted);

                if collides {
                    return Err(DocumentStoreError::backend(MemoryStoreError::DuplicateKey {
                        collection: collection.to_string(),
                        index: index.name.clone(),
                        key: index.key.clone(),
                        value: value.to_string(),
                    }));
                }
            }
        }

        debug!(collection, index = %index.name, key = %index.key, "in-memory index created");

        let name = index.name.clone();
        state.indexes.push(index);

        Ok(name)
    }

    async fn drop_collection(&self, collection: &str) -> DocumentStoreResult<()> {
        self.store.write().await.remove(collection);

        Ok(())
    }
}

/// Builder for constructing [`InMemoryStore`] instances.
///
/// # Example
///
/// ```ignore
/// use docrepo_memory::InMemoryStore;
/// use docrepo_core::backend::StoreBackendBuilder;
///
/// let store = InMemoryStore::builder().build().await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    /// Builds and returns a new [`InMemoryStore`] instance.
    ///
    /// This always succeeds and returns a freshly initialized store.
    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    async fn collect(stream: DocumentStream) -> Vec<Document> {
        stream.try_collect().await.unwrap()
    }

    fn names(documents: &[Document]) -> Vec<&str> {
        documents.iter().map(|d| d.get_str("name").unwrap()).collect()
    }

    #[tokio::test]
    async fn insert_assigns_object_ids() {
        let store = InMemoryStore::new();

        let id = store.insert_one("items", doc! { "name": "a" }).await.unwrap();
        let found = store.find_one("items", Filter::eq("name", "a")).await.unwrap().unwrap();

        assert!(matches!(id, Bson::ObjectId(_)));
        assert_eq!(found.get("_id"), Some(&id));
    }

    #[tokio::test]
    async fn insert_many_stops_at_first_duplicate() {
        let store = InMemoryStore::new();
        let id = ObjectId::new();

        let result = store
            .insert_many(
                "items",
                vec![doc! { "_id": id, "name": "a" }, doc! { "_id": id, "name": "b" }],
            )
            .await;

        assert!(result.is_err());
        let remaining = collect(store.find("items", Filter::All, FindOptions::default()).await.unwrap()).await;
        assert_eq!(names(&remaining), vec!["a"]);
    }

    #[tokio::test]
    async fn unique_index_rejects_duplicates() {
        let store = InMemoryStore::new();
        store
            .create_index("items", IndexSpec::new("name_1", "name", IndexKind::Ascending, true))
            .await
            .unwrap();

        store.insert_one("items", doc! { "name": "a" }).await.unwrap();
        let err = store.insert_one("items", doc! { "name": "a" }).await.unwrap_err();

        assert!(err.to_string().contains("duplicate key"));
    }

    #[tokio::test]
    async fn create_index_reuses_equivalent_index() {
        let store = InMemoryStore::new();

        let first = store
            .create_index("items", IndexSpec::new("by_name", "name", IndexKind::Ascending, false))
            .await
            .unwrap();
        let second = store
            .create_index("items", IndexSpec::new("other", "name", IndexKind::Ascending, false))
            .await
            .unwrap();

        assert_eq!(first, "by_name");
        assert_eq!(second, "by_name");
    }

    #[tokio::test]
    async fn find_sorts_by_field() {
        let store = InMemoryStore::new();
        store
            .insert_many(
                "items",
                vec![
                    doc! { "name": "b", "seq": 2 },
                    doc! { "name": "c", "seq": 3 },
                    doc! { "name": "a", "seq": 1 },
                ],
            )
            .await
            .unwrap();

        let descending = collect(
            store
                .find("items", Filter::All, FindOptions::sorted(Sort::field("seq", SortDirection::Descending)))
                .await
                .unwrap(),
        )
        .await;

        assert_eq!(names(&descending), vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn text_search_orders_by_relevance() {
        let store = InMemoryStore::new();
        store
            .create_index("items", IndexSpec::new("data_text", "data", IndexKind::Text, false))
            .await
            .unwrap();
        store
            .insert_many(
                "items",
                vec![
                    doc! { "name": "one", "data": "apple" },
                    doc! { "name": "none", "data": "pear" },
                    doc! { "name": "two", "data": "apple and apple" },
                ],
            )
            .await
            .unwrap();

        let found = collect(
            store
                .find("items", Filter::text("apple"), FindOptions::sorted(Sort::TextScore))
                .await
                .unwrap(),
        )
        .await;

        assert_eq!(names(&found), vec!["two", "one"]);
    }

    #[tokio::test]
    async fn text_search_without_index_fails() {
        let store = InMemoryStore::new();

        let result = store.find("items", Filter::text("apple"), FindOptions::default()).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn replace_upserts_then_matches() {
        let store = InMemoryStore::new();
        let options = ReplaceOptions { upsert: true };

        let first = store
            .replace_one("items", Filter::eq("name", "a"), doc! { "name": "a", "v": 1 }, options)
            .await
            .unwrap();
        let id = store.find_one("items", Filter::eq("name", "a")).await.unwrap().unwrap().get("_id").cloned();
        let second = store
            .replace_one("items", Filter::eq("name", "a"), doc! { "name": "a", "v": 2 }, options)
            .await
            .unwrap();
        let stored = store.find_one("items", Filter::eq("name", "a")).await.unwrap().unwrap();

        assert_eq!((first, second), (0, 1));
        assert_eq!(stored.get_i32("v").unwrap(), 2);
        assert_eq!(stored.get("_id").cloned(), id);
    }

    #[tokio::test]
    async fn increment_upserts_from_zero() {
        let store = InMemoryStore::new();
        let filter = Filter::eq("name", "counter");

        let created = store
            .find_one_and_update("items", filter.clone(), Update::increment("seq", 1), Default::default())
            .await
            .unwrap()
            .unwrap();
        let bumped = store
            .find_one_and_update("items", filter, Update::increment("seq", 5), Default::default())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(created.get_str("name").unwrap(), "counter");
        assert_eq!(created.get_i64("seq").unwrap(), 1);
        assert_eq!(bumped.get_i64("seq").unwrap(), 6);
    }

    #[tokio::test]
    async fn increment_rejects_non_numeric_fields() {
        let store = InMemoryStore::new();
        store.insert_one("items", doc! { "name": "a", "seq": "x" }).await.unwrap();

        let result = store
            .find_one_and_update("items", Filter::eq("name", "a"), Update::increment("seq", 1), Default::default())
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn update_can_return_previous_version() {
        let store = InMemoryStore::new();
        store.insert_one("items", doc! { "name": "a", "v": "old" }).await.unwrap();
        let options = FindOneAndUpdateOptions { upsert: false, return_document: ReturnDocument::Before };

        let before = store
            .find_one_and_update("items", Filter::eq("name", "a"), Update::set("v", "new"), options)
            .await
            .unwrap()
            .unwrap();
        let missing = store
            .find_one_and_update("items", Filter::eq("name", "b"), Update::set("v", "new"), options)
            .await
            .unwrap();

        assert_eq!(before.get_str("v").unwrap(), "old");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn deletes_report_counts() {
        let store = InMemoryStore::new();
        store
            .insert_many("items", vec![doc! { "k": 1 }, doc! { "k": 2 }, doc! { "k": 2 }, doc! { "k": 2 }])
            .await
            .unwrap();

        assert_eq!(store.delete_one("items", Filter::eq("k", 1)).await.unwrap(), 1);
        assert_eq!(store.delete_many("items", Filter::eq("k", 2)).await.unwrap(), 3);
        assert_eq!(store.delete_many("items", Filter::eq("k", 2)).await.unwrap(), 0);
        assert_eq!(store.delete_one("missing", Filter::All).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn clones_share_state_until_dropped() {
        let store = InMemoryStore::builder().build().await.unwrap();
        let other = store.clone();

        store.insert_one("items", doc! { "name": "a" }).await.unwrap();
        assert!(other.find_one("items", Filter::All).await.unwrap().is_some());

        other.drop_collection("items").await.unwrap();
        assert!(store.find_one("items", Filter::All).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn binary_ids_are_distinct_keys() {
        use bson::{Binary, spec::BinarySubtype};

        let store = InMemoryStore::new();
        let uuid = |byte: u8| Bson::Binary(Binary { subtype: BinarySubtype::Uuid, bytes: vec![byte; 16] });

        store.insert_one("items", doc! { "_id": uuid(1), "name": "one" }).await.unwrap();
        store.insert_one("items", doc! { "_id": uuid(2), "name": "two" }).await.unwrap();

        let one = store.find_one("items", Filter::eq("_id", uuid(1))).await.unwrap().unwrap();
        let two = store.find_one("items", Filter::eq("_id", uuid(2))).await.unwrap().unwrap();

        assert_eq!(one.get_str("name").unwrap(), "one");
        assert_eq!(two.get_str("name").unwrap(), "two");
        assert!(store.find_one("items", Filter::eq("_id", uuid(9))).await.unwrap().is_none());
        assert!(store.insert_one("items", doc! { "_id": uuid(1) }).await.is_err());
    }

    #[tokio::test]
    async fn large_integers_match_exactly() {
        let store = InMemoryStore::new();
        let big = 9_007_199_254_740_992_i64;
        store.insert_one("items", doc! { "seq": big }).await.unwrap();

        assert!(store.find_one("items", Filter::eq("seq", big + 1)).await.unwrap().is_none());
        assert!(store.find_one("items", Filter::eq("seq", big)).await.unwrap().is_some());
        assert!(
            store
                .find_one("items", Filter::range("seq", big + 1, i64::MAX))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn replace_rejects_a_changed_id() {
        let store = InMemoryStore::new();
        let id = store.insert_one("items", doc! { "name": "a" }).await.unwrap();
        let options = ReplaceOptions { upsert: false };

        let changed = store
            .replace_one("items", Filter::eq("name", "a"), doc! { "_id": ObjectId::new(), "name": "b" }, options)
            .await;
        let same = store
            .replace_one("items", Filter::eq("name", "a"), doc! { "_id": id.clone(), "name": "c" }, options)
            .await
            .unwrap();

        assert!(changed.unwrap_err().to_string().contains("immutable"));
        assert_eq!(same, 1);
        assert_eq!(store.find_one("items", Filter::All).await.unwrap().unwrap().get("_id"), Some(&id));
    }

    #[tokio::test]
    async fn sort_places_nan_below_other_numbers() {
        let store = InMemoryStore::new();
        let values = (0..64)
            .map(|i| match i % 4 {
                0 => Bson::Double(f64::NAN),
                1 => Bson::Double(i as f64 / 2.0),
                2 => Bson::Int64(64 - i),
                _ => Bson::Int32(i as i32),
            })
            .map(|value| doc! { "v": value })
            .collect::<Vec<_>>();
        store.insert_many("items", values).await.unwrap();

        let sorted = collect(
            store
                .find("items", Filter::All, FindOptions::sorted(Sort::field("v", SortDirection::Ascending)))
                .await
                .unwrap(),
        )
        .await;
        let numbers = sorted
            .iter()
            .map(|d| match d.get("v") {
                Some(Bson::Double(v)) => *v,
                Some(Bson::Int32(v)) => f64::from(*v),
                Some(Bson::Int64(v)) => *v as f64,
                _ => unreachable!(),
            })
            .collect::<Vec<_>>();

        assert!(numbers[..16].iter().all(|v| v.is_nan()));
        assert!(numbers[16..].windows(2).all(|pair| pair[0] <= pair[1]));
    }
}

//! Typed repository helpers.
//!
//! A [`Helper`] binds an [`Entity`] type to one collection of a [`StoreBackend`] and exposes the
//! full set of entity operations. Every operation resolves all logical field names it is given
//! before touching the store, so a misspelled field fails without a round trip.
//!
//! Find-and-modify operations always upsert and always return the updated document.
//!
//! # Example
//!
//! ```ignore
//! let helper = store.helper::<TestData>("testdata");
//!
//! helper.insert_one(&ctx, &record).await?;
//! let found = helper.find_one(&ctx, "name", "test1").await?;
//! let bumped = helper.find_one_and_increment_field(&ctx, "name", "test1", "seq", 5).await?;
//! ```

use bson::{Bson, DateTime};
use futures::TryStreamExt;
use std::{future::Future, marker::PhantomData};
use tracing::{debug, trace};

use crate::{
    backend::StoreBackend,
    context::Context,
    entity::{Entity, EntityExt, resolve},
    error::{DocumentStoreError, DocumentStoreResult},
    query::{
        Filter, FindOneAndUpdateOptions, FindOptions, IndexKind, IndexSpec, ReplaceOptions, Sort,
        SortDirection, Update,
    },
};

/// Type-safe accessor for the entities of one collection.
///
/// Helpers borrow the backend and hold no other state than the collection name; they are
/// cheap to create and need no teardown.
#[derive(Debug)]
pub struct Helper<'a, B: StoreBackend, T: Entity> {
    backend: &'a B,
    collection: String,
    _marker: PhantomData<T>,
}

impl<'a, B: StoreBackend, T: Entity> Clone for Helper<'a, B, T> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend,
            collection: self.collection.clone(),
            _marker: PhantomData,
        }
    }
}

impl<'a, B: StoreBackend, T: Entity> Helper<'a, B, T> {
    /// Creates a helper for `collection` on `backend`.
    pub fn new(backend: &'a B, collection: impl Into<String>) -> Self {
        Self {
            backend,
            collection: collection.into(),
            _marker: PhantomData,
        }
    }

    /// Returns the name of the bound collection.
    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    /// Creates a single-field index on `field` and returns the index name.
    ///
    /// The returned name may differ from `name` if an equivalent index already exists.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::UnmappedField`] before any I/O if `field` does not resolve.
    pub async fn create_index(
        &self,
        ctx: &Context,
        name: &str,
        field: &str,
        kind: IndexKind,
        unique: bool,
    ) -> DocumentStoreResult<String> {
        let key = resolve::<T>(field)?;
        debug!(collection = %self.collection, entity = T::entity_name(), key, name, ?kind, unique, "create_index");

        ctx.run(
            self.backend
                .create_index(&self.collection, IndexSpec::new(name, key, kind, unique)),
        )
        .await
    }

    /// Inserts one entity and returns the identifier assigned by the store.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the entity cannot be encoded, or the backend error.
    pub async fn insert_one(&self, ctx: &Context, entity: &T) -> DocumentStoreResult<Bson> {
        let document = entity.to_document()?;
        debug!(collection = %self.collection, entity = T::entity_name(), "insert_one");

        ctx.run(self.backend.insert_one(&self.collection, document))
            .await
    }

    /// Inserts entities and returns their identifiers in input order.
    ///
    /// There is no rollback when the store fails part way through.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidDocument`] before any I/O if `entities` is empty.
    pub async fn insert_many(&self, ctx: &Context, entities: &[T]) -> DocumentStoreResult<Vec<Bson>> {
        if entities.is_empty() {
            return Err(DocumentStoreError::InvalidDocument(
                "insert_many requires at least one entity".to_string(),
            ));
        }

        let documents = entities
            .iter()
            .map(|entity| entity.to_document())
            .collect::<DocumentStoreResult<Vec<_>>>()?;
        debug!(collection = %self.collection, entity = T::entity_name(), count = documents.len(), "insert_many");

        ctx.run(self.backend.insert_many(&self.collection, documents))
            .await
    }

    /// Finds the entity whose `field` equals `value`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::UnmappedField`] before any I/O if `field` does not resolve,
    /// and [`DocumentStoreError::DocumentNotFound`] if nothing matches.
    pub async fn find_one(
        &self,
        ctx: &Context,
        field: &str,
        value: impl Into<Bson>,
    ) -> DocumentStoreResult<T> {
        let key = resolve::<T>(field)?;
        debug!(collection = %self.collection, entity = T::entity_name(), key, "find_one");

        self.find_one_by(ctx, Filter::eq(key, value)).await
    }

    /// Finds the entity with the given `_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::DocumentNotFound`] if nothing matches.
    pub async fn find_by_id(&self, ctx: &Context, id: impl Into<Bson>) -> DocumentStoreResult<T> {
        debug!(collection = %self.collection, entity = T::entity_name(), "find_by_id");

        self.find_one_by(ctx, Filter::eq("_id", id)).await
    }

    /// Finds every entity whose `field` equals `value`.
    ///
    /// Results are sorted by `sort_field` in `sort_dir` when a sort field is given, otherwise
    /// they come back in store order.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::UnmappedField`] before any I/O if either field does not
    /// resolve.
    pub async fn find_many(
        &self,
        ctx: &Context,
        field: &str,
        value: impl Into<Bson>,
        sort_field: Option<&str>,
        sort_dir: SortDirection,
    ) -> DocumentStoreResult<Vec<T>> {
        let key = resolve::<T>(field)?;
        let options = match sort_field {
            Some(sort_field) => FindOptions::sorted(Sort::field(resolve::<T>(sort_field)?, sort_dir)),
            None => FindOptions::default(),
        };
        debug!(collection = %self.collection, entity = T::entity_name(), key, sort = ?options.sort, "find_many");

        self.collect(ctx, Filter::eq(key, value), options).await
    }

    /// Finds every entity whose `field` lies within `[start, end]`, sorted by that field.
    ///
    /// Both bounds are inclusive. An inverted range is passed to the store as is.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::UnmappedField`] before any I/O if `field` does not resolve.
    pub async fn find_by_date_range(
        &self,
        ctx: &Context,
        field: &str,
        start: impl Into<DateTime>,
        end: impl Into<DateTime>,
        sort_dir: SortDirection,
    ) -> DocumentStoreResult<Vec<T>> {
        let key = resolve::<T>(field)?;
        let (start, end): (DateTime, DateTime) = (start.into(), end.into());
        debug!(collection = %self.collection, entity = T::entity_name(), key, %start, %end, "find_by_date_range");

        self.collect(
            ctx,
            Filter::range(key, start, end),
            FindOptions::sorted(Sort::field(key, sort_dir)),
        )
        .await
    }

    /// Replaces the document whose `field` equals `value` with `entity`, inserting it if absent.
    ///
    /// Returns the matched count: `0` when the entity was inserted, `1` when it replaced a
    /// document.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::UnmappedField`] before any I/O if `field` does not resolve.
    pub async fn save_one(
        &self,
        ctx: &Context,
        entity: &T,
        field: &str,
        value: impl Into<Bson>,
    ) -> DocumentStoreResult<u64> {
        let key = resolve::<T>(field)?;
        let replacement = entity.to_document()?;
        debug!(collection = %self.collection, entity = T::entity_name(), key, "save_one");

        ctx.run(self.backend.replace_one(
            &self.collection,
            Filter::eq(key, value),
            replacement,
            ReplaceOptions { upsert: true },
        ))
        .await
    }

    /// Deletes the first document whose `field` equals `value` and returns the deleted count.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::UnmappedField`] before any I/O if `field` does not resolve.
    pub async fn delete_one(
        &self,
        ctx: &Context,
        field: &str,
        value: impl Into<Bson>,
    ) -> DocumentStoreResult<u64> {
        let key = resolve::<T>(field)?;
        debug!(collection = %self.collection, entity = T::entity_name(), key, "delete_one");

        ctx.run(self.backend.delete_one(&self.collection, Filter::eq(key, value)))
            .await
    }

    /// Deletes every document whose `field` equals `value` and returns the deleted count.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::UnmappedField`] before any I/O if `field` does not resolve.
    pub async fn delete_many(
        &self,
        ctx: &Context,
        field: &str,
        value: impl Into<Bson>,
    ) -> DocumentStoreResult<u64> {
        let key = resolve::<T>(field)?;
        debug!(collection = %self.collection, entity = T::entity_name(), key, "delete_many");

        ctx.run(self.backend.delete_many(&self.collection, Filter::eq(key, value)))
            .await
    }

    /// Adds `amount` to `update_field` of the document whose `field` equals `value` and returns
    /// the updated entity.
    ///
    /// If nothing matches, a document is created from the filter and the field starts from
    /// zero, so the first call returns `amount`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::UnmappedField`] before any I/O if either field does not
    /// resolve.
    pub async fn find_one_and_increment_field(
        &self,
        ctx: &Context,
        field: &str,
        value: impl Into<Bson>,
        update_field: &str,
        amount: i64,
    ) -> DocumentStoreResult<T> {
        let key = resolve::<T>(field)?;
        let update_key = resolve::<T>(update_field)?;
        debug!(collection = %self.collection, entity = T::entity_name(), key, update_key, amount, "find_one_and_increment_field");

        self.find_one_and_modify(ctx, Filter::eq(key, value), Update::increment(update_key, amount))
            .await
    }

    /// Sets `update_field` to `new_value` on the document whose `field` equals `value` and
    /// returns the updated entity, creating the document if absent.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::UnmappedField`] before any I/O if either field does not
    /// resolve.
    pub async fn find_one_and_update_field(
        &self,
        ctx: &Context,
        field: &str,
        value: impl Into<Bson>,
        update_field: &str,
        new_value: impl Into<Bson>,
    ) -> DocumentStoreResult<T> {
        let key = resolve::<T>(field)?;
        let update_key = resolve::<T>(update_field)?;
        debug!(collection = %self.collection, entity = T::entity_name(), key, update_key, "find_one_and_update_field");

        self.find_one_and_modify(ctx, Filter::eq(key, value), Update::set(update_key, new_value))
            .await
    }

    /// Runs a full text search and returns matches by descending relevance.
    ///
    /// The collection needs a text index. No match yields an empty vector.
    ///
    /// # Errors
    ///
    /// Returns the backend error, for instance when no text index exists.
    pub async fn text_search(&self, ctx: &Context, term: &str) -> DocumentStoreResult<Vec<T>> {
        debug!(collection = %self.collection, entity = T::entity_name(), term, "text_search");

        self.collect(ctx, Filter::text(term), FindOptions::sorted(Sort::TextScore))
            .await
    }

    /// Calls `callback` once for every entity of the collection, in store order.
    ///
    /// The context is checked before each document is fetched. The first error, whether from
    /// the cursor, decoding or the callback, stops the iteration and is returned.
    ///
    /// # Errors
    ///
    /// Returns the callback's error as is; store errors are converted into `E`.
    pub async fn iterate<F, Fut, E>(&self, ctx: &Context, mut callback: F) -> Result<(), E>
    where
        F: FnMut(T) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: From<DocumentStoreError>,
    {
        debug!(collection = %self.collection, entity = T::entity_name(), "iterate");

        let mut cursor = ctx
            .run(self.backend.find(&self.collection, Filter::All, FindOptions::default()))
            .await?;
        let mut visited = 0_u64;

        while let Some(document) = ctx.run(cursor.try_next()).await? {
            callback(T::from_document(document)?).await?;

            visited += 1;
            trace!(collection = %self.collection, visited, "iterate visited document");
        }

        Ok(())
    }

    async fn find_one_by(&self, ctx: &Context, filter: Filter) -> DocumentStoreResult<T> {
        match ctx
            .run(self.backend.find_one(&self.collection, filter.clone()))
            .await?
        {
            Some(document) => T::from_document(document),
            None => Err(self.not_found(&filter)),
        }
    }

    async fn find_one_and_modify(
        &self,
        ctx: &Context,
        filter: Filter,
        update: Update,
    ) -> DocumentStoreResult<T> {
        match ctx
            .run(self.backend.find_one_and_update(
                &self.collection,
                filter.clone(),
                update,
                FindOneAndUpdateOptions::default(),
            ))
            .await?
        {
            Some(document) => T::from_document(document),
            None => Err(self.not_found(&filter)),
        }
    }

    async fn collect(
        &self,
        ctx: &Context,
        filter: Filter,
        options: FindOptions,
    ) -> DocumentStoreResult<Vec<T>> {
        let mut cursor = ctx
            .run(self.backend.find(&self.collection, filter, options))
            .await?;
        let mut entities = Vec::new();

        while let Some(document) = ctx.run(cursor.try_next()).await? {
            entities.push(T::from_document(document)?);
        }

        Ok(entities)
    }

    fn not_found(&self, filter: &Filter) -> DocumentStoreError {
        DocumentStoreError::DocumentNotFound(filter.to_document().to_string(), self.collection.clone())
    }
}

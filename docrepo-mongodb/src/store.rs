use async_trait::async_trait;
use bson::{Bson, Document, doc};
use futures::{StreamExt, TryStreamExt};
use mongodb::{
    Client, Collection as MongoCollection, IndexModel,
    options::{ClientOptions, IndexOptions, ReturnDocument as MongoReturnDocument},
};
use tracing::{info, warn};

use docrepo_core::{
    backend::{DocumentStream, StoreBackend, StoreBackendBuilder},
    config::ConnectionConfig,
    context::Context,
    error::{DocumentStoreError, DocumentStoreResult},
    query::{
        Filter, FindOneAndUpdateOptions, FindOptions, IndexSpec, ReplaceOptions, ReturnDocument,
        Update,
    },
};

/// A live client connection bound to one database.
#[derive(Debug)]
pub struct MongoDbStore {
    client: Client,
    database: String,
    connection_string: String,
}

impl MongoDbStore {
    pub fn new(client: Client, database: impl Into<String>, connection_string: impl Into<String>) -> Self {
        Self {
            client,
            database: database.into(),
            connection_string: connection_string.into(),
        }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    /// Connects using `config`, verifying the server is reachable.
    ///
    /// # Errors
    ///
    /// Returns a connection error if the connection string is rejected or the server does
    /// not answer, or a context error if `ctx` fires first.
    pub async fn connect(ctx: &Context, config: &ConnectionConfig) -> DocumentStoreResult<Self> {
        ctx.run(MongoDbStoreBuilder::from_config(config).build()).await
    }

    /// The connection string this store was opened with.
    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    /// The underlying driver client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The database every collection handle is bound to.
    pub fn database_name(&self) -> &str {
        &self.database
    }

    /// Returns a handle to `name` in the bound database. This performs no I/O.
    pub fn collection(&self, name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(name)
    }
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn ping(&self) -> DocumentStoreResult<()> {
        self.client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(DocumentStoreError::backend)?;

        Ok(())
    }

    async fn insert_one(&self, collection: &str, document: Document) -> DocumentStoreResult<Bson> {
        Ok(
            self.collection(collection)
                .insert_one(document)
                .await
                .map_err(DocumentStoreError::backend)?
                .inserted_id
        )
    }

    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> DocumentStoreResult<Vec<Bson>> {
        let mut inserted = self
            .collection(collection)
            .insert_many(documents)
            .await
            .map_err(DocumentStoreError::backend)?
            .inserted_ids
            .into_iter()
            .collect::<Vec<_>>();

        inserted.sort_by_key(|(position, _)| *position);

        Ok(inserted.into_iter().map(|(_, id)| id).collect())
    }

    async fn find_one(&self, collection: &str, filter: Filter) -> DocumentStoreResult<Option<Document>> {
        self.collection(collection)
            .find_one(filter.to_document())
            .await
            .map_err(DocumentStoreError::backend)
    }

    async fn find(
        &self,
        collection: &str,
        filter: Filter,
        options: FindOptions,
    ) -> DocumentStoreResult<DocumentStream> {
        let coll = self.collection(collection);
        let find = coll.find(filter.to_document());
        let find = match &options.sort {
            Some(sort) => find.sort(sort.to_document()),
            None => find,
        };

        Ok(
            find.await
                .map_err(DocumentStoreError::backend)?
                .map_err(DocumentStoreError::backend)
                .boxed()
        )
    }

    async fn replace_one(
        &self,
        collection: &str,
        filter: Filter,
        replacement: Document,
        options: ReplaceOptions,
    ) -> DocumentStoreResult<u64> {
        Ok(
            self.collection(collection)
                .replace_one(filter.to_document(), replacement)
                .upsert(options.upsert)
                .await
                .map_err(DocumentStoreError::backend)?
                .matched_count
        )
    }

    async fn delete_one(&self, collection: &str, filter: Filter) -> DocumentStoreResult<u64> {
        Ok(
            self.collection(collection)
                .delete_one(filter.to_document())
                .await
                .map_err(DocumentStoreError::backend)?
                .deleted_count
        )
    }

    async fn delete_many(&self, collection: &str, filter: Filter) -> DocumentStoreResult<u64> {
        Ok(
            self.collection(collection)
                .delete_many(filter.to_document())
                .await
                .map_err(DocumentStoreError::backend)?
                .deleted_count
        )
    }

    async fn find_one_and_update(
        &self,
        collection: &str,
        filter: Filter,
        update: Update,
        options: FindOneAndUpdateOptions,
    ) -> DocumentStoreResult<Option<Document>> {
        self.collection(collection)
            .find_one_and_update(filter.to_document(), update.to_document())
            .upsert(options.upsert)
            .return_document(match options.return_document {
                ReturnDocument::Before => MongoReturnDocument::Before,
                ReturnDocument::After => MongoReturnDocument::After,
            })
            .await
            .map_err(DocumentStoreError::backend)
    }

    async fn create_index(&self, collection: &str, index: IndexSpec) -> DocumentStoreResult<String> {
        Ok(
            self.collection(collection)
                .create_index(
                    IndexModel::builder()
                    .keys(index.keys_document())
                    .options(
                        IndexOptions::builder()
                        .name(index.name.clone())
                        .unique(index.unique)
                        .build()
                    )
                    .build()
                )
                .await
                .map_err(DocumentStoreError::backend)?
                .index_name
        )
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.collection(name)
            .drop()
            .await
            .map_err(DocumentStoreError::backend)?;

        Ok(())
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        self.client.shutdown().await;

        info!(database = %self.database, "document store connection closed");

        Ok(())
    }
}

/// Opens a [`MongoDbStore`] from a connection string and database name.
#[derive(Debug)]
pub struct MongoDbStoreBuilder {
    dsn: String,
    database: String,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
        }
    }

    pub fn from_config(config: &ConnectionConfig) -> Self {
        Self {
            dsn: config.connection_string(),
            database: config.database.clone(),
        }
    }

    pub fn dsn(&self) -> &str {
        &self.dsn
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    /// Creates the client and pings the database before handing it out.
    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        let options = ClientOptions::parse(&self.dsn)
            .await
            .map_err(|e| DocumentStoreError::Connection(format!("invalid connection string: {e}")))?;
        let client = Client::with_options(options)
            .map_err(|e| DocumentStoreError::Connection(format!("failed to create client: {e}")))?;

        let store = MongoDbStore::new(client, self.database, self.dsn);

        if let Err(e) = store.ping().await {
            warn!(database = %store.database, error = %e, "document store did not answer ping");

            return Err(DocumentStoreError::Connection(format!("server unreachable: {e}")));
        }

        info!(database = %store.database, "connected to document store");

        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_connection_string_is_a_connection_error() {
        let result = MongoDbStoreBuilder::new("not-a-connection-string", "MongoTest")
            .build()
            .await;

        assert!(matches!(result, Err(DocumentStoreError::Connection(_))));
    }

    #[test]
    fn builder_uses_config_connection_string() {
        let config = ConnectionConfig::new("localhost", "MongoTest").with_port(27017);

        assert_eq!(MongoDbStoreBuilder::from_config(&config).dsn(), "mongodb://localhost:27017/");
    }

    #[tokio::test]
    async fn accessors_need_no_server() {
        let dsn = "mongodb://localhost:27017/";
        let client = Client::with_options(ClientOptions::parse(dsn).await.unwrap()).unwrap();
        let store = MongoDbStore::new(client, "MongoTest", dsn);

        assert_eq!(store.connection_string(), dsn);
        assert_eq!(store.database_name(), "MongoTest");
        assert_eq!(store.collection("testdata").name(), "testdata");
        assert_eq!(store.collection("testdata").namespace().db, "MongoTest");
    }
}

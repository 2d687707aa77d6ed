//! Runs against a local `mongod` on port 27017:
//!
//! ```sh
//! cargo test -p docrepo --features mongodb -- --ignored
//! ```
#![cfg(feature = "mongodb")]

use bson::oid::ObjectId;
use docrepo::{mongodb::MongoDbStore, prelude::*, query::IndexKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Entity)]
#[serde(default)]
struct TestData {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    #[serde(rename = "name")]
    name: String,
    #[serde(rename = "data")]
    data: String,
    #[serde(rename = "seq")]
    seq: i64,
}

fn record(name: &str, data: &str) -> TestData {
    TestData {
        name: name.to_string(),
        data: data.to_string(),
        ..TestData::default()
    }
}

async fn connect(ctx: &Context) -> DocumentStore<MongoDbStore> {
    let config = ConnectionConfig::new("localhost", "MongoTest").with_port(27017);
    let backend = MongoDbStore::connect(ctx, &config).await.unwrap();

    assert_eq!(backend.connection_string(), "mongodb://localhost:27017/");

    DocumentStore::new(backend)
}

#[tokio::test]
#[ignore = "needs a local mongod"]
async fn helper_operations_against_server() {
    let ctx = Context::background();
    let store = connect(&ctx).await;
    let collection = format!("testdata_{}", ObjectId::new());
    let helper = store.helper::<TestData>(&collection);

    helper.insert_one(&ctx, &record("test1", "hello")).await.unwrap();
    assert_eq!(helper.find_one(&ctx, "name", "test1").await.unwrap().data, "hello");

    helper
        .insert_many(&ctx, &[record("test2", "findme"), record("test3", "findme too")])
        .await
        .unwrap();
    assert_eq!(
        helper
            .find_many(&ctx, "data", "findme", Some("name"), SortDirection::Descending)
            .await
            .unwrap()
            .len(),
        1
    );

    assert_eq!(helper.save_one(&ctx, &record("test4", "new"), "name", "test4").await.unwrap(), 0);
    assert_eq!(helper.save_one(&ctx, &record("test4", "again"), "name", "test4").await.unwrap(), 1);

    let first = helper.find_one_and_increment_field(&ctx, "name", "counter", "seq", 1).await.unwrap();
    let second = helper.find_one_and_increment_field(&ctx, "name", "counter", "seq", 5).await.unwrap();
    assert_eq!((first.seq, second.seq), (1, 6));

    helper.create_index(&ctx, "data_text", "data", IndexKind::Text, false).await.unwrap();
    let found = helper.text_search(&ctx, "findme").await.unwrap();
    assert_eq!(found.len(), 2);

    let mut visited = 0;
    helper
        .iterate(&ctx, |_record| {
            visited += 1;
            async { Ok::<_, DocumentStoreError>(()) }
        })
        .await
        .unwrap();
    assert_eq!(visited, 5);

    assert_eq!(helper.delete_one(&ctx, "name", "test1").await.unwrap(), 1);
    assert!(helper.find_one(&ctx, "name", "test1").await.unwrap_err().is_not_found());

    store.drop_collection(&ctx, &collection).await.unwrap();
    store.shutdown().await.unwrap();
}

#[tokio::test]
#[ignore = "needs a local mongod"]
async fn ping_succeeds() {
    let ctx = Context::background();
    let store = connect(&ctx).await;

    store.ping(&ctx).await.unwrap();
    store.shutdown().await.unwrap();
}

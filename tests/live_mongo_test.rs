//! Integration tests that require a running MongoDB server.
//!
//! Set MONGO_URI and MONGO_DATABASE to run these tests; they are skipped
//! otherwise. Point MONGO_DATABASE at a scratch database - the teardown
//! test drops it.
//! Example: MONGO_URI="mongodb://localhost:27017" MONGO_DATABASE="mongo_conn_test"

use mongo_conn::{ConnectionManager, Entity};
use mongodb::bson::doc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct SensorReading {
    device: String,
    value: f64,
}

impl Entity for SensorReading {}

fn manager_from_env() -> Option<ConnectionManager> {
    if std::env::var("MONGO_URI").is_err() || std::env::var("MONGO_DATABASE").is_err() {
        eprintln!("Skipping test: MONGO_URI / MONGO_DATABASE not set");
        return None;
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
    Some(ConnectionManager::from_env().expect("env vars were just checked"))
}

#[tokio::test]
async fn test_collection_round_trip() {
    let Some(manager) = manager_from_env() else {
        return;
    };

    let collection = manager
        .collection::<SensorReading>()
        .await
        .expect("collection handle");
    collection
        .insert_one(SensorReading {
            device: "thermo-1".to_string(),
            value: 21.5,
        })
        .await
        .expect("insert");

    let found = collection
        .find_one(doc! { "device": "thermo-1" })
        .await
        .expect("find")
        .expect("document present");
    assert_eq!(found.value, 21.5);

    // The derived name is visible on the server.
    let names = manager
        .database()
        .await
        .expect("database handle")
        .list_collection_names()
        .await
        .expect("list collections");
    assert!(names.contains(&"sensor_reading".to_string()));
}

#[tokio::test]
async fn test_ensure_primary_against_live_server() {
    let Some(manager) = manager_from_env() else {
        return;
    };

    manager.connection().await.expect("connection");
    // A standalone mongod and a replica-set primary both report writable.
    assert!(manager.ensure_primary().await);
}

#[tokio::test]
async fn test_drop_database_removes_all_collections() {
    let Some(manager) = manager_from_env() else {
        return;
    };

    let collection = manager
        .collection_named::<SensorReading>("drop_me")
        .await
        .expect("collection handle");
    collection
        .insert_one(SensorReading {
            device: "thermo-2".to_string(),
            value: 3.0,
        })
        .await
        .expect("insert");

    manager.drop_database().await.expect("drop database");

    let names = manager
        .database()
        .await
        .expect("database handle")
        .list_collection_names()
        .await
        .expect("list collections");
    assert!(names.is_empty());
}

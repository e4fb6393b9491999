//! PostgreSQL adapter tests.
//!
//! Skipped unless DATABASE_URL is set to a postgres:// URL.

use std::sync::Arc;

use sql_tutor::app::Tutor;
use sql_tutor::config::DatabaseConfig;
use sql_tutor::content::ContentStore;
use sql_tutor::db::{DatabaseClient, PostgresClient, Value};
use sql_tutor::policy::KeywordBlocklist;

fn postgres_config() -> Option<DatabaseConfig> {
    let url = std::env::var("DATABASE_URL").ok()?;
    if !url.starts_with("postgres") {
        return None;
    }
    Some(DatabaseConfig {
        url,
        ..DatabaseConfig::default()
    })
}

#[tokio::test]
async fn test_execute_simple_select() {
    let Some(config) = postgres_config() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let client = PostgresClient::connect(&config).await.unwrap();

    let result = client
        .execute_query("SELECT 1::int8 AS num, 'hello' AS greeting")
        .await
        .unwrap();

    assert_eq!(result.column_names(), vec!["num", "greeting"]);
    assert_eq!(result.rows[0], vec![Value::Int(1), Value::from("hello")]);

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_engine_message_passes_through() {
    let Some(config) = postgres_config() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let db = Arc::new(PostgresClient::connect(&config).await.unwrap());
    let tutor = Tutor::new(ContentStore::builtin().unwrap(), db, Box::new(KeywordBlocklist));

    let outcome = tutor.try_query("SELECT * FROM definitely_missing_table").await;

    assert!(!outcome.success);
    assert!(outcome
        .error
        .unwrap()
        .contains("relation \"definitely_missing_table\" does not exist"));

    tutor.shutdown().await.unwrap();
}

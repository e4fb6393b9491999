//! End-to-end pipeline tests.
//!
//! Submissions go through the tutor service into the seeded in-memory
//! SQLite database and out through the renderer.

use sql_tutor::app::Tutor;
use sql_tutor::config::Config;
use sql_tutor::db::Value;
use sql_tutor::error::TutorError;
use sql_tutor::policy::PolicyMode;
use sql_tutor::query::QueryFailure;
use sql_tutor::render::{render, DisplayTable};

async fn scratch_tutor() -> Tutor {
    Tutor::from_config(&Config::default()).await.unwrap()
}

#[tokio::test]
async fn test_try_select_all_users() {
    let tutor = scratch_tutor().await;

    let outcome = tutor.try_query("SELECT * FROM users").await;

    assert!(outcome.success);
    let result = outcome.result.unwrap();
    assert_eq!(result.fields, vec!["id", "username", "email"]);
    assert_eq!(result.row_count, Some(3));
    assert_eq!(result.rows[0].get("username"), Some(&Value::from("john")));
}

#[tokio::test]
async fn test_drop_is_blocked_and_table_survives() {
    let tutor = scratch_tutor().await;

    let outcome = tutor.try_query("DROP TABLE users").await;
    assert!(!outcome.success);
    assert_eq!(
        outcome.error.as_deref(),
        Some("This type of query is not allowed in tutorial mode")
    );

    let outcome = tutor.try_query("SELECT count(*) AS n FROM users").await;
    assert_eq!(
        outcome.result.unwrap().rows[0].get("n"),
        Some(&Value::Int(3))
    );
}

#[tokio::test]
async fn test_empty_query_is_invalid() {
    let tutor = scratch_tutor().await;
    let outcome = tutor.try_query("").await;
    assert_eq!(outcome.error.as_deref(), Some("Invalid query format"));
    assert_eq!(outcome.failure, Some(QueryFailure::Validation));
}

#[tokio::test]
async fn test_engine_error_passes_through_with_hint() {
    let tutor = scratch_tutor().await;

    let outcome = tutor.try_query("SELECT * FROM no_such_table").await;

    assert!(!outcome.success);
    assert!(outcome.error.unwrap().contains("no such table"));
    assert_eq!(
        outcome.hint.as_deref(),
        Some("Check your SQL syntax and try again")
    );
}

#[tokio::test]
async fn test_zero_rows_carry_message() {
    let tutor = scratch_tutor().await;

    let outcome = tutor
        .try_query("SELECT * FROM users WHERE username = 'nobody'")
        .await;

    assert!(outcome.success);
    let result = outcome.result.unwrap();
    assert!(result.rows.is_empty());
    assert!(result.fields.is_empty());
    assert_eq!(
        result.message.as_deref(),
        Some("Query executed successfully but returned no results")
    );
    assert_eq!(render(Some(&result)), DisplayTable::Empty);
}

#[tokio::test]
async fn test_sandbox_writes_persist_for_the_session() {
    let tutor = scratch_tutor().await;

    let created = tutor
        .try_query("CREATE TABLE products (id INT PRIMARY KEY, name VARCHAR(100), price DECIMAL(10,2))")
        .await;
    assert!(created.success);

    tutor
        .try_query("INSERT INTO products VALUES (1, 'lamp', 19.5)")
        .await;
    let outcome = tutor.try_query("SELECT name, price FROM products").await;

    let table = render(outcome.result.as_ref());
    assert_eq!(
        table,
        DisplayTable::Table {
            headers: vec!["name".into(), "price".into()],
            rows: vec![vec!["lamp".into(), "19.5".into()]],
        }
    );
}

#[tokio::test]
async fn test_nulls_render_as_null() {
    let tutor = scratch_tutor().await;

    let outcome = tutor.try_query("SELECT NULL AS missing, 2 AS two").await;

    let table = render(outcome.result.as_ref());
    assert_eq!(
        table,
        DisplayTable::Table {
            headers: vec!["missing".into(), "two".into()],
            rows: vec![vec!["NULL".into(), "2".into()]],
        }
    );
}

#[tokio::test]
async fn test_evaluate_correct_answer_with_rows() {
    let tutor = scratch_tutor().await;

    let outcome = tutor
        .evaluate(1, None, "SELECT * FROM users")
        .await
        .unwrap();

    assert!(outcome.correct);
    assert_eq!(outcome.explanation, "Your query is correct!");
    assert_eq!(outcome.error, None);
    assert_eq!(outcome.result.unwrap().row_count, Some(3));
}

#[tokio::test]
async fn test_evaluate_garbage() {
    let tutor = scratch_tutor().await;

    let outcome = tutor.evaluate(1, None, "garbage").await.unwrap();

    assert!(!outcome.correct);
    assert_eq!(outcome.explanation, "Try again");
    assert!(outcome.result.is_none());
    assert!(outcome.error.unwrap().contains("syntax error"));
}

#[tokio::test]
async fn test_evaluate_does_not_apply_the_blocklist() {
    let tutor = scratch_tutor().await;

    let outcome = tutor
        .evaluate(2, None, "DELETE FROM users WHERE id = 3")
        .await
        .unwrap();
    assert!(!outcome.correct);
    assert_eq!(outcome.error, None);

    let outcome = tutor.try_query("SELECT id FROM users").await;
    assert_eq!(outcome.result.unwrap().row_count, Some(2));
}

#[tokio::test]
async fn test_evaluate_unknown_question() {
    let tutor = scratch_tutor().await;
    let err = tutor.evaluate(3, None, "SELECT 1 FROM users").await.unwrap_err();
    assert!(matches!(err, TutorError::NotFound(_)));
}

#[tokio::test]
async fn test_statement_policy_from_config() {
    let mut config = Config::default();
    config.policy.mode = PolicyMode::Statements;
    let tutor = Tutor::from_config(&config).await.unwrap();

    // The keyword check would reject this; statement classification does not.
    let outcome = tutor
        .try_query("SELECT username AS deleted_by FROM users WHERE id = 1")
        .await;
    assert!(outcome.success);

    let outcome = tutor.try_query("DELETE FROM users").await;
    assert_eq!(outcome.failure, Some(QueryFailure::PolicyViolation));
}

#[tokio::test]
async fn test_seed_file_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let seed = dir.path().join("seed.sql");
    std::fs::write(
        &seed,
        "CREATE TABLE pets (name TEXT); INSERT INTO pets VALUES ('rex');",
    )
    .unwrap();

    let mut config = Config::default();
    config.database.seed = Some(seed);
    let tutor = Tutor::from_config(&config).await.unwrap();

    let outcome = tutor.try_query("SELECT name FROM pets").await;
    assert_eq!(
        outcome.result.unwrap().rows[0].get("name"),
        Some(&Value::from("rex"))
    );
    assert!(!tutor.try_query("SELECT * FROM users").await.success);
}

#[tokio::test]
async fn test_row_cap_truncates() {
    let mut config = Config::default();
    config.database.max_rows = 2;
    let tutor = Tutor::from_config(&config).await.unwrap();

    let outcome = tutor.try_query("SELECT id FROM users").await;

    let result = outcome.result.unwrap();
    assert_eq!(result.row_count, Some(2));
    assert_eq!(result.total_rows, Some(3));
    assert!(result.is_truncated());
    assert_eq!(
        result.message.as_deref(),
        Some("Result truncated: showing 2 of 3 rows")
    );
}

#[tokio::test]
async fn test_runaway_query_times_out_and_tutor_keeps_working() {
    let mut config = Config::default();
    config.database.query_timeout_secs = 1;
    let tutor = Tutor::from_config(&config).await.unwrap();

    let outcome = tutor
        .try_query(
            "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c) SELECT count(*) FROM c",
        )
        .await;
    assert!(!outcome.success);
    assert_eq!(
        outcome.error.as_deref(),
        Some("Query timed out after 1 seconds")
    );

    let outcome = tutor.try_query("SELECT 1 AS one").await;
    assert!(outcome.success);
    assert_eq!(
        outcome.result.unwrap().rows[0].get("one"),
        Some(&Value::Int(1))
    );
}

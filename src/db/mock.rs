//! Mock database clients for testing.
//!
//! `MockDatabaseClient` returns a canned result and records every SQL string it
//! receives, so tests can assert a query was (or was never) executed.
//! `FailingDatabaseClient` rejects every query with a fixed engine message.

use super::{ColumnInfo, DatabaseClient, QueryResult, Value};
use crate::error::{Result, TutorError};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// A mock database client that returns a predefined result.
#[derive(Debug, Default)]
pub struct MockDatabaseClient {
    result: QueryResult,
    calls: Mutex<Vec<String>>,
}

impl MockDatabaseClient {
    /// Creates a mock that returns an empty result for every query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock that returns the given result for every query.
    pub fn with_result(result: QueryResult) -> Self {
        Self {
            result,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Creates a mock returning rows built from `(column, value)` pairs.
    ///
    /// The column list is taken from the first row.
    pub fn with_rows<V: Into<Value>>(rows: Vec<Vec<(&str, V)>>) -> Self {
        let columns = rows
            .first()
            .map(|row| {
                row.iter()
                    .map(|(name, _)| ColumnInfo::new(*name, "TEXT"))
                    .collect()
            })
            .unwrap_or_default();
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|(_, value)| value.into()).collect())
            .collect();
        Self::with_result(QueryResult::with_data(columns, rows))
    }

    /// Returns every SQL string this client has executed, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Returns how many queries this client has executed.
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        self.calls
            .lock()
            .map_err(|_| TutorError::internal("mock call log poisoned"))?
            .push(sql.to_string());

        Ok(self
            .result
            .clone()
            .with_execution_time(Duration::from_millis(1)))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A database client whose every query fails with the same engine message.
#[derive(Debug)]
pub struct FailingDatabaseClient {
    message: String,
}

impl FailingDatabaseClient {
    /// Creates a client failing with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn execute_query(&self, _sql: &str) -> Result<QueryResult> {
        Err(TutorError::execution(self.message.clone()))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_calls() {
        let client = MockDatabaseClient::new();
        client.execute_query("SELECT 1").await.unwrap();
        client.execute_query("SELECT 2").await.unwrap();

        assert_eq!(client.calls(), vec!["SELECT 1", "SELECT 2"]);
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_with_rows() {
        let client = MockDatabaseClient::with_rows(vec![vec![
            ("id", Value::Int(1)),
            ("username", Value::from("john")),
        ]]);

        let result = client.execute_query("SELECT * FROM users").await.unwrap();

        assert_eq!(result.column_names(), vec!["id", "username"]);
        assert_eq!(result.row_count, 1);
    }

    #[tokio::test]
    async fn test_failing_client() {
        let client = FailingDatabaseClient::new("syntax error at or near \"garbage\"");
        let err = client.execute_query("garbage").await.unwrap_err();
        assert_eq!(err.message(), "syntax error at or near \"garbage\"");
    }
}

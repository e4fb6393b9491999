//! Database abstraction layer for the tutor.
//!
//! Provides a trait-based interface over the SQL engine that executes
//! learner queries, so the evaluator and sandbox never see a concrete driver.

mod mock;
mod postgres;
mod sqlite;
mod types;

pub use mock::{FailingDatabaseClient, MockDatabaseClient};
pub use postgres::PostgresClient;
pub use sqlite::SqliteClient;
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::config::DatabaseConfig;
use crate::error::{Result, TutorError};
use async_trait::async_trait;
use std::sync::Arc;

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackend {
    Sqlite,
    Postgres,
}

impl DatabaseBackend {
    /// Returns the backend as a string for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
        }
    }

    /// Determines the backend from a connection URL.
    pub fn from_url(url: &str) -> Option<Self> {
        let scheme = url.split(':').next()?.to_lowercase();
        match scheme.as_str() {
            "sqlite" => Some(Self::Sqlite),
            "postgres" | "postgresql" => Some(Self::Postgres),
            _ => None,
        }
    }
}

/// Creates a database client for the configured URL.
///
/// This is the central factory function for database connections.
pub async fn connect(config: &DatabaseConfig) -> Result<Arc<dyn DatabaseClient>> {
    let backend = DatabaseBackend::from_url(&config.url).ok_or_else(|| {
        TutorError::config(format!(
            "Unsupported database URL '{}'. Expected sqlite: or postgres://",
            config.url
        ))
    })?;

    match backend {
        DatabaseBackend::Sqlite => Ok(Arc::new(SqliteClient::connect(config).await?)),
        DatabaseBackend::Postgres => Ok(Arc::new(PostgresClient::connect(config).await?)),
    }
}

/// The query executor adapter.
///
/// Implementations pass the SQL text to the engine unchanged and return its
/// rows, or an `Execution` error carrying the engine's message.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Executes a SQL query and returns the results.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;
}

/// Extracts the engine's own message from a sqlx error.
///
/// Database errors carry the server's text; anything else (I/O, protocol)
/// falls back to sqlx's rendering.
fn engine_message(error: &sqlx::Error) -> String {
    match error.as_database_error() {
        Some(db_error) => db_error.message().to_string(),
        None => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_url() {
        assert_eq!(
            DatabaseBackend::from_url("sqlite::memory:"),
            Some(DatabaseBackend::Sqlite)
        );
        assert_eq!(
            DatabaseBackend::from_url("sqlite:tutor.db?mode=rwc"),
            Some(DatabaseBackend::Sqlite)
        );
        assert_eq!(
            DatabaseBackend::from_url("postgres://localhost/tutor"),
            Some(DatabaseBackend::Postgres)
        );
        assert_eq!(
            DatabaseBackend::from_url("PostgreSQL://localhost/tutor"),
            Some(DatabaseBackend::Postgres)
        );
        assert_eq!(DatabaseBackend::from_url("mysql://localhost/tutor"), None);
    }

    #[tokio::test]
    async fn test_connect_rejects_unknown_scheme() {
        let config = DatabaseConfig {
            url: "mysql://localhost/tutor".to_string(),
            ..Default::default()
        };
        let err = connect(&config).await.err().unwrap();
        assert!(err.to_string().contains("Unsupported database URL"));
    }
}

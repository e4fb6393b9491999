//! SQLite database client implementation.
//!
//! The default tutor backend: a scratch database (in-memory unless configured
//! otherwise) seeded with the tables the lessons refer to.

use crate::config::DatabaseConfig;
use crate::db::{engine_message, ColumnInfo, DatabaseClient, QueryResult, Row, Value};
use crate::error::{Result, TutorError};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column as SqlxColumn, Row as SqlxRow, TypeInfo, ValueRef};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Schema and rows loaded into in-memory databases when no seed file is given.
const BUILTIN_SEED: &str = include_str!("seed.sql");

/// VM instructions between deadline checks.
const PROGRESS_INTERVAL: i32 = 1000;

/// SQLite result code for an interrupted statement.
const SQLITE_INTERRUPT: &str = "9";

/// Deadline for the statement running on the connection.
///
/// Checked by the connection's progress handler; once it has passed the
/// handler returns `false` and SQLite aborts the statement with
/// `SQLITE_INTERRUPT`.
#[derive(Debug, Clone, Default)]
struct Deadline(Arc<Mutex<Option<Instant>>>);

impl Deadline {
    fn set(&self, at: Option<Instant>) {
        *self.0.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }

    fn expired(&self) -> bool {
        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some_and(|at| Instant::now() >= at)
    }
}

/// SQLite database client.
#[derive(Debug)]
pub struct SqliteClient {
    pool: SqlitePool,
    deadline: Deadline,
    query_timeout: Duration,
    max_rows: usize,
}

impl SqliteClient {
    /// Opens the database named by `config.url` and applies the seed script.
    ///
    /// The pool holds exactly one connection that is never recycled: for
    /// `sqlite::memory:` every new connection would be a fresh, empty database.
    /// A timed-out statement is interrupted on the connection itself so the
    /// connection is free again for the next query.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| TutorError::config(format!("Invalid SQLite URL '{}': {e}", config.url)))?
            .create_if_missing(true);

        let deadline = Deadline::default();
        let handler_deadline = deadline.clone();

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .acquire_timeout(Duration::from_secs(10))
            .after_connect(move |conn, _meta| {
                let deadline = handler_deadline.clone();
                Box::pin(async move {
                    let mut handle = conn.lock_handle().await?;
                    handle.set_progress_handler(PROGRESS_INTERVAL, move || !deadline.expired());
                    Ok(())
                })
            })
            .connect_with(options)
            .await
            .map_err(|e| TutorError::connection(format!("Failed to open SQLite database: {e}")))?;

        let client = Self {
            pool,
            deadline,
            query_timeout: Duration::from_secs(config.query_timeout_secs),
            max_rows: config.max_rows,
        };

        match &config.seed {
            Some(path) => client.seed_from_file(path).await?,
            None if is_memory_url(&config.url) => client.seed(BUILTIN_SEED).await?,
            None => debug!("No seed script configured for {}", config.url),
        }

        Ok(client)
    }

    /// Runs a multi-statement seed script.
    pub async fn seed(&self, script: &str) -> Result<()> {
        self.deadline.set(None);
        sqlx::raw_sql(script)
            .execute(&self.pool)
            .await
            .map_err(|e| TutorError::connection(format!("Failed to seed database: {e}")))?;
        info!("Seeded tutorial database");
        Ok(())
    }

    async fn seed_from_file(&self, path: &Path) -> Result<()> {
        let script = std::fs::read_to_string(path).map_err(|e| {
            TutorError::config(format!("Failed to read seed file {}: {e}", path.display()))
        })?;
        self.seed(&script).await
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| TutorError::execution(engine_message(&e)))?;

        let start = Instant::now();
        // Left armed if this future is dropped mid-query, so an abandoned
        // statement still stops at its deadline.
        self.deadline.set(Some(start + self.query_timeout));
        let fetched = sqlx::query(sql).fetch_all(&mut *conn).await;
        self.deadline.set(None);

        let result = match fetched {
            Ok(rows) => rows,
            Err(e) if is_interrupt(&e) => {
                warn!("Query interrupted after {:?}", start.elapsed());
                return Err(TutorError::execution(format!(
                    "Query timed out after {} seconds",
                    self.query_timeout.as_secs()
                )));
            }
            Err(e) => return Err(TutorError::execution(engine_message(&e))),
        };

        let execution_time = start.elapsed();

        let columns: Vec<ColumnInfo> = result
            .first()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                    .collect()
            })
            .unwrap_or_default();

        let total_rows = result.len();
        let was_truncated = total_rows > self.max_rows;
        if was_truncated {
            warn!(
                "Query returned {} rows, truncating to {} rows",
                total_rows, self.max_rows
            );
        }

        let rows: Vec<Row> = result
            .iter()
            .take(self.max_rows)
            .map(convert_row)
            .collect();
        let row_count = rows.len();

        Ok(QueryResult {
            columns,
            rows,
            execution_time,
            row_count,
            total_rows,
            was_truncated,
        })
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

fn is_interrupt(error: &sqlx::Error) -> bool {
    error.as_database_error().is_some_and(|e| {
        e.code().is_some_and(|code| code == SQLITE_INTERRUPT) || e.message() == "interrupted"
    })
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Converts a sqlx SqliteRow to our Row type.
fn convert_row(row: &SqliteRow) -> Row {
    (0..row.len()).map(|i| convert_value(row, i)).collect()
}

/// Decodes one cell by the storage class of the stored value.
fn convert_value(row: &SqliteRow, index: usize) -> Value {
    let storage_class = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_uppercase(),
        Err(_) => return Value::Null,
    };

    let decoded = match storage_class.as_str() {
        "INTEGER" | "INT" | "BIGINT" => row.try_get::<i64, _>(index).map(Value::Int),
        "BOOLEAN" => row.try_get::<bool, _>(index).map(Value::Bool),
        "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => row.try_get::<f64, _>(index).map(Value::Float),
        "BLOB" => row.try_get::<Vec<u8>, _>(index).map(Value::Bytes),
        _ => row.try_get::<String, _>(index).map(Value::String),
    };

    decoded
        .or_else(|_| row.try_get::<String, _>(index).map(Value::String))
        .unwrap_or(Value::Null)
}

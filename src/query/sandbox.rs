//! The try-it sandbox.
//!
//! Runs arbitrary learner SQL after a policy check. Every failure becomes a
//! `SandboxOutcome` with `success: false`; nothing is retried.

use std::sync::Arc;

use tracing::{debug, info};

use crate::db::DatabaseClient;
use crate::policy::QueryPolicy;

use super::envelope::{ResultSet, SandboxOutcome};

/// Executes sandbox queries behind a `QueryPolicy`.
pub struct SandboxRunner {
    db: Arc<dyn DatabaseClient>,
    policy: Box<dyn QueryPolicy>,
}

impl SandboxRunner {
    pub fn new(db: Arc<dyn DatabaseClient>, policy: Box<dyn QueryPolicy>) -> Self {
        Self { db, policy }
    }

    /// Runs a request body of the form `{"query": "..."}`.
    ///
    /// A missing or non-string `query` member is an invalid format, the same
    /// as an empty string.
    pub async fn run_request(&self, body: &serde_json::Value) -> SandboxOutcome {
        match body.get("query").and_then(serde_json::Value::as_str) {
            Some(query) => self.run(query).await,
            None => SandboxOutcome::invalid_format(),
        }
    }

    /// Validates, checks policy, and executes `query`.
    pub async fn run(&self, query: &str) -> SandboxOutcome {
        if query.is_empty() {
            return SandboxOutcome::invalid_format();
        }

        if let Err(violation) = self.policy.check(query) {
            info!(policy = self.policy.name(), "Rejected sandbox query: {violation}");
            return SandboxOutcome::policy_violation(violation.message());
        }

        match self.db.execute_query(query).await {
            Ok(result) if result.is_empty() => {
                debug!("Sandbox query returned no rows");
                SandboxOutcome::success(ResultSet::no_results())
            }
            Ok(result) => {
                debug!(
                    rows = result.row_count,
                    elapsed_ms = result.execution_time.as_millis() as u64,
                    "Sandbox query succeeded"
                );
                SandboxOutcome::success(ResultSet::from_query_result(&result))
            }
            Err(e) => {
                debug!("Sandbox query failed: {e}");
                SandboxOutcome::execution_error(e.message())
            }
        }
    }
}

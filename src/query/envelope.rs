//! Response envelopes shared by the evaluator, the sandbox, and the client.
//!
//! A `ResultSet` always carries its field list explicitly. Rows serialize as
//! JSON objects whose keys follow that field order, e.g.
//! `{"rows":[{"id":1,"username":"john"}],"fields":["id","username"],"rowCount":1}`.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::db::{QueryResult, Value};

/// Informational message for a successful query with no rows.
pub const NO_RESULTS_MESSAGE: &str = "Query executed successfully but returned no results";

/// Hint attached to execution failures in the sandbox.
pub const SYNTAX_HINT: &str = "Check your SQL syntax and try again";

/// Error message for missing, empty, or non-string sandbox input.
pub const INVALID_QUERY_MESSAGE: &str = "Invalid query format";

/// Message for a result cut off at the row cap.
pub fn truncation_message(shown: usize, total: usize) -> String {
    format!("Result truncated: showing {shown} of {total} rows")
}

/// One result row: field/value pairs in field order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record(Vec<(String, Value)>);

impl Record {
    pub fn new(entries: Vec<(String, Value)>) -> Self {
        Self(entries)
    }

    /// Returns the value for `field`, or `None` if the row has no such key.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.iter().find(|(name, _)| name == field).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> &[(String, Value)] {
        &self.0
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = Record;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a row object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Record, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, Value>()? {
                    entries.push((key, value));
                }
                Ok(Record(entries))
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}

/// Normalized query result sent to the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSet {
    #[serde(default)]
    pub rows: Vec<Record>,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count: Option<usize>,
    /// Rows the query produced before the row cap; only set when truncated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ResultSet {
    /// Builds an envelope from an adapter result, keeping its column order.
    pub fn from_query_result(result: &QueryResult) -> Self {
        let fields = result.column_names();
        let rows = result
            .rows
            .iter()
            .map(|row| {
                fields
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect::<Record>()
            })
            .collect::<Vec<_>>();
        let row_count = rows.len();

        let (total_rows, message) = if result.was_truncated {
            (
                Some(result.total_rows),
                Some(truncation_message(row_count, result.total_rows)),
            )
        } else {
            (None, None)
        };

        Self {
            rows,
            fields,
            row_count: Some(row_count),
            total_rows,
            message,
        }
    }

    /// True when the adapter dropped rows past its row cap.
    pub fn is_truncated(&self) -> bool {
        self.total_rows.is_some()
    }

    /// The sandbox's "ran fine, nothing to show" envelope.
    pub fn no_results() -> Self {
        Self {
            rows: Vec::new(),
            fields: Vec::new(),
            row_count: None,
            total_rows: None,
            message: Some(NO_RESULTS_MESSAGE.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Why a submitted query produced no result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryFailure {
    /// Malformed or missing input; nothing was executed.
    Validation,
    /// Rejected by the query policy; nothing was executed.
    PolicyViolation,
    /// The engine rejected or failed the query.
    Execution,
}

/// Result of grading an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationOutcome {
    pub correct: bool,
    pub explanation: String,
    pub result: Option<ResultSet>,
    pub error: Option<String>,
}

/// Result of a try-it sandbox run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Set on failures; used for transport status, never serialized.
    #[serde(skip)]
    pub failure: Option<QueryFailure>,
}

impl SandboxOutcome {
    pub fn success(result: ResultSet) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
            hint: None,
            failure: None,
        }
    }

    pub fn invalid_format() -> Self {
        Self::failed(QueryFailure::Validation, INVALID_QUERY_MESSAGE, None)
    }

    pub fn policy_violation(message: &str) -> Self {
        Self::failed(QueryFailure::PolicyViolation, message, None)
    }

    /// An engine failure. The message is passed through as given.
    pub fn execution_error(message: &str) -> Self {
        Self::failed(QueryFailure::Execution, message, Some(SYNTAX_HINT))
    }

    fn failed(failure: QueryFailure, message: &str, hint: Option<&str>) -> Self {
        // A failed outcome must always say something.
        let error = if message.trim().is_empty() {
            "Query failed".to_string()
        } else {
            message.to_string()
        };
        Self {
            success: false,
            result: None,
            error: Some(error),
            hint: hint.map(String::from),
            failure: Some(failure),
        }
    }
}

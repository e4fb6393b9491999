//! Query policies for the try-it sandbox.
//!
//! A policy decides whether a query may run at all. The default
//! `KeywordBlocklist` is a case-insensitive substring check, not a parser:
//! it also fires on keywords inside identifiers or string literals, and it is
//! trivially bypassed. It is not a security boundary. `StatementPolicy`
//! classifies parsed statements instead and can be selected in config.

mod classifier;

pub use classifier::{classify_sql, SqlClassifier, StatementPolicy};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error message returned for any policy rejection.
pub const POLICY_VIOLATION_MESSAGE: &str = "This type of query is not allowed in tutorial mode";

/// Keywords the blocklist rejects.
pub const FORBIDDEN_KEYWORDS: [&str; 4] = ["DROP", "DELETE", "TRUNCATE", "ALTER"];

/// Why a policy refused a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyViolation {
    /// What triggered the rejection (a keyword or a statement type).
    pub trigger: String,
}

impl PolicyViolation {
    pub fn new(trigger: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
        }
    }

    /// The message shown to the learner.
    pub fn message(&self) -> &'static str {
        POLICY_VIOLATION_MESSAGE
    }
}

impl fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (matched {})", POLICY_VIOLATION_MESSAGE, self.trigger)
    }
}

/// Gate applied before a sandbox query reaches the database.
pub trait QueryPolicy: Send + Sync {
    /// Returns `Err` if the query must not be executed.
    fn check(&self, sql: &str) -> Result<(), PolicyViolation>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Rejects any query containing a forbidden keyword anywhere in its text.
#[derive(Debug, Clone, Default)]
pub struct KeywordBlocklist;

impl QueryPolicy for KeywordBlocklist {
    fn check(&self, sql: &str) -> Result<(), PolicyViolation> {
        let upper = sql.to_uppercase();
        match FORBIDDEN_KEYWORDS.iter().find(|kw| upper.contains(*kw)) {
            Some(keyword) => Err(PolicyViolation::new(*keyword)),
            None => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "keywords"
    }
}

/// Configurable choice of policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyMode {
    /// Substring blocklist.
    #[default]
    Keywords,
    /// Parsed statement classification.
    Statements,
}

impl PolicyMode {
    /// Builds the policy for this mode.
    pub fn build(self) -> Box<dyn QueryPolicy> {
        match self {
            Self::Keywords => Box::new(KeywordBlocklist),
            Self::Statements => Box::new(StatementPolicy::new()),
        }
    }
}

/// Safety level classification for SQL statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SafetyLevel {
    /// Read-only queries (SELECT, EXPLAIN, SHOW).
    Safe,
    /// Data modification queries (INSERT, UPDATE, CREATE).
    Mutating,
    /// Data loss or schema removal (DELETE, DROP, TRUNCATE, ALTER).
    Destructive,
}

impl SafetyLevel {
    /// Ordering used when combining several statements.
    fn priority(self) -> u8 {
        match self {
            Self::Safe => 0,
            Self::Mutating => 1,
            Self::Destructive => 2,
        }
    }
}

impl fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Safe => write!(f, "Safe"),
            Self::Mutating => write!(f, "Mutating"),
            Self::Destructive => write!(f, "Destructive"),
        }
    }
}

/// The type of SQL statement detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementType {
    Select,
    Insert,
    Update,
    Delete,
    Drop,
    Truncate,
    Alter,
    Create,
    Explain,
    Show,
    /// Multiple statements detected; contains the most dangerous type.
    Multiple(Box<StatementType>),
    /// Statement type could not be determined.
    Unknown,
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select => write!(f, "SELECT"),
            Self::Insert => write!(f, "INSERT"),
            Self::Update => write!(f, "UPDATE"),
            Self::Delete => write!(f, "DELETE"),
            Self::Drop => write!(f, "DROP"),
            Self::Truncate => write!(f, "TRUNCATE"),
            Self::Alter => write!(f, "ALTER"),
            Self::Create => write!(f, "CREATE"),
            Self::Explain => write!(f, "EXPLAIN"),
            Self::Show => write!(f, "SHOW"),
            Self::Multiple(inner) => write!(f, "Multiple ({})", inner),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Result of classifying a SQL query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationResult {
    pub level: SafetyLevel,
    pub statement_type: StatementType,
}

impl ClassificationResult {
    pub fn new(level: SafetyLevel, statement_type: StatementType) -> Self {
        Self {
            level,
            statement_type,
        }
    }
}

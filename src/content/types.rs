//! Lesson and tutorial records.
//!
//! Field names serialize in the camel-case shape the browser client reads.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How hard a question is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Beginner => write!(f, "beginner"),
            Self::Intermediate => write!(f, "intermediate"),
            Self::Advanced => write!(f, "advanced"),
        }
    }
}

/// One exercise inside a level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    pub title: String,
    /// The prompt shown to the learner.
    pub question: String,
    pub difficulty: Difficulty,
    /// Reference SQL. Shown for study; not used to grade answers.
    #[serde(rename = "answer")]
    pub expected_answer: String,
    pub hint: String,
    pub explanation: String,
}

/// A group of questions on related topics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub id: u32,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Level {
    /// Looks up a question by its ID within this level.
    pub fn question(&self, id: u32) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }
}

/// A worked example inside a tutorial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorialExample {
    pub description: String,
    pub query: String,
    pub explanation: String,
}

/// A walkthrough of one topic with runnable examples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tutorial {
    pub id: u32,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub introduction: String,
    #[serde(default)]
    pub examples: Vec<TutorialExample>,
}

/// Level listing entry (`GET /api/levels`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSummary {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub topics: Vec<String>,
    pub completed: u32,
}

impl From<&Level> for LevelSummary {
    fn from(level: &Level) -> Self {
        Self {
            id: level.id,
            name: level.name.clone(),
            description: level.description.clone(),
            topics: level.topics.clone(),
            completed: 0,
        }
    }
}

/// Tutorial listing entry (`GET /api/tutorials`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorialSummary {
    pub id: u32,
    pub title: String,
    pub description: String,
}

impl From<&Tutorial> for TutorialSummary {
    fn from(tutorial: &Tutorial) -> Self {
        Self {
            id: tutorial.id,
            title: tutorial.title.clone(),
            description: tutorial.description.clone(),
        }
    }
}

/// Progress report (`GET /api/progress`).
///
/// Nothing is persisted, so completion counts are always zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub completed: u32,
    pub total: usize,
    pub levels: Vec<LevelProgress>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub id: u32,
    pub name: String,
    pub completed: u32,
}

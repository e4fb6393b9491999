//! Answer grading.
//!
//! Grading is a text heuristic: an answer counts as correct when it mentions
//! both `select` and `from`, in any case. It does not compare against the
//! question's reference SQL. The submission is also executed so the learner
//! sees its rows; execution failures are reported, never raised.

use std::sync::Arc;

use tracing::debug;

use crate::content::Question;
use crate::db::DatabaseClient;

use super::envelope::{EvaluationOutcome, ResultSet};

pub const CORRECT_EXPLANATION: &str = "Your query is correct!";
pub const INCORRECT_EXPLANATION: &str = "Try again";

/// Returns true if the answer passes the grading heuristic.
pub fn is_correct(answer: &str) -> bool {
    let lower = answer.to_lowercase();
    lower.contains("select") && lower.contains("from")
}

/// Grades submitted answers and runs them for display.
pub struct AnswerEvaluator {
    db: Arc<dyn DatabaseClient>,
}

impl AnswerEvaluator {
    pub fn new(db: Arc<dyn DatabaseClient>) -> Self {
        Self { db }
    }

    /// Evaluates `answer` for `question`.
    ///
    /// The question is resolved by the caller; it only appears in logs here
    /// because grading ignores the reference answer.
    pub async fn evaluate(&self, question: &Question, answer: &str) -> EvaluationOutcome {
        let (result, error) = match self.db.execute_query(answer).await {
            Ok(query_result) => (Some(ResultSet::from_query_result(&query_result)), None),
            Err(e) => (None, Some(e.message().to_string())),
        };

        let correct = is_correct(answer);
        debug!(
            question_id = question.id,
            correct,
            executed = error.is_none(),
            "Evaluated answer"
        );

        EvaluationOutcome {
            correct,
            explanation: if correct {
                CORRECT_EXPLANATION
            } else {
                INCORRECT_EXPLANATION
            }
            .to_string(),
            result,
            error,
        }
    }
}

//! Client-side submission state.
//!
//! A `Session` tracks what the learner is looking at. Submissions are
//! last-request-wins: starting a new one cancels the previous submission's
//! token, and a response that arrives for anything but the latest request is
//! dropped without touching the display.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::query::{EvaluationOutcome, SandboxOutcome};
use crate::render::{render, DisplayTable};

/// Identifies one submission within a session.
pub type RequestId = u64;

/// Fallback shown for a wrong answer that carried no error text.
const WRONG_ANSWER_FALLBACK: &str = "Try again!";

/// A submission handed to the caller to perform.
#[derive(Debug, Clone)]
pub struct Submission {
    pub id: RequestId,
    /// Cancelled as soon as a newer submission begins.
    pub cancel: CancellationToken,
}

/// Grading feedback shown above a result table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Correct(String),
    Wrong(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SubmissionState {
    #[default]
    Idle,
    AwaitingResponse(RequestId),
    Displaying {
        feedback: Option<Feedback>,
        table: DisplayTable,
    },
    ShowingError(String),
}

/// Game score and level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreBoard {
    pub score: u32,
    pub level: u32,
}

impl Default for ScoreBoard {
    fn default() -> Self {
        Self { score: 0, level: 1 }
    }
}

impl ScoreBoard {
    /// Progress toward the next level, capped at 100.
    pub fn progress_percent(&self) -> f64 {
        let target = f64::from(self.level) * 100.0;
        (f64::from(self.score) * 100.0 / target).min(100.0)
    }

    /// Records a graded answer. Returns true if the level advanced.
    pub fn record(&mut self, correct: bool) -> bool {
        if correct {
            self.score += self.level * 10;
        }
        if self.progress_percent() >= 100.0 {
            self.level += 1;
            return true;
        }
        false
    }
}

#[derive(Debug, Default)]
pub struct Session {
    state: SubmissionState,
    score: ScoreBoard,
    last_id: RequestId,
    in_flight: Option<Submission>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn score(&self) -> ScoreBoard {
        self.score
    }

    /// Starts a submission, superseding any in flight.
    pub fn begin(&mut self) -> Submission {
        if let Some(previous) = self.in_flight.take() {
            debug!(request_id = previous.id, "Superseding in-flight submission");
            previous.cancel.cancel();
        }

        self.last_id += 1;
        let submission = Submission {
            id: self.last_id,
            cancel: CancellationToken::new(),
        };
        self.in_flight = Some(submission.clone());
        self.state = SubmissionState::AwaitingResponse(submission.id);
        submission
    }

    /// Takes the in-flight slot if `id` is still current.
    fn settle(&mut self, id: RequestId) -> bool {
        match &self.in_flight {
            Some(current) if current.id == id => {
                self.in_flight = None;
                true
            }
            _ => {
                debug!(request_id = id, "Discarding stale response");
                false
            }
        }
    }

    /// Applies a sandbox response. Returns false if it was stale.
    pub fn complete_try(&mut self, id: RequestId, outcome: &SandboxOutcome) -> bool {
        if !self.settle(id) {
            return false;
        }

        self.state = if outcome.success {
            SubmissionState::Displaying {
                feedback: None,
                table: render(outcome.result.as_ref()),
            }
        } else {
            let error = outcome.error.clone().unwrap_or_default();
            SubmissionState::ShowingError(match &outcome.hint {
                Some(hint) => format!("{error}\n{hint}"),
                None => error,
            })
        };
        true
    }

    /// Applies a grading response and updates the score. Returns false if
    /// it was stale.
    ///
    /// Only a correct answer shows its result table; a wrong one shows the
    /// feedback alone.
    pub fn complete_check(&mut self, id: RequestId, outcome: &EvaluationOutcome) -> bool {
        if !self.settle(id) {
            return false;
        }

        self.score.record(outcome.correct);
        let (feedback, table) = if outcome.correct {
            (
                Feedback::Correct(outcome.explanation.clone()),
                render(outcome.result.as_ref()),
            )
        } else {
            let reason = outcome
                .error
                .clone()
                .unwrap_or_else(|| WRONG_ANSWER_FALLBACK.to_string());
            (Feedback::Wrong(reason), DisplayTable::Empty)
        };
        self.state = SubmissionState::Displaying {
            feedback: Some(feedback),
            table,
        };
        true
    }

    /// Records a transport failure. Returns false if it was stale.
    pub fn fail(&mut self, id: RequestId, message: impl Into<String>) -> bool {
        if !self.settle(id) {
            return false;
        }
        self.state = SubmissionState::ShowingError(message.into());
        true
    }
}

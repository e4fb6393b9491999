//! The query-submission pipeline.
//!
//! Learner SQL enters through the answer evaluator or the try-it sandbox,
//! runs against the database client, and leaves as an envelope the client
//! can render.

mod envelope;
pub mod evaluator;
pub mod sandbox;

pub use envelope::{
    EvaluationOutcome, QueryFailure, Record, ResultSet, SandboxOutcome, INVALID_QUERY_MESSAGE,
    NO_RESULTS_MESSAGE, SYNTAX_HINT,
};
pub use evaluator::AnswerEvaluator;
pub use sandbox::SandboxRunner;

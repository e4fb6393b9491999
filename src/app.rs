//! The tutor service.
//!
//! Wires the content store, the answer evaluator, and the sandbox runner
//! around a single database client. All state is immutable after
//! construction, so one `Tutor` is shared across requests behind an `Arc`.

use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::content::ContentStore;
use crate::db::{self, DatabaseClient};
use crate::error::{Result, TutorError};
use crate::policy::QueryPolicy;
use crate::query::{AnswerEvaluator, EvaluationOutcome, SandboxOutcome, SandboxRunner};

pub struct Tutor {
    content: ContentStore,
    evaluator: AnswerEvaluator,
    runner: SandboxRunner,
    db: Arc<dyn DatabaseClient>,
}

impl Tutor {
    pub fn new(
        content: ContentStore,
        db: Arc<dyn DatabaseClient>,
        policy: Box<dyn QueryPolicy>,
    ) -> Self {
        Self {
            content,
            evaluator: AnswerEvaluator::new(Arc::clone(&db)),
            runner: SandboxRunner::new(Arc::clone(&db), policy),
            db,
        }
    }

    /// Builds a tutor from configuration: loads content and connects.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let content = ContentStore::load(config.content.dir.as_deref())?;
        let db = db::connect(&config.database).await?;
        let policy = config.policy.mode.build();
        info!(
            "Tutor ready: {} levels, {} tutorials, policy '{}'",
            content.level_count(),
            content.tutorial_count(),
            policy.name()
        );
        Ok(Self::new(content, db, policy))
    }

    pub fn content(&self) -> &ContentStore {
        &self.content
    }

    /// Grades `answer` for a question.
    ///
    /// Returns `NotFound` when the question does not resolve; any problem
    /// with the answer itself is reported inside the outcome.
    pub async fn evaluate(
        &self,
        question_id: u32,
        level_id: Option<u32>,
        answer: &str,
    ) -> Result<EvaluationOutcome> {
        let question = self.content.question(question_id, level_id).ok_or_else(|| {
            TutorError::not_found(match level_id {
                Some(level_id) => format!("Question {question_id} not found in level {level_id}"),
                None => format!("Question {question_id} not found"),
            })
        })?;

        Ok(self.evaluator.evaluate(question, answer).await)
    }

    pub async fn try_query(&self, query: &str) -> SandboxOutcome {
        self.runner.run(query).await
    }

    pub async fn try_request(&self, body: &serde_json::Value) -> SandboxOutcome {
        self.runner.run_request(body).await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.db.close().await
    }
}

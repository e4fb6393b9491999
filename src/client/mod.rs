//! HTTP client for a running tutor server.
//!
//! Used by the CLI when `--server` is given. Sandbox failures arrive as
//! 400 responses with a normal `SandboxOutcome` body, so those are returned
//! as outcomes rather than errors.
//!
//! `submit_try` and `submit_check` race the request against the submission's
//! cancellation token, so a superseded request is dropped mid-flight.

pub mod session;

pub use session::{Feedback, RequestId, ScoreBoard, Session, Submission, SubmissionState};

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::content::{LevelSummary, TutorialSummary};
use crate::error::{Result, TutorError};
use crate::query::{EvaluationOutcome, SandboxOutcome};
use crate::server::CheckAnswerRequest;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ApiErrorDetail {
    Structured { message: String, code: String },
    Plain(String),
}

/// Client for the tutor's JSON API.
#[derive(Debug, Clone)]
pub struct TutorClient {
    base: Url,
    client: Client,
}

impl TutorClient {
    /// Creates a client for the server at `base_url` (e.g. `http://127.0.0.1:3000`).
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| TutorError::config(format!("Invalid server URL '{base_url}': {e}")))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(TutorError::config(format!(
                "Invalid server URL '{base_url}': expected http or https"
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| TutorError::http(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { base, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| TutorError::config(format!("Invalid endpoint '{path}': {e}")))
    }

    /// Runs `query` in the server's sandbox.
    pub async fn try_query(&self, query: &str) -> Result<SandboxOutcome> {
        let url = self.endpoint("/api/try-query")?;
        debug!("POST {url}");
        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await
            .map_err(request_error)?;

        match response.status() {
            StatusCode::OK | StatusCode::BAD_REQUEST => decode(response).await,
            status => Err(Self::parse_error(status, &body_text(response).await)),
        }
    }

    /// Submits an answer for grading.
    pub async fn check_answer(&self, request: &CheckAnswerRequest) -> Result<EvaluationOutcome> {
        let url = self.endpoint("/api/check-answer")?;
        debug!("POST {url}");
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(request_error)?;

        if response.status().is_success() {
            decode(response).await
        } else {
            let status = response.status();
            Err(Self::parse_error(status, &body_text(response).await))
        }
    }

    /// Runs `query` on behalf of `submission`.
    ///
    /// Returns `Ok(None)` if the submission is cancelled before the server
    /// answers.
    pub async fn submit_try(
        &self,
        submission: &Submission,
        query: &str,
    ) -> Result<Option<SandboxOutcome>> {
        until_cancelled(&submission.cancel, submission.id, self.try_query(query)).await
    }

    /// Submits an answer on behalf of `submission`; `Ok(None)` if cancelled.
    pub async fn submit_check(
        &self,
        submission: &Submission,
        request: &CheckAnswerRequest,
    ) -> Result<Option<EvaluationOutcome>> {
        until_cancelled(&submission.cancel, submission.id, self.check_answer(request)).await
    }

    pub async fn levels(&self) -> Result<Vec<LevelSummary>> {
        self.get_json("/api/levels").await
    }

    pub async fn tutorials(&self) -> Result<Vec<TutorialSummary>> {
        self.get_json("/api/tutorials").await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path)?;
        debug!("GET {url}");
        let response = self.client.get(url).send().await.map_err(request_error)?;
        if response.status().is_success() {
            decode(response).await
        } else {
            let status = response.status();
            Err(Self::parse_error(status, &body_text(response).await))
        }
    }

    /// Maps a non-success response to an error, using the body's message
    /// when it has one.
    fn parse_error(status: StatusCode, body: &str) -> TutorError {
        let message = match serde_json::from_str::<ApiErrorBody>(body) {
            Ok(ApiErrorBody {
                error: ApiErrorDetail::Structured { message, code },
            }) => {
                debug!("Server error code {code}");
                message
            }
            Ok(ApiErrorBody {
                error: ApiErrorDetail::Plain(message),
            }) => message,
            Err(_) if body.is_empty() => format!("Server returned {status}"),
            Err(_) => format!("Server returned {status}: {body}"),
        };

        if status == StatusCode::NOT_FOUND {
            TutorError::not_found(message)
        } else {
            TutorError::http(message)
        }
    }
}

/// Drives `request` unless `cancel` fires first. Dropping the request future
/// aborts the HTTP exchange.
async fn until_cancelled<T>(
    cancel: &CancellationToken,
    id: RequestId,
    request: impl Future<Output = Result<T>>,
) -> Result<Option<T>> {
    tokio::select! {
        biased;

        _ = cancel.cancelled() => {
            debug!(request_id = id, "Request cancelled");
            Ok(None)
        }
        result = request => result.map(Some),
    }
}

fn request_error(e: reqwest::Error) -> TutorError {
    if e.is_connect() {
        TutorError::connection(format!("Cannot reach tutor server: {e}"))
    } else if e.is_timeout() {
        TutorError::http("Request to tutor server timed out")
    } else {
        TutorError::http(format!("Request failed: {e}"))
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    response
        .json()
        .await
        .map_err(|e| TutorError::http(format!("Invalid response from server: {e}")))
}

async fn body_text(response: reqwest::Response) -> String {
    response.text().await.unwrap_or_default()
}

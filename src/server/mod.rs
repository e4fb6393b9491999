//! JSON HTTP API.
//!
//! A thin axum layer over `Tutor`. Handlers translate paths and bodies into
//! tutor calls and outcomes into status codes; all behavior lives below.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::app::Tutor;
use crate::content::{Level, LevelSummary, Progress, Tutorial, TutorialSummary};
use crate::error::{Result, TutorError};
use crate::query::{EvaluationOutcome, SandboxOutcome};

/// Body of `POST /api/check-answer`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAnswerRequest {
    pub question_id: u32,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_id: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct QuestionsParams {
    level: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Builds the API router.
pub fn create_router(tutor: Arc<Tutor>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/levels", get(list_levels))
        .route("/api/levels/:id", get(get_level))
        .route("/api/questions", get(get_questions))
        .route("/api/check-answer", post(check_answer))
        .route("/api/progress", get(get_progress))
        .route("/api/tutorials", get(list_tutorials))
        .route("/api/tutorials/:id", get(get_tutorial))
        .route("/api/try-query", post(try_query))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(tutor)
}

/// Binds `addr` and serves until Ctrl-C.
pub async fn serve(tutor: Arc<Tutor>, addr: &str) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| TutorError::http(format!("Failed to bind {addr}: {e}")))?;
    info!("Listening on http://{addr}");

    axum::serve(listener, create_router(Arc::clone(&tutor)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| TutorError::internal(format!("Server error: {e}")))?;

    info!("Server stopped");
    tutor.shutdown().await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
    }
}

impl TutorError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Http(_) | Self::Execution(_) => StatusCode::BAD_REQUEST,
            Self::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Config(_) | Self::Content(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for TutorError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{}: {}", self.category(), self);
        }
        let body = json!({
            "error": {
                "message": self.message(),
                "code": self.code(),
            }
        });
        (status, Json(body)).into_response()
    }
}

fn parse_id(raw: &str) -> Option<u32> {
    raw.trim().parse().ok()
}

fn level_not_found(raw_id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Level not found",
            "message": format!("Level {raw_id} does not exist"),
        })),
    )
        .into_response()
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn list_levels(State(tutor): State<Arc<Tutor>>) -> Response {
    let levels: Vec<LevelSummary> = tutor.content().level_summaries();
    if levels.is_empty() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "No levels available"})),
        )
            .into_response();
    }
    Json(levels).into_response()
}

async fn get_level(State(tutor): State<Arc<Tutor>>, Path(id): Path<String>) -> Response {
    match parse_id(&id).and_then(|id| tutor.content().level(id)) {
        Some(level) => Json::<&Level>(level).into_response(),
        None => level_not_found(&id),
    }
}

/// Returns a whole level; `level` defaults to 1 when absent or not a number.
async fn get_questions(
    State(tutor): State<Arc<Tutor>>,
    Query(params): Query<QuestionsParams>,
) -> Response {
    let id = params.level.as_deref().and_then(parse_id).unwrap_or(1);
    match tutor.content().level(id) {
        Some(level) => Json::<&Level>(level).into_response(),
        None => level_not_found(&id.to_string()),
    }
}

async fn check_answer(
    State(tutor): State<Arc<Tutor>>,
    body: std::result::Result<Json<CheckAnswerRequest>, JsonRejection>,
) -> Result<Json<EvaluationOutcome>> {
    let Json(request) =
        body.map_err(|e| TutorError::http(format!("Invalid request body: {}", e.body_text())))?;
    let outcome = tutor
        .evaluate(request.question_id, request.level_id, &request.answer)
        .await?;
    Ok(Json(outcome))
}

async fn get_progress(State(tutor): State<Arc<Tutor>>) -> Json<Progress> {
    Json(tutor.content().progress())
}

async fn list_tutorials(State(tutor): State<Arc<Tutor>>) -> Json<Vec<TutorialSummary>> {
    Json(tutor.content().tutorial_summaries())
}

async fn get_tutorial(State(tutor): State<Arc<Tutor>>, Path(id): Path<String>) -> Response {
    let content = tutor.content();
    match parse_id(&id).and_then(|id| content.tutorial(id)) {
        Some(tutorial) => Json::<&Tutorial>(tutorial).into_response(),
        None => {
            (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "Tutorial not found",
                    "message": format!("Tutorial {id} does not exist"),
                    "availableTutorials": content.tutorial_count(),
                })),
            )
                .into_response()
        }
    }
}

/// Runs a sandbox query. Any failure, including an unreadable body, is 400.
async fn try_query(
    State(tutor): State<Arc<Tutor>>,
    body: std::result::Result<Json<serde_json::Value>, JsonRejection>,
) -> (StatusCode, Json<SandboxOutcome>) {
    let outcome = match body {
        Ok(Json(body)) => tutor.try_request(&body).await,
        Err(_) => SandboxOutcome::invalid_format(),
    };
    let status = if outcome.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    (status, Json(outcome))
}

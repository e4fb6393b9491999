//! Client tests against a live server on an ephemeral port.

use std::sync::Arc;

use sql_tutor::app::Tutor;
use sql_tutor::client::{Feedback, Session, SubmissionState, TutorClient};
use sql_tutor::config::Config;
use sql_tutor::error::TutorError;
use sql_tutor::render::DisplayTable;
use sql_tutor::server::{create_router, CheckAnswerRequest};
use tokio::net::TcpListener;

/// Starts a server over the scratch database and returns a client for it.
async fn spawn_server() -> TutorClient {
    let tutor = Arc::new(Tutor::from_config(&Config::default()).await.unwrap());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, create_router(tutor)).await.unwrap();
    });

    TutorClient::new(&format!("http://{addr}")).unwrap()
}

#[tokio::test]
async fn test_try_query_over_http() {
    let client = spawn_server().await;

    let outcome = client.try_query("SELECT id, username FROM users").await.unwrap();

    assert!(outcome.success);
    let result = outcome.result.unwrap();
    assert_eq!(result.fields, vec!["id", "username"]);
    assert_eq!(result.row_count, Some(3));
}

#[tokio::test]
async fn test_sandbox_failure_is_an_outcome_not_an_error() {
    let client = spawn_server().await;

    let outcome = client.try_query("TRUNCATE users").await.unwrap();

    assert!(!outcome.success);
    assert_eq!(
        outcome.error.as_deref(),
        Some("This type of query is not allowed in tutorial mode")
    );
}

#[tokio::test]
async fn test_check_answer_over_http() {
    let client = spawn_server().await;

    let outcome = client
        .check_answer(&CheckAnswerRequest {
            question_id: 1,
            answer: "select username from users".to_string(),
            level_id: Some(1),
        })
        .await
        .unwrap();

    assert!(outcome.correct);
    assert_eq!(outcome.result.unwrap().fields, vec!["username"]);
}

#[tokio::test]
async fn test_check_unknown_question_is_not_found() {
    let client = spawn_server().await;

    let err = client
        .check_answer(&CheckAnswerRequest {
            question_id: 1,
            answer: "SELECT 1 FROM users".to_string(),
            level_id: Some(9),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, TutorError::NotFound(_)));
    assert_eq!(err.message(), "Question 1 not found in level 9");
}

#[tokio::test]
async fn test_listings_over_http() {
    let client = spawn_server().await;

    let levels = client.levels().await.unwrap();
    assert_eq!(levels.len(), 2);
    assert_eq!(levels[0].name, "Basic SQL Queries");

    let tutorials = client.tutorials().await.unwrap();
    assert_eq!(tutorials[1].title, "Table Operations");
}

#[tokio::test]
async fn test_unreachable_server_is_connection_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = TutorClient::new(&format!("http://{addr}")).unwrap();
    let err = client.levels().await.unwrap_err();

    assert!(matches!(err, TutorError::Connection(_)));
}

#[tokio::test]
async fn test_session_keeps_only_the_latest_response() {
    let client = spawn_server().await;
    let mut session = Session::new();

    let slow = session.begin();
    let fast = session.begin();

    let fast_outcome = client.try_query("SELECT 1 AS latest").await.unwrap();
    assert!(session.complete_try(fast.id, &fast_outcome));

    let slow_outcome = client.try_query("SELECT 0 AS stale").await.unwrap();
    assert!(!session.complete_try(slow.id, &slow_outcome));

    assert_eq!(
        session.state(),
        &SubmissionState::Displaying {
            feedback: None,
            table: DisplayTable::Table {
                headers: vec!["latest".into()],
                rows: vec![vec!["1".into()]],
            },
        }
    );
}

#[tokio::test]
async fn test_superseded_submission_is_not_applied() {
    let client = spawn_server().await;
    let mut session = Session::new();

    let stale = session.begin();
    let latest = session.begin();

    assert!(client.submit_try(&stale, "SELECT 0 AS stale").await.unwrap().is_none());

    let outcome = client
        .submit_try(&latest, "SELECT 1 AS latest")
        .await
        .unwrap()
        .unwrap();
    assert!(session.complete_try(latest.id, &outcome));
    assert_eq!(
        session.state(),
        &SubmissionState::Displaying {
            feedback: None,
            table: DisplayTable::Table {
                headers: vec!["latest".into()],
                rows: vec![vec!["1".into()]],
            },
        }
    );
}

#[tokio::test]
async fn test_session_scores_correct_answers() {
    let client = spawn_server().await;
    let mut session = Session::new();

    let submission = session.begin();
    let outcome = client
        .check_answer(&CheckAnswerRequest {
            question_id: 1,
            answer: "SELECT * FROM users".to_string(),
            level_id: None,
        })
        .await
        .unwrap();
    session.complete_check(submission.id, &outcome);

    assert_eq!(session.score().score, 10);
    let SubmissionState::Displaying { feedback, table } = session.state() else {
        panic!("expected display state");
    };
    assert_eq!(
        feedback,
        &Some(Feedback::Correct("Your query is correct!".to_string()))
    );
    assert_eq!(table.row_count(), 3);
}

//! Shared test harness: a router over a throwaway database plus seeding
//! helpers.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use problem_server::core::{Config, ServerState, build_router};
use problem_server::db::DbService;
use problem_server::db::models::*;
use problem_server::db::repository::problem as problem_repo;

fn test_config() -> Config {
    Config {
        http_port: 0,
        database_path: ":memory:".to_string(),
        environment: "test".to_string(),
        log_level: "info".to_string(),
        log_dir: None,
    }
}

/// Build a router and state over a fresh file-backed database. The returned
/// TempDir must stay alive for the duration of the test.
pub async fn setup() -> (Router, ServerState, TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("problems.db");
    let db = DbService::new(path.to_str().expect("utf-8 path"))
        .await
        .expect("open test database");
    let state = ServerState {
        config: test_config(),
        db,
    };
    (build_router(state.clone()), state, dir)
}

// 2025-06-15 00:00:00 UTC, a Sunday
pub const BASE_MS: i64 = 1_749_945_600_000;
pub const DAY_MS: i64 = 86_400_000;

pub fn problem(id: &str, status: ProblemStatus, severity: &str, duration: f64) -> Problem {
    Problem {
        problem_id: id.to_string(),
        display_id: format!("P-{id}"),
        title: format!("Problem {id}"),
        status,
        impact_level: "SERVICE".to_string(),
        severity_level: severity.to_string(),
        start_time: BASE_MS,
        end_time: -1,
        duration,
        root_cause_entity: None,
        management_zones: vec![],
        affected_entities: vec![],
        entity_tags: vec![],
        evidence_details: EvidenceDetails::default(),
        recent_comments: RecentComments::default(),
        autoremediado: None,
        funciono_auto_remediacion: None,
    }
}

pub fn with_comment(mut p: Problem, content: &str) -> Problem {
    p.recent_comments.comments.push(Comment {
        content: content.to_string(),
        author: "ops".to_string(),
    });
    p.recent_comments.total_count = p.recent_comments.comments.len() as i64;
    p
}

pub async fn seed(state: &ServerState, problems: &[Problem]) {
    for p in problems {
        problem_repo::insert(state.pool(), p).await.expect("seed problem");
    }
}

pub async fn get_json(router: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let value = serde_json::from_slice(&bytes).expect("json body");
    (status, value)
}

pub async fn send_json(
    router: &Router,
    method: &str,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
        )
        .await
        .expect("response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let value = serde_json::from_slice(&bytes).expect("json body");
    (status, value)
}

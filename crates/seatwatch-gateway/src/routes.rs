//! API route handlers for the gateway.
//!
//! Parameters arrive as query strings (`?email=…&CRN=…`), also on POST.
//! Client mistakes and registry rejections answer 400 with `{"error": …}`.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use seatwatch_core::error::RegistryError;
use seatwatch_core::types::SubscriberKey;
use seatwatch_scheduler::{SubscriptionInfo, WatchStatus};

use super::server::AppState;

type Params = Query<HashMap<String, String>>;
type Reply = (StatusCode, Json<serde_json::Value>);

fn bad_request(error: &str) -> Reply {
    (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": error })))
}

/// Trimmed, non-empty query parameter.
fn param<'a>(params: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    params.get(name).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn info_json(info: &SubscriptionInfo) -> serde_json::Value {
    serde_json::json!({
        "id": info.id,
        "email": info.key.as_str(),
        "crn": info.target.crn,
        "term": info.target.term,
        "poll_interval_secs": info.target.poll_interval.as_secs(),
        "started_at": info.started_at.to_rfc3339(),
    })
}

/// Health check endpoint.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "seatwatch-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "active_checks": state.registry.active_count().await,
    }))
}

/// Start watching a CRN for an email address.
pub async fn start_course_check(State(state): State<Arc<AppState>>, Query(params): Params) -> Reply {
    let (Some(email), Some(crn)) = (param(&params, "email"), param(&params, "CRN")) else {
        return bad_request("Email and CRN are required");
    };
    let Ok(key) = SubscriberKey::parse(email) else {
        return bad_request("Email and CRN are required");
    };

    let target = state.config.target_for(crn);
    match state.registry.start(key, target).await {
        Ok(id) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "message": format!("Course availability check started for {email}"),
                "id": id,
            })),
        ),
        Err(RegistryError::AlreadyActive(_)) => {
            bad_request("A check is already running for this email")
        }
        Err(e) => bad_request(&e.to_string()),
    }
}

/// Stop the check running for an email address.
pub async fn stop_course_check(State(state): State<Arc<AppState>>, Query(params): Params) -> Reply {
    let Some(key) = param(&params, "email").and_then(|e| SubscriberKey::parse(e).ok()) else {
        return bad_request("Email is required");
    };

    match state.registry.stop(&key).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "message": format!("Course check stopped for {key}"),
            })),
        ),
        Err(RegistryError::NotFound(_)) => bad_request("No active check found for this email"),
        Err(e) => bad_request(&e.to_string()),
    }
}

/// Whether a check is running for an email address.
pub async fn course_check_status(State(state): State<Arc<AppState>>, Query(params): Params) -> Reply {
    let Some(key) = param(&params, "email").and_then(|e| SubscriberKey::parse(e).ok()) else {
        return bad_request("Email is required");
    };

    let body = match state.registry.status(&key).await {
        WatchStatus::Running(info) => {
            let mut body = info_json(&info);
            body["running"] = serde_json::Value::Bool(true);
            body
        }
        WatchStatus::NotFound => serde_json::json!({
            "email": key.as_str(),
            "running": false,
        }),
    };
    (StatusCode::OK, Json(body))
}

/// List every active check.
pub async fn list_course_checks(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let checks: Vec<_> = state.registry.list().await.iter().map(info_json).collect();
    Json(serde_json::json!({ "count": checks.len(), "checks": checks }))
}

//! Health check endpoint

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::error;

use crate::error::INTERNAL_ERROR_MESSAGE;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct HealthResponse {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    server_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.task_store().now().await {
        Ok(server_time) => (
            StatusCode::OK,
            Json(HealthResponse {
                ok: true,
                server_time: Some(server_time),
                error: None,
            }),
        ),
        Err(err) => {
            error!("Health check failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthResponse {
                    ok: false,
                    server_time: None,
                    error: Some(INTERNAL_ERROR_MESSAGE.to_string()),
                }),
            )
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", get(health_check))
}

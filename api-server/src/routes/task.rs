//! Task API endpoints
//!
//! CRUD over the task collection plus the summary counters.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use board_core::task::{ListParams, NewTaskRequest, QueryPlan, Task, TaskPatchRequest};
use board_core::view::TaskStats;

use crate::error::ApiError;
use crate::state::AppState;

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest("Invalid task id.".to_string()))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/tasks?sortBy=&order=&status=
///
/// A query string that does not parse lists with the default plan.
async fn list_tasks(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let params = match params {
        Ok(Query(params)) => params,
        Err(rejection) => {
            debug!("Ignoring list parameters: {}", rejection.body_text());
            ListParams::default()
        }
    };
    let plan = QueryPlan::from_params(&params);
    let tasks = state.task_store().list(&plan).await?;
    Ok(Json(tasks))
}

/// GET /api/tasks/stats
async fn task_stats(State(state): State<AppState>) -> Result<Json<TaskStats>, ApiError> {
    let tasks = state.task_store().list(&QueryPlan::default()).await?;
    Ok(Json(TaskStats::compute(&tasks, Utc::now())))
}

/// POST /api/tasks
async fn create_task(
    State(state): State<AppState>,
    body: Result<Json<NewTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let Json(request) = body?;
    let new_task = request.validate()?;
    let task = state.task_store().create(new_task).await?;
    info!("Created task {}", task.id);
    Ok((StatusCode::CREATED, Json(task)))
}

/// GET /api/tasks/{id}
async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    let id = parse_id(&id)?;
    state
        .task_store()
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Task {} not found", id)))
}

/// PATCH /api/tasks/{id}
async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<TaskPatchRequest>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let id = parse_id(&id)?;
    let Json(request) = body?;
    let patch = request.validate()?;
    let task = state.task_store().update(id, patch).await?;
    Ok(Json(task))
}

/// DELETE /api/tasks/{id}
async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state.task_store().delete(id).await?;
    info!("Deleted task {}", id);
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Router
// ============================================================================

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/stats", get(task_stats))
        .route(
            "/api/tasks/{id}",
            get(get_task).patch(update_task).delete(delete_task),
        )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request},
    };
    use board_core::task::{MemoryTaskStore, TaskRepository};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;

    fn setup() -> (Arc<MemoryTaskStore>, Router) {
        let store = Arc::new(MemoryTaskStore::new());
        let app = router().with_state(AppState::new(store.clone()));
        (store, app)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, payload)
    }

    async fn seed(store: &MemoryTaskStore, title: &str) -> Task {
        store
            .create(NewTaskRequest::new(title).validate().unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_returns_persisted_record() {
        let (store, app) = setup();
        let (status, payload) = send(
            &app,
            Method::POST,
            "/api/tasks",
            Some(json!({
                "title": "  Write docs  ",
                "priority": "high",
                "tags": ["Docs"],
                "dueDate": "2030-01-15"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(payload["title"], "Write docs");
        assert_eq!(payload["status"], "todo");
        assert_eq!(payload["priority"], "high");
        assert_eq!(payload["progress"], 0);
        assert_eq!(payload["assignee"]["name"], "Unassigned");
        assert!(payload["id"].is_string());
        assert!(payload["createdAt"].is_string());

        let listed = store.list(&QueryPlan::default()).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn create_rejects_invalid_input() {
        let (_store, app) = setup();

        let (status, payload) =
            send(&app, Method::POST, "/api/tasks", Some(json!({ "title": "   " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(payload["error"].is_string());

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/tasks",
            Some(json!({ "title": "ok", "status": "archived" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/tasks",
            Some(json!({ "title": "ok", "progress": 150 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let (_store, app) = setup();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/tasks")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"title\": "))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn list_ignores_injected_sort_tokens() {
        let (store, app) = setup();
        let first = seed(&store, "first").await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = seed(&store, "second").await;

        let (status, payload) = send(
            &app,
            Method::GET,
            "/api/tasks?sortBy=DROP%20TABLE&order=x",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<&str> = payload
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec![second.id.to_string(), first.id.to_string()]);
    }

    #[tokio::test]
    async fn list_with_unparsable_query_uses_default_order() {
        let (store, app) = setup();
        let first = seed(&store, "first").await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = seed(&store, "second").await;

        let (status, payload) = send(
            &app,
            Method::GET,
            "/api/tasks?sortBy=title&sortBy=status&order=asc",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<&str> = payload
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec![second.id.to_string(), first.id.to_string()]);
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let (store, app) = setup();
        let done = seed(&store, "done").await;
        seed(&store, "open").await;
        store
            .update(done.id, TaskPatchRequest::completion(true).validate().unwrap())
            .await
            .unwrap();

        let (_, payload) = send(&app, Method::GET, "/api/tasks?status=completed", None).await;
        let tasks = payload.as_array().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0]["title"], "done");

        let (_, payload) = send(&app, Method::GET, "/api/tasks?status=pending", None).await;
        let tasks = payload.as_array().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0]["title"], "open");
    }

    #[tokio::test]
    async fn patch_toggles_completion() {
        let (store, app) = setup();
        let task = seed(&store, "toggle me").await;
        let uri = format!("/api/tasks/{}", task.id);

        let (status, payload) =
            send(&app, Method::PATCH, &uri, Some(json!({ "completed": true }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["status"], "completed");
        assert_eq!(payload["progress"], 100);

        let (_, payload) =
            send(&app, Method::PATCH, &uri, Some(json!({ "completed": false }))).await;
        assert_eq!(payload["status"], "todo");
        assert_eq!(payload["progress"], 0);
    }

    #[tokio::test]
    async fn patch_requires_a_field() {
        let (store, app) = setup();
        let task = seed(&store, "unchanged").await;

        let (status, payload) = send(
            &app,
            Method::PATCH,
            &format!("/api/tasks/{}", task.id),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(payload["error"], "Nothing to update");
    }

    #[tokio::test]
    async fn unknown_and_malformed_ids() {
        let (_store, app) = setup();
        let missing = format!("/api/tasks/{}", Uuid::new_v4());

        let (status, payload) = send(&app, Method::GET, &missing, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(payload["error"].as_str().unwrap().contains("not found"));

        let (status, _) =
            send(&app, Method::PATCH, &missing, Some(json!({ "title": "x" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, payload) = send(&app, Method::GET, "/api/tasks/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(payload["error"], "Invalid task id.");
    }

    #[tokio::test]
    async fn delete_then_delete_again() {
        let (store, app) = setup();
        let task = seed(&store, "short lived").await;
        let uri = format!("/api/tasks/{}", task.id);

        let (status, payload) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(payload, Value::Null);

        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn get_single_task() {
        let (store, app) = setup();
        let task = seed(&store, "lookup").await;

        let (status, payload) =
            send(&app, Method::GET, &format!("/api/tasks/{}", task.id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["id"], task.id.to_string());
        assert_eq!(payload["title"], "lookup");
    }

    #[tokio::test]
    async fn stats_summarize_collection() {
        let (store, app) = setup();
        let done = seed(&store, "done").await;
        store
            .update(done.id, TaskPatchRequest::completion(true).validate().unwrap())
            .await
            .unwrap();
        store
            .create(
                NewTaskRequest::new("late")
                    .with_due_date("2001-01-01")
                    .validate()
                    .unwrap(),
            )
            .await
            .unwrap();
        store
            .create(
                NewTaskRequest::new("busy")
                    .with_status(board_core::task::TaskStatus::InProgress)
                    .validate()
                    .unwrap(),
            )
            .await
            .unwrap();

        let (status, payload) = send(&app, Method::GET, "/api/tasks/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["total"], 3);
        assert_eq!(payload["completed"], 1);
        assert_eq!(payload["inProgress"], 1);
        assert_eq!(payload["overdue"], 1);
    }
}

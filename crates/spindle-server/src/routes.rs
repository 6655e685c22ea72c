//! axum router and request handlers.
//!
//! | Method | Path                | Success                  |
//! |--------|---------------------|--------------------------|
//! | POST   | /api/v1/tasks       | 201 + task               |
//! | GET    | /api/v1/tasks       | 200 + task array         |
//! | GET    | /api/v1/tasks/{id}  | 200 + task               |
//! | DELETE | /api/v1/tasks/{id}  | 204                      |
//! | GET    | /api/v1/stats       | 200 + status counts      |
//! | GET    | /health             | 200 + version            |

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use spindle_core::{CreateTaskRequest, StatusCounts, TaskManager};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::dto::{HealthResponse, TaskResponse};
use crate::error::{ApiError, Operation};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub tasks: Arc<dyn TaskManager>,

    /// Cancelled when the server starts shutting down. A creation request
    /// stuck on a full queue gives up once this fires.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(tasks: Arc<dyn TaskManager>, shutdown: CancellationToken) -> Self {
        Self { tasks, shutdown }
    }
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/", get(missing_id).delete(missing_id))
        .route("/tasks/{id}", get(get_task).delete(delete_task))
        .route("/stats", get(stats));

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn create_task(
    State(state): State<AppState>,
    body: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiError> {
    let Json(request) = body?;
    let task = state
        .tasks
        .create_task(request, &state.shutdown)
        .await
        .map_err(ApiError::during(Operation::Create))?;
    Ok((StatusCode::CREATED, Json(TaskResponse::from(&task))))
}

async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<TaskResponse>>, ApiError> {
    let tasks = state
        .tasks
        .list_tasks()
        .await
        .map_err(ApiError::during(Operation::List))?;
    let now = Utc::now();
    Ok(Json(
        tasks
            .iter()
            .map(|task| TaskResponse::from_task(task, now))
            .collect(),
    ))
}

async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TaskResponse>, ApiError> {
    let task = state
        .tasks
        .get_task(&id)
        .await
        .map_err(ApiError::during(Operation::Get))?;
    Ok(Json(TaskResponse::from(&task)))
}

async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .tasks
        .delete_task(&id)
        .await
        .map_err(ApiError::during(Operation::Delete))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn missing_id() -> ApiError {
    ApiError::missing_id()
}

async fn stats(State(state): State<AppState>) -> Result<Json<StatusCounts>, ApiError> {
    let counts = state
        .tasks
        .counts()
        .await
        .map_err(ApiError::during(Operation::Stats))?;
    Ok(Json(counts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, header};
    use axum::response::Response;
    use http_body_util::BodyExt;
    use rstest::rstest;
    use serde_json::{Value, json};
    use spindle_core::{ServiceBuilder, SpindleError, Task, TaskId};
    use std::time::Duration;
    use tower::ServiceExt;

    /// Returns a fixed error from every operation.
    struct FailingManager {
        error: fn() -> SpindleError,
    }

    #[async_trait]
    impl TaskManager for FailingManager {
        async fn create_task(
            &self,
            _request: CreateTaskRequest,
            _cancel: &CancellationToken,
        ) -> spindle_core::Result<Task> {
            Err((self.error)())
        }

        async fn list_tasks(&self) -> spindle_core::Result<Vec<Task>> {
            Err((self.error)())
        }

        async fn get_task(&self, _id: &str) -> spindle_core::Result<Task> {
            Err((self.error)())
        }

        async fn delete_task(&self, _id: &str) -> spindle_core::Result<()> {
            Err((self.error)())
        }

        async fn counts(&self) -> spindle_core::Result<StatusCounts> {
            Err((self.error)())
        }

        async fn shutdown(&self, _deadline: Duration) -> spindle_core::Result<()> {
            Ok(())
        }
    }

    fn failing_app(error: fn() -> SpindleError) -> Router {
        router(AppState::new(
            Arc::new(FailingManager { error }),
            CancellationToken::new(),
        ))
    }

    fn live_app(delay: Duration) -> (Router, Arc<dyn TaskManager>) {
        let service: Arc<dyn TaskManager> = Arc::new(
            ServiceBuilder::new()
                .worker_count(1)
                .processing_delay(delay)
                .build()
                .unwrap(),
        );
        let app = router(AppState::new(
            Arc::clone(&service),
            CancellationToken::new(),
        ));
        (app, service)
    }

    fn request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_version() {
        let (app, _) = live_app(Duration::ZERO);
        let response = app.oneshot(request("GET", "/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") })
        );
    }

    #[tokio::test]
    async fn create_returns_pending_task() {
        let (app, _) = live_app(Duration::from_secs(3600));
        let response = app
            .oneshot(post_json(
                "/api/v1/tasks",
                r#"{"title":"T","description":"D"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["id"], "1");
        assert_eq!(body["title"], "T");
        assert_eq!(body["description"], "D");
        assert_eq!(body["status"], "pending");
        assert!(body.get("started_at").is_none());
        assert!(body.get("duration").is_none());
    }

    #[rstest]
    #[case("not json")]
    #[case(r#"{"title":"T"}"#)]
    #[case(r#"{"title":1,"description":"D"}"#)]
    #[tokio::test]
    async fn malformed_body_is_bad_request(#[case] body: &str) {
        let (app, service) = live_app(Duration::ZERO);
        let response = app.oneshot(post_json("/api/v1/tasks", body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Invalid request body" })
        );
        assert!(service.list_tasks().await.unwrap().is_empty());
    }

    #[rstest]
    #[case(r#"{"title":"","description":"D"}"#)]
    #[case(r#"{"title":"T","description":""}"#)]
    #[tokio::test]
    async fn empty_field_is_invalid_body(#[case] body: &str) {
        let (app, service) = live_app(Duration::ZERO);
        let response = app.oneshot(post_json("/api/v1/tasks", body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Invalid request body" })
        );
        assert!(service.list_tasks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn whitespace_title_is_accepted() {
        let (app, _) = live_app(Duration::from_secs(3600));
        let response = app
            .oneshot(post_json(
                "/api/v1/tasks",
                r#"{"title":"  ","description":"D"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(json_body(response).await["title"], "  ");
    }

    #[tokio::test]
    async fn get_list_and_delete_round_trip() {
        let (app, service) = live_app(Duration::from_secs(3600));
        let task = service
            .create_task(CreateTaskRequest::new("T", "D"), &CancellationToken::new())
            .await
            .unwrap();
        let uri = format!("/api/v1/tasks/{}", task.id());

        let response = app.clone().oneshot(request("GET", &uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["id"], task.id().to_string());

        let response = app
            .clone()
            .oneshot(request("GET", "/api/v1/tasks"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await.as_array().unwrap().len(), 1);

        let response = app.clone().oneshot(request("DELETE", &uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app.oneshot(request("GET", &uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Task not found" })
        );
    }

    #[tokio::test]
    async fn completed_task_is_served_with_result() {
        let (app, service) = live_app(Duration::ZERO);
        let task = service
            .create_task(CreateTaskRequest::new("T", "D"), &CancellationToken::new())
            .await
            .unwrap();
        let uri = format!("/api/v1/tasks/{}", task.id());

        let body = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let response = app.clone().oneshot(request("GET", &uri)).await.unwrap();
                let body = json_body(response).await;
                if body["status"] == "completed" {
                    return body;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        assert_eq!(body["result"], "Task completed successfully");
        assert!(body["started_at"].is_string());
        assert!(body["completed_at"].is_string());
        assert!(body["duration"].as_i64().unwrap() >= 0);
    }

    #[rstest]
    #[case("GET", "/api/v1/tasks/abc", "Invalid task ID format")]
    #[case("DELETE", "/api/v1/tasks/abc", "Invalid task ID format")]
    #[case("GET", "/api/v1/tasks/", "Task ID is required")]
    #[case("DELETE", "/api/v1/tasks/", "Task ID is required")]
    #[tokio::test]
    async fn bad_ids_are_bad_request(#[case] method: &str, #[case] uri: &str, #[case] message: &str) {
        let (app, _) = live_app(Duration::ZERO);
        let response = app.oneshot(request(method, uri)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await, json!({ "error": message }));
    }

    #[rstest]
    #[case("GET", "/api/v1/tasks/42")]
    #[case("DELETE", "/api/v1/tasks/42")]
    #[case("GET", "/api/v1/tasks/-1")]
    #[case("DELETE", "/api/v1/tasks/-1")]
    #[case("GET", "/api/v1/tasks/+42")]
    #[tokio::test]
    async fn well_formed_unknown_id_is_not_found(#[case] method: &str, #[case] uri: &str) {
        let (app, _) = live_app(Duration::ZERO);
        let response = app.oneshot(request(method, uri)).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Task not found" })
        );
    }

    #[tokio::test]
    async fn stats_counts_tasks() {
        let (app, service) = live_app(Duration::from_secs(3600));
        service
            .create_task(CreateTaskRequest::new("T", "D"), &CancellationToken::new())
            .await
            .unwrap();

        let response = app.oneshot(request("GET", "/api/v1/stats")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["active_workers"], 1);
    }

    #[rstest]
    #[case(|| SpindleError::ShuttingDown)]
    #[case(|| SpindleError::QueueFull(TaskId::new(3)))]
    #[case(|| SpindleError::Internal("lock poisoned".into()))]
    #[tokio::test]
    async fn create_failures_are_generic_500(#[case] error: fn() -> SpindleError) {
        let response = failing_app(error)
            .oneshot(post_json(
                "/api/v1/tasks",
                r#"{"title":"T","description":"D"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Failed to create task" })
        );
    }

    #[rstest]
    #[case("GET", "/api/v1/tasks", "Failed to list tasks")]
    #[case("GET", "/api/v1/tasks/1", "Failed to get task")]
    #[case("DELETE", "/api/v1/tasks/1", "Failed to delete task")]
    #[case("GET", "/api/v1/stats", "Failed to get task stats")]
    #[tokio::test]
    async fn internal_errors_hide_details(
        #[case] method: &str,
        #[case] uri: &str,
        #[case] message: &str,
    ) {
        let response = failing_app(|| SpindleError::Internal("lock poisoned".into()))
            .oneshot(request(method, uri))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await, json!({ "error": message }));
    }

    #[tokio::test]
    async fn creation_after_shutdown_fails() {
        let (app, service) = live_app(Duration::ZERO);
        service.shutdown(Duration::from_secs(1)).await.unwrap();

        let response = app
            .oneshot(post_json(
                "/api/v1/tasks",
                r#"{"title":"T","description":"D"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Failed to create task" })
        );
    }
}

//! HTTP route handlers for the `/api/v1` surface.

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

use algoviz::core::params::RawParameters;
use algoviz::core::types::{AlgorithmDescriptor, Category, CategoryInfo};
use algoviz::orchestrator::SubmitError;

use crate::state::AppState;

/// Build the API router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/algorithms", get(list_algorithms))
        .route("/algorithms/{id}", get(get_algorithm))
        .route("/algorithms/{id}/execute", post(execute_algorithm))
        .route("/categories", get(list_categories))
        .route("/executions/{id}", get(get_execution))
        .route("/executions/{id}/cancel", post(cancel_execution))
}

/// Error response: `{"error": "..."}` with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::NotFound(_) => ApiError::new(StatusCode::NOT_FOUND, "Algorithm not found"),
            SubmitError::Validation(err) => {
                ApiError::new(StatusCode::BAD_REQUEST, format!("Invalid parameters: {err}"))
            }
            SubmitError::AtCapacity(limit) => ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Too many concurrent executions (limit {limit})"),
            ),
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: DateTime<Utc>,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    category: Option<String>,
}

#[derive(Debug, Serialize)]
struct AlgorithmsResponse {
    algorithms: Vec<AlgorithmDescriptor>,
    count: usize,
}

/// GET /algorithms - all descriptors, optionally filtered by `?category=`.
async fn list_algorithms(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<AlgorithmsResponse>, ApiError> {
    let algorithms = match query.category.as_deref() {
        None | Some("") => state.registry.list(),
        Some(raw) => {
            let category: Category = serde_json::from_value(Value::String(raw.to_string()))
                .map_err(|_| {
                    ApiError::new(StatusCode::BAD_REQUEST, format!("Unknown category: {raw}"))
                })?;
            state.registry.list_by_category(category)
        }
    };
    Ok(Json(AlgorithmsResponse {
        count: algorithms.len(),
        algorithms,
    }))
}

/// GET /algorithms/{id} - one descriptor.
async fn get_algorithm(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AlgorithmDescriptor>, ApiError> {
    state
        .registry
        .get(&id)
        .map(|executor| Json(executor.metadata().clone()))
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "Algorithm not found"))
}

#[derive(Debug, Default, Deserialize)]
struct ExecuteRequest {
    #[serde(default)]
    parameters: Option<RawParameters>,
    #[serde(default)]
    input: Option<Value>,
}

#[derive(Debug, Serialize)]
struct ExecuteResponse {
    execution_id: String,
    status: &'static str,
    message: &'static str,
}

/// POST /algorithms/{id}/execute - validate and start an execution.
///
/// The body is optional; an empty body runs with default parameters.
async fn execute_algorithm(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<ExecuteResponse>), ApiError> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        ExecuteRequest::default()
    } else {
        serde_json::from_slice::<ExecuteRequest>(&body).map_err(|err| {
            debug!(error = %err, "malformed execute request");
            ApiError::new(StatusCode::BAD_REQUEST, format!("Invalid request body: {err}"))
        })?
    };
    let parameters = request.parameters.unwrap_or_default();

    let handle = state.orchestrator.submit(&id, &parameters, request.input)?;
    info!(algorithm_id = %id, execution_id = handle.id(), "accepted execution request");

    Ok((
        StatusCode::ACCEPTED,
        Json(ExecuteResponse {
            execution_id: handle.id().to_string(),
            status: "started",
            message: "Algorithm execution started",
        }),
    ))
}

#[derive(Debug, Serialize)]
struct CategoriesResponse {
    categories: Vec<CategoryInfo>,
    count: usize,
}

/// GET /categories - the fixed taxonomy.
async fn list_categories() -> Json<CategoriesResponse> {
    let categories: Vec<CategoryInfo> = Category::ALL.iter().map(|c| c.info()).collect();
    Json(CategoriesResponse {
        count: categories.len(),
        categories,
    })
}

/// GET /executions/{id} - execution history is not kept.
async fn get_execution(Path(_id): Path<String>) -> ApiError {
    ApiError::new(
        StatusCode::NOT_IMPLEMENTED,
        "Execution state retrieval is not implemented",
    )
}

#[derive(Debug, Serialize)]
struct CancelResponse {
    execution_id: String,
    status: &'static str,
}

/// POST /executions/{id}/cancel - stop a running execution at its next step.
async fn cancel_execution(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<CancelResponse>), ApiError> {
    if !state.orchestrator.cancel(&id) {
        return Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "No running execution with that id",
        ));
    }
    Ok((
        StatusCode::ACCEPTED,
        Json(CancelResponse {
            execution_id: id,
            status: "cancelling",
        }),
    ))
}

#[cfg(test)]
mod tests {
    use algoviz::io::config::AppConfig;
    use algoviz::test_support::raw_params;

    use super::*;

    fn state() -> AppState {
        AppState::new(&AppConfig::default())
    }

    fn body(value: Value) -> Bytes {
        Bytes::from(value.to_string())
    }

    #[tokio::test]
    async fn health_reports_version() {
        let Json(health) = health().await;
        assert_eq!(health.status, "healthy");
        assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn list_algorithms_filters_by_category() {
        let state = state();
        let Json(all) = list_algorithms(State(state.clone()), Query(ListQuery::default()))
            .await
            .expect("list");
        assert_eq!(all.count, 10);

        let Json(sorting) = list_algorithms(
            State(state.clone()),
            Query(ListQuery {
                category: Some("sorting".to_string()),
            }),
        )
        .await
        .expect("list sorting");
        assert_eq!(sorting.count, 5);
        assert!(sorting.algorithms.iter().all(|d| d.category == Category::Sorting));

        let err = list_algorithms(
            State(state),
            Query(ListQuery {
                category: Some("alchemy".to_string()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn get_algorithm_returns_descriptor_or_404() {
        let state = state();
        let Json(descriptor) = get_algorithm(State(state.clone()), Path("heap_sort".to_string()))
            .await
            .expect("descriptor");
        assert_eq!(descriptor.id, "heap_sort");

        let err = get_algorithm(State(state), Path("nope".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn execute_accepts_valid_request() {
        let state = state();
        let (status, Json(response)) = execute_algorithm(
            State(state),
            Path("bubble_sort".to_string()),
            body(json!({"parameters": {"array_size": 5, "seed": 1}})),
        )
        .await
        .expect("accepted");
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(response.status, "started");
        assert!(response.execution_id.starts_with("exec_"));
    }

    #[tokio::test]
    async fn execute_with_empty_body_uses_defaults() {
        let (status, _) = execute_algorithm(
            State(state()),
            Path("linear_search".to_string()),
            Bytes::new(),
        )
        .await
        .expect("accepted");
        assert_eq!(status, StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn execute_maps_errors_to_status_codes() {
        let state = state();

        let err = execute_algorithm(
            State(state.clone()),
            Path("nope".to_string()),
            body(json!({})),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err = execute_algorithm(
            State(state.clone()),
            Path("bubble_sort".to_string()),
            body(json!({"parameters": {"array_size": 1000}})),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("array_size"));

        let oversized: Vec<i64> = (0..500).collect();
        let err = execute_algorithm(
            State(state.clone()),
            Path("bubble_sort".to_string()),
            body(json!({"input": oversized})),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("input"));

        let err = execute_algorithm(
            State(state),
            Path("bubble_sort".to_string()),
            Bytes::from_static(b"{not json"),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn execute_refuses_at_capacity() {
        let mut config = AppConfig::default();
        config.executions.max_concurrent = 1;
        let state = AppState::new(&config);

        // Keep the only permit busy with a long-running execution.
        let running = state
            .orchestrator
            .submit(
                "bubble_sort",
                &raw_params(json!({"array_size": 100, "seed": 7})),
                None,
            )
            .expect("first");

        let err = execute_algorithm(
            State(state.clone()),
            Path("bubble_sort".to_string()),
            body(json!({})),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);

        running.cancel();
        running.wait().await.expect("join");
    }

    #[tokio::test]
    async fn categories_lists_the_taxonomy() {
        let Json(response) = list_categories().await;
        assert_eq!(response.count, 10);
        assert_eq!(response.categories[0].id, Category::Sorting);
    }

    #[tokio::test]
    async fn execution_lookup_is_not_implemented() {
        let err = get_execution(Path("exec_1".to_string())).await;
        assert_eq!(err.status, StatusCode::NOT_IMPLEMENTED);
    }

    #[tokio::test]
    async fn cancel_unknown_execution_is_404() {
        let err = cancel_execution(State(state()), Path("exec_999".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}

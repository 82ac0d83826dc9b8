use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use placement_core::{
    EngineConfig, GridPlacementRequest, LayoutScore, PlacementEngine, PlacementError,
    PlacementResponse, ScoreRequest,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

mod config;

use config::ApiConfig;

const OPENAPI_SPEC: &str = include_str!("../../../openapi.yaml");
const SWAGGER_UI_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Grid Placement API Docs</title>
    <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script>
        window.onload = () => {
            SwaggerUIBundle({
                url: '/openapi.yaml',
                dom_id: '#swagger-ui',
                presets: [SwaggerUIBundle.presets.apis],
                layout: 'BaseLayout',
            });
        };
    </script>
</body>
</html>"#;

/// Engine settings shared by all requests; each request builds its own engine.
#[derive(Clone)]
struct AppState {
    engine_config: Arc<EngineConfig>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.rust_log))
        .init();

    info!("Starting Grid Placement API");

    let app = app(AppState {
        engine_config: Arc::new(config.engine),
    });

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("API server listening on http://{}", addr);
    info!("Try: curl http://localhost:{}/api/health", config.port);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/place", post(place))
        .route("/api/score", post(score))
        .route("/openapi.yaml", get(serve_openapi_spec))
        .route("/docs", get(serve_swagger_ui))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "grid-placement-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Main placement endpoint
async fn place(
    State(state): State<AppState>,
    Json(job): Json<GridPlacementRequest>,
) -> Result<Json<PlacementResponse>, AppError> {
    info!(
        "Received placement request: {}x{} grid, {} existing containers, new '{}'",
        job.grid_size,
        job.grid_size,
        job.request.existing_containers.len(),
        job.request.new_container_requirements.content_type
    );

    // The reorganization search is CPU-bound.
    let config = (*state.engine_config).clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let engine = PlacementEngine::with_config(job.grid_size, config)?;
        engine.place(&job.request)
    })
    .await
    .context("Placement task failed")??;

    let response = PlacementResponse::from(outcome);
    info!(
        "Placement complete: success={}, reorganized={}",
        response.success,
        response.reorganization_needed.unwrap_or(false)
    );

    Ok(Json(response))
}

/// Scores a complete layout
async fn score(
    State(state): State<AppState>,
    Json(request): Json<ScoreRequest>,
) -> Result<Json<LayoutScore>, AppError> {
    info!(
        "Scoring {} containers on a {}x{} grid",
        request.containers.len(),
        request.grid_size,
        request.grid_size
    );

    let config = (*state.engine_config).clone();
    let score = tokio::task::spawn_blocking(move || {
        let engine = PlacementEngine::with_config(request.grid_size, config)?;
        engine.score(&request.containers)
    })
    .await
    .context("Scoring task failed")??;

    Ok(Json(score))
}

/// Application error type
struct AppError(anyhow::Error);

impl From<PlacementError> for AppError {
    fn from(err: PlacementError) -> Self {
        AppError(err.into())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("Request error: {}", self.0);

        let status = if self.0.downcast_ref::<PlacementError>().is_some() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        (
            status,
            Json(json!({
                "error": self.0.to_string(),
            })),
        )
            .into_response()
    }
}

async fn serve_openapi_spec() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("Content-Type", "application/yaml")],
        OPENAPI_SPEC,
    )
}

async fn serve_swagger_ui() -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}

use anyhow::Result;

#[cfg(test)]
mod tests;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use replygen_common::{
    Error as CommonError, ErrorResponse, GenerateRequest, GenerateResponse, HealthResponse,
    MetricsSnapshot, RequestId, RequestMetrics,
};
use replygen_config::ConfigLoader;
use replygen_runtime::LifecycleCoordinator;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone)]
struct AppState {
    coordinator: Arc<LifecycleCoordinator>,
    metrics: Arc<RequestMetrics>,
}

/// The listener only binds once the coordinator is Ready, so reachability
/// of this endpoint already implies readiness.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let request_id = RequestId::new();
    let started = Instant::now();
    state.metrics.record_request().await;

    match state.coordinator.handle(&request).await {
        Ok(text) => {
            let elapsed_ms = started.elapsed().as_millis() as u64;
            state.metrics.record_success(elapsed_ms).await;
            info!(%request_id, "Generated reply: {} chars in {}ms", text.chars().count(), elapsed_ms);
            Ok(Json(GenerateResponse { response: text }))
        }
        Err(e) => {
            state.metrics.record_error(&e).await;
            match &e {
                // A template defect is a bug, not an operational condition
                CommonError::Template(_) => error!(%request_id, "Generation failed: {}", e),
                _ => warn!(%request_id, "Generation failed: {}", e),
            }
            let status = StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            Err((status, Json(ErrorResponse::from(&e))))
        }
    }
}

async fn version(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "api": "Replygen Local API",
        "model": state.coordinator.model().to_string(),
    }))
}

async fn get_metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot().await)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::INFO.into()))
        .init();

    info!("Starting Replygen local API server");

    // Load configuration and resolve the model once for the process lifetime
    let config = ConfigLoader::load_with_env(None)?;
    let model_name = replygen_config::resolve_model_name()?;

    // Boot the inference server before accepting any traffic
    let coordinator = Arc::new(LifecycleCoordinator::new(&config, model_name)?);
    coordinator.start().await?;

    let state = AppState {
        coordinator: coordinator.clone(),
        metrics: Arc::new(RequestMetrics::new()),
    };

    // The client is a browser extension, so CORS must be open
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/generate", post(generate))
        .route("/version", get(version))
        .route("/metrics", get(get_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let serve_result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // Release the inference server on every exit path, including a failed
    // serve loop
    if let Err(e) = coordinator.shutdown().await {
        error!("Shutdown error: {}", e);
    }

    serve_result?;
    Ok(())
}

//! HTTP front-end for the medical question-answering pipeline.
//!
//! # Endpoints
//!
//! - `GET /health`, `GET /api/health` - readiness and loaded domains
//! - `POST /api/ask` - answer a question (`{"query": "..."}`)
//! - `POST /api/rag/query` - legacy alias of `/api/ask`
//! - `GET /api/domains` - catalog listing with index availability
//!
//! # Environment Variables
//!
//! - `MEDIRAG_LOG`: logging filter (trace, debug, info, warn, error)
//! - `MEDIRAG_DATA_DIR`: override data directory location
//! - `MEDIRAG_INDEXES_DIR`: override the directory holding domain artifacts
//! - `MEDIRAG_SERVICE_HOST`: bind address (default: 127.0.0.1)
//! - `MEDIRAG_SERVICE_PORT`: port (default: 5000)

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::{error, info};

use medirag_lib::application::{
    AskRequest, AskResponse, DomainListResponse, HealthStatusResponse, QueryOrchestrator,
};

#[derive(Clone)]
struct AppState {
    orchestrator: Arc<QueryOrchestrator>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: &str, code: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            code: code.to_string(),
        }),
    )
}

async fn health_check(State(state): State<AppState>) -> Json<HealthStatusResponse> {
    let orchestrator = &state.orchestrator;
    Json(HealthStatusResponse::healthy(
        orchestrator.catalog(),
        orchestrator.store().loaded(),
    ))
}

async fn list_domains(State(state): State<AppState>) -> Json<DomainListResponse> {
    Json(DomainListResponse::from(state.orchestrator.catalog()))
}

async fn ask(
    State(state): State<AppState>,
    Json(payload): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let query = payload.query.trim().to_string();
    if query.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Query cannot be empty",
            "EMPTY_QUERY",
        ));
    }

    let orchestrator = Arc::clone(&state.orchestrator);
    let result = tokio::task::spawn_blocking(move || orchestrator.run_query(&query))
        .await
        .map_err(|err| {
            error!(target: "medirag::service", "query task failed: {err}");
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to process question. Please try again.",
                "QUERY_FAILED",
            )
        })?;

    if result.answer.trim().is_empty() {
        return Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to generate response. Please try again.",
            "EMPTY_ANSWER",
        ));
    }

    info!(
        target: "medirag::service",
        domains = ?result.domains,
        confidence = result.confidence,
        processing_time = result.processing_time,
        "question answered"
    );
    Ok(Json(AskResponse::from(result)))
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/health", get(health_check))
        .route("/api/ask", post(ask))
        .route("/api/rag/query", post(ask))
        .route("/api/domains", get(list_domains))
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(target: "medirag::service", "failed to listen for shutdown signal: {err}");
    }
}

async fn run_service() -> anyhow::Result<()> {
    medirag_lib::init_tracing();
    info!(
        target: "medirag::service",
        "starting medirag service v{}",
        env!("CARGO_PKG_VERSION")
    );

    let handles = tokio::task::spawn_blocking(medirag_lib::build_environment)
        .await
        .context("initialisation task failed")??;
    info!(
        target: "medirag::service",
        data_dir = %handles.data_dir.display(),
        loaded = ?handles.store.loaded(),
        "pipeline initialised"
    );

    let app = router(AppState {
        orchestrator: handles.orchestrator,
    });

    let (host, port) = medirag_lib::service_address();
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid bind address {host}:{port}"))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(target: "medirag::service", "listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server failed")?;
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_service().await {
        eprintln!("[medirag::service] service failed: {err:?}");
        std::process::exit(1);
    }
}

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, Request, State},
    http::{header, Method, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use shared::protocol::{ActionResponse, SearchParams, ShowParams};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;

use api::{ApiContext, RequestError};
use app_state::AppState;
use config::load_settings;

/// HTTP bridge between browser-side clients and the Logseq CLI.
#[derive(Parser, Debug)]
#[command(name = "logseq-server", version)]
struct Args {
    /// Host to bind to (overrides the configured bind address).
    #[arg(long)]
    host: Option<String>,
    /// Port to listen on (overrides the configured bind address).
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let settings = load_settings()?;
    let addr = settings.bind_addr(args.host.as_deref(), args.port);

    let api = ApiContext {
        runner: Arc::new(settings.runner()),
    };
    let app = build_router(Arc::new(AppState { api }));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        %addr,
        version = api::SERVER_VERSION,
        logseq_bin = %settings.logseq_bin,
        "server listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down server");
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .route("/list", get(list_graphs))
        .route("/show", get(show_graph))
        .route("/search", get(search))
        .route("/query", post(query))
        .fallback(unknown_endpoint)
        .layer(middleware::from_fn(log_request))
        .layer(cors_layer())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

async fn log_request(request: Request, next: Next) -> Response {
    info!(
        method = %request.method(),
        path = %request.uri().path(),
        query = ?request.uri().query(),
        "request"
    );
    next.run(request).await
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let status = match self {
            RequestError::UnknownEndpoint(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        };
        (status, Json(ActionResponse::failure(self.to_string()))).into_response()
    }
}

async fn health() -> Json<api::HealthResponse> {
    Json(api::health())
}

async fn version() -> Json<api::VersionResponse> {
    Json(api::version())
}

async fn list_graphs(State(state): State<Arc<AppState>>) -> Json<ActionResponse> {
    Json(api::list_graphs(&state.api).await)
}

async fn show_graph(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ShowParams>,
) -> Result<Json<ActionResponse>, RequestError> {
    api::show_graph(&state.api, params.graph.as_deref())
        .await
        .map(Json)
}

async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ActionResponse>, RequestError> {
    api::search(&state.api, params.q.as_deref(), params.graph.as_deref())
        .await
        .map(Json)
}

async fn query(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ActionResponse>, RequestError> {
    api::query(&state.api, &body).await.map(Json)
}

async fn unknown_endpoint(uri: Uri) -> RequestError {
    RequestError::UnknownEndpoint(uri.path().to_string())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;

use crate::config::Config;
use crate::media::Collaborators;
use crate::pipeline::Orchestrator;
use crate::state::AppState;
use anyhow::{Context, Result};
use axum::{
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

pub mod routes_api;
pub mod routes_sse;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub state: Arc<AppState>,
    pub config: Arc<Config>,
    pub orchestrator: Arc<Orchestrator>,
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let output_dir = ctx.config.storage.output_dir();

    Router::new()
        .route("/health", get(health_check))
        .nest(
            "/api",
            routes_api::api_routes().merge(routes_sse::sse_routes()),
        )
        // Finished dubs are served directly for the retention window.
        .nest_service("/downloads", ServeDir::new(output_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Start the HTTP server
pub async fn start_server(
    config: Arc<Config>,
    state: Arc<AppState>,
    media: Arc<Collaborators>,
) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let orchestrator = Arc::new(Orchestrator::new(
        config.clone(),
        state.clone(),
        media,
    ));

    let ctx = AppContext {
        state,
        config,
        orchestrator,
    };

    let app = create_router(ctx);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

//! algoviz server: HTTP API plus WebSocket and SSE step streams.

mod routes;
mod sse;
mod state;
mod ws;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use axum::Router;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use clap::Parser;
use tower_http::cors::{AllowHeaders, Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{info, warn};

use algoviz::io::config::{AppConfig, ServerConfig, load_config};
use algoviz::logging;

use crate::state::AppState;

#[derive(Parser)]
#[command(name = "algoviz-server")]
#[command(about = "Run algorithms and stream every step to connected clients")]
struct Args {
    /// TOML config file; defaults apply when it does not exist
    #[arg(long, default_value = "algoviz.toml")]
    config: PathBuf,

    /// Address to bind the server to
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Deployment label (development, production, ...)
    #[arg(long, env = "ENVIRONMENT")]
    environment: Option<String>,

    /// Enable debug logging
    #[arg(long, env = "DEBUG")]
    debug: Option<bool>,

    /// Directory containing built UI static files
    #[arg(long)]
    ui_dir: Option<PathBuf>,
}

impl Args {
    /// Command-line and environment values win over the config file.
    fn apply(&self, config: &mut AppConfig) {
        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(environment) = &self.environment {
            config.server.environment = environment.clone();
        }
        if let Some(debug) = self.debug {
            config.server.debug = debug;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config(&args.config)
        .with_context(|| format!("load config {}", args.config.display()))?;
    args.apply(&mut config);
    config.validate()?;

    logging::init(logging::default_directive(config.server.debug));
    info!(
        environment = %config.server.environment,
        max_concurrent = config.executions.max_concurrent,
        timeout_secs = config.executions.timeout_secs,
        "starting algoviz-server"
    );

    let state = AppState::new(&config);
    info!(algorithms = state.registry.len(), "registry loaded");

    let mut app = Router::new()
        .nest("/api/v1", routes::api_router())
        .route("/ws", get(ws::ws_handler))
        .route("/events", get(sse::events_handler))
        .layer(cors_layer(&config.server)?)
        .with_state(state);

    if let Some(ui_dir) = args.ui_dir {
        if ui_dir.exists() {
            info!(ui_dir = %ui_dir.display(), "serving static UI files");
            app = app
                .fallback_service(ServeDir::new(ui_dir).append_index_html_on_directories(true));
        } else {
            warn!(ui_dir = %ui_dir.display(), "UI directory not found, API-only mode");
        }
    }

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port)
        .parse()
        .context("parse listen address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!(addr = %addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

/// CORS for the configured origins. `*` allows any origin, without credentials.
fn cors_layer(server: &ServerConfig) -> Result<CorsLayer> {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];
    if server.allowed_origins.iter().any(|origin| origin == "*") {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any));
    }

    let origins = server
        .allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("invalid CORS origin {origin}"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

//! PDF Joiner Web - Web server for combining PDF documents into one.

mod helpers;
mod routes;
mod state;
mod templates;

use anyhow::{Context, Result};
use axum::http::{HeaderValue, header};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};
use clap::Parser;
use pdf_joiner_core::AppConfig;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir,
    set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use state::AppState;

/// Resolve the static files directory.
///
/// Priority:
/// 1. Explicit path if provided
/// 2. ./static if it exists
/// 3. Crate's built-in static directory
fn resolve_static_dir(explicit_path: Option<&str>) -> PathBuf {
    if let Some(path) = explicit_path {
        return PathBuf::from(path);
    }

    let local_static = PathBuf::from("static");
    if local_static.is_dir() {
        return local_static;
    }

    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/static"))
}

#[derive(Parser, Debug)]
#[command(name = "pdf-joiner-web")]
#[command(author, version, about = "PDF Joiner Web Server", long_about = None)]
struct Args {
    /// Host to bind to (overrides config)
    #[arg(long, env = "PDF_JOINER_HOST")]
    host: Option<String>,

    /// Port to bind to (overrides config)
    #[arg(short, long, env = "PDF_JOINER_PORT")]
    port: Option<u16>,

    /// Config file (defaults to ~/.config/pdf-joiner/config.toml or ./config.toml)
    #[arg(short, long, env = "PDF_JOINER_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Static files directory (defaults to ./static or crate's static dir)
    #[arg(long, env = "STATIC_DIR")]
    static_dir: Option<String>,
}

/// Build the application router.
fn build_router(state: Arc<AppState>, static_dir: &Path) -> Router {
    let body_limit = state.config.server.max_upload_bytes();

    Router::new()
        // Pages
        .route("/", get(routes::index))
        .route("/join/{session_id}", get(routes::join_page))
        // API endpoints - HTML fragments (HTMX) and JSON
        .route("/api/sessions", post(routes::start_session))
        .route("/api/list/{session_id}", get(routes::file_list))
        .route(
            "/api/files/{session_id}",
            post(routes::add_files).get(routes::list_files),
        )
        .route("/api/files/{session_id}/{file_id}", delete(routes::remove_file))
        .route("/api/order/{session_id}", post(routes::reorder_files))
        // API endpoints - binary responses
        .route("/api/merge", post(routes::merge_request))
        .route("/api/merge/{session_id}", post(routes::merge_session))
        // Static files with Cache-Control: no-cache (cache but always revalidate via ETag)
        .nest_service(
            "/static",
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::CACHE_CONTROL,
                    HeaderValue::from_static("no-cache"),
                ))
                .service(ServeDir::new(static_dir)),
        )
        // Middleware
        // HTML fragments must not be served from bfcache after an HTMX swap
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, max-age=0"),
        ))
        .layer(CompressionLayer::new())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    // lopdf reports recoverable parse problems at warn level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{default_level},lopdf=error")));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AppConfig::load(),
    };
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid listen address")?;
    let cleanup_interval = Duration::from_secs(config.session.cleanup_interval_seconds.max(1));

    let state = Arc::new(AppState::new(config));

    // Spawn background task for idle session cleanup
    let cleanup_state = Arc::clone(&state);
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(cleanup_interval).await;
            let removed = cleanup_state.cleanup_idle_sessions().await;
            let remaining = cleanup_state.session_count().await;
            debug!(
                "Session cleanup removed {} sessions, {} active",
                removed, remaining
            );
        }
    });

    let static_dir = resolve_static_dir(args.static_dir.as_deref());
    let app = build_router(state, &static_dir);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

//! Contract Auditor Server
//!
//! Serves the browser UI and a small REST API around the analysis
//! pipeline:
//!
//! - Document upload and analysis (PDF, DOCX, TXT)
//! - PDF report rendering through the Typst report engine
//! - Append-only JSON Lines audit log of every analysis

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use analysis_engine::AnalysisEngine;
use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use shared_types::{AuditSink, JsonlAuditLog};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod error;

use api::{handle_analyze, handle_audit, handle_health, handle_index, handle_report};

/// Command-line arguments for the auditor server
#[derive(Parser, Debug)]
#[command(name = "auditor-server")]
#[command(about = "Contract auditor: clause, entity and risk analysis with PDF reports")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "3000", env = "AUDITOR_PORT")]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0", env = "AUDITOR_HOST")]
    host: String,

    /// Audit log file (JSON Lines)
    #[arg(long, default_value = "audit_logs/audit.jsonl", env = "AUDITOR_AUDIT_LOG")]
    audit_log: PathBuf,

    /// Rule file replacing the built-in rule tables
    #[arg(long, env = "AUDITOR_RULES")]
    rules: Option<PathBuf>,

    /// Report render timeout in milliseconds
    #[arg(long, default_value = "10000", env = "AUDITOR_TIMEOUT_MS")]
    timeout_ms: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Compiled rule tables, shared read-only
    pub engine: Arc<AnalysisEngine>,
    pub audit: Arc<dyn AuditSink>,
    /// Report render timeout in milliseconds
    pub timeout_ms: u64,
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_index))
        .route("/health", get(handle_health))
        .route("/api/analyze", post(handle_analyze))
        .route("/api/report", post(handle_report))
        .route("/api/audit", get(handle_audit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::disable()),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting contract auditor on {}:{}", args.host, args.port);

    let engine = match &args.rules {
        Some(path) => AnalysisEngine::from_rules_file(path)
            .with_context(|| format!("loading rules from {}", path.display()))?,
        None => AnalysisEngine::with_default_rules().context("loading built-in rules")?,
    };

    let audit = JsonlAuditLog::open(&args.audit_log)
        .with_context(|| format!("opening audit log {}", args.audit_log.display()))?;

    let state = AppState {
        engine: Arc::new(engine),
        audit: Arc::new(audit),
        timeout_ms: args.timeout_ms,
    };

    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Audit log: {}", args.audit_log.display());
    info!("Render timeout: {}ms", args.timeout_ms);

    axum::serve(listener, app).await?;

    Ok(())
}

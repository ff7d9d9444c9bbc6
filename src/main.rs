//! Diagram Chat - requirements to PlantUML diagrams
//!
//! Turns an uploaded requirements document into a PlantUML diagram via a
//! hosted completion endpoint, then refines it through chat.

mod api;
mod config;
mod diagram;
mod document;
mod flagging;
mod llm;
mod prompts;
mod runtime;
mod state_machine;

use api::{create_router, AppState};
use config::AppConfig;
use diagram::PlantUmlServerRenderer;
use flagging::FlagLog;
use llm::{EndpointService, LoggingService};
use runtime::SessionManager;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "diagram_chat=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = AppConfig::from_env();

    // Missing credentials only surface when a request is made
    if config.endpoint.url.is_none() {
        tracing::warn!("COMPLETION_ENDPOINT is not set; diagram generation will fail until it is configured.");
    }
    if config.endpoint.api_key.is_none() {
        tracing::warn!("COMPLETION_API_KEY is not set; requests will be sent without a usable key.");
    }

    let completion = Arc::new(LoggingService::new(Arc::new(EndpointService::new(
        &config.endpoint,
    )?)));
    let renderer = Arc::new(PlantUmlServerRenderer::new(
        &config.plantuml_server,
        config.request_timeout,
    )?);
    tracing::info!(
        endpoint = config.endpoint.url.as_deref().unwrap_or("<unset>"),
        plantuml_server = %config.plantuml_server,
        timeout_secs = config.request_timeout.as_secs(),
        keywords = ?config.policy.keywords,
        "Services initialized"
    );

    let sessions = Arc::new(SessionManager::new(
        completion,
        renderer,
        config.policy.clone(),
        config.request_timeout,
    ));
    let sweep_period = config.session_idle_timeout.min(Duration::from_secs(60));
    let _sweeper = sessions.spawn_idle_sweeper(config.session_idle_timeout, sweep_period);

    let flags = FlagLog::new(&config.flagging_dir);
    tracing::info!(
        idle_timeout_secs = config.session_idle_timeout.as_secs(),
        flag_log = %flags.path().display(),
        "Session housekeeping configured"
    );
    let state = AppState::new(sessions, flags);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Diagram chat server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

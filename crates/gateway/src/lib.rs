//! HTTP gateway for Parlor.
//!
//! Exposes the chat API, a health check, the personality listing and the
//! embedded chat page.
//!
//! Built on Axum for high performance async HTTP.

pub mod api;
pub mod auth;
pub mod error;
pub mod frontend;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
};
use parlor_chat::ConversationOrchestrator;
use parlor_config::GatewayConfig;
use parlor_core::identity::IdentityVerifier;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Maximum accepted request body.
pub const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub orchestrator: Arc<ConversationOrchestrator>,
    pub verifier: Arc<dyn IdentityVerifier>,
}

impl GatewayState {
    pub fn new(
        orchestrator: Arc<ConversationOrchestrator>,
        verifier: Arc<dyn IdentityVerifier>,
    ) -> Self {
        Self {
            orchestrator,
            verifier,
        }
    }
}

pub type SharedState = Arc<GatewayState>;

/// Build the full router.
///
/// Layers applied:
/// - Bearer token authentication on the chat routes
/// - CORS (configured origins, any origin when none are listed)
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(state: SharedState, config: &GatewayConfig) -> Router {
    let protected = api::protected_router().route_layer(middleware::from_fn_with_state(
        state.clone(),
        auth::auth_middleware,
    ));

    let mut app = Router::new()
        .merge(protected)
        .merge(api::public_router())
        .with_state(state);

    if config.serve_frontend {
        app = app.merge(frontend::frontend_router());
    }

    app.layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Start the gateway HTTP server and run until Ctrl-C.
pub async fn start(
    config: &GatewayConfig,
    state: SharedState,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.host, config.port);
    let app = build_router(state.clone(), config);

    info!(
        addr = %addr,
        provider = state.orchestrator.provider_name(),
        store = state.orchestrator.store_name(),
        verifier = state.verifier.name(),
        "Gateway starting"
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

//! `parlor serve` — Start the HTTP server.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use parlor_chat::ConversationOrchestrator;
use parlor_gateway::GatewayState;

pub async fn run(config_path: Option<&Path>, port_override: Option<u16>) -> anyhow::Result<()> {
    let mut config = super::load_config(config_path).context("Failed to load config")?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    config
        .require_credentials()
        .context("Refusing to start")?;

    let verifier =
        parlor_auth::build_from_config(&config.auth).context("Failed to set up authentication")?;
    let provider = parlor_providers::build_from_config(&config.provider);
    let store = parlor_store::open_from_config(&config)
        .await
        .context("Failed to open conversation store")?;

    let orchestrator = Arc::new(ConversationOrchestrator::from_config(
        provider, store, &config,
    ));
    let state = Arc::new(GatewayState::new(orchestrator, verifier));

    println!("Parlor");
    println!("   Listening: http://{}:{}", config.gateway.host, config.gateway.port);
    println!("   Provider:  {} ({})", config.provider.kind, config.provider.model);
    println!("   Store:     {}", config.store.backend);
    println!("   Auth:      {}", config.auth.mode);

    parlor_gateway::start(&config.gateway, state)
        .await
        .map_err(|e| anyhow!("Gateway failed: {e}"))?;

    Ok(())
}

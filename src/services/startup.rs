//! Initial catalogue load
//!
//! Startup is the one place where fetch and build failures are fatal: there
//! is no previous registry to fall back to.

use crate::config::Config;
use crate::error::{ConfigError, InvokeError, StartupError};
use crate::mcp::registry::ToolRegistryBuilder;
use crate::services::reload_coordinator::ReloadCoordinator;
use crate::services::spec_fetcher::{SpecFetcher, SpecSource};
use crate::services::upstream_executor::UpstreamExecutor;
use crate::services::version_monitor::VersionMonitor;
use crate::ServerState;
use std::sync::Arc;

/// Everything the binary needs to serve and keep the catalogue live
pub struct Services {
    pub state: Arc<ServerState>,
    pub coordinator: Arc<ReloadCoordinator>,
    pub monitor: Arc<VersionMonitor>,
}

/// Loads the first catalogue from the configured upstream
///
/// # Errors
///
/// * `StartupError::Config` - configuration failed validation
/// * `StartupError::Transport` - the upstream HTTP client could not be created
/// * `StartupError::Fetch` - the description could not be fetched or is invalid
/// * `StartupError::Build` - the description could not be turned into tools
pub async fn bootstrap(config: Config) -> Result<Services, StartupError> {
    config.validate()?;
    let source: Arc<dyn SpecSource> = Arc::new(SpecFetcher::from_config(&config));
    bootstrap_with_source(config, source).await
}

pub async fn bootstrap_with_source(
    config: Config,
    source: Arc<dyn SpecSource>,
) -> Result<Services, StartupError> {
    tracing::info!("Initializing MCP server from {}", config.upstream_base_url);

    let description = source.fetch_description().await.map_err(|e| {
        tracing::error!(
            "Failed to load OpenAPI spec. Make sure the upstream API is running at {}",
            config.upstream_base_url
        );
        StartupError::Fetch(e)
    })?;

    // Without a version the first successful poll triggers a reload
    let version = match source.fetch_version().await {
        Ok(token) => {
            tracing::info!(version = %token, "Upstream API version: {}", token);
            Some(token)
        }
        Err(e) => {
            tracing::warn!(failure_kind = e.kind(), "Failed to fetch API version: {}", e);
            None
        }
    };

    let executor = UpstreamExecutor::from_config(&config).map_err(|e| match e {
        InvokeError::Request(source) => StartupError::Transport(source),
        _ => StartupError::Config(ConfigError::InvalidToken),
    })?;
    tracing::info!("Created persistent HTTP client for {}", executor.base_url());

    let builder = ToolRegistryBuilder::new(executor);
    let registry = builder.spawn_build(description, version.clone(), 0).await?;
    tracing::info!(
        tools = registry.tool_count(),
        "Loaded {} endpoints",
        registry.endpoint_count()
    );

    let interval = config.poll_interval();
    let state = Arc::new(ServerState::new(config, registry, version));
    let coordinator = Arc::new(ReloadCoordinator::new(
        state.clone(),
        source.clone(),
        builder,
    ));
    let monitor = Arc::new(VersionMonitor::new(
        state.clone(),
        source,
        coordinator.clone(),
        interval,
    ));

    Ok(Services {
        state,
        coordinator,
        monitor,
    })
}

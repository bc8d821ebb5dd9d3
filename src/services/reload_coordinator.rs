//! Catalogue reload orchestration
//!
//! A reload runs fetch → sanitize → build without holding any lock, then
//! publishes under a short synchronous critical section:
//!
//! ```text
//!   fetch_description()  ──┐
//!   (network, 10s max)     │  no lock held
//!   build registry       ──┘  (blocking pool)
//!          │
//!          ▼
//!   ┌───────────────────────────────┐
//!   │ publish gate (std Mutex)      │
//!   │  - swap current registry      │
//!   │  - store version token        │
//!   │  - mark sessions stale        │
//!   └───────────────────────────────┘
//! ```
//!
//! Any failure before the publish gate aborts the reload and leaves the
//! current registry and version untouched.

use crate::mcp::registry::{ToolRegistry, ToolRegistryBuilder};
use crate::models::VersionToken;
use crate::services::spec_fetcher::SpecSource;
use crate::ServerState;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

pub struct ReloadCoordinator {
    state: Arc<ServerState>,
    source: Arc<dyn SpecSource>,
    builder: ToolRegistryBuilder,
    next_generation: AtomicU64,
    /// Generation of the most recently published registry
    publish_gate: Mutex<u64>,
}

impl ReloadCoordinator {
    pub fn new(
        state: Arc<ServerState>,
        source: Arc<dyn SpecSource>,
        builder: ToolRegistryBuilder,
    ) -> Self {
        let published = state.current_registry().generation();
        Self {
            state,
            source,
            builder,
            next_generation: AtomicU64::new(published + 1),
            publish_gate: Mutex::new(published),
        }
    }

    pub fn state(&self) -> &Arc<ServerState> {
        &self.state
    }

    /// Rebuilds the catalogue for `version` and publishes it
    ///
    /// Returns `true` when a new registry was published. Failures are logged
    /// and reported as `false`; they never propagate.
    pub async fn reload(&self, version: VersionToken) -> bool {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        tracing::info!(
            version = %version,
            generation,
            "Reloading MCP server with updated OpenAPI spec..."
        );

        let description = match self.source.fetch_description().await {
            Ok(description) => description,
            Err(e) => {
                tracing::error!(
                    failure_kind = e.kind(),
                    "Failed to fetch new OpenAPI spec, keeping current instance: {}",
                    e
                );
                return false;
            }
        };

        let registry = match self
            .builder
            .spawn_build(description, Some(version.clone()), generation)
            .await
        {
            Ok(registry) => registry,
            Err(e) => {
                tracing::error!(
                    "Failed to create new MCP instance, keeping current instance: {}",
                    e
                );
                return false;
            }
        };

        self.publish(registry, version);
        true
    }

    fn publish(&self, registry: ToolRegistry, version: VersionToken) {
        let generation = registry.generation();
        let tools = registry.tool_count();
        let endpoints = registry.endpoint_count();

        let mut last_published = self
            .publish_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if generation < *last_published {
            tracing::warn!(
                generation,
                last_published = *last_published,
                "Publishing a build that started before the current one"
            );
        }
        *last_published = generation;

        let previous = self.state.publish_registry(Arc::new(registry));
        self.state.set_version(version.clone());
        let marked = self.state.sessions().mark_all_stale();
        drop(last_published);

        tracing::info!(
            version = %version,
            previous_generation = previous.generation(),
            generation,
            tools,
            sessions_to_notify = marked,
            "MCP server reloaded successfully! Loaded {} endpoints",
            endpoints
        );
    }
}

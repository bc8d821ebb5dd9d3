pub mod config;
pub mod error;
pub mod mcp;
pub mod models;
pub mod services;

// Make test_utils available for both unit tests and integration tests
pub mod test_utils;

use arc_swap::{ArcSwap, ArcSwapOption};
use config::Config;
use mcp::registry::ToolRegistry;
use models::VersionToken;
use services::session_tracker::SessionTracker;
use std::sync::Arc;

/// Process-wide server state shared by the poll task and request handlers
///
/// The current registry and the last observed upstream version are the only
/// mutable process-wide values. Reads are lock-free pointer loads; writes are
/// single atomic replacements performed by
/// [`services::ReloadCoordinator`] and [`services::VersionMonitor`].
pub struct ServerState {
    config: Config,
    registry: ArcSwap<ToolRegistry>,
    version: ArcSwapOption<VersionToken>,
    sessions: SessionTracker,
}

impl ServerState {
    pub fn new(config: Config, registry: ToolRegistry, version: Option<VersionToken>) -> Self {
        let sessions = SessionTracker::new(config.session_ttl(), config.max_sessions);
        Self {
            config,
            registry: ArcSwap::from_pointee(registry),
            version: ArcSwapOption::new(version.map(Arc::new)),
            sessions,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sessions(&self) -> &SessionTracker {
        &self.sessions
    }

    /// Snapshot of the current registry
    ///
    /// Hold on to the returned `Arc` for the whole request; a concurrent
    /// reload does not affect it.
    pub fn current_registry(&self) -> Arc<ToolRegistry> {
        self.registry.load_full()
    }

    /// Last upstream version observed by a successful version fetch
    pub fn current_version(&self) -> Option<VersionToken> {
        self.version.load_full().map(|token| (*token).clone())
    }

    /// Replaces the current registry, returning the previous one
    pub fn publish_registry(&self, registry: Arc<ToolRegistry>) -> Arc<ToolRegistry> {
        self.registry.swap(registry)
    }

    pub fn set_version(&self, token: VersionToken) {
        self.version.store(Some(Arc::new(token)));
    }
}

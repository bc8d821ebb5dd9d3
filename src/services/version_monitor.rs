//! Background upstream version polling
//!
//! [`VersionMonitor`] is a two-phase state machine: `Idle` while waiting for
//! the next tick, `Checking` while a version fetch (and possibly a reload)
//! is in flight. It is the only task that triggers reloads.
//!
//! Tokens are opaque and compared for equality only; there is no notion of
//! a newer or older version.

use crate::services::reload_coordinator::ReloadCoordinator;
use crate::services::spec_fetcher::SpecSource;
use crate::ServerState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorPhase {
    Idle,
    Checking,
}

/// Result of one poll iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Observed token equals the published one
    Unchanged,
    /// Token differed and the new catalogue was published
    Reloaded,
    /// Token differed but the reload failed; retried next tick
    ReloadFailed,
    /// Version could not be fetched; nothing changed
    FetchFailed,
}

pub struct VersionMonitor {
    state: Arc<ServerState>,
    source: Arc<dyn SpecSource>,
    coordinator: Arc<ReloadCoordinator>,
    interval: Duration,
    checking: AtomicBool,
}

impl VersionMonitor {
    pub fn new(
        state: Arc<ServerState>,
        source: Arc<dyn SpecSource>,
        coordinator: Arc<ReloadCoordinator>,
        interval: Duration,
    ) -> Self {
        Self {
            state,
            source,
            coordinator,
            interval,
            checking: AtomicBool::new(false),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn phase(&self) -> MonitorPhase {
        if self.checking.load(Ordering::SeqCst) {
            MonitorPhase::Checking
        } else {
            MonitorPhase::Idle
        }
    }

    /// Runs one Idle → Checking → Idle cycle
    ///
    /// A successful fetch always stores the observed token, whether or not
    /// it differs. A reload is triggered when the token differs from the
    /// previously observed one, or when the current registry was built for
    /// a different token (an earlier reload failed).
    pub async fn check_once(&self) -> CheckOutcome {
        self.checking.store(true, Ordering::SeqCst);
        let outcome = self.check().await;
        self.checking.store(false, Ordering::SeqCst);
        outcome
    }

    async fn check(&self) -> CheckOutcome {
        let token = match self.source.fetch_version().await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(failure_kind = e.kind(), "Failed to fetch API version: {}", e);
                return CheckOutcome::FetchFailed;
            }
        };

        let previous = self.state.current_version();
        let registry_version = self.state.current_registry().version().cloned();
        let changed = previous.as_ref() != Some(&token);
        let behind = registry_version.as_ref() != Some(&token);

        let outcome = if !changed && !behind {
            tracing::debug!(version = %token, "Version check: API version unchanged");
            CheckOutcome::Unchanged
        } else {
            if changed {
                tracing::info!(
                    "🔄 API version changed: {} → {}",
                    previous.as_ref().map(|v| v.as_str()).unwrap_or("unknown"),
                    token
                );
            } else {
                tracing::warn!(
                    version = %token,
                    "Published catalogue does not match observed version, retrying reload"
                );
            }

            if self.coordinator.reload(token.clone()).await {
                tracing::info!("MCP server hot-reloaded successfully");
                CheckOutcome::Reloaded
            } else {
                tracing::error!("Failed to reload MCP server, continuing with old version");
                CheckOutcome::ReloadFailed
            }
        };

        self.state.set_version(token);
        outcome
    }

    /// Polls until `ct` is cancelled
    ///
    /// Cancellation is only observed between iterations: an in-flight check
    /// runs to completion (or its own timeout) before the loop exits.
    pub async fn run(self: Arc<Self>, ct: CancellationToken) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            "Version check interval: {} seconds",
            self.interval.as_secs()
        );

        loop {
            tokio::select! {
                _ = ct.cancelled() => break,
                _ = ticker.tick() => {}
            }

            self.check_once().await;

            let purged = self.state.sessions().purge_expired();
            if purged > 0 {
                tracing::debug!(purged, "Purged expired sessions");
            }
        }

        tracing::info!("Version monitor stopped");
    }
}

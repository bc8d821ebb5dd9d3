pub mod reload_coordinator;
pub mod schema_sanitizer;
pub mod session_tracker;
pub mod spec_fetcher;
pub mod startup;
pub mod tool_generator;
pub mod upstream_executor;
pub mod version_monitor;

pub use reload_coordinator::ReloadCoordinator;
pub use session_tracker::{InteractionOutcome, SessionTracker, ToolListNotifier};
pub use spec_fetcher::{SpecFetcher, SpecSource};
pub use startup::{bootstrap, bootstrap_with_source, Services};
pub use tool_generator::ToolGenerator;
pub use upstream_executor::{ExecutionResult, UpstreamExecutor};
pub use version_monitor::{CheckOutcome, MonitorPhase, VersionMonitor};

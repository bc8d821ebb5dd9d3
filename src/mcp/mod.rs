//! MCP protocol surface and the live tool catalogue
//!
//! # Architecture
//!
//! - [`ToolRegistry`] - Immutable snapshot of one catalogue build
//! - [`CatalogueService`] - rmcp `ServerHandler` answering `tools/list` and
//!   `tools/call` from the current snapshot
//! - [`build_router`] - axum router mounting the Streamable HTTP transport
//!   at `/mcp` plus the registry's plain-text routes
//! - [`proxy`] - STDIO bridge forwarding to a running server
//!
//! # Example
//!
//! ```rust,no_run
//! use specmcp::config::Config;
//! use specmcp::mcp::build_router;
//! use specmcp::services::bootstrap;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let services = bootstrap(Config::for_upstream("http://localhost:8000")).await?;
//! let app = build_router(services.state.clone());
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod http_transport;
pub mod proxy;
pub mod registry;
pub mod service;

pub use http_transport::{build_router, MCP_PATH};
pub use registry::{CustomRoute, GeneratedTool, ToolRegistry, ToolRegistryBuilder, HEALTH_PATH};
pub use service::CatalogueService;

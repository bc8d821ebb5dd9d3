//! HTTP surface of the server
//!
//! # URL Structure
//!
//! - `POST|GET|DELETE /mcp` - MCP Streamable HTTP transport (rmcp)
//! - `GET /health` - plain-text liveness check, answered with `OK`
//!
//! Plain-text routes come from the current registry rather than from the
//! router itself, so they follow the catalogue across reloads without the
//! router being rebuilt.

use crate::mcp::service::CatalogueService;
use crate::ServerState;
use axum::{
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub const MCP_PATH: &str = "/mcp";

/// Builds the application router for `state`
pub fn build_router(state: Arc<ServerState>) -> Router {
    let factory_state = state.clone();
    let mcp_service = StreamableHttpService::new(
        move || Ok(CatalogueService::new(factory_state.clone())),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig::default(),
    );

    Router::new()
        .nest_service(MCP_PATH, mcp_service)
        .fallback(custom_route_handler)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// Serves the registry's custom routes, 404 for anything else
async fn custom_route_handler(
    State(state): State<Arc<ServerState>>,
    method: Method,
    uri: Uri,
) -> Response {
    let registry = state.current_registry();
    match registry.custom_route(&method, uri.path()) {
        Some(route) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            route.body,
        )
            .into_response(),
        None => {
            tracing::debug!(method = %method, path = uri.path(), "No route");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

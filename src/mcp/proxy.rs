//! STDIO bridge to a remote catalogue
//!
//! Desktop clients that only speak stdio launch the `proxy` binary. It
//! serves MCP on stdin/stdout with [`ProxyService`] and forwards tool
//! requests to a running server over Streamable HTTP. When the remote
//! server announces `notifications/tools/list_changed`, [`RemoteListener`]
//! relays it to the local client.
//!
//! # Example
//!
//! ```rust,no_run
//! use rmcp::ServiceExt;
//! use specmcp::mcp::proxy::{connect, ProxyService, RemoteListener};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let listener = RemoteListener::default();
//! let remote = connect("http://localhost:8080/mcp", listener.clone()).await?;
//! let local = ProxyService::new(remote.peer().clone())
//!     .serve(rmcp::transport::stdio())
//!     .await?;
//! listener.attach(local.peer().clone());
//! local.waiting().await?;
//! # Ok(())
//! # }
//! ```

use crate::error::ProxyError;
use rmcp::handler::server::ServerHandler;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, ListToolsResult, PaginatedRequestParam, ServerInfo,
};
use rmcp::service::{
    NotificationContext, Peer, RequestContext, RoleClient, RoleServer, RunningService,
    ServiceError,
};
use rmcp::transport::StreamableHttpClientTransport;
use rmcp::{ClientHandler, ErrorData, ServiceExt};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Client half of the bridge
///
/// Clones share the downstream peer, so the handler can be handed to the
/// remote connection before the local client has attached.
#[derive(Clone, Default)]
pub struct RemoteListener {
    downstream: Arc<OnceCell<Peer<RoleServer>>>,
}

impl RemoteListener {
    /// Sets the local client that receives relayed notifications
    pub fn attach(&self, peer: Peer<RoleServer>) {
        if self.downstream.set(peer).is_err() {
            tracing::warn!("Local client already attached; keeping the first one");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.downstream.initialized()
    }
}

impl ClientHandler for RemoteListener {
    async fn on_tool_list_changed(&self, _context: NotificationContext<RoleClient>) {
        let Some(peer) = self.downstream.get() else {
            tracing::debug!("Tool list changed before a local client attached");
            return;
        };

        match peer.notify_tool_list_changed().await {
            Ok(()) => tracing::info!("Relayed tool list change to local client"),
            Err(e) => tracing::warn!("Failed to relay tool list change: {}", e),
        }
    }
}

pub type RemoteCatalogue = RunningService<RoleClient, RemoteListener>;

/// Opens an MCP session with the remote server at `url`
pub async fn connect(url: &str, listener: RemoteListener) -> Result<RemoteCatalogue, ProxyError> {
    let transport = StreamableHttpClientTransport::from_uri(url.to_string());
    listener
        .serve(transport)
        .await
        .map_err(|e| ProxyError::Connect {
            url: url.to_string(),
            reason: e.to_string(),
        })
}

/// Server half of the bridge, answering from the remote catalogue
#[derive(Clone)]
pub struct ProxyService {
    remote: Peer<RoleClient>,
}

impl ProxyService {
    pub fn new(remote: Peer<RoleClient>) -> Self {
        Self { remote }
    }
}

impl ServerHandler for ProxyService {
    fn get_info(&self) -> ServerInfo {
        self.remote.peer_info().cloned().unwrap_or_default()
    }

    async fn list_tools(
        &self,
        request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        self.remote.list_tools(request).await.map_err(forward_error)
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        tracing::debug!(tool = %request.name, "Forwarding tool call");
        self.remote.call_tool(request).await.map_err(forward_error)
    }
}

/// Remote protocol errors pass through; anything else is the bridge failing
fn forward_error(error: ServiceError) -> ErrorData {
    match error {
        ServiceError::McpError(error) => error,
        other => {
            tracing::warn!("Remote request failed: {}", other);
            ErrorData::internal_error(format!("Remote server unavailable: {}", other), None)
        }
    }
}

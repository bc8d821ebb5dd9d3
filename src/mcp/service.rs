//! MCP ServerHandler backed by the live tool registry
//!
//! The Streamable HTTP transport creates one [`CatalogueService`] per MCP
//! session, so each handler carries its own session id. Every request,
//! including those for capabilities the catalogue does not offer:
//!
//! 1. records the interaction with the [`SessionTracker`], which pushes
//!    `notifications/tools/list_changed` if a reload happened since the
//!    session's last request
//! 2. loads one registry snapshot and answers from it alone
//!
//! [`SessionTracker`]: crate::services::SessionTracker

use crate::ServerState;
use rmcp::handler::server::ServerHandler;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, CompleteRequestParam, CompleteResult,
    GetPromptRequestMethod, GetPromptRequestParam, GetPromptResult, Implementation,
    InitializeRequestParam, InitializeResult, ListPromptsResult, ListResourceTemplatesResult,
    ListResourcesResult, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
    ReadResourceRequestMethod, ReadResourceRequestParam, ReadResourceResult, ServerCapabilities,
    ServerInfo, SetLevelRequestMethod, SetLevelRequestParam, SubscribeRequestMethod,
    SubscribeRequestParam, UnsubscribeRequestMethod, UnsubscribeRequestParam,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::ErrorData;
use std::sync::Arc;

#[derive(Clone)]
pub struct CatalogueService {
    state: Arc<ServerState>,
    session_id: String,
}

impl CatalogueService {
    pub fn new(state: Arc<ServerState>) -> Self {
        Self::with_session_id(state, uuid::Uuid::new_v4().to_string())
    }

    pub fn with_session_id(state: Arc<ServerState>, session_id: impl Into<String>) -> Self {
        Self {
            state,
            session_id: session_id.into(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn track(&self, context: &RequestContext<RoleServer>) {
        self.state
            .sessions()
            .on_interaction(&self.session_id, &context.peer)
            .await;
    }
}

impl ServerHandler for CatalogueService {
    fn get_info(&self) -> ServerInfo {
        let registry = self.state.current_registry();
        let config = self.state.config();

        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_tool_list_changed()
                .build(),
            server_info: Implementation {
                name: config.server_name.clone(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: registry.title().map(str::to_string),
                website_url: None,
                icons: None,
            },
            instructions: Some(format!(
                "Tools mirror the operations of the REST API at {}",
                config.upstream_base_url
            )),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        self.track(&context).await;

        let registry = self.state.current_registry();
        tracing::debug!(
            session = %self.session_id,
            generation = registry.generation(),
            tools = registry.tool_count(),
            "Listing tools"
        );
        Ok(ListToolsResult::with_all_items(registry.list_tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.track(&context).await;

        let registry = self.state.current_registry();
        tracing::info!(
            session = %self.session_id,
            tool = %request.name,
            generation = registry.generation(),
            "Calling tool"
        );

        registry
            .invoke(&request.name, request.arguments)
            .await
            .map_err(|e| {
                tracing::warn!(tool = %request.name, "Tool invocation failed: {}", e);
                ErrorData::from(e)
            })
    }

    async fn initialize(
        &self,
        request: InitializeRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<InitializeResult, ErrorData> {
        if context.peer.peer_info().is_none() {
            context.peer.set_peer_info(request);
        }
        self.track(&context).await;
        Ok(self.get_info())
    }

    async fn ping(&self, context: RequestContext<RoleServer>) -> Result<(), ErrorData> {
        self.track(&context).await;
        Ok(())
    }

    async fn complete(
        &self,
        _request: CompleteRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<CompleteResult, ErrorData> {
        self.track(&context).await;
        Ok(CompleteResult::default())
    }

    async fn set_level(
        &self,
        _request: SetLevelRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<(), ErrorData> {
        self.track(&context).await;
        Err(ErrorData::method_not_found::<SetLevelRequestMethod>())
    }

    async fn get_prompt(
        &self,
        _request: GetPromptRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, ErrorData> {
        self.track(&context).await;
        Err(ErrorData::method_not_found::<GetPromptRequestMethod>())
    }

    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, ErrorData> {
        self.track(&context).await;
        Ok(ListPromptsResult::default())
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, ErrorData> {
        self.track(&context).await;
        Ok(ListResourcesResult::default())
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParam>,
        context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, ErrorData> {
        self.track(&context).await;
        Ok(ListResourceTemplatesResult::default())
    }

    async fn read_resource(
        &self,
        _request: ReadResourceRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, ErrorData> {
        self.track(&context).await;
        Err(ErrorData::method_not_found::<ReadResourceRequestMethod>())
    }

    async fn subscribe(
        &self,
        _request: SubscribeRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<(), ErrorData> {
        self.track(&context).await;
        Err(ErrorData::method_not_found::<SubscribeRequestMethod>())
    }

    async fn unsubscribe(
        &self,
        _request: UnsubscribeRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<(), ErrorData> {
        self.track(&context).await;
        Err(ErrorData::method_not_found::<UnsubscribeRequestMethod>())
    }
}

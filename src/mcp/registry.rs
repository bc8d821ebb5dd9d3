//! Immutable tool registry snapshots
//!
//! A [`ToolRegistry`] is everything one catalogue build produced: the ordered
//! tool definitions, the operations behind them, the plain-text custom routes,
//! and a handle to the shared upstream transport. Registries are never mutated
//! after [`ToolRegistryBuilder::build`] returns; a reload builds a new one and
//! swaps the pointer held by [`crate::ServerState`].
//!
//! Requests clone the `Arc<ToolRegistry>` once and finish against that
//! snapshot, so a reload mid-request never mixes tools from two builds. The
//! old snapshot is dropped when its last in-flight request completes.

use crate::error::{BuildError, InvokeError};
use crate::models::{Operation, SanitizedDescription, VersionToken};
use crate::services::tool_generator::ToolGenerator;
use crate::services::upstream_executor::UpstreamExecutor;
use rmcp::model::{CallToolResult, Content};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

pub const HEALTH_PATH: &str = "/health";

/// One invocable tool and the upstream operation it replays
#[derive(Debug, Clone)]
pub struct GeneratedTool {
    pub definition: rmcp::model::Tool,
    pub operation: Operation,
}

/// Fixed plain-text endpoint served alongside the MCP transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomRoute {
    pub method: reqwest::Method,
    pub path: String,
    pub body: &'static str,
}

pub struct ToolRegistry {
    tools: Vec<GeneratedTool>,
    index: HashMap<String, usize>,
    custom_routes: Vec<CustomRoute>,
    executor: UpstreamExecutor,
    version: Option<VersionToken>,
    generation: u64,
    endpoint_count: usize,
    title: Option<String>,
}

impl ToolRegistry {
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// Number of paths in the description this registry was built from
    pub fn endpoint_count(&self) -> usize {
        self.endpoint_count
    }

    /// Upstream version this registry was built for, if known
    pub fn version(&self) -> Option<&VersionToken> {
        self.version.as_ref()
    }

    /// Build sequence number; higher means started later
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn tools(&self) -> &[GeneratedTool] {
        &self.tools
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools
            .iter()
            .map(|t| t.operation.tool_name.as_str())
            .collect()
    }

    /// Tool definitions in catalogue order, for `tools/list`
    pub fn list_tools(&self) -> Vec<rmcp::model::Tool> {
        self.tools.iter().map(|t| t.definition.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&GeneratedTool> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn custom_routes(&self) -> &[CustomRoute] {
        &self.custom_routes
    }

    pub fn custom_route(&self, method: &reqwest::Method, path: &str) -> Option<&CustomRoute> {
        self.custom_routes
            .iter()
            .find(|route| route.method == *method && route.path == path)
    }

    /// Invokes a tool against the upstream API
    ///
    /// # Errors
    ///
    /// * `InvokeError::UnknownTool` - no tool of that name in this snapshot
    /// * `InvokeError::InvalidArguments` - arguments cannot be mapped onto the request
    /// * `InvokeError::Upstream` - upstream answered with a non-2xx status
    /// * `InvokeError::Request` - network error or timeout
    pub async fn invoke(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> Result<CallToolResult, InvokeError> {
        let tool = self
            .get(name)
            .ok_or_else(|| InvokeError::UnknownTool(name.to_string()))?;
        let arguments = arguments.unwrap_or_default();

        let response = self.executor.execute(&tool.operation, &arguments).await?;

        if response.is_success {
            Ok(CallToolResult::success(vec![Content::text(response.body)]))
        } else {
            tracing::warn!(
                tool = name,
                status = response.status,
                "Upstream rejected tool invocation"
            );
            Err(InvokeError::Upstream {
                status: response.status,
                body: response.body,
            })
        }
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("generation", &self.generation)
            .field("version", &self.version)
            .field("tools", &self.tools.len())
            .field("endpoints", &self.endpoint_count)
            .finish()
    }
}

/// Builds registries bound to one shared upstream transport
#[derive(Clone)]
pub struct ToolRegistryBuilder {
    executor: UpstreamExecutor,
}

impl ToolRegistryBuilder {
    pub fn new(executor: UpstreamExecutor) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &UpstreamExecutor {
        &self.executor
    }

    /// [`Self::build`] on the blocking pool, keeping runtime workers free
    /// while large descriptions are walked
    ///
    /// # Errors
    ///
    /// As [`Self::build`], plus `BuildError::Aborted` if the task panicked.
    pub async fn spawn_build(
        &self,
        description: SanitizedDescription,
        version: Option<VersionToken>,
        generation: u64,
    ) -> Result<ToolRegistry, BuildError> {
        let builder = self.clone();
        tokio::task::spawn_blocking(move || builder.build(&description, version, generation))
            .await
            .map_err(|e| BuildError::Aborted(e.to_string()))?
    }

    /// Materialises one tool per operation in `description`
    ///
    /// The health route is registered on every build regardless of the
    /// description's content.
    ///
    /// # Errors
    ///
    /// Propagates `BuildError` from the tool generator; nothing is published.
    pub fn build(
        &self,
        description: &SanitizedDescription,
        version: Option<VersionToken>,
        generation: u64,
    ) -> Result<ToolRegistry, BuildError> {
        let operations = ToolGenerator::generate(description)?;

        let mut tools = Vec::with_capacity(operations.len());
        let mut index = HashMap::with_capacity(operations.len());
        for operation in operations {
            let definition = rmcp::model::Tool {
                name: operation.tool_name.clone().into(),
                description: operation.description.clone().map(Into::into),
                input_schema: Arc::new(operation.input_schema.clone()),
                annotations: None,
                title: None,
                icons: None,
                output_schema: None,
            };
            index.insert(operation.tool_name.clone(), tools.len());
            tools.push(GeneratedTool {
                definition,
                operation,
            });
        }

        let custom_routes = vec![CustomRoute {
            method: reqwest::Method::GET,
            path: HEALTH_PATH.to_string(),
            body: "OK",
        }];

        Ok(ToolRegistry {
            tools,
            index,
            custom_routes,
            executor: self.executor.clone(),
            version,
            generation,
            endpoint_count: description.endpoint_count(),
            title: description.title().map(str::to_string),
        })
    }
}

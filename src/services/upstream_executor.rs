//! Tool invocation against the upstream REST API
//!
//! [`UpstreamExecutor`] owns the upstream transport: one pooled
//! `reqwest::Client` bound to the base URL and carrying the bearer
//! credential. Registries share it across rebuilds, so a reload never
//! re-establishes connections or re-reads credentials.
//!
//! # Example
//!
//! ```rust,no_run
//! use specmcp::config::Config;
//! use specmcp::services::UpstreamExecutor;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::for_upstream("http://localhost:8000");
//! let executor = UpstreamExecutor::from_config(&config)?;
//! assert_eq!(executor.base_url(), "http://localhost:8000");
//! # Ok(())
//! # }
//! ```

use crate::config::Config;
use crate::error::InvokeError;
use crate::models::{BodyShape, Operation, ParamLocation};
use crate::services::schema_sanitizer::RENAMED_PROPERTIES;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use serde_json::{Map, Value};
use std::time::Duration;

/// Result of executing an upstream request
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// HTTP status code (e.g., 200, 404, 500)
    pub status: u16,
    /// Response body as a string
    pub body: String,
    /// True if status code is 2xx, false otherwise
    pub is_success: bool,
}

/// Shared upstream transport
///
/// Safe to share across threads: the underlying `reqwest::Client` pools
/// connections and is designed for concurrent use. Cloning is cheap.
#[derive(Clone)]
pub struct UpstreamExecutor {
    client: reqwest::Client,
    base_url: String,
}

impl UpstreamExecutor {
    /// Creates the transport with an optional bearer credential
    ///
    /// # Errors
    ///
    /// * `reqwest::Error` - the TLS backend could not be initialised
    /// * `InvokeError::InvalidArguments` - the token is not a valid header value
    pub fn new(
        base_url: impl Into<String>,
        api_token: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, InvokeError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = api_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                InvokeError::InvalidArguments("API token contains invalid characters".to_string())
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, InvokeError> {
        Self::new(
            config.upstream_base_url.clone(),
            config.api_token.as_deref(),
            config.upstream_timeout(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn render_path(
        &self,
        operation: &Operation,
        args: &Map<String, Value>,
    ) -> Result<String, InvokeError> {
        let mut path = operation.path.clone();

        for param in operation.params_in(ParamLocation::Path) {
            let placeholder = format!("{{{}}}", param.name);
            let value = args.get(&param.name).filter(|v| !v.is_null()).ok_or_else(|| {
                InvokeError::InvalidArguments(format!(
                    "missing required path parameter '{}'",
                    param.name
                ))
            })?;
            let encoded = urlencoding::encode(&scalar_to_string(value)).into_owned();
            path = path.replace(&placeholder, &encoded);
        }

        Ok(format!("{}{}", self.base_url, path))
    }

    fn render_query(&self, operation: &Operation, args: &Map<String, Value>) -> Vec<(String, String)> {
        let mut query = Vec::new();

        for param in operation.params_in(ParamLocation::Query) {
            match args.get(&param.name) {
                None | Some(Value::Null) => {}
                Some(Value::Array(items)) => {
                    for item in items {
                        query.push((param.name.clone(), scalar_to_string(item)));
                    }
                }
                Some(value) => query.push((param.name.clone(), scalar_to_string(value))),
            }
        }

        query
    }

    fn render_headers(
        &self,
        operation: &Operation,
        args: &Map<String, Value>,
    ) -> Result<HeaderMap, InvokeError> {
        let mut headers = HeaderMap::new();

        for param in operation.params_in(ParamLocation::Header) {
            let Some(value) = args.get(&param.name).filter(|v| !v.is_null()) else {
                continue;
            };
            let name = HeaderName::from_bytes(param.name.as_bytes()).map_err(|e| {
                InvokeError::InvalidArguments(format!("invalid header '{}': {}", param.name, e))
            })?;
            let value = HeaderValue::from_str(&scalar_to_string(value)).map_err(|e| {
                InvokeError::InvalidArguments(format!("invalid header '{}': {}", param.name, e))
            })?;
            headers.insert(name, value);
        }

        Ok(headers)
    }

    fn render_body(&self, operation: &Operation, args: &Map<String, Value>) -> Option<Value> {
        let shape = operation.body.as_ref()?;
        match shape {
            BodyShape::Whole { .. } => args
                .get("body")
                .filter(|v| !v.is_null())
                .map(|value| restore_wire_names(value, argument_schema(operation, "body"))),
            BodyShape::Flattened {
                properties,
                required,
                ..
            } => {
                let mut body = Map::new();
                for name in properties {
                    // A parameter of the same name claims the argument
                    if operation.param(name).is_some() {
                        continue;
                    }
                    if let Some(value) = args.get(name) {
                        body.insert(
                            shape.wire_name(name).to_string(),
                            restore_wire_names(value, argument_schema(operation, name)),
                        );
                    }
                }
                if body.is_empty() && !required {
                    None
                } else {
                    Some(Value::Object(body))
                }
            }
        }
    }

    /// Executes one operation with the given tool arguments
    ///
    /// # Returns
    ///
    /// * `Ok(ExecutionResult)` - upstream answered, whatever the status
    /// * `Err(InvokeError::InvalidArguments)` - arguments cannot be mapped
    /// * `Err(InvokeError::Request)` - network error or timeout
    pub async fn execute(
        &self,
        operation: &Operation,
        args: &Map<String, Value>,
    ) -> Result<ExecutionResult, InvokeError> {
        let url = self.render_path(operation, args)?;
        let query = self.render_query(operation, args);
        let headers = self.render_headers(operation, args)?;
        let body = self.render_body(operation, args);

        tracing::debug!(
            tool = %operation.tool_name,
            method = %operation.method,
            url = %url,
            "Invoking upstream operation"
        );

        let mut request = self
            .client
            .request(operation.method.clone(), &url)
            .headers(headers);
        if !query.is_empty() {
            request = request.query(&query);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        Ok(ExecutionResult {
            status: status.as_u16(),
            body,
            is_success: status.is_success(),
        })
    }
}

fn argument_schema<'a>(operation: &'a Operation, name: &str) -> Option<&'a Value> {
    operation.input_schema.get("properties")?.get(name)
}

/// Undoes sanitizer renames inside a nested argument value, guided by the
/// rename records in its schema
fn restore_wire_names(value: &Value, schema: Option<&Value>) -> Value {
    let Some(schema) = schema else {
        return value.clone();
    };

    match value {
        Value::Object(map) => {
            let renamed = schema.get(RENAMED_PROPERTIES);
            let properties = schema.get("properties");
            Value::Object(
                map.iter()
                    .map(|(name, child)| {
                        let wire = renamed
                            .and_then(|r| r.get(name))
                            .and_then(Value::as_str)
                            .unwrap_or(name);
                        let child_schema = properties.and_then(|p| p.get(name));
                        (wire.to_string(), restore_wire_names(child, child_schema))
                    })
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| restore_wire_names(item, schema.get("items")))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => value.to_string(),
    }
}

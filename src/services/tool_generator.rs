//! Operation extraction from a sanitized interface description
//!
//! Turns every `paths.{path}.{method}` entry into an [`Operation`]: a tool
//! name, a JSON Schema for its arguments, and enough wire metadata for
//! [`crate::services::upstream_executor::UpstreamExecutor`] to replay a call.
//!
//! # Tool Naming
//!
//! Names are derived from method and path only, so they are stable across
//! reloads as long as the endpoint exists:
//!
//! | Endpoint                          | Tool name                    |
//! |-----------------------------------|------------------------------|
//! | `GET /v1/networks`                | `getV1Networks`              |
//! | `GET /v1/evm/balances/native`     | `getV1EvmBalancesNative`     |
//! | `GET /v1/evm/tokens/{contract}`   | `getV1EvmTokensByContract`   |
//! | `POST /v1/swap-quotes`            | `postV1SwapQuotes`           |
//!
//! # Arguments
//!
//! Path, query and header parameters become top-level properties. A JSON
//! object body with `properties` is flattened next to them; any other body
//! is exposed as a single `body` argument.

use crate::error::BuildError;
use crate::models::{BodyShape, Operation, OperationParam, ParamLocation, SanitizedDescription};
use crate::services::schema_sanitizer::RENAMED_PROPERTIES;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};

// Hardcoded regex pattern - guaranteed to be valid at compile time
#[allow(clippy::unwrap_used)]
static WORD_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9]+").unwrap());

const METHODS: &[&str] = &[
    "get", "put", "post", "delete", "patch", "head", "options", "trace",
];

/// Nested `$ref` hops beyond this are left unresolved
const MAX_REF_DEPTH: usize = 32;

pub struct ToolGenerator;

impl ToolGenerator {
    /// Extracts one operation per path + method pair, in path order
    ///
    /// # Errors
    ///
    /// * `BuildError::InvalidPathItem` - a path entry is not an object
    /// * `BuildError::InvalidOperation` - an operation or parameter is malformed
    /// * `BuildError::DuplicateToolName` - two endpoints map to one tool name
    /// * `BuildError::NoOperations` - no path declares an HTTP method
    pub fn generate(description: &SanitizedDescription) -> Result<Vec<Operation>, BuildError> {
        let root = description.document();
        let paths = match root.get("paths") {
            Some(Value::Object(paths)) => paths,
            _ => return Err(BuildError::NoOperations),
        };

        let mut operations = Vec::new();
        let mut seen: HashMap<String, String> = HashMap::new();

        for (path, item) in paths {
            let item = resolve(root, item);
            let item = item
                .as_object()
                .ok_or_else(|| BuildError::InvalidPathItem(path.clone()))?;

            let shared_params = item
                .get("parameters")
                .map(|params| parse_params(root, params, "*", path))
                .transpose()?
                .unwrap_or_default();

            for method in METHODS {
                let Some(op) = item.get(*method) else {
                    continue;
                };
                let op = op.as_object().ok_or_else(|| BuildError::InvalidOperation {
                    method: method.to_uppercase(),
                    path: path.clone(),
                    reason: "operation is not an object".to_string(),
                })?;

                let operation = build_operation(root, path, method, op, &shared_params)?;
                let endpoint = format!("{} {}", operation.method, path);

                if let Some(first) = seen.insert(operation.tool_name.clone(), endpoint.clone()) {
                    return Err(BuildError::DuplicateToolName {
                        name: operation.tool_name,
                        first,
                        second: endpoint,
                    });
                }
                operations.push(operation);
            }
        }

        if operations.is_empty() {
            return Err(BuildError::NoOperations);
        }

        Ok(operations)
    }
}

/// Deterministic tool name for an endpoint
pub fn tool_name(method: &str, path: &str) -> String {
    let mut name = method.to_ascii_lowercase();

    for segment in path.split('/').filter(|s| !s.is_empty()) {
        let (templated, raw) = match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(inner) => (true, inner),
            None => (false, segment),
        };

        if templated {
            name.push_str("By");
        }
        for word in WORD_SPLIT.split(raw).filter(|w| !w.is_empty()) {
            name.push_str(&upper_first(word));
        }
    }

    name
}

fn upper_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

fn build_operation(
    root: &Value,
    path: &str,
    method: &str,
    op: &Map<String, Value>,
    shared_params: &[OperationParam],
) -> Result<Operation, BuildError> {
    let http_method = reqwest::Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|e| BuildError::InvalidOperation {
            method: method.to_uppercase(),
            path: path.to_string(),
            reason: e.to_string(),
        })?;

    let own_params = op
        .get("parameters")
        .map(|params| parse_params(root, params, method, path))
        .transpose()?
        .unwrap_or_default();

    // Operation-level parameters override path-level ones
    let mut params: Vec<OperationParam> = shared_params
        .iter()
        .filter(|shared| {
            !own_params
                .iter()
                .any(|own| own.name == shared.name && own.location == shared.location)
        })
        .cloned()
        .collect();
    params.extend(own_params);

    let body = op
        .get("requestBody")
        .map(|body| resolve(root, body))
        .and_then(|body| json_body_schema(root, &body));

    let (body_shape, body_properties, body_required) = match body {
        Some((schema, required)) => shape_body(schema, required),
        None => (None, Map::new(), Vec::new()),
    };

    let input_schema = input_schema(&params, body_properties, body_required);

    Ok(Operation {
        tool_name: tool_name(method, path),
        method: http_method,
        path: path.to_string(),
        description: describe(op),
        params,
        body: body_shape,
        input_schema,
    })
}

fn describe(op: &Map<String, Value>) -> Option<String> {
    let parts: Vec<&str> = ["summary", "description"]
        .iter()
        .filter_map(|field| op.get(*field).and_then(Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n\n"))
    }
}

fn parse_params(
    root: &Value,
    params: &Value,
    method: &str,
    path: &str,
) -> Result<Vec<OperationParam>, BuildError> {
    let malformed = |reason: &str| BuildError::InvalidOperation {
        method: method.to_uppercase(),
        path: path.to_string(),
        reason: reason.to_string(),
    };

    let list = params
        .as_array()
        .ok_or_else(|| malformed("'parameters' is not a list"))?;

    let mut out = Vec::with_capacity(list.len());
    for param in list {
        let param = resolve(root, param);
        let name = param
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("parameter without a name"))?;
        let location = param
            .get("in")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("parameter without a location"))?;

        let Some(location) = ParamLocation::parse(location) else {
            tracing::debug!(parameter = name, location, "Skipping unsupported parameter location");
            continue;
        };

        let mut schema = param
            .get("schema")
            .map(|s| resolve(root, s))
            .unwrap_or_else(|| json!({"type": "string"}));
        if let (Some(description), Value::Object(map)) =
            (param.get("description").and_then(Value::as_str), &mut schema)
        {
            map.entry("description")
                .or_insert_with(|| Value::String(description.to_string()));
        }

        out.push(OperationParam {
            name: name.to_string(),
            location,
            // path parameters are always required
            required: location == ParamLocation::Path
                || param.get("required").and_then(Value::as_bool).unwrap_or(false),
            schema,
        });
    }

    Ok(out)
}

fn json_body_schema(root: &Value, body: &Value) -> Option<(Value, bool)> {
    let content = body.get("content")?.as_object()?;
    let media = content
        .get("application/json")
        .or_else(|| {
            content
                .iter()
                .find(|(media_type, _)| media_type.ends_with("+json"))
                .map(|(_, media)| media)
        })?;

    let schema = media
        .get("schema")
        .map(|s| resolve(root, s))
        .unwrap_or_else(|| json!({}));
    let required = body.get("required").and_then(Value::as_bool).unwrap_or(false);
    Some((schema, required))
}

fn shape_body(schema: Value, required: bool) -> (Option<BodyShape>, Map<String, Value>, Vec<String>) {
    if let Some(Value::Object(properties)) = schema.get("properties") {
        let names: Vec<String> = properties.keys().cloned().collect();
        let required_names = if required {
            schema
                .get("required")
                .and_then(Value::as_array)
                .map(|names| {
                    names
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default()
        } else {
            Vec::new()
        };
        let wire_names: BTreeMap<String, String> = schema
            .get(RENAMED_PROPERTIES)
            .and_then(Value::as_object)
            .map(|renamed| {
                renamed
                    .iter()
                    .filter(|(name, _)| properties.contains_key(*name))
                    .filter_map(|(name, wire)| Some((name.clone(), wire.as_str()?.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        return (
            Some(BodyShape::Flattened {
                properties: names,
                required,
                wire_names,
            }),
            properties.clone(),
            required_names,
        );
    }

    let mut whole = Map::new();
    whole.insert("body".to_string(), schema);
    let required_names = if required {
        vec!["body".to_string()]
    } else {
        Vec::new()
    };
    (Some(BodyShape::Whole { required }), whole, required_names)
}

fn input_schema(
    params: &[OperationParam],
    body_properties: Map<String, Value>,
    body_required: Vec<String>,
) -> Map<String, Value> {
    let mut properties = Map::new();
    let mut required: Vec<Value> = Vec::new();

    for (name, schema) in body_properties {
        properties.insert(name, schema);
    }
    for name in body_required {
        required.push(Value::String(name));
    }

    // Parameters win over body properties of the same name
    for param in params {
        properties.insert(param.name.clone(), param.schema.clone());
        if param.required && !required.iter().any(|r| r.as_str() == Some(param.name.as_str())) {
            required.push(Value::String(param.name.clone()));
        }
    }

    let mut schema = Map::new();
    schema.insert("type".to_string(), Value::String("object".to_string()));
    schema.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".to_string(), Value::Array(required));
    }
    schema
}

/// Inlines local `$ref` pointers, leaving unresolvable ones in place
fn resolve(root: &Value, value: &Value) -> Value {
    resolve_in(root, value, &mut Vec::new())
}

/// `chain` holds the refs currently being expanded; meeting one of them
/// again means the schema is recursive and the ref stays as written.
fn resolve_in<'a>(root: &'a Value, value: &'a Value, chain: &mut Vec<&'a str>) -> Value {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get("$ref") {
                if chain.len() >= MAX_REF_DEPTH || chain.contains(&reference.as_str()) {
                    return value.clone();
                }
                let Some(target) = reference
                    .strip_prefix('#')
                    .and_then(|pointer| root.pointer(pointer))
                else {
                    return value.clone();
                };
                chain.push(reference);
                let resolved = resolve_in(root, target, chain);
                chain.pop();
                return resolved;
            }
            Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), resolve_in(root, v, chain)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| resolve_in(root, item, chain))
                .collect(),
        ),
        other => other.clone(),
    }
}

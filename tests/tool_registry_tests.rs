use serde_json::json;
use specmcp::error::BuildError;
use specmcp::mcp::{ToolRegistryBuilder, HEALTH_PATH};
use specmcp::models::{BodyShape, ParamLocation, VersionToken};
use specmcp::services::{ToolGenerator, UpstreamExecutor};
use specmcp::test_utils::test_helpers;
use std::time::Duration;

fn builder() -> ToolRegistryBuilder {
    let executor =
        UpstreamExecutor::new("http://localhost:8000", None, Duration::from_secs(5)).unwrap();
    ToolRegistryBuilder::new(executor)
}

#[test]
fn test_generate_one_tool_per_operation() {
    let description = test_helpers::sanitized(test_helpers::sample_description()).unwrap();

    let operations = ToolGenerator::generate(&description).unwrap();
    let mut names: Vec<&str> = operations.iter().map(|o| o.tool_name.as_str()).collect();
    names.sort();

    assert_eq!(
        names,
        vec!["getV1EvmTokensByContract", "getV1Networks", "postV1Transfers"]
    );
}

#[test]
fn test_path_level_parameters_are_merged() {
    let description = test_helpers::sanitized(test_helpers::sample_description()).unwrap();
    let operations = ToolGenerator::generate(&description).unwrap();

    let token = operations
        .iter()
        .find(|o| o.tool_name == "getV1EvmTokensByContract")
        .unwrap();

    let contract = token.param("contract").unwrap();
    assert_eq!(contract.location, ParamLocation::Path);
    assert!(contract.required);
    assert_eq!(token.params_in(ParamLocation::Query).count(), 2);
    assert_eq!(token.input_schema["required"], json!(["contract"]));
    assert_eq!(token.description.as_deref(), Some("Token metadata"));
}

#[test]
fn test_object_body_is_flattened_with_sanitized_names() {
    let description = test_helpers::sanitized(test_helpers::sample_description()).unwrap();
    let operations = ToolGenerator::generate(&description).unwrap();

    let transfer = operations
        .iter()
        .find(|o| o.tool_name == "postV1Transfers")
        .unwrap();

    assert_eq!(transfer.method, reqwest::Method::POST);
    match &transfer.body {
        Some(BodyShape::Flattened {
            properties,
            required,
            wire_names,
        }) => {
            assert!(*required);
            assert!(properties.contains(&"from_".to_string()));
            assert!(!properties.contains(&"from".to_string()));
            assert_eq!(wire_names.get("from_").map(String::as_str), Some("from"));
            assert_eq!(wire_names.len(), 1);
        }
        other => panic!("expected flattened body, got {:?}", other),
    }

    let properties = transfer.input_schema["properties"].as_object().unwrap();
    assert!(properties.contains_key("from_"));
    assert!(!properties.contains_key("x-renamed-properties"));
    assert!(properties.contains_key("X-Request-Id"));
    let required = transfer.input_schema["required"].as_array().unwrap();
    assert!(required.contains(&json!("from_")));
    assert!(required.contains(&json!("amount")));
}

#[test]
fn test_suffixed_upstream_property_keeps_its_name() {
    let description = test_helpers::sanitized(json!({
        "openapi": "3.1.0",
        "paths": {
            "/v1/items": {
                "post": {
                    "requestBody": {
                        "content": {
                            "application/json": {
                                "schema": {"properties": {"class_": {"type": "string"}}}
                            }
                        }
                    }
                }
            }
        }
    }))
    .unwrap();

    let operations = ToolGenerator::generate(&description).unwrap();
    let body = operations[0].body.as_ref().unwrap();

    assert_eq!(body.wire_name("class_"), "class_");
}

#[test]
fn test_recursive_body_schema_is_generated() {
    let description = test_helpers::sanitized(json!({
        "openapi": "3.1.0",
        "paths": {
            "/v1/trees": {
                "post": {
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": {"$ref": "#/components/schemas/Node"}
                            }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Node": {
                    "type": "object",
                    "properties": {
                        "value": {"type": "integer"},
                        "left": {"$ref": "#/components/schemas/Node"},
                        "right": {"$ref": "#/components/schemas/Node"}
                    }
                }
            }
        }
    }))
    .unwrap();

    let operations = ToolGenerator::generate(&description).unwrap();

    assert_eq!(operations.len(), 1);
    let properties = operations[0].input_schema["properties"].as_object().unwrap();
    assert_eq!(properties["value"], json!({"type": "integer"}));
    assert_eq!(
        properties["left"],
        json!({"$ref": "#/components/schemas/Node"})
    );
    assert_eq!(
        properties["right"],
        json!({"$ref": "#/components/schemas/Node"})
    );
}

#[test]
fn test_non_object_body_is_passed_whole() {
    let description = test_helpers::sanitized(json!({
        "openapi": "3.0.3",
        "paths": {
            "/v1/batch": {
                "put": {
                    "requestBody": {
                        "content": {
                            "application/json": {
                                "schema": {"type": "array", "items": {"type": "string"}}
                            }
                        }
                    }
                }
            }
        }
    }))
    .unwrap();

    let operations = ToolGenerator::generate(&description).unwrap();

    assert_eq!(operations[0].tool_name, "putV1Batch");
    assert_eq!(operations[0].body, Some(BodyShape::Whole { required: false }));
    assert_eq!(
        operations[0].input_schema["properties"]["body"]["type"],
        "array"
    );
    assert!(operations[0].input_schema.get("required").is_none());
}

#[test]
fn test_description_without_operations_fails() {
    let description = test_helpers::sanitized(json!({
        "openapi": "3.1.0",
        "paths": {"/v1/empty": {"summary": "no methods"}}
    }))
    .unwrap();

    let err = ToolGenerator::generate(&description).unwrap_err();

    assert!(matches!(err, BuildError::NoOperations));
}

#[test]
fn test_colliding_tool_names_fail() {
    let description = test_helpers::sanitized(json!({
        "openapi": "3.1.0",
        "paths": {
            "/v1/swap-quotes": {"get": {}},
            "/v1/swap_quotes": {"get": {}}
        }
    }))
    .unwrap();

    let err = ToolGenerator::generate(&description).unwrap_err();

    match err {
        BuildError::DuplicateToolName { name, .. } => assert_eq!(name, "getV1SwapQuotes"),
        other => panic!("expected duplicate name, got {:?}", other),
    }
}

#[test]
fn test_malformed_parameter_fails() {
    let description = test_helpers::sanitized(json!({
        "openapi": "3.1.0",
        "paths": {"/v1/networks": {"get": {"parameters": [{"in": "query"}]}}}
    }))
    .unwrap();

    assert!(matches!(
        ToolGenerator::generate(&description),
        Err(BuildError::InvalidOperation { .. })
    ));
}

#[test]
fn test_build_registry_snapshot() {
    let description = test_helpers::sanitized(test_helpers::sample_description()).unwrap();

    let registry = builder()
        .build(&description, Some(VersionToken::new("1.0.0")), 4)
        .unwrap();

    assert_eq!(registry.tool_count(), 3);
    assert_eq!(registry.endpoint_count(), 3);
    assert_eq!(registry.generation(), 4);
    assert_eq!(registry.version().map(|v| v.as_str()), Some("1.0.0"));
    assert_eq!(registry.title(), Some("Sample Token API"));

    let tool = registry.get("getV1Networks").unwrap();
    assert_eq!(tool.definition.name, "getV1Networks");
    assert_eq!(tool.definition.input_schema["type"], "object");
    assert!(registry.get("getV1Unknown").is_none());

    let listed: Vec<String> = registry
        .list_tools()
        .into_iter()
        .map(|t| t.name.to_string())
        .collect();
    let names: Vec<String> = registry
        .tool_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    assert_eq!(listed, names);
}

#[test]
fn test_health_route_registered_on_every_build() {
    let builder = builder();
    let v1 = test_helpers::sanitized(test_helpers::sample_description()).unwrap();
    let v2 = test_helpers::sanitized(test_helpers::sample_description_v2()).unwrap();

    for description in [&v1, &v2] {
        let registry = builder.build(description, None, 0).unwrap();
        let route = registry
            .custom_route(&reqwest::Method::GET, HEALTH_PATH)
            .unwrap();
        assert_eq!(route.body, "OK");
        assert_eq!(registry.custom_routes().len(), 1);
        assert!(registry
            .custom_route(&reqwest::Method::POST, HEALTH_PATH)
            .is_none());
    }
}

#[tokio::test]
async fn test_spawn_build_runs_on_blocking_pool() {
    let builder = builder();
    let description = test_helpers::sanitized(test_helpers::sample_description_v2()).unwrap();

    let registry = builder
        .spawn_build(description, Some(VersionToken::new("1.1.0")), 2)
        .await
        .unwrap();

    assert_eq!(registry.tool_count(), 4);
    assert_eq!(registry.generation(), 2);

    let empty = test_helpers::sanitized(json!({
        "openapi": "3.1.0",
        "paths": {"/v1/empty": {"summary": "no methods"}}
    }))
    .unwrap();
    let err = builder.spawn_build(empty, None, 3).await.unwrap_err();
    assert!(matches!(err, BuildError::NoOperations));
}

#[tokio::test]
async fn test_invoke_unknown_tool() {
    let description = test_helpers::sanitized(test_helpers::sample_description()).unwrap();
    let registry = builder().build(&description, None, 0).unwrap();

    let err = registry.invoke("getV1Nothing", None).await.unwrap_err();

    assert!(matches!(err, specmcp::error::InvokeError::UnknownTool(_)));
    let data: rmcp::ErrorData = err.into();
    assert_eq!(data.code, rmcp::model::ErrorCode::METHOD_NOT_FOUND);
}

use serde_json::json;
use specmcp::models::InterfaceDescription;
use specmcp::services::schema_sanitizer::{sanitize, sanitize_value, RENAMED_PROPERTIES};

#[test]
fn test_renames_reserved_properties_at_every_depth() {
    let raw = InterfaceDescription::new(json!({
        "openapi": "3.1.0",
        "paths": {
            "/v1/transfers": {
                "post": {
                    "requestBody": {
                        "content": {
                            "application/json": {
                                "schema": {
                                    "type": "object",
                                    "properties": {
                                        "from": {"type": "string"},
                                        "meta": {
                                            "type": "object",
                                            "properties": {
                                                "class": {"type": "string"},
                                                "tags": {
                                                    "type": "array",
                                                    "items": {
                                                        "properties": {"in": {"type": "string"}}
                                                    }
                                                }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }));

    let clean = sanitize(&raw);
    let schema = clean
        .document()
        .pointer("/paths/~1v1~1transfers/post/requestBody/content/application~1json/schema")
        .unwrap();

    assert!(schema.pointer("/properties/from_").is_some());
    assert!(schema.pointer("/properties/from").is_none());
    assert!(schema.pointer("/properties/meta/properties/class_").is_some());
    assert!(schema.pointer("/properties/meta/properties/class").is_none());
    assert!(schema
        .pointer("/properties/meta/properties/tags/items/properties/in_")
        .is_some());
}

#[test]
fn test_input_is_not_mutated() {
    let document = json!({
        "openapi": "3.1.0",
        "paths": {},
        "components": {"schemas": {"Q": {"properties": {"await": {"type": "boolean"}}}}}
    });
    let raw = InterfaceDescription::new(document.clone());

    let clean = sanitize(&raw);

    assert_eq!(raw.document(), &document);
    assert!(clean
        .document()
        .pointer("/components/schemas/Q/properties/await_")
        .is_some());
}

#[test]
fn test_required_list_follows_renamed_properties() {
    let schema = json!({
        "type": "object",
        "required": ["from", "to"],
        "properties": {"from": {"type": "string"}, "to": {"type": "string"}}
    });

    let clean = sanitize_value(&schema);

    assert_eq!(clean["required"], json!(["from_", "to"]));
}

#[test]
fn test_renames_are_recorded_next_to_properties() {
    let schema = json!({
        "properties": {
            "from": {"type": "string"},
            "class_": {"type": "string"},
            "meta": {"properties": {"in": {"type": "string"}}}
        }
    });

    let clean = sanitize_value(&schema);

    // Only names that were actually rewritten are recorded
    assert_eq!(clean[RENAMED_PROPERTIES], json!({"from_": "from"}));
    assert_eq!(
        clean["properties"]["meta"][RENAMED_PROPERTIES],
        json!({"in_": "in"})
    );
}

#[test]
fn test_non_property_keys_are_left_alone() {
    // Parameter names and enum values are not schema property names
    let value = json!({
        "parameters": [{"name": "from", "in": "query"}],
        "schema": {"enum": ["in", "or"]},
        "required": ["from"]
    });

    assert_eq!(sanitize_value(&value), value);
}

#[test]
fn test_renamed_key_wins_over_existing_sibling() {
    let schema = json!({
        "properties": {
            "from": {"type": "string", "description": "reserved"},
            "from_": {"type": "integer"}
        }
    });

    let clean = sanitize_value(&schema);
    let properties = clean["properties"].as_object().unwrap();

    assert_eq!(properties.len(), 1);
    assert_eq!(properties["from_"]["description"], "reserved");
}

#[test]
fn test_description_without_reserved_words_is_unchanged() {
    let document = json!({
        "openapi": "3.1.0",
        "paths": {"/v1/networks": {"get": {"summary": "List"}}},
        "components": {"schemas": {"Net": {"properties": {"id": {"type": "string"}}}}}
    });

    let clean = sanitize(&InterfaceDescription::new(document.clone()));

    assert_eq!(clean.document(), &document);
}

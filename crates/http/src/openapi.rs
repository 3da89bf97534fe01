//! Helpers for writing module OpenAPI fragments as JSON

use serde_json::{json, Value};

/// `$ref` to a schema under `#/components/schemas`
pub fn schema_ref(name: &str) -> Value {
    json!({ "$ref": format!("#/components/schemas/{name}") })
}

pub fn json_response(description: &str, schema: Value) -> Value {
    json!({
        "description": description,
        "content": { "application/json": { "schema": schema } }
    })
}

/// Required JSON request body
pub fn json_body(schema: Value) -> Value {
    json!({
        "required": true,
        "content": { "application/json": { "schema": schema } }
    })
}

/// 400 response carrying the shared error envelope
pub fn validation_response() -> Value {
    json_response("Validation failed", schema_ref("ErrorResponse"))
}

/// Path parameter list for an integer `id`
pub fn id_parameter() -> Value {
    json!([{
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer", "format": "int64" }
    }])
}

//! Instance validation against resolved schema documents.

use serde_json::{json, Map, Value};

use crate::document::SchemaDocument;
use crate::error::{ValidateError, Violation};

/// Validate a JSON instance against a resolved document's root schema.
///
/// The document is first lowered to a plain JSON Schema (see
/// [`to_json_schema`]) so `$ref`s into the components section resolve.
///
/// # Errors
///
/// Returns `ValidateError::InvalidSchema` if the validator rejects the
/// lowered schema, or `ValidateError::Invalid` with every violation found.
pub fn validate(document: &SchemaDocument, instance: &Value) -> Result<(), ValidateError> {
    let schema = to_json_schema(document);
    let validator = jsonschema::validator_for(&schema).map_err(|e| ValidateError::InvalidSchema {
        message: e.to_string(),
    })?;

    let errors: Vec<Violation> = validator
        .iter_errors(instance)
        .map(|e| Violation {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidateError::Invalid { errors })
    }
}

/// Lower a document to a self-contained JSON Schema.
///
/// The root schema keeps its place and the definitions are carried under
/// `components/schemas`, so `#/components/schemas/...` pointers stay valid.
/// OpenAPI 3.0 keywords with different JSON Schema semantics are rewritten:
/// boolean `exclusiveMaximum`/`exclusiveMinimum` become numeric bounds and
/// `nullable: true` adds `"null"` to the type.
pub fn to_json_schema(document: &SchemaDocument) -> Value {
    let mut root = match &document.schema {
        Some(schema) => schema.to_value(),
        // A hidden root accepts nothing.
        None => json!({ "not": {} }),
    };
    lower(&mut root);

    let mut schemas = Map::new();
    for (name, schema) in &document.components.schemas {
        let mut value = schema.to_value();
        lower(&mut value);
        schemas.insert(name.clone(), value);
    }

    if let Value::Object(map) = &mut root {
        map.insert("components".to_string(), json!({ "schemas": schemas }));
    }
    root
}

fn lower(value: &mut Value) {
    let Value::Object(map) = value else {
        return;
    };

    lower_exclusive(map, "exclusiveMaximum", "maximum");
    lower_exclusive(map, "exclusiveMinimum", "minimum");

    if map.get("nullable") == Some(&Value::Bool(true)) {
        if let Some(Value::String(t)) = map.get("type").cloned() {
            map.insert("type".to_string(), json!([t, "null"]));
        }
    }
    map.remove("nullable");

    for (key, child) in map.iter_mut() {
        match key.as_str() {
            "properties" => {
                if let Value::Object(props) = child {
                    for prop in props.values_mut() {
                        lower(prop);
                    }
                }
            }
            "items" | "not" => lower(child),
            "allOf" | "anyOf" | "oneOf" => {
                if let Value::Array(branches) = child {
                    for branch in branches {
                        lower(branch);
                    }
                }
            }
            _ => {}
        }
    }
}

fn lower_exclusive(map: &mut Map<String, Value>, exclusive: &str, bound: &str) {
    match map.get(exclusive) {
        Some(Value::Bool(true)) => match map.remove(bound) {
            Some(limit) => {
                map.insert(exclusive.to_string(), limit);
            }
            None => {
                map.remove(exclusive);
            }
        },
        Some(Value::Bool(false)) => {
            map.remove(exclusive);
        }
        _ => {}
    }
}

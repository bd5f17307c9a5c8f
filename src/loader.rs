//! Model loading from files and strings.
//!
//! A model file describes the introspected types and their overrides:
//!
//! ```json
//! {
//!   "types": [
//!     {
//!       "name": "Pet",
//!       "fields": [
//!         { "name": "name", "type": "string", "overrides": { "required": true } },
//!         { "name": "age", "type": "int32" }
//!       ],
//!       "overrides": { "description": "A pet" }
//!     },
//!     { "name": "Color", "kind": "enum", "constants": ["RED", "GREEN"] }
//!   ]
//! }
//! ```
//!
//! Field types are type expressions (see [`TypeIndex::parse_type`]).

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::ModelError;
use crate::overrides::OverrideMap;
use crate::types::{FieldInfo, TypeIndex, TypeInfo, TypeInfoKind};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawModel {
    #[serde(default)]
    types: Vec<RawType>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawType {
    name: String,
    #[serde(default)]
    kind: TypeInfoKind,
    #[serde(default)]
    superclass: Option<String>,
    #[serde(default)]
    type_parameters: Vec<String>,
    #[serde(default)]
    fields: Vec<RawField>,
    #[serde(default)]
    constants: Vec<String>,
    #[serde(default)]
    overrides: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawField {
    name: String,
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    overrides: Option<Value>,
}

/// Load a model from a file path.
///
/// # Errors
///
/// Returns `ModelError::FileNotFound` if the file doesn't exist,
/// `ModelError::InvalidJson` if it isn't valid JSON, or
/// `ModelError::InvalidModel` if it doesn't describe a model.
pub fn load_model(path: &Path) -> Result<TypeIndex, ModelError> {
    let content = read_file(path)?;
    load_model_str(&content)
}

/// Load a model from a JSON string.
///
/// # Errors
///
/// Returns `ModelError::InvalidJson` or `ModelError::InvalidModel`.
pub fn load_model_str(content: &str) -> Result<TypeIndex, ModelError> {
    let value: Value =
        serde_json::from_str(content).map_err(|source| ModelError::InvalidJson { source })?;
    model_from_value(&value)
}

/// Build a type index from a parsed model document.
///
/// Types are indexed in two steps so field types and overrides can refer to
/// any type of the model, including enums declared later in the file.
///
/// # Errors
///
/// Returns `ModelError::InvalidModel` for structural problems or
/// `ModelError::InvalidTypeExpression` for unparsable field types.
pub fn model_from_value(value: &Value) -> Result<TypeIndex, ModelError> {
    let raw: RawModel =
        serde_json::from_value(value.clone()).map_err(|e| ModelError::InvalidModel {
            path: "/".to_string(),
            message: e.to_string(),
        })?;

    let mut skeleton = TypeIndex::new();
    for (i, ty) in raw.types.iter().enumerate() {
        let previous = skeleton.insert(TypeInfo {
            name: ty.name.clone(),
            kind: ty.kind,
            ..TypeInfo::default()
        });
        if previous.is_some() {
            return Err(ModelError::InvalidModel {
                path: format!("/types/{}", i),
                message: format!("duplicate type '{}'", ty.name),
            });
        }
    }

    let mut index = TypeIndex::new();
    for (i, ty) in raw.types.into_iter().enumerate() {
        let path = format!("/types/{}", i);

        let mut fields = Vec::with_capacity(ty.fields.len());
        for (j, field) in ty.fields.into_iter().enumerate() {
            let field_path = format!("{}/fields/{}", path, j);
            let mut info = FieldInfo::new(field.name, skeleton.parse_type(&field.ty)?);
            if let Some(overrides) = &field.overrides {
                info.overrides = Some(OverrideMap::from_json(
                    overrides,
                    &skeleton,
                    &format!("{}/overrides", field_path),
                )?);
            }
            fields.push(info);
        }

        let overrides = match &ty.overrides {
            Some(v) => Some(OverrideMap::from_json(v, &skeleton, &format!("{}/overrides", path))?),
            None => None,
        };

        if ty.kind == TypeInfoKind::Enum && !fields.is_empty() {
            tracing::debug!(type_name = %ty.name, "ignoring fields declared on enum");
        }

        index.insert(TypeInfo {
            name: ty.name,
            kind: ty.kind,
            superclass: ty.superclass,
            type_parameters: ty.type_parameters,
            fields,
            constants: ty.constants,
            overrides,
        });
    }

    Ok(index)
}

/// Load a standalone override map (e.g. from a CLI flag) against a model.
///
/// # Errors
///
/// Returns `ModelError::InvalidJson` or `ModelError::InvalidModel`.
pub fn load_overrides_str(content: &str, index: &TypeIndex) -> Result<OverrideMap, ModelError> {
    let value: Value =
        serde_json::from_str(content).map_err(|source| ModelError::InvalidJson { source })?;
    OverrideMap::from_json(&value, index, "")
}

/// Load any JSON document (an instance to validate, for example).
///
/// # Errors
///
/// Returns `ModelError::FileNotFound`, `ModelError::ReadError` or
/// `ModelError::InvalidJson`.
pub fn load_json(path: &Path) -> Result<Value, ModelError> {
    let content = read_file(path)?;
    serde_json::from_str(&content).map_err(|source| ModelError::InvalidJson { source })
}

fn read_file(path: &Path) -> Result<String, ModelError> {
    if !path.exists() {
        return Err(ModelError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    std::fs::read_to_string(path).map_err(|source| ModelError::ReadError {
        path: path.to_path_buf(),
        source,
    })
}

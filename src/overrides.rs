//! Override maps: explicitly supplied schema properties.
//!
//! An [`OverrideMap`] holds already-decoded values keyed by the fixed
//! property vocabulary below. Lookups are two-valued: a typed accessor
//! returns `Some` when the property is present with a usable value, `None`
//! otherwise. The [`OverrideValue::UseDefault`] marker and malformed values
//! both read as absent; malformed ones are logged.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::ModelError;
use crate::model::SchemaType;
use crate::types::{json_type_name, TypeDescriptor, TypeIndex};

pub const PROP_TITLE: &str = "title";
pub const PROP_DESCRIPTION: &str = "description";
pub const PROP_FORMAT: &str = "format";
pub const PROP_TYPE: &str = "type";
pub const PROP_REF: &str = "ref";
pub const PROP_NAME: &str = "name";
pub const PROP_HIDDEN: &str = "hidden";
pub const PROP_IMPLEMENTATION: &str = "implementation";
pub const PROP_DEFAULT_VALUE: &str = "defaultValue";
pub const PROP_EXAMPLE: &str = "example";
pub const PROP_DEPRECATED: &str = "deprecated";
pub const PROP_NULLABLE: &str = "nullable";
pub const PROP_READ_ONLY: &str = "readOnly";
pub const PROP_WRITE_ONLY: &str = "writeOnly";
pub const PROP_MULTIPLE_OF: &str = "multipleOf";
pub const PROP_MAXIMUM: &str = "maximum";
pub const PROP_EXCLUSIVE_MAXIMUM: &str = "exclusiveMaximum";
pub const PROP_MINIMUM: &str = "minimum";
pub const PROP_EXCLUSIVE_MINIMUM: &str = "exclusiveMinimum";
pub const PROP_MAX_LENGTH: &str = "maxLength";
pub const PROP_MIN_LENGTH: &str = "minLength";
pub const PROP_PATTERN: &str = "pattern";
pub const PROP_MAX_PROPERTIES: &str = "maxProperties";
pub const PROP_MIN_PROPERTIES: &str = "minProperties";
pub const PROP_REQUIRED_PROPERTIES: &str = "requiredProperties";
pub const PROP_REQUIRED: &str = "required";
pub const PROP_MAX_ITEMS: &str = "maxItems";
pub const PROP_MIN_ITEMS: &str = "minItems";
pub const PROP_UNIQUE_ITEMS: &str = "uniqueItems";
pub const PROP_ENUMERATION: &str = "enumeration";
pub const PROP_NOT: &str = "not";
pub const PROP_ONE_OF: &str = "oneOf";
pub const PROP_ANY_OF: &str = "anyOf";
pub const PROP_ALL_OF: &str = "allOf";
pub const PROP_DISCRIMINATOR_PROPERTY: &str = "discriminatorProperty";
pub const PROP_DISCRIMINATOR_MAPPING: &str = "discriminatorMapping";
pub const PROP_EXTERNAL_DOCS: &str = "externalDocs";
pub const PROP_EXTERNAL_DOCS_DESCRIPTION: &str = "externalDocs.description";
pub const PROP_EXTERNAL_DOCS_URL: &str = "externalDocs.url";
pub const PROP_EXTENSIONS: &str = "extensions";

/// Keys inside a discriminator mapping entry.
pub const PROP_VALUE: &str = "value";
pub const PROP_SCHEMA: &str = "schema";
/// Keys inside a nested external docs entry.
pub const PROP_URL: &str = "url";

/// Prefix required on extension names.
pub const EXTENSION_PREFIX: &str = "x-";

/// A decoded override value.
#[derive(Debug, Clone, PartialEq)]
pub enum OverrideValue {
    /// Explicitly "use the structural default"; reads as absent.
    UseDefault,
    String(String),
    Number(f64),
    Bool(bool),
    /// Raw literal for `defaultValue`, `example`, enumeration entries and extensions.
    Literal(Value),
    Type(TypeDescriptor),
    List(Vec<OverrideValue>),
    Nested(OverrideMap),
}

impl OverrideValue {
    fn kind(&self) -> &'static str {
        match self {
            OverrideValue::UseDefault => "default marker",
            OverrideValue::String(_) => "string",
            OverrideValue::Number(_) => "number",
            OverrideValue::Bool(_) => "boolean",
            OverrideValue::Literal(v) => json_type_name(v),
            OverrideValue::Type(_) => "type",
            OverrideValue::List(_) => "list",
            OverrideValue::Nested(_) => "nested overrides",
        }
    }

    /// JSON rendering of scalar values; `None` for types and nested maps.
    pub fn to_literal(&self) -> Option<Value> {
        match self {
            OverrideValue::String(s) => Some(Value::String(s.clone())),
            OverrideValue::Number(n) => serde_json::Number::from_f64(*n).map(Value::Number),
            OverrideValue::Bool(b) => Some(Value::Bool(*b)),
            OverrideValue::Literal(v) => Some(v.clone()),
            OverrideValue::List(items) => items
                .iter()
                .map(OverrideValue::to_literal)
                .collect::<Option<Vec<_>>>()
                .map(Value::Array),
            OverrideValue::UseDefault | OverrideValue::Type(_) | OverrideValue::Nested(_) => None,
        }
    }
}

impl From<&str> for OverrideValue {
    fn from(s: &str) -> Self {
        OverrideValue::String(s.to_string())
    }
}

impl From<String> for OverrideValue {
    fn from(s: String) -> Self {
        OverrideValue::String(s)
    }
}

impl From<bool> for OverrideValue {
    fn from(b: bool) -> Self {
        OverrideValue::Bool(b)
    }
}

impl From<f64> for OverrideValue {
    fn from(n: f64) -> Self {
        OverrideValue::Number(n)
    }
}

impl From<i64> for OverrideValue {
    fn from(n: i64) -> Self {
        OverrideValue::Number(n as f64)
    }
}

impl From<i32> for OverrideValue {
    fn from(n: i32) -> Self {
        OverrideValue::Number(f64::from(n))
    }
}

impl From<TypeDescriptor> for OverrideValue {
    fn from(ty: TypeDescriptor) -> Self {
        OverrideValue::Type(ty)
    }
}

impl From<OverrideMap> for OverrideValue {
    fn from(map: OverrideMap) -> Self {
        OverrideValue::Nested(map)
    }
}

impl From<Vec<OverrideValue>> for OverrideValue {
    fn from(items: Vec<OverrideValue>) -> Self {
        OverrideValue::List(items)
    }
}

/// Property name -> decoded value, for one type, field or nested entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideMap {
    values: BTreeMap<String, OverrideValue>,
}

impl OverrideMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<OverrideValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<OverrideValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// The raw value, unless absent or the use-default marker.
    pub fn get(&self, key: &str) -> Option<&OverrideValue> {
        match self.values.get(key) {
            Some(OverrideValue::UseDefault) | None => None,
            Some(value) => Some(value),
        }
    }

    /// A copy with `key` removed.
    pub fn without(&self, key: &str) -> OverrideMap {
        let mut copy = self.clone();
        copy.values.remove(key);
        copy
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Keys carrying an explicit value, in sorted order.
    pub fn explicit_keys(&self) -> impl Iterator<Item = &str> {
        self.values
            .iter()
            .filter(|(_, v)| !matches!(v, OverrideValue::UseDefault))
            .map(|(k, _)| k.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.explicit_keys().next().is_none()
    }

    pub fn is_hidden(&self) -> bool {
        self.bool(PROP_HIDDEN) == Some(true)
    }

    pub fn string(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            OverrideValue::String(s) => Some(s.clone()),
            OverrideValue::Literal(Value::String(s)) => Some(s.clone()),
            other => malformed(key, "string", other),
        }
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            OverrideValue::Bool(b) | OverrideValue::Literal(Value::Bool(b)) => Some(*b),
            OverrideValue::String(s) => match s.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => malformed(key, "boolean", &OverrideValue::String(s.clone())),
            },
            other => malformed(key, "boolean", other),
        }
    }

    /// Decimal constraint. Numeric strings are accepted.
    pub fn number(&self, key: &str) -> Option<f64> {
        let value = self.get(key)?;
        let number = match value {
            OverrideValue::Number(n) => Some(*n),
            OverrideValue::Literal(Value::Number(n)) => n.as_f64(),
            OverrideValue::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match number {
            Some(n) if n.is_finite() => Some(n),
            _ => malformed(key, "number", value),
        }
    }

    /// Non-negative integer constraint (lengths, counts).
    pub fn count(&self, key: &str) -> Option<u64> {
        let n = self.number(key)?;
        if n >= 0.0 && n.fract() == 0.0 && n <= u64::MAX as f64 {
            Some(n as u64)
        } else {
            malformed(key, "non-negative integer", &OverrideValue::Number(n))
        }
    }

    /// List of strings. Non-string entries are logged and skipped.
    pub fn strings(&self, key: &str) -> Option<Vec<String>> {
        match self.get(key)? {
            OverrideValue::List(items) => Some(
                items
                    .iter()
                    .filter_map(|item| match item {
                        OverrideValue::String(s) => Some(s.clone()),
                        OverrideValue::Literal(Value::String(s)) => Some(s.clone()),
                        other => malformed(key, "string entry", other),
                    })
                    .collect(),
            ),
            other => malformed(key, "list of strings", other),
        }
    }

    /// A literal JSON value (`defaultValue`, `example`).
    pub fn literal(&self, key: &str) -> Option<Value> {
        let value = self.get(key)?;
        match value.to_literal() {
            Some(v) => Some(v),
            None => malformed(key, "literal", value),
        }
    }

    /// A list of literal JSON values (`enumeration`).
    pub fn literals(&self, key: &str) -> Option<Vec<Value>> {
        match self.get(key)? {
            OverrideValue::List(items) => Some(
                items
                    .iter()
                    .filter_map(|item| item.to_literal().or_else(|| malformed(key, "literal", item)))
                    .collect(),
            ),
            other => malformed(key, "list of literals", other),
        }
    }

    pub fn schema_type(&self, key: &str) -> Option<SchemaType> {
        let raw = self.string(key)?;
        match SchemaType::parse(&raw) {
            Some(t) => Some(t),
            None => malformed(key, "schema type", &OverrideValue::String(raw)),
        }
    }

    pub fn type_ref(&self, key: &str) -> Option<&TypeDescriptor> {
        match self.get(key)? {
            OverrideValue::Type(ty) => Some(ty),
            other => malformed(key, "type reference", other),
        }
    }

    pub fn list(&self, key: &str) -> Option<&[OverrideValue]> {
        match self.get(key)? {
            OverrideValue::List(items) => Some(items),
            other => malformed(key, "list", other),
        }
    }

    pub fn nested(&self, key: &str) -> Option<&OverrideMap> {
        match self.get(key)? {
            OverrideValue::Nested(map) => Some(map),
            other => malformed(key, "nested overrides", other),
        }
    }

    /// Decode an override map from its JSON form.
    ///
    /// Type-valued properties (`implementation`, `not`, `oneOf`/`anyOf`/`allOf`
    /// entries, discriminator mapping `schema`) are type expressions parsed
    /// against `index`; objects in those positions are inline override maps.
    /// `null` decodes to the use-default marker.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidModel` when a value has the wrong JSON
    /// type for its property, or a type expression error.
    pub fn from_json(value: &Value, index: &TypeIndex, path: &str) -> Result<Self, ModelError> {
        let Some(obj) = value.as_object() else {
            return Err(invalid(path, "overrides", value));
        };

        let mut map = OverrideMap::new();
        for (key, value) in obj {
            let child_path = format!("{}/{}", path, key);
            let decoded = match key.as_str() {
                _ if value.is_null() => OverrideValue::UseDefault,
                PROP_IMPLEMENTATION | PROP_NOT => decode_schema_ref(value, index, &child_path)?,
                PROP_ONE_OF | PROP_ANY_OF | PROP_ALL_OF => {
                    let Some(items) = value.as_array() else {
                        return Err(invalid(&child_path, "array", value));
                    };
                    let mut decoded = Vec::with_capacity(items.len());
                    for (i, item) in items.iter().enumerate() {
                        decoded.push(decode_schema_ref(item, index, &format!("{}/{}", child_path, i))?);
                    }
                    OverrideValue::List(decoded)
                }
                PROP_DISCRIMINATOR_MAPPING => {
                    let Some(items) = value.as_array() else {
                        return Err(invalid(&child_path, "array", value));
                    };
                    let mut decoded = Vec::with_capacity(items.len());
                    for (i, item) in items.iter().enumerate() {
                        decoded.push(OverrideValue::Nested(decode_mapping_entry(
                            item,
                            index,
                            &format!("{}/{}", child_path, i),
                        )?));
                    }
                    OverrideValue::List(decoded)
                }
                PROP_DEFAULT_VALUE | PROP_EXAMPLE => OverrideValue::Literal(value.clone()),
                PROP_ENUMERATION => {
                    let Some(items) = value.as_array() else {
                        return Err(invalid(&child_path, "array", value));
                    };
                    OverrideValue::List(items.iter().cloned().map(OverrideValue::Literal).collect())
                }
                PROP_EXTENSIONS => {
                    let Some(ext) = value.as_object() else {
                        return Err(invalid(&child_path, "object", value));
                    };
                    let mut nested = OverrideMap::new();
                    for (name, v) in ext {
                        nested.insert(name.clone(), OverrideValue::Literal(v.clone()));
                    }
                    OverrideValue::Nested(nested)
                }
                _ => decode_plain(value),
            };
            map.values.insert(key.clone(), decoded);
        }
        Ok(map)
    }
}

fn malformed<T>(key: &str, expected: &str, actual: &OverrideValue) -> Option<T> {
    tracing::warn!(
        property = key,
        expected,
        actual = actual.kind(),
        "ignoring malformed override value"
    );
    None
}

fn invalid(path: &str, expected: &str, actual: &Value) -> ModelError {
    ModelError::InvalidModel {
        path: path.to_string(),
        message: format!("expected {}, got {}", expected, json_type_name(actual)),
    }
}

fn decode_schema_ref(value: &Value, index: &TypeIndex, path: &str) -> Result<OverrideValue, ModelError> {
    match value {
        Value::String(expr) => Ok(OverrideValue::Type(index.parse_type(expr)?)),
        Value::Object(_) => Ok(OverrideValue::Nested(OverrideMap::from_json(value, index, path)?)),
        other => Err(invalid(path, "type expression or overrides object", other)),
    }
}

fn decode_mapping_entry(value: &Value, index: &TypeIndex, path: &str) -> Result<OverrideMap, ModelError> {
    let Some(obj) = value.as_object() else {
        return Err(invalid(path, "object", value));
    };
    let mut entry = OverrideMap::new();
    if let Some(v) = obj.get(PROP_VALUE).filter(|v| !v.is_null()) {
        let Some(s) = v.as_str() else {
            return Err(invalid(&format!("{}/{}", path, PROP_VALUE), "string", v));
        };
        entry.insert(PROP_VALUE, s);
    }
    if let Some(v) = obj.get(PROP_SCHEMA).filter(|v| !v.is_null()) {
        let Some(expr) = v.as_str() else {
            return Err(invalid(&format!("{}/{}", path, PROP_SCHEMA), "type expression", v));
        };
        entry.insert(PROP_SCHEMA, index.parse_type(expr)?);
    }
    Ok(entry)
}

fn decode_plain(value: &Value) -> OverrideValue {
    match value {
        Value::Null => OverrideValue::UseDefault,
        Value::Bool(b) => OverrideValue::Bool(*b),
        Value::Number(n) => match n.as_f64() {
            Some(f) => OverrideValue::Number(f),
            None => OverrideValue::Literal(value.clone()),
        },
        Value::String(s) => OverrideValue::String(s.clone()),
        Value::Array(items) => OverrideValue::List(items.iter().map(decode_plain).collect()),
        Value::Object(obj) => OverrideValue::Nested(OverrideMap {
            values: obj
                .iter()
                .map(|(k, v)| (k.clone(), decode_plain(v)))
                .collect(),
        }),
    }
}

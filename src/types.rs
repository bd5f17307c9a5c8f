//! Core types: type descriptors, the introspection index, and factory options.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ModelError;
use crate::model::SchemaType;
use crate::overrides::OverrideMap;

/// Generic bases whose single argument is the real payload type.
pub const DEFAULT_ASYNC_WRAPPERS: &[&str] = &["CompletionStage", "CompletableFuture", "Future"];

/// Generic bases rendered as arrays of their single argument.
pub const DEFAULT_COLLECTION_WRAPPERS: &[&str] = &["List", "Set", "Collection", "Vec"];

/// Types that never contribute a schema.
pub const DEFAULT_OPAQUE_TYPES: &[&str] = &["Response"];

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Built-in scalar types with a fixed schema rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Primitive {
    Boolean,
    Byte,
    Char,
    Int16,
    Int32,
    Int64,
    Float,
    Double,
    String,
    Decimal,
    BigInteger,
    Date,
    DateTime,
    Uuid,
    Binary,
}

impl Primitive {
    /// Parse a primitive from its name in a type expression.
    ///
    /// Accepts a few common aliases (`int`, `long`, `short`). Returns `None`
    /// for anything else so the caller can fall back to a class lookup.
    pub fn parse(s: &str) -> Option<Self> {
        let primitive = match s {
            "boolean" | "bool" => Primitive::Boolean,
            "byte" => Primitive::Byte,
            "char" => Primitive::Char,
            "int16" | "short" => Primitive::Int16,
            "int32" | "int" | "integer" => Primitive::Int32,
            "int64" | "long" => Primitive::Int64,
            "float" => Primitive::Float,
            "double" => Primitive::Double,
            "string" => Primitive::String,
            "decimal" => Primitive::Decimal,
            "big-integer" => Primitive::BigInteger,
            "date" => Primitive::Date,
            "date-time" => Primitive::DateTime,
            "uuid" => Primitive::Uuid,
            "binary" => Primitive::Binary,
            _ => return None,
        };
        Some(primitive)
    }

    /// Canonical name, as accepted by [`Primitive::parse`].
    pub fn name(&self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Char => "char",
            Primitive::Int16 => "int16",
            Primitive::Int32 => "int32",
            Primitive::Int64 => "int64",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::String => "string",
            Primitive::Decimal => "decimal",
            Primitive::BigInteger => "big-integer",
            Primitive::Date => "date",
            Primitive::DateTime => "date-time",
            Primitive::Uuid => "uuid",
            Primitive::Binary => "binary",
        }
    }

    /// The `(type, format)` pair this primitive renders as.
    pub fn schema_type(&self) -> (SchemaType, Option<&'static str>) {
        match self {
            Primitive::Boolean => (SchemaType::Boolean, None),
            Primitive::Byte => (SchemaType::String, Some("byte")),
            Primitive::Char => (SchemaType::String, None),
            Primitive::Int16 | Primitive::Int32 => (SchemaType::Integer, Some("int32")),
            Primitive::Int64 => (SchemaType::Integer, Some("int64")),
            Primitive::Float => (SchemaType::Number, Some("float")),
            Primitive::Double => (SchemaType::Number, Some("double")),
            Primitive::String => (SchemaType::String, None),
            Primitive::Decimal => (SchemaType::Number, None),
            Primitive::BigInteger => (SchemaType::Integer, None),
            Primitive::Date => (SchemaType::String, Some("date")),
            Primitive::DateTime => (SchemaType::String, Some("date-time")),
            Primitive::Uuid => (SchemaType::String, Some("uuid")),
            Primitive::Binary => (SchemaType::String, Some("binary")),
        }
    }
}

/// Structural description of a type, as supplied by introspection.
///
/// Class and enum variants carry the lookup key into the [`TypeIndex`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    Primitive(Primitive),
    Array(Box<TypeDescriptor>),
    Class(String),
    Parameterized {
        base: String,
        arguments: Vec<TypeDescriptor>,
    },
    Enum(String),
}

impl TypeDescriptor {
    pub fn class(name: impl Into<String>) -> Self {
        TypeDescriptor::Class(name.into())
    }

    pub fn enumeration(name: impl Into<String>) -> Self {
        TypeDescriptor::Enum(name.into())
    }

    pub fn array(component: TypeDescriptor) -> Self {
        TypeDescriptor::Array(Box::new(component))
    }

    pub fn parameterized(base: impl Into<String>, arguments: Vec<TypeDescriptor>) -> Self {
        TypeDescriptor::Parameterized {
            base: base.into(),
            arguments,
        }
    }

    /// Canonical identity of this type, used as the registry key.
    pub fn canonical_name(&self) -> String {
        self.to_string()
    }

    /// Short name used to derive a registry name (`com.acme.Pet` -> `Pet`,
    /// `Page<Pet>` -> `PagePet`).
    pub fn simple_name(&self) -> String {
        match self {
            TypeDescriptor::Primitive(p) => p.name().to_string(),
            TypeDescriptor::Array(component) => format!("{}Array", component.simple_name()),
            TypeDescriptor::Class(name) | TypeDescriptor::Enum(name) => {
                simple_segment(name).to_string()
            }
            TypeDescriptor::Parameterized { base, arguments } => {
                let mut name = simple_segment(base).to_string();
                for arg in arguments {
                    name.push_str(&arg.simple_name());
                }
                name
            }
        }
    }

    /// Replace class references naming a type parameter with its binding.
    pub(crate) fn substitute(&self, bindings: &HashMap<String, TypeDescriptor>) -> TypeDescriptor {
        match self {
            TypeDescriptor::Class(name) => bindings.get(name).cloned().unwrap_or_else(|| self.clone()),
            TypeDescriptor::Array(component) => {
                TypeDescriptor::Array(Box::new(component.substitute(bindings)))
            }
            TypeDescriptor::Parameterized { base, arguments } => TypeDescriptor::Parameterized {
                base: base.clone(),
                arguments: arguments.iter().map(|a| a.substitute(bindings)).collect(),
            },
            other => other.clone(),
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Primitive(p) => f.write_str(p.name()),
            TypeDescriptor::Array(component) => write!(f, "{}[]", component),
            TypeDescriptor::Class(name) | TypeDescriptor::Enum(name) => f.write_str(name),
            TypeDescriptor::Parameterized { base, arguments } => {
                write!(f, "{}<", base)?;
                for (i, arg) in arguments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(">")
            }
        }
    }
}

fn simple_segment(name: &str) -> &str {
    name.rsplit(['.', '$']).next().unwrap_or(name)
}

/// Whether an indexed type is a class or an enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeInfoKind {
    #[default]
    Class,
    Enum,
}

/// A declared field of an indexed class.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub name: String,
    pub ty: TypeDescriptor,
    /// Field-level overrides, if the field carries any.
    pub overrides: Option<OverrideMap>,
}

impl FieldInfo {
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty,
            overrides: None,
        }
    }

    pub fn with_overrides(mut self, overrides: OverrideMap) -> Self {
        self.overrides = Some(overrides);
        self
    }
}

/// Introspected description of a class or enum.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeInfo {
    pub name: String,
    pub kind: TypeInfoKind,
    pub superclass: Option<String>,
    /// Names of generic parameters, bound positionally by parameterized uses.
    pub type_parameters: Vec<String>,
    pub fields: Vec<FieldInfo>,
    /// Enum constants in declaration order.
    pub constants: Vec<String>,
    /// Class-level overrides.
    pub overrides: Option<OverrideMap>,
}

impl TypeInfo {
    pub fn class(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn enumeration<I, S>(name: impl Into<String>, constants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            kind: TypeInfoKind::Enum,
            constants: constants.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn type_parameter(mut self, name: impl Into<String>) -> Self {
        self.type_parameters.push(name.into());
        self
    }

    pub fn field(mut self, field: FieldInfo) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_overrides(mut self, overrides: OverrideMap) -> Self {
        self.overrides = Some(overrides);
        self
    }

    /// Descriptor referring to this type.
    pub fn descriptor(&self) -> TypeDescriptor {
        match self.kind {
            TypeInfoKind::Class => TypeDescriptor::Class(self.name.clone()),
            TypeInfoKind::Enum => TypeDescriptor::Enum(self.name.clone()),
        }
    }
}

/// Lookup table of introspected classes and enums, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct TypeIndex {
    types: HashMap<String, TypeInfo>,
}

impl TypeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a type, returning the previous entry with the same name.
    pub fn insert(&mut self, info: TypeInfo) -> Option<TypeInfo> {
        self.types.insert(info.name.clone(), info)
    }

    pub fn with(mut self, info: TypeInfo) -> Self {
        self.insert(info);
        self
    }

    pub fn get(&self, name: &str) -> Option<&TypeInfo> {
        self.types.get(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Names of all indexed types, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Parse a type expression against this index.
    ///
    /// Grammar: a primitive name (`int32`, `string`, ...), `T[]`, `Base<A, B>`,
    /// or a class/enum name. Names not in the index parse as classes; they
    /// surface as unresolved references during resolution.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidTypeExpression` for empty names or
    /// unbalanced generic brackets.
    pub fn parse_type(&self, expr: &str) -> Result<TypeDescriptor, ModelError> {
        let expr = expr.trim();
        let invalid = |message: &str| ModelError::InvalidTypeExpression {
            expr: expr.to_string(),
            message: message.to_string(),
        };

        if expr.is_empty() {
            return Err(invalid("empty type name"));
        }

        if let Some(component) = expr.strip_suffix("[]") {
            return Ok(TypeDescriptor::array(self.parse_type(component)?));
        }

        if let Some(open) = expr.find('<') {
            let Some(inner) = expr[open + 1..].strip_suffix('>') else {
                return Err(invalid("missing closing '>'"));
            };
            let base = expr[..open].trim();
            if base.is_empty() {
                return Err(invalid("missing generic base name"));
            }
            let arguments = split_arguments(inner)
                .ok_or_else(|| invalid("unbalanced generic arguments"))?
                .into_iter()
                .map(|arg| self.parse_type(arg))
                .collect::<Result<Vec<_>, _>>()?;
            if arguments.is_empty() {
                return Err(invalid("generic type without arguments"));
            }
            return Ok(TypeDescriptor::parameterized(base, arguments));
        }

        if expr.contains(['>', ',']) {
            return Err(invalid("unexpected generic delimiter"));
        }

        if let Some(primitive) = Primitive::parse(expr) {
            return Ok(TypeDescriptor::Primitive(primitive));
        }

        Ok(match self.get(expr) {
            Some(info) => info.descriptor(),
            None => TypeDescriptor::class(expr),
        })
    }
}

/// Split generic arguments on top-level commas. `None` if brackets don't balance.
fn split_arguments(inner: &str) -> Option<Vec<&str>> {
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in inner.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => {
                args.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    let last = inner[start..].trim();
    if !last.is_empty() || !args.is_empty() {
        args.push(last);
    }
    Some(args)
}

/// Options for a resolution pass.
#[derive(Debug, Clone)]
pub struct FactoryOptions {
    /// Generic bases unwrapped to their single type argument.
    pub async_wrappers: Vec<String>,
    /// Generic bases rendered as `type: array` of their single argument.
    pub collection_wrappers: Vec<String>,
    /// Types that resolve to no schema at all.
    pub opaque_types: Vec<String>,
}

impl Default for FactoryOptions {
    fn default() -> Self {
        Self {
            async_wrappers: to_strings(DEFAULT_ASYNC_WRAPPERS),
            collection_wrappers: to_strings(DEFAULT_COLLECTION_WRAPPERS),
            opaque_types: to_strings(DEFAULT_OPAQUE_TYPES),
        }
    }
}

impl FactoryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an additional async wrapper base.
    pub fn async_wrapper(mut self, base: impl Into<String>) -> Self {
        self.async_wrappers.push(base.into());
        self
    }

    /// Register an additional collection wrapper base.
    pub fn collection_wrapper(mut self, base: impl Into<String>) -> Self {
        self.collection_wrappers.push(base.into());
        self
    }

    /// Register an additional opaque type.
    pub fn opaque_type(mut self, name: impl Into<String>) -> Self {
        self.opaque_types.push(name.into());
        self
    }

    pub fn is_async_wrapper(&self, base: &str) -> bool {
        matches_name(&self.async_wrappers, base)
    }

    pub fn is_collection_wrapper(&self, base: &str) -> bool {
        matches_name(&self.collection_wrappers, base)
    }

    pub fn is_opaque(&self, name: &str) -> bool {
        matches_name(&self.opaque_types, name)
    }
}

/// Matches either the full name or its last path segment.
fn matches_name(candidates: &[String], name: &str) -> bool {
    let simple = simple_segment(name);
    candidates.iter().any(|c| c == name || c == simple)
}

fn to_strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

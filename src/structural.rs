//! Structural resolution: baseline schemas derived from type descriptors.
//!
//! Nothing here reads overrides of the type being resolved. Field types are
//! resolved through the factory, which applies each field's own overrides.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::SchemaError;
use crate::factory::SchemaFactory;
use crate::model::{Schema, SchemaType};
use crate::overrides::{PROP_NAME, PROP_REQUIRED};
use crate::types::{FactoryOptions, FieldInfo, Primitive, TypeDescriptor, TypeIndex, TypeInfo};

/// A generic type that contributes no schema of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrapper<'t> {
    /// Async result wrapper: resolves as its argument.
    Async(&'t TypeDescriptor),
    /// Collection wrapper: resolves as an array of its argument.
    Collection(&'t TypeDescriptor),
}

/// Classify `ty` as a single-argument wrapper, if it is one.
pub fn wrapper<'t>(options: &FactoryOptions, ty: &'t TypeDescriptor) -> Option<Wrapper<'t>> {
    let TypeDescriptor::Parameterized { base, arguments } = ty else {
        return None;
    };
    let [argument] = arguments.as_slice() else {
        return None;
    };
    if options.is_async_wrapper(base) {
        Some(Wrapper::Async(argument))
    } else if options.is_collection_wrapper(base) {
        Some(Wrapper::Collection(argument))
    } else {
        None
    }
}

/// Fixed schema for a primitive.
pub fn primitive_schema(primitive: Primitive) -> Schema {
    let (schema_type, format) = primitive.schema_type();
    Schema {
        schema_type: Some(schema_type),
        format: format.map(str::to_string),
        ..Schema::default()
    }
}

/// The index entry describing `ty`, if it is a class-like type in the index.
pub fn indexed_info<'a>(index: &'a TypeIndex, ty: &TypeDescriptor) -> Option<&'a TypeInfo> {
    match ty {
        TypeDescriptor::Class(name) | TypeDescriptor::Enum(name) => index.get(name),
        TypeDescriptor::Parameterized { base, .. } => index.get(base),
        TypeDescriptor::Primitive(_) | TypeDescriptor::Array(_) => None,
    }
}

/// Build the baseline schema for `ty`.
///
/// Every kind dispatch goes through here. Array components and wrapper
/// arguments resolve through the factory, so class-like ones come back as
/// references.
///
/// # Errors
///
/// Returns `SchemaError::UnresolvedReference` when a class, enum or generic
/// base is missing from the index; the factory downgrades that to an absent
/// schema. Registry misuse propagates as-is.
pub fn resolve_structural(
    factory: &mut SchemaFactory<'_>,
    ty: &TypeDescriptor,
) -> Result<Option<Schema>, SchemaError> {
    match ty {
        TypeDescriptor::Primitive(p) => Ok(Some(primitive_schema(*p))),
        TypeDescriptor::Array(component) => {
            let items = factory.resolve(component, None)?;
            Ok(Some(Schema::array_of(items)))
        }
        TypeDescriptor::Enum(name) => {
            let info = lookup(factory.index(), name, ty)?;
            Ok(Some(enum_schema(info)))
        }
        TypeDescriptor::Class(name) => {
            let info = lookup(factory.index(), name, ty)?;
            object_schema(factory, info, &HashMap::new()).map(Some)
        }
        TypeDescriptor::Parameterized { base, arguments } => match wrapper(factory.options(), ty) {
            Some(Wrapper::Async(argument)) => factory.resolve(argument, None),
            Some(Wrapper::Collection(argument)) => {
                let items = factory.resolve(argument, None)?;
                Ok(Some(Schema::array_of(items)))
            }
            None => {
                let info = lookup(factory.index(), base, ty)?;
                if info.type_parameters.len() != arguments.len() {
                    tracing::warn!(
                        type_name = %ty,
                        expected = info.type_parameters.len(),
                        actual = arguments.len(),
                        "generic argument count mismatch"
                    );
                }
                let bindings: HashMap<String, TypeDescriptor> = info
                    .type_parameters
                    .iter()
                    .cloned()
                    .zip(arguments.iter().cloned())
                    .collect();
                object_schema(factory, info, &bindings).map(Some)
            }
        },
    }
}

fn lookup<'a>(
    index: &'a TypeIndex,
    name: &str,
    ty: &TypeDescriptor,
) -> Result<&'a TypeInfo, SchemaError> {
    index.get(name).ok_or_else(|| SchemaError::UnresolvedReference {
        type_name: ty.canonical_name(),
    })
}

/// `type: string` with the constants sorted, so declaration order never
/// affects the output.
fn enum_schema(info: &TypeInfo) -> Schema {
    let mut constants: Vec<&String> = info.constants.iter().collect();
    constants.sort();

    let mut schema = Schema::of_type(SchemaType::String);
    for constant in constants {
        schema.add_enumeration(Value::String(constant.clone()));
    }
    schema
}

fn object_schema(
    factory: &mut SchemaFactory<'_>,
    info: &TypeInfo,
    bindings: &HashMap<String, TypeDescriptor>,
) -> Result<Schema, SchemaError> {
    let mut schema = Schema::of_type(SchemaType::Object);
    let mut properties = IndexMap::new();

    for field in collect_fields(factory.index(), info) {
        let ty = field.ty.substitute(bindings);
        let overrides = field.overrides.as_ref();

        // Hidden fields resolve to nothing.
        let Some(property) = factory.resolve(&ty, overrides)? else {
            continue;
        };

        let key = overrides
            .and_then(|o| o.string(PROP_NAME))
            .unwrap_or_else(|| field.name.clone());
        if overrides.and_then(|o| o.bool(PROP_REQUIRED)) == Some(true) {
            schema.add_required(key.clone());
        }
        properties.insert(key, property);
    }

    if !properties.is_empty() {
        schema.properties = Some(properties);
    }
    Ok(schema)
}

/// Fields of `info` and its superclasses, ancestors first. A field redeclared
/// by a subclass replaces the inherited one in place.
fn collect_fields<'a>(index: &'a TypeIndex, info: &'a TypeInfo) -> Vec<&'a FieldInfo> {
    let mut chain = vec![info];
    let mut seen = HashSet::from([info.name.as_str()]);
    let mut current = info;
    while let Some(superclass) = current.superclass.as_deref() {
        match index.get(superclass) {
            Some(parent) if seen.insert(parent.name.as_str()) => {
                chain.push(parent);
                current = parent;
            }
            Some(_) => break,
            None => {
                tracing::debug!(superclass, "superclass not in index");
                break;
            }
        }
    }

    let mut fields: Vec<&FieldInfo> = Vec::new();
    for ancestor in chain.into_iter().rev() {
        for field in &ancestor.fields {
            match fields.iter().position(|f| f.name == field.name) {
                Some(pos) => fields[pos] = field,
                None => fields.push(field),
            }
        }
    }
    fields
}

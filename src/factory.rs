//! Schema factory: orchestrates structural resolution, registration,
//! override merging and discriminator resolution for one pass.

use std::collections::HashSet;

use crate::discriminator::read_discriminator;
use crate::error::SchemaError;
use crate::merge::{apply_implementation, merge};
use crate::model::{ExternalDocs, Schema, SchemaType};
use crate::overrides::*;
use crate::registry::{ref_for_name, SchemaRegistry};
use crate::structural::{indexed_info, resolve_structural, wrapper};
use crate::types::{FactoryOptions, TypeDescriptor, TypeIndex};

/// How an `implementation` override relates to the other overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImplementationRole {
    /// Only `implementation`, naming a class-like type: its reference is the
    /// base and the (empty) overrides merge onto it.
    Reference,
    /// Exactly `implementation` and `type: array`: the reference becomes `items`.
    ArrayItems,
    /// Anything else: the implementation is resolved inline, then either
    /// wrapped as `items` (declared array) or used as the merge base.
    Inline,
}

/// Classify the `implementation` override of `overrides`.
pub fn implementation_role(overrides: &OverrideMap, implementation: &TypeDescriptor) -> ImplementationRole {
    let keys: Vec<&str> = overrides.explicit_keys().collect();
    let class_like = matches!(
        implementation,
        TypeDescriptor::Class(_) | TypeDescriptor::Enum(_) | TypeDescriptor::Parameterized { .. }
    );

    if keys == [PROP_IMPLEMENTATION] && class_like {
        ImplementationRole::Reference
    } else if keys.len() == 2
        && keys.contains(&PROP_TYPE)
        && overrides.schema_type(PROP_TYPE) == Some(SchemaType::Array)
    {
        ImplementationRole::ArrayItems
    } else {
        ImplementationRole::Inline
    }
}

/// Resolves types and overrides into schemas for one resolution pass.
///
/// The factory owns the pass's [`SchemaRegistry`]; every recursive call in
/// the pass goes through the same factory and so shares it. Start a new
/// factory for each document build.
#[derive(Debug)]
pub struct SchemaFactory<'a> {
    index: &'a TypeIndex,
    options: FactoryOptions,
    registry: SchemaRegistry,
    /// Class-like types whose schema is being built right now.
    in_progress: HashSet<String>,
}

impl<'a> SchemaFactory<'a> {
    pub fn new(index: &'a TypeIndex) -> Self {
        Self::with_options(index, FactoryOptions::default())
    }

    pub fn with_options(index: &'a TypeIndex, options: FactoryOptions) -> Self {
        Self {
            index,
            options,
            registry: SchemaRegistry::new(),
            in_progress: HashSet::new(),
        }
    }

    pub fn index(&self) -> &'a TypeIndex {
        self.index
    }

    pub fn options(&self) -> &FactoryOptions {
        &self.options
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// End the pass and hand over its registered definitions.
    pub fn into_registry(self) -> SchemaRegistry {
        self.registry
    }

    /// Resolve a declared type together with the overrides attached to its
    /// position (a field, a parameter, a root).
    ///
    /// - no overrides: the type's own schema (a `$ref` for class-like types);
    /// - `hidden`: `None`;
    /// - an `implementation` override: the overrides alone decide, see
    ///   [`SchemaFactory::read_schema`];
    /// - otherwise the overrides merge onto the declared type's schema.
    ///
    /// # Errors
    ///
    /// Only registry misuse is reported; unresolvable types yield `None`.
    pub fn resolve(
        &mut self,
        ty: &TypeDescriptor,
        overrides: Option<&OverrideMap>,
    ) -> Result<Option<Schema>, SchemaError> {
        let Some(overrides) = overrides.filter(|o| !o.is_empty()) else {
            return self.schema_for_type(ty, true);
        };
        if overrides.is_hidden() {
            return Ok(None);
        }
        if overrides.contains(PROP_IMPLEMENTATION) {
            return self.read_schema(overrides);
        }

        let base = self.schema_for_type(ty, true)?;
        let overlay = self.read_schema(overrides)?;
        Ok(overlay.map(|overlay| merge(base.as_ref(), &overlay)))
    }

    /// Build a schema from overrides alone.
    ///
    /// Returns `None` for hidden overrides. The `implementation` override, if
    /// any, supplies the base schema (see [`ImplementationRole`]); the
    /// discriminator and external docs are attached after merging.
    ///
    /// # Errors
    ///
    /// Only registry misuse is reported.
    pub fn read_schema(&mut self, overrides: &OverrideMap) -> Result<Option<Schema>, SchemaError> {
        if overrides.is_hidden() {
            return Ok(None);
        }

        let explicit = self.read_overrides(overrides)?;

        let mut schema = match overrides.type_ref(PROP_IMPLEMENTATION) {
            None => explicit,
            Some(implementation) => match implementation_role(overrides, implementation) {
                ImplementationRole::Reference => {
                    let base = self.schema_for_type(implementation, true)?;
                    merge(base.as_ref(), &explicit)
                }
                ImplementationRole::ArrayItems => {
                    let items = self.schema_for_type(implementation, true)?;
                    Schema {
                        items: items.map(Box::new),
                        ..explicit
                    }
                }
                ImplementationRole::Inline => {
                    let base = self.schema_for_type(implementation, false)?;
                    apply_implementation(base, explicit)
                }
            },
        };

        if let Some(discriminator) = read_discriminator(
            self,
            overrides.string(PROP_DISCRIMINATOR_PROPERTY),
            overrides.list(PROP_DISCRIMINATOR_MAPPING),
        )? {
            schema.discriminator = Some(discriminator);
        }
        if let Some(docs) = read_external_docs(overrides) {
            schema.external_docs = Some(docs);
        }

        Ok(Some(schema))
    }

    /// Schema for a type with no overrides of its own.
    ///
    /// With `by_reference`, class-like types are registered and returned as
    /// `$ref`s; without it they are introspected inline.
    ///
    /// # Errors
    ///
    /// Only registry misuse is reported.
    pub fn schema_for_type(
        &mut self,
        ty: &TypeDescriptor,
        by_reference: bool,
    ) -> Result<Option<Schema>, SchemaError> {
        match ty {
            TypeDescriptor::Primitive(_) | TypeDescriptor::Array(_) => resolve_structural(self, ty),
            TypeDescriptor::Class(_) | TypeDescriptor::Enum(_) | TypeDescriptor::Parameterized { .. } => {
                self.introspect(ty, by_reference)
            }
        }
    }

    /// Introspect a class-like type, consulting the registry first when
    /// `by_reference` is set.
    ///
    /// A type requested while its own schema is still being built always
    /// resolves by reference, so cycles through inline positions terminate.
    ///
    /// # Errors
    ///
    /// Only registry misuse is reported.
    pub fn introspect(
        &mut self,
        ty: &TypeDescriptor,
        by_reference: bool,
    ) -> Result<Option<Schema>, SchemaError> {
        let type_name = ty.canonical_name();
        if self.options.is_opaque(&type_name) {
            return Ok(None);
        }

        // Wrappers have no definition of their own.
        if wrapper(&self.options, ty).is_some() {
            return resolve_structural(self, ty);
        }

        let by_reference = by_reference || self.in_progress.contains(&type_name);
        if by_reference && self.registry.has(ty) {
            return self.registry.lookup_ref(ty).map(Some);
        }

        let Some(info) = indexed_info(self.index, ty) else {
            tracing::warn!(type_name = %type_name, "unresolved type reference; schema omitted");
            return Ok(None);
        };
        let class_overrides = info.overrides.as_ref().filter(|o| !o.is_empty());
        if class_overrides.map_or(false, OverrideMap::is_hidden) {
            tracing::debug!(type_name = %type_name, "type is hidden");
            return Ok(None);
        }

        if !by_reference {
            return self.build_tracked(ty, &type_name, class_overrides);
        }

        // Register before recursing so cycles come back as references.
        let provisional = Schema {
            name: class_overrides.and_then(|o| o.string(PROP_NAME)),
            ..Schema::default()
        };
        self.registry.register(ty, provisional);

        if let Some(schema) = self.build_tracked(ty, &type_name, class_overrides)? {
            self.registry.complete(ty, schema)?;
        }
        self.registry.lookup_ref(ty).map(Some)
    }

    /// [`SchemaFactory::build`] with `ty` marked as in progress.
    fn build_tracked(
        &mut self,
        ty: &TypeDescriptor,
        type_name: &str,
        class_overrides: Option<&OverrideMap>,
    ) -> Result<Option<Schema>, SchemaError> {
        let entered = self.in_progress.insert(type_name.to_string());
        let result = self.build(ty, class_overrides);
        if entered {
            self.in_progress.remove(type_name);
        }
        result
    }

    /// Structural schema for `ty` with class-level overrides merged on top.
    fn build(
        &mut self,
        ty: &TypeDescriptor,
        class_overrides: Option<&OverrideMap>,
    ) -> Result<Option<Schema>, SchemaError> {
        let base = match resolve_structural(self, ty) {
            Ok(schema) => schema,
            Err(SchemaError::UnresolvedReference { type_name }) => {
                tracing::warn!(type_name = %type_name, "unresolved type reference; schema omitted");
                None
            }
            Err(e) => return Err(e),
        };

        let Some(class_overrides) = class_overrides else {
            return Ok(base);
        };
        // A type implemented by itself is just its structural schema.
        let overlay = if class_overrides.type_ref(PROP_IMPLEMENTATION) == Some(ty) {
            tracing::debug!(type_name = %ty, "ignoring self-referencing implementation");
            self.read_schema(&class_overrides.without(PROP_IMPLEMENTATION))?
        } else {
            self.read_schema(class_overrides)?
        };
        Ok(match overlay {
            Some(overlay) => Some(merge(base.as_ref(), &overlay)),
            None => base,
        })
    }

    /// Every recognized override field except the implementation,
    /// discriminator and external docs.
    fn read_overrides(&mut self, o: &OverrideMap) -> Result<Schema, SchemaError> {
        let not = match o.get(PROP_NOT) {
            Some(value) => self.read_schema_value(value)?.map(Box::new),
            None => None,
        };

        Ok(Schema {
            ref_: o.string(PROP_REF).map(normalize_ref),
            name: o.string(PROP_NAME),
            schema_type: o.schema_type(PROP_TYPE),
            format: o.string(PROP_FORMAT),
            title: o.string(PROP_TITLE),
            description: o.string(PROP_DESCRIPTION),
            default_value: o.literal(PROP_DEFAULT_VALUE),
            example: o.literal(PROP_EXAMPLE),
            deprecated: o.bool(PROP_DEPRECATED),
            nullable: o.bool(PROP_NULLABLE),
            read_only: o.bool(PROP_READ_ONLY),
            write_only: o.bool(PROP_WRITE_ONLY),
            multiple_of: o.number(PROP_MULTIPLE_OF),
            maximum: o.number(PROP_MAXIMUM),
            exclusive_maximum: o.bool(PROP_EXCLUSIVE_MAXIMUM),
            minimum: o.number(PROP_MINIMUM),
            exclusive_minimum: o.bool(PROP_EXCLUSIVE_MINIMUM),
            max_length: o.count(PROP_MAX_LENGTH),
            min_length: o.count(PROP_MIN_LENGTH),
            pattern: o.string(PROP_PATTERN),
            max_properties: o.count(PROP_MAX_PROPERTIES),
            min_properties: o.count(PROP_MIN_PROPERTIES),
            required: o.strings(PROP_REQUIRED_PROPERTIES),
            max_items: o.count(PROP_MAX_ITEMS),
            min_items: o.count(PROP_MIN_ITEMS),
            unique_items: o.bool(PROP_UNIQUE_ITEMS),
            one_of: self.read_schemas(o, PROP_ONE_OF)?,
            any_of: self.read_schemas(o, PROP_ANY_OF)?,
            all_of: self.read_schemas(o, PROP_ALL_OF)?,
            not,
            enumeration: o.literals(PROP_ENUMERATION).filter(|values| !values.is_empty()),
            extensions: read_extensions(o),
            ..Schema::default()
        })
    }

    /// A composition list; hidden or unresolvable entries are dropped.
    fn read_schemas(&mut self, o: &OverrideMap, key: &str) -> Result<Option<Vec<Schema>>, SchemaError> {
        let Some(values) = o.list(key) else {
            return Ok(None);
        };
        let mut schemas = Vec::with_capacity(values.len());
        for value in values {
            if let Some(schema) = self.read_schema_value(value)? {
                schemas.push(schema);
            }
        }
        Ok(Some(schemas))
    }

    /// A type reference resolves by reference; nested overrides resolve as an
    /// inline schema.
    fn read_schema_value(&mut self, value: &OverrideValue) -> Result<Option<Schema>, SchemaError> {
        match value {
            OverrideValue::Type(ty) => self.schema_for_type(ty, true),
            OverrideValue::Nested(nested) => self.read_schema(nested),
            other => {
                tracing::warn!(value = ?other, "expected a type or nested schema overrides");
                Ok(None)
            }
        }
    }
}

/// Short refs (`Pet`) point into the components section.
fn normalize_ref(schema_ref: String) -> String {
    if schema_ref.contains('/') || schema_ref.starts_with('#') {
        schema_ref
    } else {
        ref_for_name(&schema_ref)
    }
}

fn read_external_docs(o: &OverrideMap) -> Option<ExternalDocs> {
    let docs = match o.nested(PROP_EXTERNAL_DOCS) {
        Some(nested) => ExternalDocs {
            description: nested.string(PROP_DESCRIPTION),
            url: nested.string(PROP_URL),
        },
        None => ExternalDocs {
            description: o.string(PROP_EXTERNAL_DOCS_DESCRIPTION),
            url: o.string(PROP_EXTERNAL_DOCS_URL),
        },
    };
    if docs.description.is_none() && docs.url.is_none() && !o.contains(PROP_EXTERNAL_DOCS) {
        return None;
    }
    Some(docs)
}

fn read_extensions(o: &OverrideMap) -> std::collections::BTreeMap<String, serde_json::Value> {
    let Some(nested) = o.nested(PROP_EXTENSIONS) else {
        return Default::default();
    };
    nested
        .explicit_keys()
        .filter_map(|name| {
            if !name.starts_with(EXTENSION_PREFIX) {
                tracing::warn!(extension = name, "extension names must start with \"x-\"");
                return None;
            }
            nested.literal(name).map(|value| (name.to_string(), value))
        })
        .collect()
}

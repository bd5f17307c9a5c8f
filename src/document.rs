//! Document assembly: a resolved root schema plus the components section.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::SchemaError;
use crate::factory::SchemaFactory;
use crate::model::Schema;
use crate::overrides::OverrideMap;
use crate::registry::SchemaRegistry;
use crate::types::{FactoryOptions, TypeDescriptor, TypeIndex};

/// The `components` section: one entry per registered definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Components {
    pub schemas: BTreeMap<String, Schema>,
}

impl From<SchemaRegistry> for Components {
    fn from(registry: SchemaRegistry) -> Self {
        Self {
            schemas: registry.into_components().into_iter().collect(),
        }
    }
}

/// Output of one resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaDocument {
    /// The requested schema; absent when hidden or unresolvable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    pub components: Components,
}

impl SchemaDocument {
    /// Follow a root `$ref` into the components section.
    pub fn definition(&self, name: &str) -> Option<&Schema> {
        self.components.schemas.get(name)
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Resolve one type (with optional position overrides) in a fresh pass.
///
/// # Errors
///
/// Returns `SchemaError::NotRegistered` only on registry misuse.
pub fn resolve_type(
    index: &TypeIndex,
    ty: &TypeDescriptor,
    overrides: Option<&OverrideMap>,
    options: &FactoryOptions,
) -> Result<SchemaDocument, SchemaError> {
    tracing::debug!(type_name = %ty, "starting resolution pass");
    let mut factory = SchemaFactory::with_options(index, options.clone());
    let schema = factory.resolve(ty, overrides)?;
    Ok(SchemaDocument {
        schema,
        components: factory.into_registry().into(),
    })
}

/// Resolve every non-generic type in the index in a single pass.
///
/// Generic templates (types declaring type parameters) only appear through
/// their parameterized uses.
///
/// # Errors
///
/// Returns `SchemaError::NotRegistered` only on registry misuse.
pub fn resolve_all(index: &TypeIndex, options: &FactoryOptions) -> Result<Components, SchemaError> {
    let mut factory = SchemaFactory::with_options(index, options.clone());
    for name in index.names() {
        let Some(info) = index.get(name) else {
            continue;
        };
        if !info.type_parameters.is_empty() {
            continue;
        }
        factory.resolve(&info.descriptor(), None)?;
    }
    tracing::debug!(definitions = factory.registry().len(), "resolution pass complete");
    Ok(factory.into_registry().into())
}

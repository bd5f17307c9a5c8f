//! Discriminator resolution.

use crate::error::SchemaError;
use crate::factory::SchemaFactory;
use crate::model::Discriminator;
use crate::overrides::{OverrideValue, PROP_SCHEMA, PROP_VALUE};
use crate::registry::name_from_ref;

/// Build discriminator metadata from a property name and mapping entries.
///
/// Returns `None` only when both are absent. A missing property name is kept
/// as an empty string. Each mapping entry takes its explicit `value` or, when
/// omitted, the registered name of its `schema` type. Entries whose type
/// cannot be resolved are kept with no ref.
///
/// # Errors
///
/// Propagates registry misuse from resolving the mapped types.
pub fn read_discriminator(
    factory: &mut SchemaFactory<'_>,
    property_name: Option<String>,
    mapping: Option<&[OverrideValue]>,
) -> Result<Option<Discriminator>, SchemaError> {
    if property_name.is_none() && mapping.is_none() {
        return Ok(None);
    }

    let mut discriminator = Discriminator::new(property_name.unwrap_or_default());

    for entry in mapping.unwrap_or_default() {
        let OverrideValue::Nested(entry) = entry else {
            tracing::warn!("ignoring discriminator mapping entry that is not a nested override");
            continue;
        };

        let schema_ref = match entry.type_ref(PROP_SCHEMA) {
            Some(ty) => factory
                .introspect(ty, true)?
                .and_then(|schema| schema.ref_),
            None => None,
        };

        let value = entry
            .string(PROP_VALUE)
            .or_else(|| schema_ref.as_deref().map(|r| name_from_ref(r).to_string()));

        if schema_ref.is_none() {
            tracing::debug!(value = ?value, "discriminator mapping without resolvable schema");
        }
        discriminator.add_mapping(value, schema_ref);
    }

    Ok(Some(discriminator))
}

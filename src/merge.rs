//! Schema merging.

use indexmap::IndexMap;

use crate::model::{Schema, SchemaType};

/// Overlay `overlay`'s explicitly set fields onto `base`, returning a new schema.
///
/// A field set on the overlay wins, including explicit `false`, `0` and empty
/// strings; otherwise the base value is kept. `oneOf`/`anyOf`/`allOf` are
/// replaced wholesale. `properties` and extensions merge key by key, with
/// properties present on both sides merged recursively.
pub fn merge(base: Option<&Schema>, overlay: &Schema) -> Schema {
    let Some(base) = base else {
        return overlay.clone();
    };

    Schema {
        ref_: pick(&base.ref_, &overlay.ref_),
        name: pick(&base.name, &overlay.name),
        schema_type: pick(&base.schema_type, &overlay.schema_type),
        format: pick(&base.format, &overlay.format),
        title: pick(&base.title, &overlay.title),
        description: pick(&base.description, &overlay.description),
        default_value: pick(&base.default_value, &overlay.default_value),
        example: pick(&base.example, &overlay.example),
        deprecated: pick(&base.deprecated, &overlay.deprecated),
        nullable: pick(&base.nullable, &overlay.nullable),
        read_only: pick(&base.read_only, &overlay.read_only),
        write_only: pick(&base.write_only, &overlay.write_only),
        multiple_of: pick(&base.multiple_of, &overlay.multiple_of),
        maximum: pick(&base.maximum, &overlay.maximum),
        exclusive_maximum: pick(&base.exclusive_maximum, &overlay.exclusive_maximum),
        minimum: pick(&base.minimum, &overlay.minimum),
        exclusive_minimum: pick(&base.exclusive_minimum, &overlay.exclusive_minimum),
        max_length: pick(&base.max_length, &overlay.max_length),
        min_length: pick(&base.min_length, &overlay.min_length),
        pattern: pick(&base.pattern, &overlay.pattern),
        max_properties: pick(&base.max_properties, &overlay.max_properties),
        min_properties: pick(&base.min_properties, &overlay.min_properties),
        required: pick(&base.required, &overlay.required),
        properties: merge_properties(&base.properties, &overlay.properties),
        items: pick(&base.items, &overlay.items),
        max_items: pick(&base.max_items, &overlay.max_items),
        min_items: pick(&base.min_items, &overlay.min_items),
        unique_items: pick(&base.unique_items, &overlay.unique_items),
        one_of: pick(&base.one_of, &overlay.one_of),
        any_of: pick(&base.any_of, &overlay.any_of),
        all_of: pick(&base.all_of, &overlay.all_of),
        not: pick(&base.not, &overlay.not),
        enumeration: pick(&base.enumeration, &overlay.enumeration),
        discriminator: pick(&base.discriminator, &overlay.discriminator),
        external_docs: pick(&base.external_docs, &overlay.external_docs),
        extensions: base
            .extensions
            .iter()
            .chain(&overlay.extensions)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    }
}

/// Combine an implementation schema with an overlay built from overrides.
///
/// An overlay declaring `type: array` without items of its own wraps the
/// implementation as its `items`; any other overlay is merged onto it.
pub fn apply_implementation(implementation: Option<Schema>, overlay: Schema) -> Schema {
    let Some(implementation) = implementation else {
        return overlay;
    };
    if is_array_wrapper(&overlay) {
        let mut wrapper = overlay;
        wrapper.items = Some(Box::new(implementation));
        wrapper
    } else {
        merge(Some(&implementation), &overlay)
    }
}

/// True when `schema` declares `type: array` and has no items.
pub fn is_array_wrapper(schema: &Schema) -> bool {
    schema.schema_type == Some(SchemaType::Array) && schema.items.is_none()
}

fn pick<T: Clone>(base: &Option<T>, overlay: &Option<T>) -> Option<T> {
    overlay.as_ref().or(base.as_ref()).cloned()
}

fn merge_properties(
    base: &Option<IndexMap<String, Schema>>,
    overlay: &Option<IndexMap<String, Schema>>,
) -> Option<IndexMap<String, Schema>> {
    match (base, overlay) {
        (Some(base), Some(overlay)) => {
            let mut merged = base.clone();
            for (name, schema) in overlay {
                let combined = merge(base.get(name), schema);
                merged.insert(name.clone(), combined);
            }
            Some(merged)
        }
        _ => pick(base, overlay),
    }
}

//! Schema Factory
//!
//! Resolves structural type descriptions plus declarative overrides into
//! OpenAPI schema trees.
//!
//! A resolution pass walks a graph of class, enum, array, primitive and
//! generic types, registers every class-like type once in a pass-scoped
//! registry (handing out `$ref`s, which also breaks reference cycles), and
//! merges explicitly supplied override values on top of the structurally
//! derived schemas.
//!
//! # Example
//!
//! ```
//! use schema_factory::{
//!     FieldInfo, OverrideMap, Primitive, SchemaFactory, TypeDescriptor, TypeIndex, TypeInfo,
//! };
//! use serde_json::json;
//!
//! let index = TypeIndex::new().with(
//!     TypeInfo::class("Pet")
//!         .field(FieldInfo::new("name", TypeDescriptor::Primitive(Primitive::String)))
//!         .field(FieldInfo::new("age", TypeDescriptor::Primitive(Primitive::Int32))),
//! );
//!
//! let mut factory = SchemaFactory::new(&index);
//! let overrides = OverrideMap::new()
//!     .with("implementation", TypeDescriptor::class("Pet"))
//!     .with("type", "array");
//! let schema = factory.read_schema(&overrides).unwrap().unwrap();
//!
//! assert_eq!(
//!     schema.to_value(),
//!     json!({ "type": "array", "items": { "$ref": "#/components/schemas/Pet" } })
//! );
//!
//! let registry = factory.into_registry();
//! assert_eq!(registry.definitions()[0].name, "Pet");
//! ```
//!
//! # Override Priority
//!
//! | Position | Base schema | Overrides |
//! |----------|-------------|-----------|
//! | field / root without `implementation` | declared type | merged on top |
//! | `implementation` only | `$ref` to the implementation | - |
//! | `implementation` + `type: array` | - | implementation `$ref` becomes `items` |
//! | `implementation` + anything else | inline implementation schema | merged on top, or wrap it as `items` when `type: array` |
//! | `hidden: true` | - | position omitted |

mod discriminator;
mod document;
mod error;
mod factory;
mod loader;
mod merge;
mod model;
mod overrides;
mod registry;
mod structural;
mod types;
mod validator;

pub use discriminator::read_discriminator;
pub use document::{resolve_all, resolve_type, Components, SchemaDocument};
pub use error::{ModelError, SchemaError, ValidateError, Violation};
pub use factory::{implementation_role, ImplementationRole, SchemaFactory};
pub use loader::{load_json, load_model, load_model_str, load_overrides_str, model_from_value};
pub use merge::{apply_implementation, is_array_wrapper, merge};
pub use model::{Discriminator, ExternalDocs, MappingEntry, Schema, SchemaType};
pub use overrides::{OverrideMap, OverrideValue};
pub use registry::{name_from_ref, ref_for_name, RegistryEntry, SchemaRegistry, REF_PREFIX};
pub use structural::{primitive_schema, resolve_structural};
pub use types::{
    FactoryOptions, FieldInfo, Primitive, TypeDescriptor, TypeIndex, TypeInfo, TypeInfoKind,
};
pub use validator::{to_json_schema, validate};

/// Override property names.
pub mod props {
    pub use crate::overrides::{
        EXTENSION_PREFIX, PROP_ALL_OF, PROP_ANY_OF, PROP_DEFAULT_VALUE, PROP_DEPRECATED,
        PROP_DESCRIPTION, PROP_DISCRIMINATOR_MAPPING, PROP_DISCRIMINATOR_PROPERTY, PROP_ENUMERATION,
        PROP_EXAMPLE, PROP_EXCLUSIVE_MAXIMUM, PROP_EXCLUSIVE_MINIMUM, PROP_EXTENSIONS,
        PROP_EXTERNAL_DOCS, PROP_EXTERNAL_DOCS_DESCRIPTION, PROP_EXTERNAL_DOCS_URL, PROP_FORMAT,
        PROP_HIDDEN, PROP_IMPLEMENTATION, PROP_MAXIMUM, PROP_MAX_ITEMS, PROP_MAX_LENGTH,
        PROP_MAX_PROPERTIES, PROP_MINIMUM, PROP_MIN_ITEMS, PROP_MIN_LENGTH, PROP_MIN_PROPERTIES,
        PROP_MULTIPLE_OF, PROP_NAME, PROP_NOT, PROP_NULLABLE, PROP_ONE_OF, PROP_PATTERN,
        PROP_READ_ONLY, PROP_REF, PROP_REQUIRED, PROP_REQUIRED_PROPERTIES, PROP_SCHEMA, PROP_TITLE,
        PROP_TYPE, PROP_UNIQUE_ITEMS, PROP_URL, PROP_VALUE, PROP_WRITE_ONLY,
    };
}

//! Integration tests for schema resolution passes.

use serde_json::{json, Value};
use schema_factory::{
    load_model_str, merge, resolve_all, resolve_type, FactoryOptions, FieldInfo, OverrideMap,
    OverrideValue, Primitive, Schema, SchemaDocument, SchemaFactory, TypeDescriptor, TypeIndex,
    TypeInfo,
};

fn string() -> TypeDescriptor {
    TypeDescriptor::Primitive(Primitive::String)
}

fn int32() -> TypeDescriptor {
    TypeDescriptor::Primitive(Primitive::Int32)
}

fn pet_index() -> TypeIndex {
    TypeIndex::new().with(
        TypeInfo::class("Pet")
            .field(FieldInfo::new("name", string()))
            .field(FieldInfo::new("age", int32())),
    )
}

fn pet_definition() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": { "type": "string" },
            "age": { "type": "integer", "format": "int32" }
        }
    })
}

fn resolve(index: &TypeIndex, expr: &str, overrides: Option<&OverrideMap>) -> SchemaDocument {
    let ty = index.parse_type(expr).unwrap();
    resolve_type(index, &ty, overrides, &FactoryOptions::default()).unwrap()
}

fn schema_value(doc: &SchemaDocument) -> Value {
    doc.schema.as_ref().map(Schema::to_value).unwrap_or(Value::Null)
}

fn component(doc: &SchemaDocument, name: &str) -> Value {
    doc.definition(name)
        .map(Schema::to_value)
        .unwrap_or(Value::Null)
}

// === Implementation Overrides ===

mod implementation {
    use super::*;

    #[test]
    fn implementation_with_array_type_references_items() {
        let index = pet_index();
        let overrides = OverrideMap::new()
            .with("implementation", TypeDescriptor::class("Pet"))
            .with("type", "array");

        let doc = resolve(&index, "string", Some(&overrides));

        assert_eq!(
            schema_value(&doc),
            json!({ "type": "array", "items": { "$ref": "#/components/schemas/Pet" } })
        );
        assert_eq!(component(&doc, "Pet"), pet_definition());
    }

    #[test]
    fn implementation_alone_is_a_reference() {
        let index = pet_index();
        let overrides = OverrideMap::new().with("implementation", TypeDescriptor::class("Pet"));

        let doc = resolve(&index, "string", Some(&overrides));

        assert_eq!(
            schema_value(&doc),
            json!({ "$ref": "#/components/schemas/Pet" })
        );
    }

    #[test]
    fn described_array_inlines_implementation_as_items() {
        let index = pet_index();
        let overrides = OverrideMap::new()
            .with("implementation", TypeDescriptor::class("Pet"))
            .with("type", "array")
            .with("description", "All pets");

        let doc = resolve(&index, "string", Some(&overrides));

        assert_eq!(
            schema_value(&doc),
            json!({
                "type": "array",
                "description": "All pets",
                "items": pet_definition()
            })
        );
        // Inline introspection registers nothing for the implementation.
        assert!(doc.components.schemas.is_empty());
    }

    #[test]
    fn inline_implementation_takes_overrides_on_top() {
        let index = pet_index();
        let overrides = OverrideMap::new()
            .with("implementation", TypeDescriptor::class("Pet"))
            .with("title", "A pet");

        let doc = resolve(&index, "string", Some(&overrides));
        let schema = schema_value(&doc);

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["title"], "A pet");
        assert_eq!(schema["properties"]["age"]["format"], "int32");
    }

    #[test]
    fn array_implementation_keeps_component_reference() {
        let index = pet_index();
        let overrides = OverrideMap::new()
            .with(
                "implementation",
                TypeDescriptor::array(TypeDescriptor::class("Pet")),
            )
            .with("description", "Pets in the shop");

        let doc = resolve(&index, "string", Some(&overrides));

        assert_eq!(
            schema_value(&doc),
            json!({
                "type": "array",
                "description": "Pets in the shop",
                "items": { "$ref": "#/components/schemas/Pet" }
            })
        );
        assert_eq!(component(&doc, "Pet"), pet_definition());
    }

    #[test]
    fn primitive_implementation_is_resolved_inline() {
        let index = TypeIndex::new();
        let overrides = OverrideMap::new()
            .with("implementation", TypeDescriptor::Primitive(Primitive::Int64))
            .with("minimum", 0);

        let doc = resolve(&index, "string", Some(&overrides));

        assert_eq!(
            schema_value(&doc),
            json!({ "type": "integer", "format": "int64", "minimum": 0.0 })
        );
    }
}

// === Registration and Cycles ===

mod registration {
    use super::*;

    #[test]
    fn self_reference_terminates() {
        let index = TypeIndex::new().with(
            TypeInfo::class("Node")
                .field(FieldInfo::new("value", int32()))
                .field(FieldInfo::new("next", TypeDescriptor::class("Node"))),
        );

        let doc = resolve(&index, "Node", None);

        assert_eq!(schema_value(&doc), json!({ "$ref": "#/components/schemas/Node" }));
        assert_eq!(
            component(&doc, "Node")["properties"]["next"],
            json!({ "$ref": "#/components/schemas/Node" })
        );
    }

    fn tree_node_index() -> TypeIndex {
        TypeIndex::new().with(
            TypeInfo::class("TreeNode")
                .field(FieldInfo::new("label", string()))
                .field(
                    FieldInfo::new("parent", TypeDescriptor::class("TreeNode")).with_overrides(
                        OverrideMap::new()
                            .with("implementation", TypeDescriptor::class("TreeNode"))
                            .with("description", "the parent node"),
                    ),
                ),
        )
    }

    #[test]
    fn self_reference_through_inline_implementation_terminates() {
        let doc = resolve(&tree_node_index(), "TreeNode", None);

        assert_eq!(schema_value(&doc), json!({ "$ref": "#/components/schemas/TreeNode" }));
        assert_eq!(
            component(&doc, "TreeNode")["properties"]["parent"],
            json!({
                "$ref": "#/components/schemas/TreeNode",
                "description": "the parent node"
            })
        );
    }

    #[test]
    fn inline_root_with_self_reference_terminates() {
        let index = tree_node_index();
        let overrides = OverrideMap::new()
            .with("implementation", TypeDescriptor::class("TreeNode"))
            .with("title", "Root");

        let doc = resolve(&index, "string", Some(&overrides));
        let schema = schema_value(&doc);

        assert_eq!(schema["title"], "Root");
        assert_eq!(schema["type"], "object");
        assert_eq!(
            schema["properties"]["parent"]["$ref"],
            "#/components/schemas/TreeNode"
        );
        assert!(doc.definition("TreeNode").is_some());
    }

    #[test]
    fn class_implemented_by_itself_terminates() {
        let index = TypeIndex::new().with(
            TypeInfo::class("Node")
                .field(FieldInfo::new("value", int32()))
                .with_overrides(
                    OverrideMap::new()
                        .with("implementation", TypeDescriptor::class("Node"))
                        .with("description", "a node"),
                ),
        );

        let doc = resolve(&index, "Node", None);

        assert_eq!(schema_value(&doc), json!({ "$ref": "#/components/schemas/Node" }));
        assert_eq!(
            component(&doc, "Node"),
            json!({
                "type": "object",
                "description": "a node",
                "properties": { "value": { "type": "integer", "format": "int32" } }
            })
        );
    }

    #[test]
    fn mutual_references_terminate() {
        let index = TypeIndex::new()
            .with(TypeInfo::class("Owner").field(FieldInfo::new(
                "pets",
                TypeDescriptor::array(TypeDescriptor::class("Pet")),
            )))
            .with(TypeInfo::class("Pet").field(FieldInfo::new("owner", TypeDescriptor::class("Owner"))));

        let doc = resolve(&index, "Owner", None);

        assert_eq!(doc.components.schemas.len(), 2);
        assert_eq!(
            component(&doc, "Owner")["properties"]["pets"],
            json!({ "type": "array", "items": { "$ref": "#/components/schemas/Pet" } })
        );
        assert_eq!(
            component(&doc, "Pet")["properties"]["owner"],
            json!({ "$ref": "#/components/schemas/Owner" })
        );
    }

    #[test]
    fn repeated_use_registers_once() {
        let index = pet_index().with(
            TypeInfo::class("Household")
                .field(FieldInfo::new("first", TypeDescriptor::class("Pet")))
                .field(FieldInfo::new("second", TypeDescriptor::class("Pet"))),
        );

        let doc = resolve(&index, "Household", None);

        assert_eq!(doc.components.schemas.len(), 2);
        let household = component(&doc, "Household");
        assert_eq!(household["properties"]["first"], household["properties"]["second"]);
    }

    #[test]
    fn colliding_simple_names_get_suffixes() {
        let index = TypeIndex::new()
            .with(TypeInfo::class("com.a.Pet").field(FieldInfo::new("name", string())))
            .with(TypeInfo::class("com.b.Pet").field(FieldInfo::new("id", int32())))
            .with(
                TypeInfo::class("Zoo")
                    .field(FieldInfo::new("a", TypeDescriptor::class("com.a.Pet")))
                    .field(FieldInfo::new("b", TypeDescriptor::class("com.b.Pet"))),
            );

        let mut factory = SchemaFactory::new(&index);
        factory.resolve(&TypeDescriptor::class("Zoo"), None).unwrap();
        let registry = factory.into_registry();

        let names: Vec<&str> = registry.definitions().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Zoo", "Pet", "Pet1"]);
        assert_eq!(
            registry.by_name("Pet1").map(|e| e.type_name.as_str()),
            Some("com.b.Pet")
        );
    }

    #[test]
    fn class_name_override_renames_definition() {
        let index = TypeIndex::new().with(
            TypeInfo::class("PetDto")
                .field(FieldInfo::new("name", string()))
                .with_overrides(OverrideMap::new().with("name", "Pet")),
        );

        let doc = resolve(&index, "PetDto", None);

        assert_eq!(schema_value(&doc), json!({ "$ref": "#/components/schemas/Pet" }));
        assert!(doc.definition("PetDto").is_none());
        assert_eq!(component(&doc, "Pet")["properties"]["name"]["type"], "string");
    }

    #[test]
    fn unresolved_field_type_is_dropped() {
        let index = TypeIndex::new().with(
            TypeInfo::class("Pet")
                .field(FieldInfo::new("name", string()))
                .field(FieldInfo::new("tag", TypeDescriptor::class("Missing"))),
        );

        let doc = resolve(&index, "Pet", None);

        assert_eq!(
            component(&doc, "Pet")["properties"],
            json!({ "name": { "type": "string" } })
        );
    }
}

// === Property Order ===

mod property_order {
    use super::*;

    #[test]
    fn properties_keep_declaration_order() {
        let doc = resolve(&pet_index(), "Pet", None);

        let pet = component(&doc, "Pet");
        let keys: Vec<&str> = pet["properties"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["name", "age"]);
    }

    #[test]
    fn inherited_fields_come_first() {
        let index = TypeIndex::new()
            .with(TypeInfo::class("Animal").field(FieldInfo::new("zoneId", int32())))
            .with(
                TypeInfo::class("Dog")
                    .extends("Animal")
                    .field(FieldInfo::new("breed", string())),
            );

        let doc = resolve(&index, "Dog", None);

        let rendered = serde_json::to_string(&component(&doc, "Dog")["properties"]).unwrap();
        assert_eq!(
            rendered,
            r#"{"zoneId":{"type":"integer","format":"int32"},"breed":{"type":"string"}}"#
        );
    }
}

// === Enums ===

mod enums {
    use super::*;

    #[test]
    fn constant_order_does_not_matter() {
        let forward = TypeIndex::new().with(TypeInfo::enumeration("Color", ["RED", "GREEN", "BLUE"]));
        let backward = TypeIndex::new().with(TypeInfo::enumeration("Color", ["BLUE", "GREEN", "RED"]));

        let a = resolve(&forward, "Color", None);
        let b = resolve(&backward, "Color", None);

        assert_eq!(a, b);
        assert_eq!(
            component(&a, "Color"),
            json!({ "type": "string", "enum": ["BLUE", "GREEN", "RED"] })
        );
    }

    #[test]
    fn enumeration_override_replaces_constants() {
        let index = TypeIndex::new().with(
            TypeInfo::class("Pet").field(
                FieldInfo::new("status", string()).with_overrides(OverrideMap::new().with(
                    "enumeration",
                    vec![
                        OverrideValue::from("available"),
                        OverrideValue::from("sold"),
                    ],
                )),
            ),
        );

        let doc = resolve(&index, "Pet", None);

        assert_eq!(
            component(&doc, "Pet")["properties"]["status"],
            json!({ "type": "string", "enum": ["available", "sold"] })
        );
    }
}

// === Discriminators ===

mod discriminators {
    use super::*;

    fn animal_index() -> TypeIndex {
        let mapping = vec![
            OverrideValue::from(OverrideMap::new().with("schema", TypeDescriptor::class("Dog"))),
            OverrideValue::from(
                OverrideMap::new()
                    .with("value", "cat")
                    .with("schema", TypeDescriptor::class("Cat")),
            ),
            OverrideValue::from(
                OverrideMap::new()
                    .with("value", "ghost")
                    .with("schema", TypeDescriptor::class("Ghost")),
            ),
        ];

        TypeIndex::new()
            .with(
                TypeInfo::class("Animal")
                    .field(FieldInfo::new("kind", string()))
                    .with_overrides(
                        OverrideMap::new()
                            .with("discriminatorProperty", "kind")
                            .with("discriminatorMapping", mapping),
                    ),
            )
            .with(TypeInfo::class("Dog").extends("Animal").field(FieldInfo::new("barks", TypeDescriptor::Primitive(Primitive::Boolean))))
            .with(TypeInfo::class("Cat").extends("Animal"))
    }

    #[test]
    fn mapping_value_defaults_to_registered_name() {
        let doc = resolve(&animal_index(), "Animal", None);

        assert_eq!(
            component(&doc, "Animal")["discriminator"],
            json!({
                "propertyName": "kind",
                "mapping": {
                    "Dog": "#/components/schemas/Dog",
                    "cat": "#/components/schemas/Cat",
                    "ghost": null
                }
            })
        );
    }

    #[test]
    fn mapped_types_are_registered() {
        let doc = resolve(&animal_index(), "Animal", None);

        let names: Vec<&str> = doc.components.schemas.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["Animal", "Cat", "Dog"]);
        // Subclasses inherit the superclass fields.
        assert_eq!(
            component(&doc, "Dog")["properties"],
            json!({ "kind": { "type": "string" }, "barks": { "type": "boolean" } })
        );
    }

    #[test]
    fn property_without_mapping() {
        let index = TypeIndex::new();
        let overrides = OverrideMap::new()
            .with("type", "object")
            .with("discriminatorProperty", "");

        let doc = resolve(&index, "string", Some(&overrides));

        assert_eq!(
            schema_value(&doc),
            json!({ "type": "object", "discriminator": { "propertyName": "" } })
        );
    }
}

// === Hidden Positions ===

mod hidden {
    use super::*;

    fn hidden() -> OverrideMap {
        OverrideMap::new().with("hidden", true)
    }

    #[test]
    fn hidden_root_yields_nothing() {
        let doc = resolve(&pet_index(), "Pet", Some(&hidden()));
        assert_eq!(doc.schema, None);
        assert!(doc.components.schemas.is_empty());
    }

    #[test]
    fn hidden_field_is_omitted() {
        let index = TypeIndex::new().with(
            TypeInfo::class("Account")
                .field(FieldInfo::new("login", string()))
                .field(FieldInfo::new("password", string()).with_overrides(hidden())),
        );

        let doc = resolve(&index, "Account", None);

        assert_eq!(
            component(&doc, "Account")["properties"],
            json!({ "login": { "type": "string" } })
        );
    }

    #[test]
    fn hidden_class_is_never_registered() {
        let index = TypeIndex::new()
            .with(TypeInfo::class("Internal").with_overrides(hidden()))
            .with(
                TypeInfo::class("Account")
                    .field(FieldInfo::new("login", string()))
                    .field(FieldInfo::new("internal", TypeDescriptor::class("Internal"))),
            );

        let doc = resolve(&index, "Account", None);

        assert!(doc.definition("Internal").is_none());
        assert!(component(&doc, "Account")["properties"].get("internal").is_none());
    }

    #[test]
    fn hidden_composition_entry_is_dropped() {
        let index = pet_index();
        let overrides = OverrideMap::new().with(
            "oneOf",
            vec![
                OverrideValue::from(TypeDescriptor::class("Pet")),
                OverrideValue::from(hidden()),
                OverrideValue::from(OverrideMap::new().with("type", "string")),
            ],
        );

        let doc = resolve(&index, "Pet", Some(&overrides));

        assert_eq!(
            schema_value(&doc)["oneOf"],
            json!([{ "$ref": "#/components/schemas/Pet" }, { "type": "string" }])
        );
    }
}

// === Generics and Wrappers ===

mod generics {
    use super::*;

    fn page_index() -> TypeIndex {
        pet_index().with(
            TypeInfo::class("Page")
                .type_parameter("T")
                .field(FieldInfo::new("items", TypeDescriptor::array(TypeDescriptor::class("T"))))
                .field(FieldInfo::new("total", TypeDescriptor::Primitive(Primitive::Int64))),
        )
    }

    #[test]
    fn parameterized_type_gets_its_own_definition() {
        let doc = resolve(&page_index(), "Page<Pet>", None);

        assert_eq!(schema_value(&doc), json!({ "$ref": "#/components/schemas/PagePet" }));
        assert_eq!(
            component(&doc, "PagePet")["properties"]["items"],
            json!({ "type": "array", "items": { "$ref": "#/components/schemas/Pet" } })
        );
        assert!(doc.definition("Page").is_none());
    }

    #[test]
    fn async_wrapper_unwraps() {
        let doc = resolve(&pet_index(), "CompletableFuture<Pet>", None);
        assert_eq!(schema_value(&doc), json!({ "$ref": "#/components/schemas/Pet" }));
        assert_eq!(doc.components.schemas.len(), 1);
    }

    #[test]
    fn collection_wrapper_is_an_array() {
        let doc = resolve(&pet_index(), "List<Pet>", None);
        assert_eq!(
            schema_value(&doc),
            json!({ "type": "array", "items": { "$ref": "#/components/schemas/Pet" } })
        );
    }

    #[test]
    fn custom_wrappers_from_options() {
        let index = pet_index();
        let options = FactoryOptions::default()
            .async_wrapper("Mono")
            .opaque_type("Pet");

        let ty = index.parse_type("Mono<Pet>").unwrap();
        let doc = resolve_type(&index, &ty, None, &options).unwrap();

        assert_eq!(doc.schema, None);
        assert!(doc.components.schemas.is_empty());
    }

    #[test]
    fn resolve_all_covers_uses_of_templates() {
        let index = page_index().with(
            TypeInfo::class("Catalog").field(FieldInfo::new(
                "page",
                TypeDescriptor::parameterized("Page", vec![TypeDescriptor::class("Pet")]),
            )),
        );

        let components = resolve_all(&index, &FactoryOptions::default()).unwrap();
        let names: Vec<&str> = components.schemas.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["Catalog", "PagePet", "Pet"]);
    }
}

// === Field Overrides ===

mod field_overrides {
    use super::*;

    #[test]
    fn overrides_merge_onto_declared_type() {
        let index = TypeIndex::new().with(
            TypeInfo::class("Pet").field(
                FieldInfo::new("name", string()).with_overrides(
                    OverrideMap::new()
                        .with("description", "The pet's name")
                        .with("minLength", 1)
                        .with("required", true)
                        .with("name", "petName"),
                ),
            ),
        );

        let doc = resolve(&index, "Pet", None);
        let pet = component(&doc, "Pet");

        assert_eq!(
            pet["properties"]["petName"],
            json!({ "type": "string", "description": "The pet's name", "minLength": 1 })
        );
        assert_eq!(pet["required"], json!(["petName"]));
    }

    #[test]
    fn explicit_false_overrides_win() {
        let index = TypeIndex::new().with(
            TypeInfo::class("Pet").field(
                FieldInfo::new("id", int32())
                    .with_overrides(OverrideMap::new().with("readOnly", false).with("minimum", 0)),
            ),
        );

        let doc = resolve(&index, "Pet", None);

        assert_eq!(
            component(&doc, "Pet")["properties"]["id"],
            json!({ "type": "integer", "format": "int32", "readOnly": false, "minimum": 0.0 })
        );
    }

    #[test]
    fn use_default_values_are_ignored() {
        let index = TypeIndex::new();
        let overrides = OverrideMap::new()
            .with("description", OverrideValue::UseDefault)
            .with("format", "email");

        let doc = resolve(&index, "string", Some(&overrides));

        assert_eq!(
            schema_value(&doc),
            json!({ "type": "string", "format": "email" })
        );
    }
}

// === Merge ===

mod merging {
    use super::*;

    #[test]
    fn merge_identities() {
        let schema = Schema::of_type(schema_factory::SchemaType::String).description("text");

        assert_eq!(merge(None, &schema), schema);
        assert_eq!(merge(Some(&schema), &Schema::default()), schema);
        assert_eq!(merge(Some(&Schema::default()), &schema), schema);
    }
}

// === Model Files ===

mod model_files {
    use super::*;

    const MODEL: &str = r#"{
        "types": [
            {
                "name": "Pet",
                "fields": [
                    { "name": "name", "type": "string", "overrides": { "required": true } },
                    { "name": "color", "type": "Color" },
                    { "name": "tags", "type": "List<string>", "overrides": { "maxItems": 5 } },
                    { "name": "internal", "type": "string", "overrides": { "hidden": true } }
                ],
                "overrides": {
                    "description": "A pet",
                    "extensions": { "x-owner": "store" }
                }
            },
            { "name": "Color", "kind": "enum", "constants": ["RED", "GREEN"] }
        ]
    }"#;

    #[test]
    fn model_resolves_end_to_end() {
        let index = load_model_str(MODEL).unwrap();
        let doc = resolve(&index, "Pet", None);

        assert_eq!(
            component(&doc, "Pet"),
            json!({
                "type": "object",
                "description": "A pet",
                "required": ["name"],
                "properties": {
                    "color": { "$ref": "#/components/schemas/Color" },
                    "name": { "type": "string" },
                    "tags": { "type": "array", "items": { "type": "string" }, "maxItems": 5 }
                },
                "x-owner": "store"
            })
        );
        assert_eq!(
            component(&doc, "Color"),
            json!({ "type": "string", "enum": ["GREEN", "RED"] })
        );
    }
}

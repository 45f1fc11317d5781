//! Integration tests for specification generation.

use std::fs;
use std::path::Path;

use schema_typegen::{
    generate, mapping_table, merge, ComponentReference, DocumentStore, GenerateError, Generator,
    Schema, Settings, Specification,
};
use serde_json::{json, Value};
use tempfile::TempDir;

const SPEC_ROOT: &str = "/work/api";
const MODEL_ROOT: &str = "/work/models";
const SPEC_DOCUMENT: &str = "/work/api/openapi.yaml";

fn settings() -> Settings {
    Settings::new(SPEC_ROOT, MODEL_ROOT)
        .unwrap()
        .spec(SPEC_DOCUMENT)
        .unwrap()
        .spec_package("example.com/api")
        .model_package("example.com/models")
}

fn store(schemas: Value) -> DocumentStore {
    let mut store = DocumentStore::new();
    store.insert(
        SPEC_DOCUMENT,
        json!({ "openapi": "3.0.3", "components": { "schemas": schemas } }),
    );
    store
}

fn run(schemas: Value) -> Result<Specification, GenerateError> {
    generate(&settings(), &mut store(schemas))
}

fn schema(value: Value) -> Schema {
    serde_json::from_value(value).unwrap()
}

// === Registry Tests ===

mod registry {
    use super::*;

    #[test]
    fn recreating_an_identity_is_a_cache_hit() {
        let settings = settings();
        let mut store = store(json!({
            "Tag": { "type": "string" }
        }));
        let mut generator = Generator::new(&settings, &mut store);
        let id = settings.spec_component("Pet").unwrap().unwrap();
        let pet = schema(json!({
            "type": "object",
            "properties": { "tag": { "$ref": "#/components/schemas/Tag" } }
        }));

        generator.create_component(id.clone(), pet.clone()).unwrap();
        let registered = generator.resolver().len();

        generator.create_component(id.clone(), pet).unwrap();
        assert_eq!(generator.resolver().len(), registered);
        assert_eq!(registered, 2);
    }

    #[test]
    fn shared_target_is_created_once() {
        let spec = run(json!({
            "Tag": { "type": "object" },
            "Pet": {
                "type": "object",
                "properties": {
                    "primary": { "$ref": "#/components/schemas/Tag" },
                    "secondary": { "$ref": "#/components/schemas/Tag" }
                }
            }
        }))
        .unwrap();

        let pet = spec.definition("Pet").unwrap();
        let primary = spec
            .definition_of(&pet.property("primary").unwrap().component)
            .unwrap();
        let secondary = spec
            .definition_of(&pet.property("secondary").unwrap().component)
            .unwrap();
        assert_eq!(primary.id, secondary.id);
        assert_eq!(primary.id.to_string(), "/work/api/openapi#/components/schemas/Tag");
    }

    #[test]
    fn reference_components_follow_to_definition() {
        let spec = run(json!({
            "Animal": { "type": "object", "properties": { "name": { "type": "string" } } },
            "Pet": { "$ref": "#/components/schemas/Animal" },
            "Companion": { "$ref": "#/components/schemas/Pet" }
        }))
        .unwrap();

        let companion = spec.component("Companion").unwrap();
        assert!(companion.is_reference());
        let definition = spec.definition_of(companion).unwrap();
        assert_eq!(definition.id.type_name(), "Animal");
        assert!(definition.property("name").is_some());
    }
}

// === Cycle Tests ===

mod cycles {
    use super::*;

    #[test]
    fn self_reference_points_back_at_owner() {
        let spec = run(json!({
            "Node": {
                "type": "object",
                "properties": {
                    "value": { "type": "string" },
                    "next": { "$ref": "#/components/schemas/Node" }
                }
            }
        }))
        .unwrap();

        let node = spec.definition("Node").unwrap();
        let next = node.property("next").unwrap();
        assert_eq!(next.component.reference.as_ref(), Some(&node.id));
        assert_eq!(spec.definition_of(&next.component).unwrap().id, node.id);
    }

    #[test]
    fn mutual_references_terminate() {
        let spec = run(json!({
            "Person": {
                "type": "object",
                "properties": { "employer": { "$ref": "#/components/schemas/Company" } }
            },
            "Company": {
                "type": "object",
                "properties": {
                    "staff": { "type": "array", "items": { "$ref": "#/components/schemas/Person" } }
                }
            }
        }))
        .unwrap();

        let person = spec.definition("Person").unwrap();
        let company = spec
            .definition_of(&person.property("employer").unwrap().component)
            .unwrap();
        let staff = spec
            .definition_of(&company.property("staff").unwrap().component)
            .unwrap();
        let item = spec.definition_of(staff.items.as_deref().unwrap()).unwrap();
        assert_eq!(item.id, person.id);
    }

    #[test]
    fn cycle_through_inline_object() {
        let spec = run(json!({
            "Tree": {
                "type": "object",
                "properties": {
                    "meta": {
                        "type": "object",
                        "properties": { "parent": { "$ref": "#/components/schemas/Tree" } }
                    }
                }
            }
        }))
        .unwrap();

        let tree = spec.definition("Tree").unwrap();
        let meta = spec
            .definition_of(&tree.property("meta").unwrap().component)
            .unwrap();
        assert_eq!(
            meta.id.to_string(),
            "/work/api/openapi#/components/schemas/Tree/meta"
        );
        let parent = meta.property("parent").unwrap();
        assert_eq!(parent.component.reference.as_ref(), Some(&tree.id));
    }
}

// === Merge Tests ===

mod merging {
    use super::*;

    #[test]
    fn title_merge_is_not_commutative() {
        let x = schema(json!({ "type": "object", "title": "X" }));
        let y = schema(json!({ "type": "object", "title": "Y" }));

        let xy = merge(&x, &y).unwrap();
        let yx = merge(&y, &x).unwrap();
        assert_eq!(xy.title, "X\n\nY");
        assert_ne!(xy, yx);
    }

    #[test]
    fn required_fields_are_unioned_once() {
        let merged = merge(
            &schema(json!({ "type": "object", "required": ["x"] })),
            &schema(json!({ "type": "object", "required": ["y"] })),
        )
        .unwrap();
        assert_eq!(merged.required, ["x", "y"]);

        let again = merge(&merged, &schema(json!({ "type": "object", "required": ["x"] }))).unwrap();
        assert_eq!(again.required, ["x", "y"]);
    }
}

// === Composition Tests ===

mod composition {
    use super::*;

    #[test]
    fn inline_fragment_is_folded_and_reference_kept() {
        let spec = run(json!({
            "Base": {
                "type": "object",
                "properties": { "id": { "type": "string" } }
            },
            "Derived": {
                "allOf": [
                    { "$ref": "#/components/schemas/Base" },
                    { "type": "object", "properties": { "name": { "type": "string" } } }
                ]
            }
        }))
        .unwrap();

        let derived = spec.definition("Derived").unwrap();
        assert_eq!(derived.composition.len(), 1);
        let parent = &derived.composition[0];
        assert!(!parent.inline);
        assert_eq!(
            spec.definition_of(&parent.component).unwrap().id.type_name(),
            "Base"
        );

        assert!(derived.property("name").is_some());
        assert!(derived.property("id").is_none());
    }

    #[test]
    fn parents_keep_declaration_order() {
        let spec = run(json!({
            "A": { "type": "object" },
            "B": { "type": "object" },
            "C": { "type": "object" },
            "Mixed": {
                "allOf": [
                    { "$ref": "#/components/schemas/C" },
                    { "type": "object", "description": "inline" },
                    { "$ref": "#/components/schemas/A" },
                    { "$ref": "#/components/schemas/B" }
                ]
            }
        }))
        .unwrap();

        let mixed = spec.definition("Mixed").unwrap();
        let parents: Vec<&str> = mixed
            .composition
            .iter()
            .map(|c| c.component.reference.as_ref().unwrap().type_name())
            .collect();
        assert_eq!(parents, ["C", "A", "B"]);
        assert_eq!(mixed.source_schema.description, "inline");
    }

    #[test]
    fn parent_pointers_do_not_alias_their_target() {
        let spec = run(json!({
            "Base": { "type": "object" },
            "Derived": { "allOf": [{ "$ref": "#/components/schemas/Base" }] }
        }))
        .unwrap();

        let parent = &spec.definition("Derived").unwrap().composition[0].component;
        assert_eq!(
            parent.id.to_string(),
            "/work/api/openapi#/components/schemas/Derived/$allOf/0"
        );
        assert_eq!(spec.definition_of(parent).unwrap().id.type_name(), "Base");
    }

    #[test]
    fn folded_union_beside_named_parent_aborts_run() {
        let result = run(json!({
            "Base": { "type": "object" },
            "Cat": { "type": "object" },
            "Pet": {
                "allOf": [
                    { "$ref": "#/components/schemas/Base" },
                    {
                        "type": "object",
                        "oneOf": [{ "$ref": "#/components/schemas/Cat" }],
                        "discriminator": { "propertyName": "kind" }
                    }
                ]
            }
        }));
        assert!(matches!(
            result,
            Err(GenerateError::DiscriminatorWithAllOf { .. })
        ));
    }

    #[test]
    fn folded_union_is_resolved() {
        let spec = run(json!({
            "Cat": { "type": "object" },
            "Pet": {
                "allOf": [{
                    "type": "object",
                    "oneOf": [{ "$ref": "#/components/schemas/Cat" }],
                    "discriminator": { "propertyName": "kind", "mapping": { "cat": "Cat" } }
                }]
            }
        }))
        .unwrap();

        let pet = spec.definition("Pet").unwrap();
        assert_eq!(pet.discriminator_components.len(), 1);
        assert_eq!(pet.discriminator_components[0].map_from_key, "cat");
    }

    #[test]
    fn non_object_fragment_aborts_run() {
        let result = run(json!({
            "Bad": { "allOf": [{ "type": "string" }] }
        }));
        assert!(matches!(result, Err(GenerateError::Merge { .. })));
    }
}

// === Polymorphism Tests ===

mod polymorphism {
    use super::*;

    fn pets() -> Value {
        json!({
            "Cat": { "type": "object", "properties": { "kind": { "type": "string" } } },
            "Dog": { "type": "object", "properties": { "kind": { "type": "string" } } },
            "Pet": {
                "oneOf": [
                    { "$ref": "#/components/schemas/Cat" },
                    { "$ref": "#/components/schemas/Dog" }
                ],
                "discriminator": {
                    "propertyName": "kind",
                    "mapping": { "a": "#/components/schemas/Cat" }
                }
            }
        })
    }

    #[test]
    fn mapping_table_has_one_key_per_variant() {
        let settings = settings();
        let schemas = pets();
        let mut store = store(schemas.clone());
        let generator = Generator::new(&settings, &mut store);
        let id = settings.spec_component("Pet").unwrap().unwrap();
        let td = schema_typegen::TypeDefinition::new(id, "", schema(schemas["Pet"].clone()));

        let table = mapping_table(&generator, &td).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table["a"].type_name(), "Cat");
        assert_eq!(table["Dog"].type_name(), "Dog");
    }

    #[test]
    fn discriminator_components_carry_keys() {
        let spec = run(pets()).unwrap();
        let pet = spec.definition("Pet").unwrap();

        let variants: Vec<(&str, &str)> = pet
            .discriminator_components
            .iter()
            .map(|d| (d.map_from_key.as_str(), d.discriminator_property_name.as_str()))
            .collect();
        assert_eq!(variants, [("a", "kind"), ("Dog", "kind")]);

        let cat = &pet.discriminator_components[0].component;
        let cat_definition = spec.definition("Cat").unwrap();
        assert_ne!(cat.id, cat_definition.id);
        assert_eq!(spec.definition_of(cat).unwrap().id, cat_definition.id);
        assert!(spec.registry.contains(&cat.id));
    }

    #[test]
    fn property_named_like_variant_keeps_variant_distinct() {
        let mut schemas = pets();
        schemas["Cat"]["properties"]["Variant"] = json!({ "type": "object" });
        let spec = run(schemas).unwrap();

        let pet = spec.definition("Pet").unwrap();
        let cat = &pet.discriminator_components[0].component;
        let registered = spec.registry.resolve(&cat.id).unwrap();
        assert_eq!(registered.reference.as_ref().unwrap().type_name(), "Cat");
        assert_eq!(spec.definition_of(registered).unwrap().id.type_name(), "Cat");

        let nested = &spec.definition("Cat").unwrap().property("Variant").unwrap().component;
        assert_ne!(nested.id, cat.id);
    }

    #[test]
    fn discriminator_with_own_properties_aborts_run() {
        let mut schemas = pets();
        schemas["Pet"]["properties"] = json!({ "kind": { "type": "string" } });
        assert!(matches!(
            run(schemas),
            Err(GenerateError::DiscriminatorWithProperties { .. })
        ));
    }

    #[test]
    fn discriminator_with_any_of_aborts_run() {
        let mut schemas = pets();
        schemas["Pet"]["anyOf"] = json!([{ "$ref": "#/components/schemas/Cat" }]);
        assert!(matches!(
            run(schemas),
            Err(GenerateError::DiscriminatorWithAnyOf { .. })
        ));
    }

    #[test]
    fn one_of_without_discriminator_stays_untyped_union() {
        let spec = run(json!({
            "Cat": { "type": "object" },
            "Dog": { "type": "object" },
            "Pet": {
                "type": "object",
                "oneOf": [
                    { "$ref": "#/components/schemas/Cat" },
                    { "$ref": "#/components/schemas/Dog" }
                ]
            }
        }))
        .unwrap();

        let pet = spec.definition("Pet").unwrap();
        assert!(pet.discriminator_components.is_empty());
        assert_eq!(pet.source_schema.one_of.len(), 2);
    }
}

// === Property Tests ===

mod properties {
    use super::*;

    #[test]
    fn required_flags_and_literal_names() {
        let spec = run(json!({
            "Order": {
                "type": "object",
                "required": ["order-id"],
                "properties": {
                    "order-id": { "type": "string" },
                    "note": { "type": "string" }
                }
            }
        }))
        .unwrap();

        let order = spec.definition("Order").unwrap();
        assert!(order.property("order-id").unwrap().required);
        assert!(!order.property("note").unwrap().required);
    }

    #[test]
    fn scalar_and_primitive_arrays_are_not_registered() {
        let spec = run(json!({
            "Order": {
                "type": "object",
                "properties": {
                    "id": { "type": "string" },
                    "tags": { "type": "array", "items": { "type": "string" } }
                }
            }
        }))
        .unwrap();

        assert_eq!(spec.registry.len(), 1);
        let order = spec.definition("Order").unwrap();
        let tags = order.property("tags").unwrap();
        let items = tags
            .component
            .definition
            .as_ref()
            .and_then(|d| d.items.as_deref())
            .unwrap();
        assert!(items.is_definition());
    }

    #[test]
    fn structured_arrays_are_named_components() {
        let spec = run(json!({
            "Order": {
                "type": "object",
                "properties": {
                    "lines": {
                        "type": "array",
                        "items": { "type": "object", "properties": { "sku": { "type": "string" } } }
                    }
                }
            }
        }))
        .unwrap();

        let order = spec.definition("Order").unwrap();
        let lines = spec
            .definition_of(&order.property("lines").unwrap().component)
            .unwrap();
        assert_eq!(
            lines.id.to_string(),
            "/work/api/openapi#/components/schemas/Order/lines"
        );
        let item = spec.definition_of(lines.items.as_deref().unwrap()).unwrap();
        assert_eq!(
            item.id.to_string(),
            "/work/api/openapi#/components/schemas/Order/lines/Item"
        );
        assert!(item.property("sku").is_some());
    }

    #[test]
    fn packages_follow_owning_root() {
        let spec = run(json!({
            "Order": { "type": "object", "properties": { "id": { "type": "string" } } }
        }))
        .unwrap();

        let order = spec.definition("Order").unwrap();
        assert_eq!(order.package, "example.com/api");
        let id = order.property("id").unwrap();
        assert_eq!(
            id.component.definition.as_ref().unwrap().package,
            "example.com/api"
        );
    }
}

// === Root Switch Tests ===

mod root_switch {
    use super::*;

    #[test]
    fn spec_reference_into_model_tree_is_model_rooted() {
        let settings = settings();
        let mut store = store(json!({
            "Pet": {
                "type": "object",
                "properties": { "tag": { "$ref": "../models/common/tag.yaml#/Tag" } }
            }
        }));
        store.insert(
            "/work/models/common/tag.yaml",
            json!({ "Tag": { "type": "object", "properties": { "label": { "type": "string" } } } }),
        );

        let spec = generate(&settings, &mut store).unwrap();
        let pet = spec.definition("Pet").unwrap();
        let tag = pet.property("tag").unwrap();
        let target = tag.component.reference.as_ref().unwrap();

        assert_eq!(target.root_path(), Path::new(MODEL_ROOT));
        assert_eq!(target.to_string(), "/work/models/common/tag#/Tag");

        let definition = spec.definition_of(&tag.component).unwrap();
        assert_eq!(definition.package, "example.com/models/common");
    }

    #[test]
    fn model_reference_into_spec_tree_is_spec_rooted() {
        let settings = settings();
        let mut store = DocumentStore::new();
        store.insert(
            "/work/models/pet.yaml",
            json!({ "Pet": { "properties": { "id": { "$ref": "../api/ids.yaml#/Id" } } } }),
        );
        store.insert("/work/api/ids.yaml", json!({ "Id": { "type": "string" } }));
        let mut generator = Generator::new(&settings, &mut store);

        let id = ComponentReference::new("Pet", "pet.yaml", "", MODEL_ROOT).unwrap();
        let pet = generator.load(&id).unwrap();
        generator.create_component(id.clone(), pet).unwrap();

        let definition = generator.resolver().resolve_definition(&id).unwrap();
        let target = definition
            .property("id")
            .unwrap()
            .component
            .reference
            .clone()
            .unwrap();
        assert_eq!(target.root_path(), Path::new(SPEC_ROOT));
        assert_eq!(definition.package, "example.com/models");
    }

    #[test]
    fn nested_roots_keep_referrer_root() {
        let settings = Settings::new("/work", "/work/models").unwrap();
        let mut store = DocumentStore::new();
        store.insert(
            "/work/api.yaml",
            json!({ "Pet": { "properties": { "tag": { "$ref": "models/tag.yaml#/Tag" } } } }),
        );
        store.insert("/work/models/tag.yaml", json!({ "Tag": { "type": "string" } }));
        let mut generator = Generator::new(&settings, &mut store);

        let id = ComponentReference::new("Pet", "api", "", "/work").unwrap();
        let pet = generator.load(&id).unwrap();
        generator.create_component(id.clone(), pet).unwrap();

        let definition = generator.resolver().resolve_definition(&id).unwrap();
        let target = definition.property("tag").unwrap().component.reference.clone().unwrap();
        assert_eq!(target.root_path(), Path::new("/work"));
        assert_eq!(target.path(), "models");
    }

    #[test]
    fn reference_outside_both_roots_is_config_error() {
        let result = run(json!({
            "Pet": {
                "type": "object",
                "properties": { "tag": { "$ref": "../../elsewhere/tag.yaml#/Tag" } }
            }
        }));
        assert!(matches!(result, Err(GenerateError::Config(_))));
    }
}

// === Error Handling Tests ===

mod error_handling {
    use super::*;

    #[test]
    fn missing_target_aborts_run() {
        let result = run(json!({
            "Pet": {
                "type": "object",
                "properties": { "owner": { "$ref": "#/components/schemas/Owner" } }
            }
        }));
        let err = result.unwrap_err();
        assert!(matches!(err, GenerateError::FragmentNotFound { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn missing_document_is_io_error() {
        let result = run(json!({
            "Pet": { "$ref": "missing.yaml#/Pet" }
        }));
        let err = result.unwrap_err();
        assert!(matches!(err, GenerateError::FileNotFound { .. }));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn alias_loop_aborts_run() {
        let result = run(json!({
            "A": { "$ref": "#/components/schemas/B" },
            "B": { "$ref": "#/components/schemas/A" }
        }));
        let err = result.unwrap_err();
        assert!(matches!(err, GenerateError::UnterminatedReference { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn self_alias_aborts_run() {
        let result = run(json!({
            "Pet": { "type": "object" },
            "A": { "$ref": "#/components/schemas/A" }
        }));
        assert!(matches!(
            result,
            Err(GenerateError::UnterminatedReference { reference })
                if reference == "/work/api/openapi#/components/schemas/A"
        ));
    }

    #[test]
    fn unknown_component_name() {
        let spec = run(json!({ "Pet": { "type": "object" } })).unwrap();
        assert!(matches!(
            spec.definition("Owner"),
            Err(GenerateError::UnknownComponent { name }) if name == "Owner"
        ));
    }

    #[test]
    fn malformed_schema_node() {
        let result = run(json!({
            "Pet": { "type": "object", "properties": ["not", "a", "map"] }
        }));
        assert!(matches!(result, Err(GenerateError::InvalidSchema { .. })));
    }
}

// === Model Scanning Tests ===

mod model_scanning {
    use super::*;

    fn write(root: &Path, name: &str, content: &str) {
        let path = root.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn scanned_objects_join_specification() {
        let dir = TempDir::new().unwrap();
        let api = dir.path().join("api");
        let models = dir.path().join("models");
        write(
            &api,
            "openapi.yaml",
            "openapi: 3.0.3\ncomponents:\n  schemas:\n    Pet:\n      type: object\n      properties:\n        tag:\n          $ref: '../models/pets/tag.yaml#/Tag'\n",
        );
        write(&models, "pets/tag.yaml", "Tag:\n  type: object\nPet:\n  type: string\n");
        write(&models, "store/order.json", r#"{"Order": {"type": "object"}}"#);

        let settings = Settings::new(&api, &models)
            .unwrap()
            .spec(api.join("openapi.yaml"))
            .unwrap()
            .model_package("models")
            .include("pets");

        let spec = generate(&settings, &mut DocumentStore::new()).unwrap();
        let names: Vec<&str> = spec.components.keys().map(String::as_str).collect();
        assert_eq!(names, ["Pet", "Tag"]);

        // The specification's Pet wins over the model document's Pet.
        assert!(spec.definition("Pet").unwrap().source_schema.is_object());

        let tag = spec.definition("Tag").unwrap();
        assert_eq!(tag.package, "models/pets");
        let pet_tag = &spec.definition("Pet").unwrap().property("tag").unwrap().component;
        assert_eq!(spec.definition_of(pet_tag).unwrap().id, tag.id);
    }

    #[test]
    fn without_spec_document_whole_model_root_is_scanned() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.yaml", "A:\n  type: object\n");
        write(dir.path(), "nested/b.yml", "B:\n  type: object\n");

        let settings = Settings::new(dir.path(), dir.path()).unwrap();
        let spec = generate(&settings, &mut DocumentStore::new()).unwrap();

        let names: Vec<&str> = spec.components.keys().map(String::as_str).collect();
        assert_eq!(names, ["A", "B"]);
        assert_eq!(spec.definition("B").unwrap().id.path(), "nested");
    }

    #[test]
    fn output_serializes_to_json() {
        let spec = run(json!({
            "Pet": { "type": "object", "properties": { "name": { "type": "string" } } }
        }))
        .unwrap();

        let value = serde_json::to_value(&spec).unwrap();
        let pet = &value["components"]["Pet"];
        assert_eq!(pet["definition"]["package"], json!("example.com/api"));
        assert_eq!(
            pet["definition"]["properties"][0]["propertyName"],
            json!("name")
        );
        assert!(value["registry"]["/work/api/openapi#/components/schemas/Pet"].is_object());
    }
}

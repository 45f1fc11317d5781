//! Schema Typegen
//!
//! Resolves OpenAPI 3.0 schema graphs into a language-neutral component
//! model for code generators.
//!
//! Schemas may live in a specification document and in a separate tree of
//! shared model documents. Every schema node is classified, references are
//! followed across documents and roots, `allOf` fragments are merged and
//! discriminated `oneOf` unions get a complete key table. The result is a
//! [`Specification`]: top-level name to [`ComponentDefinition`], plus the
//! registry every pointer in it resolves against.
//!
//! # Example
//!
//! ```
//! use schema_typegen::{generate, DocumentStore, Settings};
//! use serde_json::json;
//!
//! let settings = Settings::new("/work/api", "/work/models")
//!     .unwrap()
//!     .spec("/work/api/openapi.yaml")
//!     .unwrap();
//!
//! let mut store = DocumentStore::new();
//! store.insert(
//!     "/work/api/openapi.yaml",
//!     json!({ "components": { "schemas": {
//!         "Base": { "type": "object", "properties": { "id": { "type": "string" } } },
//!         "Pet": {
//!             "allOf": [
//!                 { "$ref": "#/components/schemas/Base" },
//!                 { "type": "object", "properties": { "name": { "type": "string" } } }
//!             ]
//!         }
//!     } } }),
//! );
//!
//! let spec = generate(&settings, &mut store).unwrap();
//! let pet = spec.definition("Pet").unwrap();
//!
//! // The inline fragment is folded into Pet, Base stays a parent
//! assert!(pet.property("name").is_some());
//! assert_eq!(pet.composition.len(), 1);
//! ```
//!
//! # Identities
//!
//! Every component has a canonical identity:
//!
//! ```text
//! <root>/<path>/<module>#/<namespace>/<type name>
//! ```
//!
//! | Component | Identity |
//! |-----------|----------|
//! | Named schema in the spec document | `/api/openapi#/components/schemas/Pet` |
//! | Object in a model document | `/models/pets/pet#/Pet` |
//! | Inline property object | `.../Pet/address` |
//! | Inline array items | `.../Pet/tags/Item` |
//! | Union variant | `.../Cat/$variant` |
//! | `allOf` parent pointer | `.../Pet/$allOf/0` |

mod component;
mod compose;
mod error;
mod generator;
mod loader;
mod merge;
mod polymorphic;
mod properties;
mod reference;
mod resolver;
mod scanner;
mod schema;
mod types;

pub use component::{
    ComponentDefinition, Composition, DiscriminatorComponent, Property, Specification,
    TypeDefinition,
};
pub use compose::{resolve_composition, PARENT_SEGMENT};
pub use error::{ConfigError, GenerateError, MergeError};
pub use generator::{classify, generate, Generator, SchemaKind, ITEM_SEGMENT};
pub use loader::{load_document, navigate_fragment, DocumentStore, SchemaSource};
pub use merge::{merge, merge_text};
pub use polymorphic::{mapping_table, resolve_polymorphism, VARIANT_SEGMENT};
pub use properties::resolve_properties;
pub use reference::{ComponentReference, Roots};
pub use resolver::Resolver;
pub use scanner::{scan_models, Module};
pub use schema::{AdditionalProperties, Discriminator, Schema};
pub use types::{Include, Settings, COMPONENTS_SCHEMAS, DEFAULT_INCLUDE_GLOB};

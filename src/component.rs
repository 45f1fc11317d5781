//! Resolved component graph.
//!
//! Every node of the output is a [`ComponentDefinition`]: either a concrete
//! [`TypeDefinition`] or a pointer to another component by identity. Pointers
//! keep the graph acyclic in memory; the [`Resolver`] is the arena they point
//! into.

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::GenerateError;
use crate::reference::ComponentReference;
use crate::resolver::Resolver;
use crate::schema::Schema;

/// A component: a concrete definition or a reference to another component.
///
/// Once resolution completes exactly one of `definition` and `reference` is
/// set. While a component is being built it is registered with neither.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDefinition {
    pub id: ComponentReference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<Box<TypeDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<ComponentReference>,
}

impl ComponentDefinition {
    /// Placeholder registered before a component's children are resolved.
    pub fn pending(id: ComponentReference) -> Self {
        Self {
            id,
            definition: None,
            reference: None,
        }
    }

    pub fn with_definition(definition: TypeDefinition) -> Self {
        Self {
            id: definition.id.clone(),
            definition: Some(Box::new(definition)),
            reference: None,
        }
    }

    pub fn with_reference(id: ComponentReference, target: ComponentReference) -> Self {
        Self {
            id,
            definition: None,
            reference: Some(target),
        }
    }

    pub fn is_definition(&self) -> bool {
        self.definition.is_some() && self.reference.is_none()
    }

    pub fn is_reference(&self) -> bool {
        self.reference.is_some() && self.definition.is_none()
    }

    pub fn is_pending(&self) -> bool {
        self.definition.is_none() && self.reference.is_none()
    }
}

/// A concrete type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDefinition {
    pub id: ComponentReference,
    pub package: String,
    /// The schema after inline `allOf`/`oneOf` fragments were folded in.
    pub source_schema: Schema,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub composition: Vec<Composition>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub discriminator_components: Vec<DiscriminatorComponent>,
    /// Element type of an array.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<ComponentDefinition>>,
}

impl TypeDefinition {
    pub fn new(id: ComponentReference, package: impl Into<String>, source_schema: Schema) -> Self {
        Self {
            id,
            package: package.into(),
            source_schema,
            composition: Vec::new(),
            properties: Vec::new(),
            discriminator_components: Vec::new(),
            items: None,
        }
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.property_name == name)
    }
}

/// A composed (`allOf`) parent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Composition {
    #[serde(flatten)]
    pub component: ComponentDefinition,
    /// True when the parent is folded into the owner rather than kept as a
    /// distinct parent type.
    pub inline: bool,
}

/// A property of an object type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    #[serde(flatten)]
    pub component: ComponentDefinition,
    pub required: bool,
    pub property_name: String,
}

/// One variant of a discriminated union.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscriminatorComponent {
    #[serde(flatten)]
    pub component: ComponentDefinition,
    pub discriminator_property_name: String,
    pub map_from_key: String,
}

/// Output of a generation run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Specification {
    /// Top-level name -> component.
    pub components: IndexMap<String, ComponentDefinition>,
    /// Every registered component by canonical identity.
    pub registry: Resolver,
}

impl Specification {
    pub fn component(&self, name: &str) -> Option<&ComponentDefinition> {
        self.components.get(name)
    }

    /// Follow `component` through the registry to its concrete definition.
    pub fn definition_of<'a>(
        &'a self,
        component: &'a ComponentDefinition,
    ) -> Result<&'a TypeDefinition, GenerateError> {
        self.registry.follow(component)
    }

    /// Concrete definition of the top-level component `name`.
    pub fn definition(&self, name: &str) -> Result<&TypeDefinition, GenerateError> {
        let component = self
            .component(name)
            .ok_or_else(|| GenerateError::UnknownComponent {
                name: name.to_string(),
            })?;
        self.definition_of(component)
    }
}

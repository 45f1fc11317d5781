//! Generation orchestrator.
//!
//! [`Generator`] is the per-run context: settings, the schema source and the
//! component registry. [`Generator::create_component`] is the "create or
//! return cached" entry point every resolver recurses through.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info, trace, warn};

use crate::component::{ComponentDefinition, Specification, TypeDefinition};
use crate::compose::resolve_composition;
use crate::error::{ConfigError, GenerateError};
use crate::loader::SchemaSource;
use crate::polymorphic::resolve_polymorphism;
use crate::properties::resolve_properties;
use crate::reference::ComponentReference;
use crate::resolver::Resolver;
use crate::scanner::scan_models;
use crate::schema::Schema;
use crate::types::{Include, Settings, COMPONENTS_SCHEMAS};

/// Segment appended to an array identity for its inline object items.
pub const ITEM_SEGMENT: &str = "Item";

/// How a schema node is handled. Exactly one kind applies to every node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    /// `$ref` node.
    Reference,
    /// `oneOf` with a discriminator.
    Polymorphic,
    /// `allOf` present.
    Composed,
    Array,
    Object,
    Primitive,
}

/// Classify a node. Earlier kinds take precedence.
///
/// A `oneOf` without discriminator is not polymorphic; it falls through to
/// the remaining markers and its variants stay in the source schema.
pub fn classify(schema: &Schema) -> SchemaKind {
    if schema.is_reference() {
        SchemaKind::Reference
    } else if is_discriminated_union(schema) {
        SchemaKind::Polymorphic
    } else if !schema.all_of.is_empty() {
        SchemaKind::Composed
    } else if schema.is_array() {
        SchemaKind::Array
    } else if schema.is_object() {
        SchemaKind::Object
    } else {
        SchemaKind::Primitive
    }
}

fn is_discriminated_union(schema: &Schema) -> bool {
    !schema.one_of.is_empty() && schema.discriminator_property().is_some()
}

/// Generate the specification described by `settings`.
///
/// Named schemas of the specification document come first, under their
/// names; objects of scanned model documents follow unless the
/// specification already uses the name. Any error aborts the run, including
/// a reference chain that never reaches a definition.
pub fn generate(
    settings: &Settings,
    source: &mut dyn SchemaSource,
) -> Result<Specification, GenerateError> {
    let mut generator = Generator::new(settings, source);
    let mut components = IndexMap::new();

    if let Some(spec) = &settings.spec {
        let document = spec.with_extension("");
        let schemas = match generator
            .source
            .load_node(&document, &format!("#/{}", COMPONENTS_SCHEMAS))
        {
            Err(GenerateError::FragmentNotFound { .. }) => Value::Null,
            result => result?,
        };

        if let Value::Object(schemas) = schemas {
            for (name, node) in schemas {
                let Some(id) = settings.spec_component(&name)? else {
                    continue;
                };
                let schema = parse_schema(&id, node)?;
                generator.create_component(id.clone(), schema)?;
                components.insert(name, id);
            }
        }
    }

    let includes = if settings.includes.is_empty() && settings.spec.is_none() {
        vec![Include::directory("")]
    } else {
        settings.includes.clone()
    };
    let model_root = settings.roots.model();
    let exclude: Vec<_> = settings.spec.iter().cloned().collect();

    for module in scan_models(model_root, &includes, &exclude)? {
        let (path, file) = module
            .path
            .rsplit_once('/')
            .unwrap_or(("", module.path.as_str()));
        for object in &module.objects {
            if components.contains_key(object) {
                continue;
            }
            let id = ComponentReference::new(object, file, path, model_root)?;
            let schema = generator.load(&id)?;
            generator.create_component(id.clone(), schema)?;
            components.insert(object.clone(), id);
        }
    }

    let registry = generator.into_resolver();
    registry.verify()?;

    let components = components
        .into_iter()
        .map(|(name, id)| {
            registry
                .resolve(&id)
                .cloned()
                .map(|component| (name, component))
                .ok_or_else(|| GenerateError::DanglingReference {
                    reference: id.to_string(),
                })
        })
        .collect::<Result<IndexMap<_, _>, _>>()?;

    info!(
        components = components.len(),
        registered = registry.len(),
        "generated specification"
    );

    Ok(Specification {
        components,
        registry,
    })
}

/// Per-run resolution context.
pub struct Generator<'a> {
    settings: &'a Settings,
    source: &'a mut dyn SchemaSource,
    resolver: Resolver,
}

impl<'a> Generator<'a> {
    pub fn new(settings: &'a Settings, source: &'a mut dyn SchemaSource) -> Self {
        Self {
            settings,
            source,
            resolver: Resolver::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        self.settings
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub(crate) fn resolver_mut(&mut self) -> &mut Resolver {
        &mut self.resolver
    }

    pub fn into_resolver(self) -> Resolver {
        self.resolver
    }

    /// Load and parse the schema node `id` points at.
    pub fn load(&mut self, id: &ComponentReference) -> Result<Schema, GenerateError> {
        let node = self.source.load_node(&id.document_path(), &id.fragment())?;
        parse_schema(id, node)
    }

    /// Identity of the target of the `$ref` node `schema`, seen from
    /// `referrer`.
    pub fn target_of(
        &self,
        referrer: &ComponentReference,
        schema: &Schema,
    ) -> Result<ComponentReference, GenerateError> {
        let reference = schema
            .reference
            .as_deref()
            .ok_or_else(|| ConfigError::InvalidReference {
                reference: String::new(),
            })?;
        Ok(referrer.resolve_reference(reference, &self.settings.roots)?)
    }

    /// Resolve the `$ref` node `schema` found in `referrer`, creating the
    /// target component on first sight. Returns the target identity.
    pub fn component_from_reference(
        &mut self,
        referrer: &ComponentReference,
        schema: &Schema,
    ) -> Result<ComponentReference, GenerateError> {
        let target = self.target_of(referrer, schema)?;
        if self.resolver.contains(&target) {
            trace!(id = %target, "component already registered");
            return Ok(target);
        }

        let target_schema = self.load(&target)?;
        self.create_component(target.clone(), target_schema)?;
        Ok(target)
    }

    /// Create the component `id` from `schema`, or return immediately when
    /// `id` is already registered.
    ///
    /// A pending entry is registered before any child is visited, which is
    /// what terminates cyclic graphs.
    pub fn create_component(
        &mut self,
        id: ComponentReference,
        schema: Schema,
    ) -> Result<(), GenerateError> {
        if self.resolver.contains(&id) {
            trace!(id = %id, "component already registered");
            return Ok(());
        }

        let kind = classify(&schema);
        debug!(id = %id, ?kind, "creating component");
        self.resolver
            .register(ComponentDefinition::pending(id.clone()));

        let component = match kind {
            SchemaKind::Reference => {
                let target = self.component_from_reference(&id, &schema)?;
                ComponentDefinition::with_reference(id, target)
            }
            SchemaKind::Array => ComponentDefinition::with_definition(self.array(id, schema)?),
            SchemaKind::Primitive => {
                warn_untyped_union(&id, &schema);
                let package = self.settings.package_for(&id);
                ComponentDefinition::with_definition(TypeDefinition::new(id, package, schema))
            }
            SchemaKind::Object | SchemaKind::Composed | SchemaKind::Polymorphic => {
                let package = self.settings.package_for(&id);
                let mut definition = TypeDefinition::new(id, package, schema);
                if kind == SchemaKind::Composed {
                    resolve_composition(self, &mut definition)?;
                }
                // Folded allOf fragments may bring a discriminated union.
                if is_discriminated_union(&definition.source_schema) {
                    resolve_polymorphism(self, &mut definition)?;
                }
                warn_untyped_union(&definition.id, &definition.source_schema);
                resolve_properties(self, &mut definition)?;
                ComponentDefinition::with_definition(definition)
            }
        };

        self.resolver.register(component);
        Ok(())
    }

    /// Definition of the array `id`.
    ///
    /// Reference items point at their target. Object items are registered
    /// under `Array/Item` and carried as that definition; primitive items
    /// stay inline.
    pub fn array(
        &mut self,
        id: ComponentReference,
        schema: Schema,
    ) -> Result<TypeDefinition, GenerateError> {
        let package = self.settings.package_for(&id);
        let items = match schema.items.as_deref() {
            Some(item) => Some(Box::new(self.array_item(&id, &package, item)?)),
            None => None,
        };

        let mut definition = TypeDefinition::new(id, package, schema);
        definition.items = items;
        Ok(definition)
    }

    /// Copy of the completed component registered under `id`.
    pub(crate) fn registered(
        &self,
        id: &ComponentReference,
    ) -> Result<ComponentDefinition, GenerateError> {
        self.resolver
            .resolve(id)
            .filter(|component| !component.is_pending())
            .cloned()
            .ok_or_else(|| GenerateError::DanglingReference {
                reference: id.to_string(),
            })
    }

    fn array_item(
        &mut self,
        array: &ComponentReference,
        package: &str,
        item: &Schema,
    ) -> Result<ComponentDefinition, GenerateError> {
        let item_id = array.with_appended_type_name(ITEM_SEGMENT);
        match classify(item) {
            SchemaKind::Reference => {
                let target = self.component_from_reference(array, item)?;
                Ok(ComponentDefinition::with_reference(item_id, target))
            }
            SchemaKind::Primitive => Ok(ComponentDefinition::with_definition(
                TypeDefinition::new(item_id, package, item.clone()),
            )),
            _ => {
                self.create_component(item_id.clone(), item.clone())?;
                self.registered(&item_id)
            }
        }
    }
}

fn parse_schema(id: &ComponentReference, node: Value) -> Result<Schema, GenerateError> {
    serde_json::from_value(node).map_err(|source| GenerateError::InvalidSchema {
        component: id.to_string(),
        source,
    })
}

pub(crate) fn warn_untyped_union(id: &ComponentReference, schema: &Schema) {
    if !schema.one_of.is_empty() && schema.discriminator_property().is_none() {
        warn!(id = %id, variants = schema.one_of.len(), "oneOf without discriminator left as untyped union");
    }
}

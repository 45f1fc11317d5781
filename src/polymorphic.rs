//! Discriminated unions (`oneOf` with a discriminator).
//!
//! Every named `oneOf` variant gets exactly one discriminator key. Keys come
//! from the explicit `mapping` first; variants without one get their bare
//! type name. A key claimed by two variants, or a variant reachable through
//! two keys, is rejected rather than guessed at.

use indexmap::IndexMap;

use crate::component::{ComponentDefinition, DiscriminatorComponent, TypeDefinition};
use crate::compose::fold_inline;
use crate::error::GenerateError;
use crate::generator::Generator;
use crate::reference::ComponentReference;
use crate::schema::Schema;
use crate::types::COMPONENTS_SCHEMAS;

/// Segment appended to a target identity for its union-variant identity.
///
/// The `$` prefix keeps it apart from ordinary property names.
pub const VARIANT_SEGMENT: &str = "$variant";

/// Resolve the discriminated `oneOf` of `definition`.
pub fn resolve_polymorphism(
    generator: &mut Generator<'_>,
    definition: &mut TypeDefinition,
) -> Result<(), GenerateError> {
    let Some(property_name) = definition
        .source_schema
        .discriminator_property()
        .map(str::to_string)
    else {
        return Ok(());
    };
    if definition.source_schema.one_of.is_empty() {
        return Ok(());
    }

    check_shape(definition)?;
    fold_inline(definition, |schema| &mut schema.one_of)?;
    check_shape(definition)?;

    let table = mapping_table(generator, definition)?;

    let variants = definition.source_schema.one_of.clone();
    let mut seen = Vec::new();
    for variant in &variants {
        let target = generator.component_from_reference(&definition.id, variant)?;
        if seen.contains(&target) {
            continue;
        }

        let key = table
            .iter()
            .find(|(_, mapped)| **mapped == target)
            .map(|(key, _)| key.clone())
            .unwrap_or_else(|| target.type_name().to_string());

        let variant_id = target.with_appended_type_name(VARIANT_SEGMENT);
        let component = ComponentDefinition::with_reference(variant_id, target.clone());
        let points_at_target = generator
            .resolver()
            .resolve(&component.id)
            .map(|existing| existing.reference.as_ref() == Some(&target));
        match points_at_target {
            None => generator.resolver_mut().register(component.clone()),
            Some(true) => {}
            Some(false) => {
                return Err(GenerateError::IdentityConflict {
                    id: component.id.to_string(),
                    target: target.to_string(),
                })
            }
        }

        definition
            .discriminator_components
            .push(DiscriminatorComponent {
                component,
                discriminator_property_name: property_name.clone(),
                map_from_key: key,
            });
        seen.push(target);
    }

    Ok(())
}

/// Discriminator key -> variant identity for `definition`, in mapping order
/// followed by synthesized keys in `oneOf` order.
pub fn mapping_table(
    generator: &Generator<'_>,
    definition: &TypeDefinition,
) -> Result<IndexMap<String, ComponentReference>, GenerateError> {
    let schema = &definition.source_schema;
    let id = &definition.id;
    let component = id.to_string();

    let mut variants: Vec<ComponentReference> = Vec::new();
    for variant in &schema.one_of {
        let target = generator.target_of(id, variant)?;
        if !variants.contains(&target) {
            variants.push(target);
        }
    }

    let mut table = IndexMap::new();
    if let Some(discriminator) = &schema.discriminator {
        for (key, reference) in &discriminator.mapping {
            let target = generator.target_of(id, &Schema::reference(mapping_reference(reference)))?;
            if !variants.contains(&target) {
                return Err(GenerateError::MappingTargetNotInUnion {
                    component,
                    key: key.clone(),
                    target: target.to_string(),
                });
            }
            table.insert(key.clone(), target);
        }
    }

    for target in &variants {
        if table.values().any(|mapped| mapped == target) {
            continue;
        }
        let key = target.type_name().to_string();
        if let Some(existing) = table.get(&key) {
            return Err(GenerateError::AmbiguousMapping {
                component,
                key,
                existing: existing.to_string(),
                target: target.to_string(),
            });
        }
        table.insert(key, target.clone());
    }

    for target in &variants {
        let keys: Vec<String> = table
            .iter()
            .filter(|(_, mapped)| *mapped == target)
            .map(|(key, _)| key.clone())
            .collect();
        if keys.len() > 1 {
            return Err(GenerateError::DuplicateMappingKeys {
                component,
                target: target.to_string(),
                keys,
            });
        }
    }

    Ok(table)
}

fn check_shape(definition: &TypeDefinition) -> Result<(), GenerateError> {
    let schema = &definition.source_schema;
    let component = definition.id.to_string();

    if !schema.properties.is_empty() {
        return Err(GenerateError::DiscriminatorWithProperties { component });
    }
    if !schema.all_of.is_empty() {
        return Err(GenerateError::DiscriminatorWithAllOf { component });
    }
    if !schema.any_of.is_empty() {
        return Err(GenerateError::DiscriminatorWithAnyOf { component });
    }
    Ok(())
}

/// Mapping values may name a schema instead of referencing it.
fn mapping_reference(value: &str) -> String {
    if value.contains('#') {
        value.to_string()
    } else {
        format!("#/{}/{}", COMPONENTS_SCHEMAS, value)
    }
}

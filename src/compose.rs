//! `allOf` composition.
//!
//! Inline `allOf` fragments are folded into the owning schema through the
//! merge engine. What remains are named parents, which become
//! [`Composition`] entries in declaration order.

use crate::component::{ComponentDefinition, Composition, TypeDefinition};
use crate::error::GenerateError;
use crate::generator::Generator;
use crate::merge::merge;
use crate::schema::Schema;

/// Segment under which the parent pointers of a composed identity are
/// numbered, e.g. `Pet/$allOf/0`.
pub const PARENT_SEGMENT: &str = "$allOf";

/// Resolve the `allOf` list of `definition`.
pub fn resolve_composition(
    generator: &mut Generator<'_>,
    definition: &mut TypeDefinition,
) -> Result<(), GenerateError> {
    if definition.source_schema.all_of.is_empty() {
        return Ok(());
    }

    fold_inline(definition, |schema| &mut schema.all_of)?;

    let parents = definition.source_schema.all_of.clone();
    let scope = definition.id.with_appended_type_name(PARENT_SEGMENT);
    for (index, parent) in parents.iter().enumerate() {
        let target = generator.component_from_reference(&definition.id, parent)?;
        let pointer = scope.with_appended_type_name(&index.to_string());
        definition.composition.push(Composition {
            component: ComponentDefinition::with_reference(pointer, target),
            inline: false,
        });
    }

    Ok(())
}

/// Merge every inline entry of the list `select` picks into the owning
/// schema, until only `$ref` entries remain.
///
/// A folded fragment may bring entries of its own, so the list is scanned
/// again after each pass.
pub(crate) fn fold_inline(
    definition: &mut TypeDefinition,
    select: fn(&mut Schema) -> &mut Vec<Schema>,
) -> Result<(), GenerateError> {
    loop {
        let entries = std::mem::take(select(&mut definition.source_schema));
        let (inline, named): (Vec<Schema>, Vec<Schema>) =
            entries.into_iter().partition(|entry| !entry.is_reference());
        *select(&mut definition.source_schema) = named;

        if inline.is_empty() {
            return Ok(());
        }

        for fragment in &inline {
            definition.source_schema =
                merge(&definition.source_schema, fragment).map_err(|source| {
                    GenerateError::Merge {
                        component: definition.id.to_string(),
                        source,
                    }
                })?;
        }
    }
}

//! Object properties.

use crate::component::{ComponentDefinition, Property, TypeDefinition};
use crate::error::GenerateError;
use crate::generator::{classify, warn_untyped_union, Generator, SchemaKind};
use crate::schema::Schema;

/// Resolve every declared property of `definition`, in declaration order.
///
/// References become pointers to their target. Inline structured types are
/// registered under `Owner/prop` and carried as that definition; scalars and
/// arrays of scalars stay inline and anonymous.
pub fn resolve_properties(
    generator: &mut Generator<'_>,
    definition: &mut TypeDefinition,
) -> Result<(), GenerateError> {
    let properties = definition.source_schema.properties.clone();

    for (name, schema) in &properties {
        let property_id = definition.id.with_appended_type_name(name);

        let component = match classify(schema) {
            SchemaKind::Reference => {
                let target = generator.component_from_reference(&definition.id, schema)?;
                ComponentDefinition::with_reference(property_id, target)
            }
            SchemaKind::Object | SchemaKind::Composed | SchemaKind::Polymorphic => {
                generator.create_component(property_id.clone(), schema.clone())?;
                generator.registered(&property_id)?
            }
            SchemaKind::Array if has_structured_items(schema) => {
                generator.create_component(property_id.clone(), schema.clone())?;
                generator.registered(&property_id)?
            }
            SchemaKind::Array => {
                ComponentDefinition::with_definition(generator.array(property_id, schema.clone())?)
            }
            SchemaKind::Primitive => {
                warn_untyped_union(&property_id, schema);
                ComponentDefinition::with_definition(TypeDefinition::new(
                    property_id,
                    definition.package.clone(),
                    schema.clone(),
                ))
            }
        };

        definition.properties.push(Property {
            component,
            required: definition.source_schema.is_required(name),
            property_name: name.clone(),
        });
    }

    Ok(())
}

fn has_structured_items(schema: &Schema) -> bool {
    schema
        .items
        .as_deref()
        .map(|item| classify(item) != SchemaKind::Primitive)
        .unwrap_or(false)
}

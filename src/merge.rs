//! Deep merge of two object schemas.
//!
//! [`merge`] folds a `from` fragment into a `to` schema. The merge is not
//! commutative: `to` is the schema closer to the final type and wins every
//! tie.
//!
//! | Field | Rule |
//! |-------|------|
//! | `oneOf` / `allOf` / `anyOf` | append `from` entries not already present in `to` |
//! | `not` | `to` if set, else `from` |
//! | `title` / `description` | joined with a blank line when both are non-empty |
//! | `enum` | append `from` values not already present in `to` |
//! | scalar constraints | `to` if non-default, else `from` |
//! | `required` | union without duplicates |
//! | `minProperties` / `maxProperties` | summed when both are set |
//! | `properties` | `from` entries added when absent; `to` wins on collision |

use crate::error::MergeError;
use crate::schema::Schema;

/// Merge `from` into `to`.
///
/// # Errors
///
/// Returns `MergeError::NotObject` when neither side is an object schema.
pub fn merge(to: &Schema, from: &Schema) -> Result<Schema, MergeError> {
    if !to.is_object() && !from.is_object() {
        return Err(MergeError::NotObject {
            to: to.type_name().to_string(),
            from: from.type_name().to_string(),
        });
    }

    let mut merged = to.clone();

    append_missing(&mut merged.one_of, &from.one_of);
    append_missing(&mut merged.all_of, &from.all_of);
    append_missing(&mut merged.any_of, &from.any_of);
    prefer(&mut merged.not, &from.not);

    merged.title = merge_text(&to.title, &from.title);
    merged.description = merge_text(&to.description, &from.description);
    append_missing(&mut merged.enum_values, &from.enum_values);

    prefer(&mut merged.schema_type, &from.schema_type);
    prefer(&mut merged.format, &from.format);
    prefer(&mut merged.default, &from.default);
    prefer(&mut merged.example, &from.example);
    prefer(&mut merged.external_docs, &from.external_docs);
    prefer(&mut merged.xml, &from.xml);

    merged.unique_items |= from.unique_items;
    merged.exclusive_minimum |= from.exclusive_minimum;
    merged.exclusive_maximum |= from.exclusive_maximum;
    merged.nullable |= from.nullable;
    merged.read_only |= from.read_only;
    merged.write_only |= from.write_only;
    merged.allow_empty_value |= from.allow_empty_value;
    merged.deprecated |= from.deprecated;

    prefer(&mut merged.minimum, &from.minimum);
    prefer(&mut merged.maximum, &from.maximum);
    prefer(&mut merged.multiple_of, &from.multiple_of);
    if merged.min_length == 0 {
        merged.min_length = from.min_length;
    }
    prefer(&mut merged.max_length, &from.max_length);
    if merged.pattern.is_empty() {
        merged.pattern = from.pattern.clone();
    }
    if merged.min_items == 0 {
        merged.min_items = from.min_items;
    }
    prefer(&mut merged.max_items, &from.max_items);
    prefer(&mut merged.items, &from.items);
    prefer(&mut merged.additional_properties, &from.additional_properties);
    prefer(&mut merged.discriminator, &from.discriminator);

    merged.min_properties = sum_bounds(to.min_properties, from.min_properties);
    merged.max_properties = sum_bounds(to.max_properties, from.max_properties);

    append_missing(&mut merged.required, &from.required);

    for (name, property) in &from.properties {
        if !merged.properties.contains_key(name) {
            merged.properties.insert(name.clone(), property.clone());
        }
    }

    Ok(merged)
}

/// Join two texts with a blank line; an empty side yields the other.
pub fn merge_text(to: &str, from: &str) -> String {
    match (to.is_empty(), from.is_empty()) {
        (true, _) => from.to_string(),
        (false, true) => to.to_string(),
        (false, false) => format!("{}\n\n{}", to, from),
    }
}

fn append_missing<T: PartialEq + Clone>(to: &mut Vec<T>, from: &[T]) {
    for item in from {
        if !to.contains(item) {
            to.push(item.clone());
        }
    }
}

fn prefer<T: Clone>(to: &mut Option<T>, from: &Option<T>) {
    if to.is_none() {
        to.clone_from(from);
    }
}

fn sum_bounds(to: Option<u64>, from: Option<u64>) -> Option<u64> {
    match (to, from) {
        (Some(a), Some(b)) => Some(a.saturating_add(b)),
        (a, b) => a.or(b),
    }
}

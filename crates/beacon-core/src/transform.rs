//! Field remapping from intake records to outbound records.

use std::collections::HashMap;

use crate::models::{AttributeEntry, IntakeRecord, OutboundRecord, TraitEntry};

/// Reshapes an intake record into the outbound schema.
///
/// Scalar fields are renamed one to one with no validation or defaulting.
/// Every key in the value maps produces exactly one entry whose type is
/// taken from the matching type map, or left empty. Keys present only in a
/// type map produce nothing. The `atrv`/`uatrv` maps are not read.
///
/// # Example
///
/// ```
/// use beacon_core::{transform, IntakeRecord};
///
/// let mut record = IntakeRecord { event: "click".into(), ..Default::default() };
/// record.attribute_values.insert("color".into(), "red".into());
/// record.attribute_types.insert("color".into(), "string".into());
/// record.attribute_types.insert("size".into(), "number".into());
///
/// let outbound = transform(record);
/// assert_eq!(outbound.event, "click");
/// assert_eq!(outbound.attributes["color"].value_type, "string");
/// assert!(!outbound.attributes.contains_key("size"));
/// ```
pub fn transform(record: IntakeRecord) -> OutboundRecord {
    let IntakeRecord {
        event,
        event_type,
        app_id,
        user_id,
        message_id,
        page_title,
        page_url,
        browser_language,
        screen_size,
        attribute_values,
        attribute_types,
        trait_values,
        trait_types,
        ..
    } = record;

    OutboundRecord {
        event,
        event_type,
        app_id,
        user_id,
        message_id,
        page_title,
        page_url,
        browser_language,
        screen_size,
        attributes: pair_entries(attribute_values, attribute_types, |value, value_type| {
            AttributeEntry { value, value_type }
        }),
        traits: pair_entries(trait_values, trait_types, |value, value_type| TraitEntry {
            value,
            value_type,
        }),
    }
}

/// Joins a value map with its type map, keyed by the value map.
fn pair_entries<E>(
    values: HashMap<String, String>,
    mut types: HashMap<String, String>,
    entry: impl Fn(String, String) -> E,
) -> HashMap<String, E> {
    values
        .into_iter()
        .map(|(name, value)| {
            let value_type = types.remove(&name).unwrap_or_default();
            (name, entry(value, value_type))
        })
        .collect()
}

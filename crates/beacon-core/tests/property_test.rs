//! Property-based tests for the intake-to-outbound transform.
//!
//! Checks the mapping rules that must hold for every intake record: value
//! keys drive the output, types are joined by name, and type-only keys
//! vanish. Uses deterministic, in-memory testing without external
//! dependencies.

#![allow(clippy::unwrap_used)] // Test regex patterns are known to be valid

use std::collections::HashMap;

use beacon_core::{transform, IntakeRecord, OutboundRecord};
use proptest::{prelude::*, test_runner::Config as ProptestConfig};

/// Deterministic property test configuration for CI stability.
fn proptest_config() -> ProptestConfig {
    ProptestConfig {
        cases: 100,
        timeout: 5000, // 5 seconds max
        fork: false,
        failure_persistence: None,
        source_file: None,
        ..ProptestConfig::default()
    }
}

fn name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z_]{1,12}").unwrap()
}

fn text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9 ./:-]{0,40}").unwrap()
}

fn string_map_strategy() -> impl Strategy<Value = HashMap<String, String>> {
    prop::collection::hash_map(name_strategy(), text_strategy(), 0..8)
}

/// Generates intake records whose value and type maps partially overlap.
fn intake_strategy() -> impl Strategy<Value = IntakeRecord> {
    (
        prop::collection::vec(text_strategy(), 9),
        string_map_strategy(),
        string_map_strategy(),
        string_map_strategy(),
        string_map_strategy(),
        string_map_strategy(),
    )
        .prop_map(|(scalars, atrk, atrt, uatrk, uatrt, aux)| IntakeRecord {
            event: scalars[0].clone(),
            event_type: scalars[1].clone(),
            app_id: scalars[2].clone(),
            user_id: scalars[3].clone(),
            message_id: scalars[4].clone(),
            page_title: scalars[5].clone(),
            page_url: scalars[6].clone(),
            browser_language: scalars[7].clone(),
            screen_size: scalars[8].clone(),
            attribute_values: atrk,
            attribute_aux: aux.clone(),
            attribute_types: atrt,
            trait_values: uatrk,
            trait_aux: aux,
            trait_types: uatrt,
        })
}

/// Rebuilds every map with a different insertion order.
fn reinserted(record: &IntakeRecord) -> IntakeRecord {
    fn reversed(map: &HashMap<String, String>) -> HashMap<String, String> {
        let mut entries: Vec<_> = map.iter().collect();
        entries.sort();
        entries.into_iter().rev().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    IntakeRecord {
        attribute_values: reversed(&record.attribute_values),
        attribute_types: reversed(&record.attribute_types),
        trait_values: reversed(&record.trait_values),
        trait_types: reversed(&record.trait_types),
        ..record.clone()
    }
}

proptest! {
    #![proptest_config(proptest_config())]

    /// Property: identical input yields identical output regardless of map
    /// iteration order.
    #[test]
    fn transform_is_deterministic(record in intake_strategy()) {
        let first = transform(record.clone());
        let second = transform(record.clone());
        let reordered = transform(reinserted(&record));

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(&first, &reordered);
    }

    /// Property: every attribute value survives with its matching type or an
    /// empty one.
    #[test]
    fn attribute_values_round_trip(record in intake_strategy()) {
        let outbound = transform(record.clone());

        prop_assert_eq!(outbound.attributes.len(), record.attribute_values.len());
        for (name, value) in &record.attribute_values {
            let entry = &outbound.attributes[name];
            prop_assert_eq!(&entry.value, value);
            let expected_type = record.attribute_types.get(name).cloned().unwrap_or_default();
            prop_assert_eq!(&entry.value_type, &expected_type);
        }
    }

    /// Property: every trait value survives with its matching type or an
    /// empty one.
    #[test]
    fn trait_values_round_trip(record in intake_strategy()) {
        let outbound = transform(record.clone());

        prop_assert_eq!(outbound.traits.len(), record.trait_values.len());
        for (name, value) in &record.trait_values {
            let entry = &outbound.traits[name];
            prop_assert_eq!(&entry.value, value);
            let expected_type = record.trait_types.get(name).cloned().unwrap_or_default();
            prop_assert_eq!(&entry.value_type, &expected_type);
        }
    }

    /// Property: keys present only in a type map never reach the output.
    #[test]
    fn type_only_keys_never_emitted(record in intake_strategy()) {
        let outbound = transform(record.clone());

        for name in record.attribute_types.keys() {
            if !record.attribute_values.contains_key(name) {
                prop_assert!(!outbound.attributes.contains_key(name));
            }
        }
        for name in record.trait_types.keys() {
            if !record.trait_values.contains_key(name) {
                prop_assert!(!outbound.traits.contains_key(name));
            }
        }
    }

    /// Property: scalar fields are copied verbatim.
    #[test]
    fn scalars_copied_verbatim(record in intake_strategy()) {
        let outbound = transform(record.clone());

        prop_assert_eq!(&outbound.event, &record.event);
        prop_assert_eq!(&outbound.event_type, &record.event_type);
        prop_assert_eq!(&outbound.app_id, &record.app_id);
        prop_assert_eq!(&outbound.user_id, &record.user_id);
        prop_assert_eq!(&outbound.message_id, &record.message_id);
        prop_assert_eq!(&outbound.page_title, &record.page_title);
        prop_assert_eq!(&outbound.page_url, &record.page_url);
        prop_assert_eq!(&outbound.browser_language, &record.browser_language);
        prop_assert_eq!(&outbound.screen_size, &record.screen_size);
    }

    /// Property: the wire encoding of an intake record decodes back to the
    /// same record, so client payloads lose nothing before the transform.
    #[test]
    fn intake_wire_names_decode(record in intake_strategy()) {
        let body = serde_json::to_vec(&record).unwrap();
        let decoded = IntakeRecord::decode(&body).unwrap();

        prop_assert_eq!(decoded, record);
    }

    /// Property: outbound JSON always carries every schema field.
    #[test]
    fn outbound_json_has_full_schema(record in intake_strategy()) {
        let value = serde_json::to_value(transform(record)).unwrap();
        let object = value.as_object().unwrap();

        for field in [
            "event", "event_type", "app_id", "user_id", "message_id", "page_title",
            "page_url", "browser_language", "screen_size", "attributes", "traits",
        ] {
            prop_assert!(object.contains_key(field), "missing field {}", field);
        }
        prop_assert_eq!(object.len(), 11);
        let _: OutboundRecord = serde_json::from_value(value.clone()).unwrap();
    }
}

#![no_main]

//! Fuzz target for intake record decoding.
//!
//! Feeds arbitrary request bodies through the intake decoder and the
//! transform. Decoding may fail but must never panic, and anything that
//! decodes must transform and serialize cleanly.

use beacon_core::{transform, BeaconError, IntakeRecord};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    match IntakeRecord::decode(data) {
        Ok(record) => {
            let value_keys: Vec<String> = record.attribute_values.keys().cloned().collect();
            let outbound = transform(record);

            assert_eq!(outbound.attributes.len(), value_keys.len());
            assert!(serde_json::to_vec(&outbound).is_ok());
        },
        Err(error) => {
            assert!(matches!(error, BeaconError::MalformedJson { .. }));
        },
    }
});

//! Intake and outbound record shapes.
//!
//! `IntakeRecord` mirrors the compact wire format clients send (`ev`, `uid`,
//! `atrk`, ...). `OutboundRecord` is the normalized payload forwarded to the
//! downstream webhook. Both are plain owned values: a record moves from the
//! handler into the dispatch queue, then into the worker, and is dropped
//! once delivery has been attempted.

use std::{borrow::Cow, collections::HashMap};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{BeaconError, Result};

/// Raw tracking event as received from a client.
///
/// Every field is optional on the wire. Missing fields and explicit `null`
/// values decode to an empty string or empty map; unknown fields are
/// ignored.
///
/// # Example
///
/// ```
/// use beacon_core::IntakeRecord;
///
/// let record = IntakeRecord::decode(br#"{"ev":"click","uid":"u1"}"#).unwrap();
/// assert_eq!(record.event, "click");
/// assert_eq!(record.user_id, "u1");
/// assert!(record.attribute_values.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeRecord {
    /// Event name.
    #[serde(rename = "ev", deserialize_with = "nullable")]
    pub event: String,
    /// Event type.
    #[serde(rename = "et", deserialize_with = "nullable")]
    pub event_type: String,
    /// Application identifier.
    #[serde(rename = "id", deserialize_with = "nullable")]
    pub app_id: String,
    /// User identifier.
    #[serde(rename = "uid", deserialize_with = "nullable")]
    pub user_id: String,
    /// Message identifier.
    #[serde(rename = "mid", deserialize_with = "nullable")]
    pub message_id: String,
    /// Page title.
    #[serde(rename = "t", deserialize_with = "nullable")]
    pub page_title: String,
    /// Page URL.
    #[serde(rename = "p", deserialize_with = "nullable")]
    pub page_url: String,
    /// Browser language.
    #[serde(rename = "l", deserialize_with = "nullable")]
    pub browser_language: String,
    /// Screen size.
    #[serde(rename = "sc", deserialize_with = "nullable")]
    pub screen_size: String,
    /// Event attribute values keyed by attribute name.
    #[serde(rename = "atrk", deserialize_with = "nullable_map")]
    pub attribute_values: HashMap<String, String>,
    /// Secondary attribute map. Accepted for wire compatibility, never
    /// forwarded.
    #[serde(rename = "atrv", deserialize_with = "nullable_map")]
    pub attribute_aux: HashMap<String, String>,
    /// Event attribute types keyed by attribute name.
    #[serde(rename = "atrt", deserialize_with = "nullable_map")]
    pub attribute_types: HashMap<String, String>,
    /// User trait values keyed by trait name.
    #[serde(rename = "uatrk", deserialize_with = "nullable_map")]
    pub trait_values: HashMap<String, String>,
    /// Secondary trait map. Accepted for wire compatibility, never
    /// forwarded.
    #[serde(rename = "uatrv", deserialize_with = "nullable_map")]
    pub trait_aux: HashMap<String, String>,
    /// User trait types keyed by trait name.
    #[serde(rename = "uatrt", deserialize_with = "nullable_map")]
    pub trait_types: HashMap<String, String>,
}

/// Top-level wire names, matched case-insensitively on decode.
const WIRE_NAMES: [&str; 15] = [
    "ev", "et", "id", "uid", "mid", "t", "p", "l", "sc", "atrk", "atrv", "atrt", "uatrk", "uatrv",
    "uatrt",
];

impl IntakeRecord {
    /// Decodes a request body into an intake record.
    ///
    /// Decoding is lenient in the ways tracking clients rely on:
    /// - a top-level `null` body decodes to an empty record
    /// - invalid UTF-8 and unpaired surrogate escapes become U+FFFD
    /// - top-level keys match wire names case-insensitively, an exact match
    ///   taking precedence
    ///
    /// # Errors
    ///
    /// Returns `BeaconError::MalformedJson` if the body is not JSON, is not
    /// an object, or carries a field of the wrong type.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let text = String::from_utf8_lossy(body);
        let text = replace_lone_surrogates(&text);

        // Derived struct impls also accept JSON arrays; only objects are records.
        match serde_json::from_str::<Value>(&text)? {
            Value::Null => Ok(Self::default()),
            Value::Object(fields) => {
                Ok(serde_json::from_value(Value::Object(canonicalize_keys(fields)))?)
            },
            other => Err(BeaconError::malformed_json(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }
}

fn canonicalize_keys(mut fields: Map<String, Value>) -> Map<String, Value> {
    for name in WIRE_NAMES {
        if fields.contains_key(name) {
            continue;
        }
        let variant = fields.keys().find(|key| key.eq_ignore_ascii_case(name)).cloned();
        if let Some(value) = variant.and_then(|key| fields.remove(&key)) {
            fields.insert(name.to_string(), value);
        }
    }
    fields
}

/// Rewrites `\uXXXX` escapes naming an unpaired UTF-16 surrogate to
/// `\uFFFD`. Well-formed pairs and all other escapes are left alone.
fn replace_lone_surrogates(text: &str) -> Cow<'_, str> {
    if !text.contains("\\u") {
        return Cow::Borrowed(text);
    }

    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\\' {
            i += 1;
            continue;
        }
        let paired = matches!(escaped_unit(bytes, i + 6), Some(0xDC00..=0xDFFF));
        match escaped_unit(bytes, i) {
            Some(0xD800..=0xDBFF) if paired => i += 12,
            Some(0xD800..=0xDFFF) => {
                out.push_str(&text[copied..i]);
                out.push_str("\\uFFFD");
                i += 6;
                copied = i;
            },
            // Any other escape, including `\\`, is two bytes we step over.
            _ => i += 2,
        }
    }

    if copied == 0 {
        return Cow::Borrowed(text);
    }
    out.push_str(&text[copied..]);
    Cow::Owned(out)
}

/// Code unit of the `\uXXXX` escape starting at `at`, if there is one.
fn escaped_unit(bytes: &[u8], at: usize) -> Option<u16> {
    let escape = bytes.get(at..at + 6)?;
    if !escape.starts_with(b"\\u") || !escape[2..].iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    let hex = std::str::from_utf8(&escape[2..]).ok()?;
    u16::from_str_radix(hex, 16).ok()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Normalized event payload sent downstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundRecord {
    /// Event name.
    pub event: String,
    /// Event type.
    pub event_type: String,
    /// Application identifier.
    pub app_id: String,
    /// User identifier.
    pub user_id: String,
    /// Message identifier.
    pub message_id: String,
    /// Page title.
    pub page_title: String,
    /// Page URL.
    pub page_url: String,
    /// Browser language.
    pub browser_language: String,
    /// Screen size.
    pub screen_size: String,
    /// Event attributes keyed by name.
    pub attributes: HashMap<String, AttributeEntry>,
    /// User traits keyed by name.
    pub traits: HashMap<String, TraitEntry>,
}

/// A named event attribute's value and declared type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeEntry {
    /// Attribute value.
    pub value: String,
    /// Declared type, empty when the client sent none.
    #[serde(rename = "type")]
    pub value_type: String,
}

/// A named user trait's value and declared type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitEntry {
    /// Trait value.
    pub value: String,
    /// Declared type, empty when the client sent none.
    #[serde(rename = "type")]
    pub value_type: String,
}

fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn nullable_map<'de, D>(deserializer: D) -> std::result::Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let map: Option<HashMap<String, Option<String>>> = Option::deserialize(deserializer)?;
    Ok(map
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| (key, value.unwrap_or_default()))
        .collect())
}

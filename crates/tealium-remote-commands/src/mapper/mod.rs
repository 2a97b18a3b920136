//! Lookup-table driven payload mapping.
//!
//! A flat event payload is projected into the shape a vendor integration
//! expects. Each lookup entry names a source key and one or more destination
//! paths separated by commas. A destination is either a bare key, written at
//! the top level of the result, or `group.key`, written into the nested
//! object `result[group][key]`. Source keys without a lookup entry are
//! dropped.
//!
//! The event name travels under the reserved source key
//! [`EVENT_NAME_KEY`] and is emitted as [`COMMAND_NAME_KEY`] unless the
//! lookup table maps the reserved key itself.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::Payload;

/// Reserved payload key carrying the event or view name.
pub const EVENT_NAME_KEY: &str = "tealium_event";

/// Reserved result key naming the command the payload is destined for.
pub const COMMAND_NAME_KEY: &str = "command_name";

/// Source key to comma-separated destination paths.
pub type LookupTable = BTreeMap<String, String>;

/// One parsed destination path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination<'a> {
    /// Written at the top level of the result.
    TopLevel(&'a str),
    /// Written into the nested object named by `group`.
    Nested {
        /// Top-level key of the nested object.
        group: &'a str,
        /// Key inside the nested object.
        key: &'a str,
    },
}

/// Splits a destination specifier into its destination paths.
///
/// Segments are trimmed; empty segments, and dot paths with an empty group or
/// key, are skipped. Dot paths split at the first `.`.
pub fn destinations(specifier: &str) -> impl Iterator<Item = Destination<'_>> {
    specifier.split(',').filter_map(|segment| {
        let path = segment.trim();
        if path.is_empty() {
            return None;
        }
        match path.split_once('.') {
            None => Some(Destination::TopLevel(path)),
            Some((group, key)) => {
                let (group, key) = (group.trim(), key.trim());
                (!group.is_empty() && !key.is_empty()).then_some(Destination::Nested { group, key })
            }
        }
    })
}

/// Maps a flat payload through `lookup`, returning a new nested payload.
///
/// Inputs are never modified and the result depends only on the inputs, so
/// the function is safe to call concurrently.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use tealium_remote_commands::mapper::{map_payload, LookupTable};
///
/// let payload = json!({"tealium_event": "purchase", "coupon": "X"});
/// let lookup = LookupTable::from([(
///     "coupon".to_owned(),
///     "purchase.coupon, event.discount_code".to_owned(),
/// )]);
///
/// let mapped = map_payload(payload.as_object().unwrap(), &lookup);
/// assert_eq!(mapped["purchase"]["coupon"], "X");
/// assert_eq!(mapped["event"]["discount_code"], "X");
/// assert_eq!(mapped["command_name"], "purchase");
/// ```
#[must_use]
pub fn map_payload(payload: &Payload, lookup: &LookupTable) -> Payload {
    let mut result = Payload::new();
    for (source_key, value) in payload {
        let Some(specifier) = lookup.get(source_key) else {
            continue;
        };
        for destination in destinations(specifier) {
            write(&mut result, destination, value);
        }
    }

    if !lookup.contains_key(EVENT_NAME_KEY)
        && let Some(event_name) = payload.get(EVENT_NAME_KEY)
    {
        result
            .entry(COMMAND_NAME_KEY)
            .or_insert_with(|| event_name.clone());
    }
    result
}

fn write(result: &mut Payload, destination: Destination<'_>, value: &Value) {
    match destination {
        Destination::TopLevel(key) => {
            // A nested group already claimed this key; groups win over scalars.
            if result.get(key).is_some_and(Value::is_object) {
                return;
            }
            result.insert(key.to_owned(), value.clone());
        }
        Destination::Nested { group, key } => {
            let slot = result
                .entry(group)
                .or_insert_with(|| Value::Object(Payload::new()));
            if !slot.is_object() {
                *slot = Value::Object(Payload::new());
            }
            if let Value::Object(nested) = slot {
                nested.insert(key.to_owned(), value.clone());
            }
        }
    }
}

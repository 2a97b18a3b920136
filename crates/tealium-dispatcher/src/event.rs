//! Tracked events handed to the dispatcher.

use serde_json::Value;
use tealium_remote_commands::{EVENT_NAME_KEY, Payload};

/// Key carrying the kind of tracked call (`event` or `view`).
pub const EVENT_TYPE_KEY: &str = "tealium_event_type";

/// Key carrying the screen title of a view.
pub const SCREEN_TITLE_KEY: &str = "screen_title";

/// A tracked call routed to JSON remote commands.
pub trait Dispatch {
    /// Returns the event name matched against each command's allow-list.
    fn event_name(&self) -> &str;

    /// Returns the flat payload, including the reserved event keys.
    fn payload(&self) -> Payload;
}

/// A named analytics event.
#[derive(Debug, Clone, PartialEq)]
pub struct TealiumEvent {
    event_name: String,
    data: Payload,
}

impl TealiumEvent {
    /// Creates an event with caller-supplied data.
    #[must_use]
    pub fn new(event_name: impl Into<String>, data: Payload) -> Self {
        Self {
            event_name: event_name.into(),
            data,
        }
    }

    /// Returns the caller-supplied data without reserved keys.
    #[must_use]
    pub const fn data(&self) -> &Payload {
        &self.data
    }
}

impl Dispatch for TealiumEvent {
    fn event_name(&self) -> &str {
        &self.event_name
    }

    fn payload(&self) -> Payload {
        with_reserved_keys(&self.data, &self.event_name, "event")
    }
}

/// A screen view. The event name doubles as the screen title.
#[derive(Debug, Clone, PartialEq)]
pub struct TealiumView {
    view_name: String,
    data: Payload,
}

impl TealiumView {
    /// Creates a view with caller-supplied data.
    #[must_use]
    pub fn new(view_name: impl Into<String>, data: Payload) -> Self {
        Self {
            view_name: view_name.into(),
            data,
        }
    }

    /// Returns the caller-supplied data without reserved keys.
    #[must_use]
    pub const fn data(&self) -> &Payload {
        &self.data
    }
}

impl Dispatch for TealiumView {
    fn event_name(&self) -> &str {
        &self.view_name
    }

    fn payload(&self) -> Payload {
        let mut payload = with_reserved_keys(&self.data, &self.view_name, "view");
        payload.insert(
            SCREEN_TITLE_KEY.to_owned(),
            Value::String(self.view_name.clone()),
        );
        payload
    }
}

fn with_reserved_keys(data: &Payload, event_name: &str, event_type: &str) -> Payload {
    let mut payload = data.clone();
    payload.insert(
        EVENT_NAME_KEY.to_owned(),
        Value::String(event_name.to_owned()),
    );
    payload.insert(
        EVENT_TYPE_KEY.to_owned(),
        Value::String(event_type.to_owned()),
    );
    payload
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn data(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn event_payload_carries_reserved_keys() {
        let event = TealiumEvent::new("purchase", data(json!({"order_id": "ord123"})));

        let payload = event.payload();

        assert_eq!(event.event_name(), "purchase");
        assert_eq!(payload["order_id"], json!("ord123"));
        assert_eq!(payload[EVENT_NAME_KEY], json!("purchase"));
        assert_eq!(payload[EVENT_TYPE_KEY], json!("event"));
        assert!(!payload.contains_key(SCREEN_TITLE_KEY));
    }

    #[test]
    fn view_payload_adds_screen_title() {
        let view = TealiumView::new("home", Payload::new());

        let payload = view.payload();

        assert_eq!(payload[EVENT_TYPE_KEY], json!("view"));
        assert_eq!(payload[SCREEN_TITLE_KEY], json!("home"));
    }

    #[test]
    fn reserved_keys_override_caller_data() {
        let event = TealiumEvent::new("purchase", data(json!({"tealium_event": "spoofed"})));

        assert_eq!(event.payload()[EVENT_NAME_KEY], json!("purchase"));
        assert_eq!(event.data()[EVENT_NAME_KEY], json!("spoofed"));
    }
}

//! Tag metadata published by the `_config` bridge command.

use serde_json::Value;
use tealium_remote_commands::Payload;

const PUBLISHED_KEY: &str = "published";
const TRACE_ID_KEY: &str = "trace_id";

/// Metadata the tag-management page reports about itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagMetadata {
    published: Option<Value>,
    trace_id: Option<String>,
}

impl TagMetadata {
    /// Reads metadata from a `_config` payload.
    ///
    /// Unknown keys are ignored; a `trace_id` that is not a string or number
    /// is dropped.
    #[must_use]
    pub fn from_payload(payload: &Payload) -> Self {
        let published = payload.get(PUBLISHED_KEY).filter(|value| !value.is_null()).cloned();
        let trace_id = payload.get(TRACE_ID_KEY).and_then(|value| match value {
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        });
        Self {
            published,
            trace_id,
        }
    }

    /// Returns the publish stamp of the loaded tag configuration.
    #[must_use]
    pub const fn published(&self) -> Option<&Value> {
        self.published.as_ref()
    }

    /// Returns the trace id active on the page.
    #[must_use]
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Returns `true` when nothing has been reported.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.published.is_none() && self.trace_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn reads_published_and_trace_id() {
        let Value::Object(payload) = json!({"published": "202410161200", "trace_id": 4321})
        else {
            panic!("object literal");
        };

        let metadata = TagMetadata::from_payload(&payload);

        assert_eq!(metadata.published(), Some(&json!("202410161200")));
        assert_eq!(metadata.trace_id(), Some("4321"));
        assert!(!metadata.is_empty());
    }

    #[test]
    fn empty_payload_yields_empty_metadata() {
        assert!(TagMetadata::from_payload(&Payload::new()).is_empty());
    }
}

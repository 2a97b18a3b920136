//! Bridge URL parsing.
//!
//! Page scripts invoke native commands by navigating to
//! `tealium://<command>?request=<url-encoded JSON>`, where the JSON object
//! carries optional `config` and `payload` objects. This module decodes that
//! format and can render it back for tests and tooling.

use std::fmt;
use std::sync::Arc;

use percent_encoding::{NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use tealium_remote_commands::{Payload, ResponseHandler};
use url::form_urlencoded;

use crate::errors::DispatchError;

/// Scheme used by page scripts to reach native commands.
pub const BRIDGE_SCHEME: &str = "tealium";

/// Query parameter holding the JSON request.
pub const REQUEST_PARAM: &str = "request";

#[derive(Debug, Default, Deserialize, Serialize)]
struct Envelope {
    #[serde(default)]
    config: Payload,
    #[serde(default)]
    payload: Payload,
}

/// Returns `true` when `url` uses `scheme` as its bridge scheme.
#[must_use]
pub fn is_bridge_url(url: &str, scheme: &str) -> bool {
    url.strip_prefix(scheme)
        .is_some_and(|rest| rest.starts_with("://"))
}

/// A decoded bridge invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeInvocation {
    command_name: String,
    config: Payload,
    payload: Payload,
}

impl BridgeInvocation {
    /// Creates an invocation from its parts.
    #[must_use]
    pub fn new(command_name: impl Into<String>, config: Payload, payload: Payload) -> Self {
        Self {
            command_name: command_name.into(),
            config,
            payload,
        }
    }

    /// Parses a bridge URL using `scheme`.
    ///
    /// A URL without a `request` parameter yields empty `config` and
    /// `payload` objects.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::NotBridgeUrl`] when the scheme differs and
    /// [`DispatchError::MalformedBridgeUrl`] when the command name is empty
    /// or the request is not a JSON object.
    pub fn parse(url: &str, scheme: &str) -> Result<Self, DispatchError> {
        let target = url
            .strip_prefix(scheme)
            .and_then(|after_scheme| after_scheme.strip_prefix("://"))
            .ok_or_else(|| DispatchError::not_bridge_url(url))?;
        let without_fragment = target.split_once('#').map_or(target, |(before, _)| before);
        let (head, query) = without_fragment
            .split_once('?')
            .unwrap_or((without_fragment, ""));
        let command_name = percent_decode_str(head.trim_end_matches('/'))
            .decode_utf8()
            .map_err(|error| DispatchError::malformed(error.to_string(), None))?
            .into_owned();
        if command_name.is_empty() {
            return Err(DispatchError::malformed("missing command name", None));
        }

        let request = form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == REQUEST_PARAM)
            .map(|(_, value)| value.into_owned());
        let envelope = match request {
            Some(json) => serde_json::from_str::<Envelope>(&json).map_err(|error| {
                DispatchError::malformed(error.to_string(), Some(&command_name))
            })?,
            None => Envelope::default(),
        };

        Ok(Self {
            command_name,
            config: envelope.config,
            payload: envelope.payload,
        })
    }

    /// Returns the target command name.
    #[must_use]
    pub fn command_name(&self) -> &str {
        &self.command_name
    }

    /// Returns the `config` object.
    #[must_use]
    pub const fn config(&self) -> &Payload {
        &self.config
    }

    /// Returns the `payload` object.
    #[must_use]
    pub const fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Splits the invocation into its name, config and payload.
    #[must_use]
    pub fn into_parts(self) -> (String, Payload, Payload) {
        (self.command_name, self.config, self.payload)
    }

    /// Renders the invocation as a bridge URL under `scheme`.
    #[must_use]
    pub fn to_url(&self, scheme: &str) -> String {
        let envelope = Envelope {
            config: self.config.clone(),
            payload: self.payload.clone(),
        };
        let json = serde_json::to_string(&envelope).unwrap_or_else(|_| String::from("{}"));
        format!(
            "{scheme}://{}?{REQUEST_PARAM}={}",
            utf8_percent_encode(&self.command_name, NON_ALPHANUMERIC),
            utf8_percent_encode(&json, NON_ALPHANUMERIC),
        )
    }
}

/// A bridge URL paired with the handler that answers its caller.
#[derive(Clone)]
pub struct BridgeRequest {
    url: String,
    handler: Arc<dyn ResponseHandler>,
}

impl fmt::Debug for BridgeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeRequest")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl BridgeRequest {
    /// Creates a request for `url` answered through `handler`.
    #[must_use]
    pub fn new(url: impl Into<String>, handler: Arc<dyn ResponseHandler>) -> Self {
        Self {
            url: url.into(),
            handler,
        }
    }

    /// Returns the raw bridge URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the handler bound to the caller.
    #[must_use]
    pub const fn handler(&self) -> &Arc<dyn ResponseHandler> {
        &self.handler
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_raw_json_request() {
        let url = r#"tealium://testWebViewCommand?request={"config":{"response_id":"123"},"payload":{"hello": "world"}}"#;

        let invocation = BridgeInvocation::parse(url, BRIDGE_SCHEME).expect("parse");

        assert_eq!(invocation.command_name(), "testWebViewCommand");
        assert_eq!(invocation.config()["response_id"], json!("123"));
        assert_eq!(invocation.payload()["hello"], json!("world"));
    }

    #[test]
    fn parses_percent_encoded_request() {
        let url = "tealium://bgcolor?request=%7B%22payload%22%3A%7B%22color%22%3A%22%23ff0000%22%7D%7D";

        let invocation = BridgeInvocation::parse(url, BRIDGE_SCHEME).expect("parse");

        assert_eq!(invocation.command_name(), "bgcolor");
        assert_eq!(invocation.payload()["color"], json!("#ff0000"));
        assert!(invocation.config().is_empty());
    }

    #[test]
    fn missing_request_yields_empty_objects() {
        let invocation = BridgeInvocation::parse("tealium://ping", BRIDGE_SCHEME).expect("parse");

        assert_eq!(invocation.command_name(), "ping");
        assert!(invocation.config().is_empty());
        assert!(invocation.payload().is_empty());
    }

    #[rstest]
    #[case::other_scheme("https://tags.tiqcdn.com/utag/mobile.html", 400, None)]
    #[case::empty_name("tealium://?request={}", 400, None)]
    #[case::bad_json("tealium://bgcolor?request={oops", 400, Some("bgcolor"))]
    #[case::not_object("tealium://bgcolor?request=[1,2]", 400, Some("bgcolor"))]
    fn rejects_invalid_urls(
        #[case] url: &str,
        #[case] status: i32,
        #[case] command: Option<&str>,
    ) {
        let error = BridgeInvocation::parse(url, BRIDGE_SCHEME).expect_err("should fail");

        assert_eq!(error.status(), status);
        assert_eq!(error.command_name(), command);
    }

    #[test]
    fn rendered_url_parses_back() {
        let mut payload = Payload::new();
        payload.insert("note".into(), json!("a&b=c d"));
        let invocation = BridgeInvocation::new("notes", Payload::new(), payload);

        let url = invocation.to_url(BRIDGE_SCHEME);

        assert!(url.starts_with("tealium://notes?request="));
        assert_eq!(
            BridgeInvocation::parse(&url, BRIDGE_SCHEME).expect("parse"),
            invocation
        );
    }

    #[rstest]
    #[case("tealium://bgcolor", true)]
    #[case("tealiumx://bgcolor", false)]
    #[case("https://example.com", false)]
    fn detects_bridge_urls(#[case] url: &str, #[case] expected: bool) {
        assert_eq!(is_bridge_url(url, BRIDGE_SCHEME), expected);
    }
}

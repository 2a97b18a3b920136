//! Invocation payloads handed to remote commands, and the channel used to
//! answer the caller.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::trace;

use crate::Payload;

/// Request handled successfully.
pub const STATUS_OK: i32 = 200;
/// Request was malformed.
pub const STATUS_BAD_REQUEST: i32 = 400;
/// Requested command is not registered.
pub const STATUS_NOT_FOUND: i32 = 404;
/// Command failed while handling the request.
pub const STATUS_SERVER_ERROR: i32 = 555;

/// Key of the bridge `config` block that correlates a response with its
/// request.
pub const RESPONSE_ID_KEY: &str = "response_id";

const RESPONSE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::response");

/// Receives responses written back by a command.
pub trait ResponseHandler: Send + Sync {
    /// Called once per [`Response::send`].
    fn on_handle(&self, response: &Response);
}

impl<F> ResponseHandler for F
where
    F: Fn(&Response) + Send + Sync,
{
    fn on_handle(&self, response: &Response) {
        self(response);
    }
}

/// The value passed to [`RemoteCommand::on_invoke`](crate::RemoteCommand::on_invoke).
///
/// Carries the request payload (mapped for event-driven invocations, raw for
/// bridge invocations), the bridge `config` block, and an optional handler
/// bound to the original caller. Commands set a status and body and call
/// [`Response::send`] to answer; commands may move the response into their
/// own asynchronous work and answer later.
#[derive(Clone)]
pub struct Response {
    command_name: String,
    response_id: Option<String>,
    request_payload: Payload,
    config: Payload,
    status: i32,
    body: Option<String>,
    handler: Option<Arc<dyn ResponseHandler>>,
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("command_name", &self.command_name)
            .field("response_id", &self.response_id)
            .field("request_payload", &self.request_payload)
            .field("config", &self.config)
            .field("status", &self.status)
            .field("body", &self.body)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

impl Response {
    /// Creates a response for a programmatic invocation with no caller to
    /// answer.
    #[must_use]
    pub fn new(command_name: impl Into<String>, request_payload: Payload) -> Self {
        Self {
            command_name: command_name.into(),
            response_id: None,
            request_payload,
            config: Payload::new(),
            status: STATUS_OK,
            body: None,
            handler: None,
        }
    }

    /// Creates a response for a bridge invocation answered through
    /// `handler`.
    ///
    /// The response id is read from `config.response_id`; numeric ids are
    /// accepted and rendered as text.
    #[must_use]
    pub fn bridged(
        command_name: impl Into<String>,
        config: Payload,
        request_payload: Payload,
        handler: Arc<dyn ResponseHandler>,
    ) -> Self {
        let response_id = config.get(RESPONSE_ID_KEY).and_then(|value| match value {
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        });
        Self {
            command_name: command_name.into(),
            response_id,
            request_payload,
            config,
            status: STATUS_OK,
            body: None,
            handler: Some(handler),
        }
    }

    /// Returns the name of the invoked command.
    #[must_use]
    pub fn command_name(&self) -> &str {
        self.command_name.as_str()
    }

    /// Returns the correlation id supplied by the caller, if any.
    #[must_use]
    pub fn response_id(&self) -> Option<&str> {
        self.response_id.as_deref()
    }

    /// Returns the request payload.
    #[must_use]
    pub const fn request_payload(&self) -> &Payload {
        &self.request_payload
    }

    /// Returns the bridge `config` block (empty for event invocations).
    #[must_use]
    pub const fn config(&self) -> &Payload {
        &self.config
    }

    /// Returns the status that will be reported.
    #[must_use]
    pub const fn status(&self) -> i32 {
        self.status
    }

    /// Returns the body that will be reported.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Returns `true` when a caller is waiting for an answer.
    #[must_use]
    pub fn expects_answer(&self) -> bool {
        self.handler.is_some()
    }

    /// Sets the reported status.
    pub const fn set_status(&mut self, status: i32) -> &mut Self {
        self.status = status;
        self
    }

    /// Sets the reported body.
    pub fn set_body(&mut self, body: impl Into<String>) -> &mut Self {
        self.body = Some(body.into());
        self
    }

    /// Delivers the response to the bound handler.
    ///
    /// Returns `false` when there is no caller to answer.
    pub fn send(&self) -> bool {
        match &self.handler {
            Some(handler) => {
                handler.on_handle(self);
                true
            }
            None => {
                trace!(
                    target: RESPONSE_TARGET,
                    command = %self.command_name,
                    "response has no handler; nothing to send"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    fn object(value: Value) -> Payload {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn programmatic_response_has_no_handler() {
        let response = Response::new("firebase", Payload::new());
        assert!(!response.expects_answer());
        assert!(!response.send());
        assert_eq!(response.status(), STATUS_OK);
    }

    #[test]
    fn bridged_response_reaches_handler() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler: Arc<dyn ResponseHandler> = Arc::new(move |response: &Response| {
            sink.lock()
                .expect("sink lock")
                .push((response.status(), response.body().map(str::to_owned)));
        });
        let mut response = Response::bridged(
            "bgcolor",
            object(json!({"response_id": "123"})),
            object(json!({"hello": "world"})),
            handler,
        );
        response.set_status(STATUS_NOT_FOUND).set_body("missing");

        assert!(response.send());
        assert_eq!(response.response_id(), Some("123"));
        assert_eq!(
            seen.lock().expect("seen lock").as_slice(),
            &[(STATUS_NOT_FOUND, Some("missing".to_owned()))]
        );
    }

    #[test]
    fn numeric_response_id_is_rendered_as_text() {
        let handler: Arc<dyn ResponseHandler> = Arc::new(|_: &Response| {});
        let response = Response::bridged(
            "bgcolor",
            object(json!({"response_id": 42})),
            Payload::new(),
            handler,
        );
        assert_eq!(response.response_id(), Some("42"));
    }
}

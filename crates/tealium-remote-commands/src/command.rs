//! The remote command contract and a closure-backed implementation.

use crate::error::CommandError;
use crate::response::Response;

/// A named handler invoked with a (possibly mapped) payload.
///
/// Implementations must be thread-safe: the dispatcher may invoke a command
/// from whichever thread delivers the event or bridge URL. Work that outlives
/// the call should move the [`Response`] into that work and call
/// [`Response::send`] when done.
pub trait RemoteCommand: Send + Sync {
    /// Unique command name used for registration and bridge routing.
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> Option<&str> {
        None
    }

    /// Handles one invocation.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] when the command cannot handle the request.
    /// The failure is logged and reported without affecting other commands.
    fn on_invoke(&self, response: Response) -> Result<(), CommandError>;
}

/// Adapts a closure into a [`RemoteCommand`].
///
/// # Example
///
/// ```
/// use tealium_remote_commands::{RemoteCommand, RemoteCommandFn, Response};
///
/// let command = RemoteCommandFn::new("bgcolor", |response: Response| {
///     let _ = response.request_payload();
///     Ok(())
/// })
/// .with_description("sets the background colour");
/// assert_eq!(command.name(), "bgcolor");
/// ```
pub struct RemoteCommandFn<F> {
    name: String,
    description: Option<String>,
    handler: F,
}

impl<F> RemoteCommandFn<F>
where
    F: Fn(Response) -> Result<(), CommandError> + Send + Sync,
{
    /// Wraps `handler` under `name`.
    pub fn new(name: impl Into<String>, handler: F) -> Self {
        Self {
            name: name.into(),
            description: None,
            handler,
        }
    }

    /// Attaches a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl<F> std::fmt::Debug for RemoteCommandFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteCommandFn")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl<F> RemoteCommand for RemoteCommandFn<F>
where
    F: Fn(Response) -> Result<(), CommandError> + Send + Sync,
{
    fn name(&self) -> &str {
        self.name.as_str()
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn on_invoke(&self, response: Response) -> Result<(), CommandError> {
        (self.handler)(response)
    }
}

//! Routing of tracked events and bridge invocations to remote commands.
//!
//! Tracked events fan out to every JSON command whose configuration accepts
//! the event, in registration order. Bridge URLs name exactly one command;
//! unknown names and undecodable requests are answered through the caller's
//! handler so the page does not wait forever.
//!
//! Every invocation is isolated: a command that errors or panics is logged
//! and reported, and the remaining commands still run.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tealium_remote_commands::{
    CONFIG_COMMAND, CommandConfigSource, CommandError, CommandRegistry, Payload, RegisteredCommand,
    RemoteCommand, Response, ResponseHandler,
};
use tracing::{debug, info, warn};

use crate::bridge::{BRIDGE_SCHEME, BridgeInvocation, BridgeRequest};
use crate::errors::DispatchError;
use crate::event::Dispatch;
use crate::metadata::TagMetadata;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// How a single command fared during a dispatch.
#[derive(Debug, Clone)]
pub enum InvocationStatus {
    /// The command ran and returned normally.
    Completed,
    /// The command was not invoked.
    Skipped(DispatchError),
    /// The command ran and failed.
    Failed(DispatchError),
}

/// Outcome for one command.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    command: String,
    status: InvocationStatus,
}

impl CommandOutcome {
    /// Returns the command name.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Returns the invocation status.
    #[must_use]
    pub const fn status(&self) -> &InvocationStatus {
        &self.status
    }

    /// Returns `true` when the command ran and returned normally.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self.status, InvocationStatus::Completed)
    }

    /// Returns the error that skipped or failed the command.
    #[must_use]
    pub const fn error(&self) -> Option<&DispatchError> {
        match &self.status {
            InvocationStatus::Completed => None,
            InvocationStatus::Skipped(error) | InvocationStatus::Failed(error) => Some(error),
        }
    }
}

/// Summary of routing one tracked event.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    event_name: String,
    outcomes: Vec<CommandOutcome>,
}

impl DispatchReport {
    fn new(event_name: &str) -> Self {
        Self {
            event_name: event_name.to_owned(),
            outcomes: Vec::new(),
        }
    }

    fn push(&mut self, command: &str, status: InvocationStatus) {
        self.outcomes.push(CommandOutcome {
            command: command.to_owned(),
            status,
        });
    }

    /// Returns the dispatched event name.
    #[must_use]
    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    /// Returns the outcomes in invocation order.
    #[must_use]
    pub fn outcomes(&self) -> &[CommandOutcome] {
        &self.outcomes
    }

    /// Returns the names of the commands that were invoked.
    #[must_use]
    pub fn invoked(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|outcome| !matches!(outcome.status, InvocationStatus::Skipped(_)))
            .map(CommandOutcome::command)
            .collect()
    }

    /// Returns `true` when every matched command completed.
    #[must_use]
    pub fn all_completed(&self) -> bool {
        self.outcomes.iter().all(CommandOutcome::is_completed)
    }
}

/// Routes tracked events and bridge URLs to registered commands.
///
/// The registry lock is only held while selecting commands; commands run
/// without it so they may register or remove commands themselves.
#[derive(Debug)]
pub struct RemoteCommandDispatcher {
    registry: RwLock<CommandRegistry>,
    scheme: String,
    metadata: Mutex<TagMetadata>,
}

impl Default for RemoteCommandDispatcher {
    fn default() -> Self {
        Self::new(CommandRegistry::new())
    }
}

impl RemoteCommandDispatcher {
    /// Creates a dispatcher over `registry` using the `tealium` scheme.
    #[must_use]
    pub fn new(registry: CommandRegistry) -> Self {
        Self::with_scheme(registry, BRIDGE_SCHEME)
    }

    /// Creates a dispatcher that recognizes bridge URLs under `scheme`.
    #[must_use]
    pub fn with_scheme(registry: CommandRegistry, scheme: impl Into<String>) -> Self {
        Self {
            registry: RwLock::new(registry),
            scheme: scheme.into(),
            metadata: Mutex::new(TagMetadata::default()),
        }
    }

    /// Returns the bridge scheme.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Registers a command. See [`CommandRegistry::add`].
    ///
    /// # Errors
    ///
    /// Propagates the registry's validation errors.
    pub fn add(
        &self,
        command: Arc<dyn RemoteCommand>,
        filename: Option<&str>,
    ) -> Result<(), CommandError> {
        let name = command.name().to_owned();
        self.write_registry().add(command, filename)?;
        info!(target: DISPATCH_TARGET, command = %name, "remote command registered");
        Ok(())
    }

    /// Registers a JSON command with an explicit configuration source.
    ///
    /// # Errors
    ///
    /// Propagates the registry's validation errors.
    pub fn add_with_source(
        &self,
        command: Arc<dyn RemoteCommand>,
        source: Arc<dyn CommandConfigSource>,
    ) -> Result<(), CommandError> {
        let name = command.name().to_owned();
        self.write_registry().add_with_source(command, source)?;
        info!(target: DISPATCH_TARGET, command = %name, "remote command registered");
        Ok(())
    }

    /// Removes the command registered under `name`.
    pub fn remove(&self, name: &str) -> bool {
        let removed = self.write_registry().remove(name).is_some();
        if removed {
            info!(target: DISPATCH_TARGET, command = %name, "remote command removed");
        }
        removed
    }

    /// Removes every registered command.
    pub fn remove_all(&self) {
        self.write_registry().remove_all();
        info!(target: DISPATCH_TARGET, "all remote commands removed");
    }

    /// Returns the registered command names in registration order.
    #[must_use]
    pub fn command_names(&self) -> Vec<String> {
        self.read_registry()
            .names()
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    /// Returns the latest metadata reported through `_config`.
    #[must_use]
    pub fn tag_metadata(&self) -> TagMetadata {
        self.metadata
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Routes a tracked event to every JSON command that accepts it.
    ///
    /// Commands whose configuration cannot be retrieved are skipped and
    /// reported; commands that do not accept the event are left out of the
    /// report.
    pub fn on_process_remote_command(&self, dispatch: &dyn Dispatch) -> DispatchReport {
        let event_name = dispatch.event_name();
        let payload = dispatch.payload();
        let candidates: Vec<RegisteredCommand> =
            self.read_registry().json_commands().cloned().collect();
        let mut report = DispatchReport::new(event_name);

        for entry in candidates {
            let Some(retriever) = entry.retriever() else {
                continue;
            };
            let config = match retriever.config() {
                Ok(config) => config,
                Err(source) => {
                    let error = DispatchError::config_retrieval(entry.name(), source);
                    warn!(
                        target: DISPATCH_TARGET,
                        command = %entry.name(),
                        error = %error,
                        "skipping remote command"
                    );
                    report.push(entry.name(), InvocationStatus::Skipped(error));
                    continue;
                }
            };
            if !config.accepts(event_name) {
                debug!(
                    target: DISPATCH_TARGET,
                    command = %entry.name(),
                    event = %event_name,
                    "event not mapped for remote command"
                );
                continue;
            }

            let request = config.request_payload(event_name, &payload);
            let response = Response::new(entry.name(), request);
            let status = match invoke(entry.command().as_ref(), response) {
                Ok(()) => InvocationStatus::Completed,
                Err(error) => InvocationStatus::Failed(error),
            };
            report.push(entry.name(), status);
        }

        debug!(
            target: DISPATCH_TARGET,
            event = %event_name,
            invoked = report.invoked().len(),
            "event dispatched"
        );
        report
    }

    /// Routes a bridge URL to the command it names.
    ///
    /// `_config` is handled internally and records [`TagMetadata`]. Unknown
    /// commands are answered with 404 and undecodable requests for a known
    /// name with 400. Failures of the command itself are logged and returned
    /// but not answered; answering is the command's responsibility.
    ///
    /// # Errors
    ///
    /// Returns the [`DispatchError`] describing why the command did not
    /// complete.
    pub fn on_remote_command_send(&self, request: BridgeRequest) -> Result<(), DispatchError> {
        let invocation = match BridgeInvocation::parse(request.url(), &self.scheme) {
            Ok(invocation) => invocation,
            Err(error) => {
                warn!(target: DISPATCH_TARGET, url = %request.url(), error = %error, "rejecting bridge request");
                if let Some(name) = error.command_name() {
                    answer_error(name, Payload::new(), request.handler(), &error);
                }
                return Err(error);
            }
        };

        if invocation.command_name() == CONFIG_COMMAND {
            let metadata = TagMetadata::from_payload(invocation.payload());
            debug!(
                target: DISPATCH_TARGET,
                trace_id = ?metadata.trace_id(),
                "tag metadata received"
            );
            *self.metadata.lock().unwrap_or_else(PoisonError::into_inner) = metadata;
            return Ok(());
        }

        let entry = self.read_registry().get(invocation.command_name()).cloned();
        let (name, config, payload) = invocation.into_parts();
        let Some(entry) = entry else {
            let error = DispatchError::unknown_command(&name);
            warn!(target: DISPATCH_TARGET, command = %name, "bridge request for unknown command");
            answer_error(&name, config, request.handler(), &error);
            return Err(error);
        };

        let response = Response::bridged(name, config, payload, Arc::clone(request.handler()));
        invoke(entry.command().as_ref(), response)
    }

    fn read_registry(&self) -> RwLockReadGuard<'_, CommandRegistry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_registry(&self) -> RwLockWriteGuard<'_, CommandRegistry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn answer_error(
    name: &str,
    config: Payload,
    handler: &Arc<dyn ResponseHandler>,
    error: &DispatchError,
) {
    let mut response = Response::bridged(name, config, Payload::new(), Arc::clone(handler));
    response.set_status(error.status()).set_body(error.to_string());
    response.send();
}

fn invoke(command: &dyn RemoteCommand, response: Response) -> Result<(), DispatchError> {
    let name = command.name().to_owned();
    debug!(target: DISPATCH_TARGET, command = %name, "invoking remote command");
    match panic::catch_unwind(AssertUnwindSafe(|| command.on_invoke(response))) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => {
            let error = DispatchError::command_failed(name, source);
            warn!(target: DISPATCH_TARGET, error = %error, "remote command failed");
            Err(error)
        }
        Err(panic) => {
            let error = DispatchError::command_panicked(name, panic_message(panic.as_ref()));
            warn!(target: DISPATCH_TARGET, error = %error, "remote command panicked");
            Err(error)
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| String::from("non-string panic payload"))
}

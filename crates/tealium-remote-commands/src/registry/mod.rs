//! Registry of remote commands and their configuration retrievers.
//!
//! The [`CommandRegistry`] keeps commands in registration order, which is the
//! order the dispatcher invokes them in. Commands registered with a
//! configuration source are *JSON-configured*: events reach them through
//! their allow-list and lookup table. Commands registered without one are
//! *webview* commands, reached by name from bridge URLs. Duplicate
//! registrations for the same name are rejected.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};

use crate::command::RemoteCommand;
use crate::error::CommandError;
use crate::retriever::ConfigRetriever;
use crate::source::{AssetConfigSource, CommandConfigSource};

/// Name of the internal command that receives page metadata from the
/// tag-management surface.
pub const CONFIG_COMMAND: &str = "_config";

/// How the dispatcher selects a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Selected by event name through the configured allow-list.
    Json,
    /// Selected by literal name from a bridge URL.
    Webview,
}

impl CommandKind {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Webview => "webview",
        }
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A command together with its routing class and configuration retriever.
#[derive(Clone)]
pub struct RegisteredCommand {
    command: Arc<dyn RemoteCommand>,
    kind: CommandKind,
    retriever: Option<Arc<ConfigRetriever>>,
}

impl std::fmt::Debug for RegisteredCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredCommand")
            .field("name", &self.name())
            .field("kind", &self.kind)
            .field("retriever", &self.retriever)
            .finish()
    }
}

impl RegisteredCommand {
    /// Returns the command name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.command.name()
    }

    /// Returns the command.
    #[must_use]
    pub const fn command(&self) -> &Arc<dyn RemoteCommand> {
        &self.command
    }

    /// Returns the routing class.
    #[must_use]
    pub const fn kind(&self) -> CommandKind {
        self.kind
    }

    /// Returns the configuration retriever of a JSON-configured command.
    #[must_use]
    pub const fn retriever(&self) -> Option<&Arc<ConfigRetriever>> {
        self.retriever.as_ref()
    }
}

/// Registry of remote commands.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tealium_remote_commands::{CommandRegistry, RemoteCommandFn};
///
/// let mut registry = CommandRegistry::new();
/// registry
///     .add(Arc::new(RemoteCommandFn::new("bgcolor", |_| Ok(()))), None)
///     .expect("registration succeeds");
/// assert!(registry.get("bgcolor").is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: Vec<RegisteredCommand>,
    asset_directory: Option<Utf8PathBuf>,
}

impl CommandRegistry {
    /// Creates an empty registry without an asset directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry that resolves bundled files in `directory`.
    #[must_use]
    pub fn with_asset_directory(directory: impl Into<Utf8PathBuf>) -> Self {
        Self {
            commands: Vec::new(),
            asset_directory: Some(directory.into()),
        }
    }

    /// Returns the directory bundled configuration files are read from.
    #[must_use]
    pub fn asset_directory(&self) -> Option<&Utf8Path> {
        self.asset_directory.as_deref()
    }

    /// Registers `command`.
    ///
    /// With a `filename`, the command is JSON-configured from that bundled
    /// file. Without one it is a webview command that needs no
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::AlreadyRegistered`] for a duplicate name,
    /// [`CommandError::ReservedName`] for [`CONFIG_COMMAND`],
    /// [`CommandError::EmptyName`] for a blank name, and
    /// [`CommandError::MissingAssetDirectory`] when a filename is given but no
    /// asset directory is configured.
    pub fn add(
        &mut self,
        command: Arc<dyn RemoteCommand>,
        filename: Option<&str>,
    ) -> Result<(), CommandError> {
        self.validate_name(command.name())?;
        let Some(filename) = filename else {
            self.commands.push(RegisteredCommand {
                command,
                kind: CommandKind::Webview,
                retriever: None,
            });
            return Ok(());
        };
        let Some(directory) = self.asset_directory.as_deref() else {
            return Err(CommandError::MissingAssetDirectory {
                name: command.name().to_owned(),
                filename: filename.to_owned(),
            });
        };
        let source = Arc::new(AssetConfigSource::new(directory, filename));
        self.push_configured(command, source);
        Ok(())
    }

    /// Registers a JSON-configured `command` whose configuration comes from
    /// `source`.
    ///
    /// # Errors
    ///
    /// Fails for the same naming reasons as [`CommandRegistry::add`].
    pub fn add_with_source(
        &mut self,
        command: Arc<dyn RemoteCommand>,
        source: Arc<dyn CommandConfigSource>,
    ) -> Result<(), CommandError> {
        self.validate_name(command.name())?;
        self.push_configured(command, source);
        Ok(())
    }

    fn push_configured(
        &mut self,
        command: Arc<dyn RemoteCommand>,
        source: Arc<dyn CommandConfigSource>,
    ) {
        let retriever = Arc::new(ConfigRetriever::new(command.name(), source));
        self.commands.push(RegisteredCommand {
            command,
            kind: CommandKind::Json,
            retriever: Some(retriever),
        });
    }

    fn validate_name(&self, name: &str) -> Result<(), CommandError> {
        if name.trim().is_empty() {
            return Err(CommandError::EmptyName);
        }
        if name == CONFIG_COMMAND {
            return Err(CommandError::ReservedName {
                name: name.to_owned(),
            });
        }
        if self.get(name).is_some() {
            return Err(CommandError::AlreadyRegistered {
                name: name.to_owned(),
            });
        }
        Ok(())
    }

    /// Looks up a command by exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RegisteredCommand> {
        self.commands.iter().find(|entry| entry.name() == name)
    }

    /// Returns the configuration retriever of a JSON-configured command.
    #[must_use]
    pub fn config_retriever_for(&self, name: &str) -> Option<Arc<ConfigRetriever>> {
        self.get(name)
            .and_then(|entry| entry.retriever.as_ref().map(Arc::clone))
    }

    /// Returns JSON-configured commands in registration order.
    pub fn json_commands(&self) -> impl Iterator<Item = &RegisteredCommand> {
        self.of_kind(CommandKind::Json)
    }

    /// Returns webview commands in registration order.
    pub fn webview_commands(&self) -> impl Iterator<Item = &RegisteredCommand> {
        self.of_kind(CommandKind::Webview)
    }

    fn of_kind(&self, kind: CommandKind) -> impl Iterator<Item = &RegisteredCommand> {
        self.commands.iter().filter(move |entry| entry.kind == kind)
    }

    /// Unregisters a command, returning it if it was present.
    pub fn remove(&mut self, name: &str) -> Option<RegisteredCommand> {
        let index = self.commands.iter().position(|entry| entry.name() == name)?;
        Some(self.commands.remove(index))
    }

    /// Unregisters every command.
    pub fn remove_all(&mut self) {
        self.commands.clear();
    }

    /// Returns registered names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.commands.iter().map(RegisteredCommand::name).collect()
    }

    /// Returns the number of registered commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` when no commands are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

//! Error types for event and bridge dispatch failures.
//!
//! Each variant maps to a specific failure mode and carries enough context to
//! answer a bridge caller or to explain a skipped command in the dispatch
//! report.

use tealium_remote_commands::{
    CommandError, ConfigError, STATUS_BAD_REQUEST, STATUS_NOT_FOUND, STATUS_SERVER_ERROR,
};
use thiserror::Error;

/// Errors surfaced while parsing or routing an invocation.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// The URL does not use the bridge scheme.
    #[error("not a bridge URL: {url}")]
    NotBridgeUrl {
        /// Offending URL.
        url: String,
    },

    /// The bridge URL could not be decoded.
    #[error("malformed bridge URL: {message}")]
    MalformedBridgeUrl {
        /// Parser message.
        message: String,
        /// Command name, when it could be extracted.
        command: Option<String>,
    },

    /// The bridge URL names a command that is not registered.
    #[error("no remote command registered as '{name}'")]
    UnknownCommand {
        /// Requested command name.
        name: String,
    },

    /// The command's configuration could not be retrieved.
    #[error("configuration for '{command}' unavailable: {source}")]
    ConfigRetrieval {
        /// Command name.
        command: String,
        /// Underlying retrieval error.
        #[source]
        source: ConfigError,
    },

    /// The command returned an error.
    #[error("remote command '{command}' failed: {source}")]
    CommandFailed {
        /// Command name.
        command: String,
        /// Error returned by the command.
        #[source]
        source: CommandError,
    },

    /// The command panicked.
    #[error("remote command '{command}' panicked: {message}")]
    CommandPanicked {
        /// Command name.
        command: String,
        /// Panic message, when it was a string.
        message: String,
    },
}

impl DispatchError {
    /// Returns the response status reported to a bridge caller.
    #[must_use]
    pub const fn status(&self) -> i32 {
        match self {
            Self::NotBridgeUrl { .. } | Self::MalformedBridgeUrl { .. } => STATUS_BAD_REQUEST,
            Self::UnknownCommand { .. } => STATUS_NOT_FOUND,
            Self::ConfigRetrieval { .. }
            | Self::CommandFailed { .. }
            | Self::CommandPanicked { .. } => STATUS_SERVER_ERROR,
        }
    }

    /// Returns the command the error concerns, when known.
    #[must_use]
    pub fn command_name(&self) -> Option<&str> {
        match self {
            Self::NotBridgeUrl { .. } => None,
            Self::MalformedBridgeUrl { command, .. } => command.as_deref(),
            Self::UnknownCommand { name } => Some(name.as_str()),
            Self::ConfigRetrieval { command, .. }
            | Self::CommandFailed { command, .. }
            | Self::CommandPanicked { command, .. } => Some(command.as_str()),
        }
    }

    /// Creates a not-a-bridge-URL error.
    pub fn not_bridge_url(url: impl Into<String>) -> Self {
        Self::NotBridgeUrl { url: url.into() }
    }

    /// Creates a malformed bridge URL error.
    pub fn malformed(message: impl Into<String>, command: Option<&str>) -> Self {
        Self::MalformedBridgeUrl {
            message: message.into(),
            command: command.map(str::to_owned),
        }
    }

    /// Creates an unknown command error.
    pub fn unknown_command(name: impl Into<String>) -> Self {
        Self::UnknownCommand { name: name.into() }
    }

    /// Creates a configuration retrieval error.
    pub fn config_retrieval(command: impl Into<String>, source: ConfigError) -> Self {
        Self::ConfigRetrieval {
            command: command.into(),
            source,
        }
    }

    /// Creates a command failure error.
    pub fn command_failed(command: impl Into<String>, source: CommandError) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Creates a command panic error.
    pub fn command_panicked(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CommandPanicked {
            command: command.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::malformed(DispatchError::malformed("bad json", Some("bgcolor")), 400)]
    #[case::not_bridge(DispatchError::not_bridge_url("https://example.com"), 400)]
    #[case::unknown(DispatchError::unknown_command("bgcolor"), 404)]
    #[case::panicked(DispatchError::command_panicked("bgcolor", "boom"), 555)]
    fn maps_errors_to_statuses(#[case] error: DispatchError, #[case] status: i32) {
        assert_eq!(error.status(), status);
    }

    #[test]
    fn command_name_is_exposed_when_known() {
        assert_eq!(
            DispatchError::unknown_command("bgcolor").command_name(),
            Some("bgcolor")
        );
        assert_eq!(DispatchError::malformed("no name", None).command_name(), None);
    }
}

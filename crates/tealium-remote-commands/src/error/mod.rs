//! Domain errors raised by remote-command registration and configuration.
//!
//! All errors use `thiserror`-derived enums with structured context so callers
//! can inspect the failure programmatically. I/O errors are wrapped in `Arc`
//! so the enums stay cheap to clone into dispatch reports.

use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors arising from command registration or invocation.
#[derive(Debug, Clone, Error)]
pub enum CommandError {
    /// A command with the same name is already registered.
    #[error("remote command '{name}' is already registered")]
    AlreadyRegistered {
        /// Name that collided.
        name: String,
    },

    /// The name is reserved for an internal command.
    #[error("remote command name '{name}' is reserved")]
    ReservedName {
        /// Name that was rejected.
        name: String,
    },

    /// The command name is empty or whitespace.
    #[error("remote command name must not be empty")]
    EmptyName,

    /// A file-configured command was added without an asset directory.
    #[error("remote command '{name}' names file '{filename}' but no asset directory is configured")]
    MissingAssetDirectory {
        /// Command name.
        name: String,
        /// Requested bundled file.
        filename: String,
    },

    /// The command reported a failure while handling an invocation.
    #[error("remote command '{name}' failed: {message}")]
    Invocation {
        /// Command name.
        name: String,
        /// Human-readable failure description.
        message: String,
    },
}

impl CommandError {
    /// Creates an invocation failure for the named command.
    pub fn invocation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invocation {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Errors raised while fetching or parsing a [`CommandConfig`](crate::CommandConfig).
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// The bundled configuration file does not exist or cannot be read.
    #[error("failed to read command configuration '{path}': {source}")]
    Read {
        /// File that was read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The configuration is not valid JSON or does not match the schema.
    #[error("malformed command configuration from {origin}: {message}")]
    Malformed {
        /// Where the configuration came from (file path or source label).
        origin: String,
        /// Parser message.
        message: String,
    },

    /// The source has nothing for this command.
    #[error("no configuration available for remote command '{name}'")]
    Missing {
        /// Command name.
        name: String,
    },
}

impl ConfigError {
    /// Creates a malformed-configuration error from a serde error.
    pub fn malformed(origin: impl Into<String>, source: &serde_json::Error) -> Self {
        Self::Malformed {
            origin: origin.into(),
            message: source.to_string(),
        }
    }
}

#[cfg(test)]
mod tests;

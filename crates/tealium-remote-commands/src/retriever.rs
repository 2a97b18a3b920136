//! Lazy, cached retrieval of a command's configuration.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::config::CommandConfig;
use crate::error::ConfigError;
use crate::source::CommandConfigSource;

const RETRIEVER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::config");

/// Fetches a command's configuration on first use and caches it.
///
/// Failed fetches are not cached, so the next retrieval tries again.
pub struct ConfigRetriever {
    command_name: String,
    source: Arc<dyn CommandConfigSource>,
    cached: Mutex<Option<Arc<CommandConfig>>>,
}

impl std::fmt::Debug for ConfigRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigRetriever")
            .field("command_name", &self.command_name)
            .field("cached", &self.is_cached())
            .finish_non_exhaustive()
    }
}

impl ConfigRetriever {
    /// Creates a retriever for `command_name` backed by `source`.
    #[must_use]
    pub fn new(command_name: impl Into<String>, source: Arc<dyn CommandConfigSource>) -> Self {
        Self {
            command_name: command_name.into(),
            source,
            cached: Mutex::new(None),
        }
    }

    /// Returns the command this retriever serves.
    #[must_use]
    pub fn command_name(&self) -> &str {
        self.command_name.as_str()
    }

    /// Returns the cached configuration, fetching it first if necessary.
    ///
    /// # Errors
    ///
    /// Returns the source's [`ConfigError`] when the fetch fails.
    pub fn config(&self) -> Result<Arc<CommandConfig>, ConfigError> {
        let mut cached = self.cached.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(config) = cached.as_ref() {
            return Ok(Arc::clone(config));
        }
        let config = Arc::new(self.source.fetch(&self.command_name)?);
        debug!(
            target: RETRIEVER_TARGET,
            command = %self.command_name,
            mappings = config.mappings().len(),
            "command configuration loaded"
        );
        *cached = Some(Arc::clone(&config));
        Ok(config)
    }

    /// Drops the cached configuration so the next retrieval refetches it.
    pub fn invalidate(&self) {
        *self.cached.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Refetches immediately, replacing the cache only on success.
    ///
    /// # Errors
    ///
    /// Returns the source's [`ConfigError`]; the previous value stays cached.
    pub fn refresh(&self) -> Result<Arc<CommandConfig>, ConfigError> {
        let config = Arc::new(self.source.fetch(&self.command_name)?);
        *self.cached.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&config));
        Ok(config)
    }

    /// Returns `true` when a configuration is cached.
    #[must_use]
    pub fn is_cached(&self) -> bool {
        self.cached
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

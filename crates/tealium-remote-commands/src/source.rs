//! Sources that resolve a command's [`CommandConfig`].

use std::fs;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};

use crate::config::CommandConfig;
use crate::error::ConfigError;

/// Resolves the configuration of a named command.
///
/// Implementations may read bundled files, return pinned values, or fetch
/// from a remote endpoint. Failures are always reported; a source never
/// substitutes an empty configuration.
#[cfg_attr(test, mockall::automock)]
pub trait CommandConfigSource: Send + Sync {
    /// Fetches the configuration for `command_name`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the configuration is missing or
    /// malformed.
    fn fetch(&self, command_name: &str) -> Result<CommandConfig, ConfigError>;
}

impl<T: CommandConfigSource + ?Sized> CommandConfigSource for Arc<T> {
    fn fetch(&self, command_name: &str) -> Result<CommandConfig, ConfigError> {
        (**self).fetch(command_name)
    }
}

/// Reads a JSON configuration bundled with the application.
#[derive(Debug, Clone)]
pub struct AssetConfigSource {
    path: Utf8PathBuf,
}

impl AssetConfigSource {
    /// Reads `filename` from `directory`.
    #[must_use]
    pub fn new(directory: &Utf8Path, filename: &str) -> Self {
        Self {
            path: directory.join(filename),
        }
    }

    /// Returns the file that will be read.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        self.path.as_path()
    }
}

impl CommandConfigSource for AssetConfigSource {
    fn fetch(&self, _command_name: &str) -> Result<CommandConfig, ConfigError> {
        let json = fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.clone(),
            source: Arc::new(source),
        })?;
        CommandConfig::from_json(self.path.as_str(), &json)
    }
}

/// Serves an already-parsed configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticConfigSource {
    config: CommandConfig,
}

impl StaticConfigSource {
    /// Pins `config`.
    #[must_use]
    pub const fn new(config: CommandConfig) -> Self {
        Self { config }
    }
}

impl CommandConfigSource for StaticConfigSource {
    fn fetch(&self, _command_name: &str) -> Result<CommandConfig, ConfigError> {
        Ok(self.config.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    use super::*;

    fn asset_dir() -> (TempDir, Utf8PathBuf) {
        let temp = TempDir::new().expect("create temp dir");
        let path = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8 temp path");
        (temp, path)
    }

    #[test]
    fn reads_bundled_file() {
        let (_temp, dir) = asset_dir();
        fs::write(
            dir.join("remotecommand.json"),
            r#"{"mappings": {"order_id": "transaction_id"}}"#,
        )
        .expect("write config");

        let source = AssetConfigSource::new(&dir, "remotecommand.json");
        let config = source.fetch("localJsonCommand").expect("fetch");

        assert_eq!(
            config.mappings().get("order_id").map(String::as_str),
            Some("transaction_id")
        );
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let (_temp, dir) = asset_dir();
        let source = AssetConfigSource::new(&dir, "absent.json");
        let error = source.fetch("absent").expect_err("should fail");
        assert!(matches!(error, ConfigError::Read { .. }));
        assert!(error.to_string().contains("absent.json"));
    }

    #[test]
    fn malformed_file_is_reported() {
        let (_temp, dir) = asset_dir();
        fs::write(dir.join("broken.json"), "{ not json").expect("write config");
        let error = AssetConfigSource::new(&dir, "broken.json")
            .fetch("broken")
            .expect_err("should fail");
        assert!(matches!(error, ConfigError::Malformed { .. }));
    }
}

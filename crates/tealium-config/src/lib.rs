//! Shared configuration for the remote-command dispatch layer.
//!
//! [`Config`] is loaded through `ortho_config`, which layers built-in
//! defaults, an optional configuration file, `TEALIUM_*` environment
//! variables, and command-line flags, in increasing order of precedence.
//! The crate also owns the [`LibrarySettings`] value that can change at
//! runtime and the [`SettingsBus`] that announces those changes.

mod defaults;
mod environment;
mod logging;
mod settings;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_REFRESH_INTERVAL_SECS, TAG_MANAGEMENT_HOST, default_log_format,
    default_refresh_interval_secs, tag_management_url,
};
pub use environment::Environment;
pub use logging::{LogFormat, LogFormatParseError};
pub use settings::{LibrarySettings, SettingsBus, SettingsListener, Subscription};

/// Resolved SDK configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "TEALIUM")]
pub struct Config {
    /// `tracing` filter expression for the diagnostic log channel.
    #[serde(default = "defaults::default_log_filter_string")]
    pub log_filter: String,
    /// Output format of the diagnostic log channel.
    #[serde(default = "defaults::default_log_format")]
    pub log_format: LogFormat,
    /// Tag-management account name.
    #[serde(default)]
    pub account: String,
    /// Tag-management profile name.
    #[serde(default)]
    pub profile: String,
    /// Publishing environment of the profile.
    #[serde(default)]
    pub environment: Environment,
    /// Overrides the hosted `mobile.html` URL derived from the profile.
    #[serde(default)]
    pub tag_management_url: Option<String>,
    /// Whether the embedded tag-management surface is started.
    #[serde(default = "defaults::default_tag_management_enabled")]
    pub tag_management_enabled: bool,
    /// Directory holding bundled remote-command JSON files.
    #[serde(default)]
    pub asset_directory: Option<Utf8PathBuf>,
    /// Initial Wi-Fi-only flag.
    #[serde(default)]
    pub wifi_only: bool,
    /// Initial stale-page interval in seconds.
    #[serde(default = "defaults::default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: defaults::default_log_filter_string(),
            log_format: defaults::default_log_format(),
            account: String::new(),
            profile: String::new(),
            environment: Environment::default(),
            tag_management_url: None,
            tag_management_enabled: defaults::default_tag_management_enabled(),
            asset_directory: None,
            wifi_only: false,
            refresh_interval_secs: defaults::default_refresh_interval_secs(),
        }
    }
}

impl Config {
    /// Returns the configured log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Returns the configured log format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Returns the URL loaded into the tag-management surface.
    ///
    /// An explicit override wins; otherwise the URL is derived from the
    /// account, profile, and environment.
    #[must_use]
    pub fn tag_management_url(&self) -> String {
        self.tag_management_url.clone().unwrap_or_else(|| {
            defaults::tag_management_url(&self.account, &self.profile, self.environment)
        })
    }

    /// Returns the directory holding bundled remote-command files.
    #[must_use]
    pub fn asset_directory(&self) -> Option<&camino::Utf8Path> {
        self.asset_directory.as_deref()
    }

    /// Returns the initial library settings implied by this configuration.
    #[must_use]
    pub const fn library_settings(&self) -> LibrarySettings {
        LibrarySettings {
            wifi_only: self.wifi_only,
            refresh_interval_secs: self.refresh_interval_secs,
        }
    }
}

//! Per-command configuration: static options, the lookup table, and the
//! event allow-list.
//!
//! Bundled and remote configurations share one JSON schema:
//!
//! ```json
//! {
//!   "config": {"api_key": "abc"},
//!   "mappings": {"order_id": "purchase.transaction_id"},
//!   "commands": {"purchase": "logpurchase"}
//! }
//! ```
//!
//! Every section is optional. `commands` maps event names to vendor command
//! names; when present it restricts which events trigger the command.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Payload;
use crate::error::ConfigError;
use crate::mapper::{COMMAND_NAME_KEY, LookupTable, map_payload};

/// Parsed configuration of one remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandConfig {
    #[serde(default)]
    config: Payload,
    #[serde(default)]
    mappings: LookupTable,
    #[serde(default)]
    commands: Option<BTreeMap<String, String>>,
}

impl CommandConfig {
    /// Creates a configuration from its sections.
    #[must_use]
    pub const fn new(
        config: Payload,
        mappings: LookupTable,
        commands: Option<BTreeMap<String, String>>,
    ) -> Self {
        Self {
            config,
            mappings,
            commands,
        }
    }

    /// Parses a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Malformed`] when `json` is not a valid
    /// configuration object; `origin` labels the document in the message.
    pub fn from_json(origin: &str, json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|error| ConfigError::malformed(origin, &error))
    }

    /// Returns the static options merged into every mapped payload.
    #[must_use]
    pub const fn options(&self) -> &Payload {
        &self.config
    }

    /// Returns the lookup table.
    #[must_use]
    pub const fn mappings(&self) -> &LookupTable {
        &self.mappings
    }

    /// Returns the event allow-list, if one is configured.
    #[must_use]
    pub const fn commands(&self) -> Option<&BTreeMap<String, String>> {
        self.commands.as_ref()
    }

    /// Returns `true` when `event_name` should trigger the command.
    ///
    /// Without an allow-list every event matches.
    #[must_use]
    pub fn accepts(&self, event_name: &str) -> bool {
        self.commands
            .as_ref()
            .is_none_or(|commands| commands.contains_key(event_name))
    }

    /// Returns the vendor command name configured for `event_name`.
    #[must_use]
    pub fn vendor_command(&self, event_name: &str) -> Option<&str> {
        self.commands
            .as_ref()
            .and_then(|commands| commands.get(event_name))
            .map(String::as_str)
    }

    /// Builds the request payload for an event.
    ///
    /// The flat payload is mapped through the lookup table, the vendor
    /// command name (when configured) replaces `command_name`, and static
    /// options are added without overriding mapped keys.
    #[must_use]
    pub fn request_payload(&self, event_name: &str, payload: &Payload) -> Payload {
        let mut mapped = map_payload(payload, &self.mappings);
        if let Some(vendor) = self.vendor_command(event_name) {
            mapped.insert(COMMAND_NAME_KEY.to_owned(), Value::String(vendor.to_owned()));
        }
        for (key, value) in &self.config {
            mapped
                .entry(key.as_str())
                .or_insert_with(|| value.clone());
        }
        mapped
    }
}

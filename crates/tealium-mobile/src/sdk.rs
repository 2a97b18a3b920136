//! The running SDK instance.

use std::sync::Arc;

use tealium_config::{Config, LibrarySettings, SettingsBus};
use tealium_dispatcher::{Dispatch, DispatchReport, RemoteCommandDispatcher, TagMetadata};
use tealium_remote_commands::{CommandError, RemoteCommand};
use tealium_tag_management::EmbeddedSurfaceController;

use crate::telemetry::TelemetryHandle;

/// Result of a successful bootstrap.
///
/// Owns the remote-command dispatcher, the settings channel and, when
/// enabled, the tag-management surface.
pub struct Tealium {
    config: Config,
    dispatcher: Arc<RemoteCommandDispatcher>,
    settings: SettingsBus,
    tag_management: Option<EmbeddedSurfaceController>,
    telemetry: TelemetryHandle,
}

impl Tealium {
    pub(crate) const fn new(
        config: Config,
        dispatcher: Arc<RemoteCommandDispatcher>,
        settings: SettingsBus,
        tag_management: Option<EmbeddedSurfaceController>,
        telemetry: TelemetryHandle,
    ) -> Self {
        Self {
            config,
            dispatcher,
            settings,
            tag_management,
            telemetry,
        }
    }

    /// Accessor for the resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub const fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Routes a tracked event or view to the JSON remote commands.
    pub fn track(&self, dispatch: &dyn Dispatch) -> DispatchReport {
        self.dispatcher.on_process_remote_command(dispatch)
    }

    /// Registers a remote command; see [`RemoteCommandDispatcher::add`].
    ///
    /// # Errors
    ///
    /// Propagates registration errors.
    pub fn add_remote_command(
        &self,
        command: Arc<dyn RemoteCommand>,
        filename: Option<&str>,
    ) -> Result<(), CommandError> {
        self.dispatcher.add(command, filename)
    }

    /// Returns the remote-command dispatcher.
    #[must_use]
    pub const fn remote_commands(&self) -> &Arc<RemoteCommandDispatcher> {
        &self.dispatcher
    }

    /// Returns the metadata the tag-management page last reported.
    #[must_use]
    pub fn tag_metadata(&self) -> TagMetadata {
        self.dispatcher.tag_metadata()
    }

    /// Returns the settings channel.
    #[must_use]
    pub const fn settings(&self) -> &SettingsBus {
        &self.settings
    }

    /// Publishes new library settings to every subscriber.
    pub fn update_settings(&self, settings: LibrarySettings) {
        self.settings.publish(settings);
    }

    /// Returns the tag-management surface controller, when running.
    #[must_use]
    pub const fn tag_management(&self) -> Option<&EmbeddedSurfaceController> {
        self.tag_management.as_ref()
    }
}

impl std::fmt::Debug for Tealium {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tealium")
            .field("config", &self.config)
            .field("commands", &self.dispatcher.command_names())
            .field("tag_management", &self.tag_management)
            .finish_non_exhaustive()
    }
}

//! SDK bootstrap orchestration.

use std::io;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;
use tracing::{debug, info};

use tealium_config::{Config, SettingsBus};
use tealium_dispatcher::{BridgeRequest, RemoteCommandDispatcher};
use tealium_remote_commands::{CommandRegistry, ResponseHandler};
use tealium_tag_management::{
    Connectivity, EmbeddedSurfaceController, MainExecutor, RemoteCommandSender, SurfaceCollaborators,
    SurfaceFactory, ThreadExecutor,
};

use crate::health::LifecycleReporter;
use crate::sdk::Tealium;
use crate::telemetry::{self, TelemetryError};

const BOOTSTRAP_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::bootstrap");

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the SDK configuration.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader returning a fixed configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps `config`.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// Tag management is enabled without an account and profile to load.
    #[error("tag management requires an account and profile or an explicit URL")]
    MissingProfile,
    /// The surface executor thread could not be started.
    #[error("failed to start surface executor: {source}")]
    Executor {
        /// Spawn error.
        #[source]
        source: io::Error,
    },
}

/// Platform pieces needed to run the tag-management surface.
#[derive(Clone)]
pub struct SurfaceBinding {
    /// Builds surfaces.
    pub factory: Arc<dyn SurfaceFactory>,
    /// Connectivity oracle.
    pub connectivity: Arc<dyn Connectivity>,
    /// Context owning the surface; a dedicated thread is spawned when unset.
    pub executor: Option<Arc<dyn MainExecutor>>,
}

/// Bootstraps the SDK using the supplied collaborators.
///
/// Without a `surface` binding, or with tag management disabled, only
/// JSON remote commands are available.
///
/// # Errors
///
/// Returns [`BootstrapError`] when configuration, telemetry or the surface
/// executor cannot be set up, or when tag management has no page to load.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn LifecycleReporter>,
    surface: Option<SurfaceBinding>,
) -> Result<Tealium, BootstrapError> {
    reporter.bootstrap_starting();
    build(loader, &*reporter, surface).inspect_err(|error| reporter.bootstrap_failed(error))
}

fn build(
    loader: &dyn ConfigLoader,
    reporter: &dyn LifecycleReporter,
    surface: Option<SurfaceBinding>,
) -> Result<Tealium, BootstrapError> {
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;
    let telemetry =
        telemetry::initialise(&config).map_err(|source| BootstrapError::Telemetry { source })?;

    let registry = config
        .asset_directory()
        .map_or_else(CommandRegistry::new, |directory| {
            CommandRegistry::with_asset_directory(directory.to_owned())
        });
    let dispatcher = Arc::new(RemoteCommandDispatcher::new(registry));
    let settings = SettingsBus::new(config.library_settings());

    let tag_management = match surface {
        Some(binding) if config.tag_management_enabled => {
            let controller = start_surface(&config, &dispatcher, &settings, binding)?;
            let attempt = controller.initialize();
            reporter.tag_management_started(controller.url(), &attempt);
            Some(controller)
        }
        Some(_) => {
            info!(target: BOOTSTRAP_TARGET, "tag management disabled by configuration");
            None
        }
        None => {
            debug!(target: BOOTSTRAP_TARGET, "no surface binding; tag management unavailable");
            None
        }
    };

    reporter.bootstrap_succeeded(&config);
    Ok(Tealium::new(
        config,
        dispatcher,
        settings,
        tag_management,
        telemetry,
    ))
}

fn start_surface(
    config: &Config,
    dispatcher: &Arc<RemoteCommandDispatcher>,
    settings: &SettingsBus,
    binding: SurfaceBinding,
) -> Result<EmbeddedSurfaceController, BootstrapError> {
    let has_profile = !config.account.is_empty() && !config.profile.is_empty();
    if config.tag_management_url.is_none() && !has_profile {
        return Err(BootstrapError::MissingProfile);
    }

    let executor: Arc<dyn MainExecutor> = match binding.executor {
        Some(executor) => executor,
        None => Arc::new(
            ThreadExecutor::spawn(ThreadExecutor::DEFAULT_THREAD_NAME)
                .map_err(|source| BootstrapError::Executor { source })?,
        ),
    };
    let parts = SurfaceCollaborators::new(
        binding.factory,
        binding.connectivity,
        executor,
        bridge_sender(dispatcher),
    );
    Ok(EmbeddedSurfaceController::new(
        config.tag_management_url(),
        parts,
        settings,
    ))
}

/// Routes bridge URLs intercepted by the surface into the dispatcher.
fn bridge_sender(dispatcher: &Arc<RemoteCommandDispatcher>) -> Arc<dyn RemoteCommandSender> {
    let weak = Arc::downgrade(dispatcher);
    Arc::new(move |url: &str, handler: Arc<dyn ResponseHandler>| {
        if let Some(dispatcher) = weak.upgrade()
            && let Err(error) = dispatcher.on_remote_command_send(BridgeRequest::new(url, handler))
        {
            debug!(
                target: BOOTSTRAP_TARGET,
                status = error.status(),
                "bridge request did not complete"
            );
        }
    })
}

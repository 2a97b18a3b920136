//! Bootstrap of the remote-command dispatch layer.
//!
//! [`bootstrap_with`] loads [`tealium_config::Config`], installs structured
//! telemetry, builds the [`RemoteCommandDispatcher`] over a registry rooted
//! at the configured asset directory, and, when a [`SurfaceBinding`] is
//! supplied and tag management is enabled, starts the embedded
//! tag-management surface with its bridge wired into the dispatcher.
//!
//! Lifecycle reporting hooks emit structured telemetry at each stage so a
//! failed start can be diagnosed from the log channel alone.
//!
//! [`RemoteCommandDispatcher`]: tealium_dispatcher::RemoteCommandDispatcher

mod bootstrap;
mod health;
mod sdk;
mod telemetry;

pub use bootstrap::{
    BootstrapError, ConfigLoader, StaticConfigLoader, SurfaceBinding, SystemConfigLoader,
    bootstrap_with,
};
pub use health::{LifecycleReporter, StructuredLifecycleReporter};
pub use sdk::Tealium;
pub use telemetry::{TelemetryError, TelemetryHandle, initialise as initialise_telemetry};

#[cfg(test)]
mod tests;

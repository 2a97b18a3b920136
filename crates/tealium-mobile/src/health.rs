//! Structured lifecycle reporting for SDK start-up.

use std::sync::Arc;

use tealium_config::Config;
use tealium_tag_management::LoadAttempt;

use crate::bootstrap::BootstrapError;

/// Tracing target for lifecycle events.
const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer of start-up lifecycle events.
pub trait LifecycleReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked after the tag-management surface was initialised.
    fn tag_management_started(&self, url: &str, attempt: &LoadAttempt);
}

impl<T> LifecycleReporter for Arc<T>
where
    T: LifecycleReporter + ?Sized,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn tag_management_started(&self, url: &str, attempt: &LoadAttempt) {
        (**self).tag_management_started(url, attempt);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredLifecycleReporter;

impl LifecycleReporter for StructuredLifecycleReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting SDK bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            account = %config.account,
            profile = %config.profile,
            environment = %config.environment.as_str(),
            tag_management = config.tag_management_enabled,
            log_format = ?config.log_format(),
            "SDK bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "SDK bootstrap failed"
        );
    }

    fn tag_management_started(&self, url: &str, attempt: &LoadAttempt) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "tag_management_started",
            url = %url,
            attempt = ?attempt,
            "tag management surface initialised"
        );
    }
}

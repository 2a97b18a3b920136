//! Diagnostic log channel of the SDK.
//!
//! Events go to standard error through one process-wide `tracing`
//! subscriber. Only the first successful call installs it; the
//! [`TelemetryHandle`] reports the format that is actually in effect.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::{self, time::UtcTime};

use tealium_config::{Config, LogFormat};

static INSTALLED_FORMAT: OnceCell<LogFormat> = OnceCell::new();

type BoxedSubscriber = Box<dyn Subscriber + Send + Sync>;

/// Proof that the diagnostic log channel is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryHandle {
    format: LogFormat,
}

impl TelemetryHandle {
    /// Format chosen by the call that installed the subscriber.
    #[must_use]
    pub const fn format(self) -> LogFormat {
        self.format
    }
}

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured filter expression does not parse.
    #[error("invalid log filter '{filter}': {message}")]
    Filter {
        /// Expression taken from configuration.
        filter: String,
        /// Parser message.
        message: String,
    },
    /// Another global subscriber, usually the host application's, is
    /// already installed.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the diagnostic log channel on first use.
///
/// Later calls leave the installed subscriber alone and return a handle
/// describing it, even when their configuration differs.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] for an unparsable filter and
/// [`TelemetryError::Subscriber`] when the host already owns the global
/// subscriber.
///
/// # Examples
///
/// ```rust
/// use tealium_config::{Config, LogFormat};
/// use tealium_mobile::initialise_telemetry;
///
/// # fn main() -> Result<(), tealium_mobile::TelemetryError> {
/// let compact = Config {
///     log_format: LogFormat::Compact,
///     ..Config::default()
/// };
/// let first = initialise_telemetry(&compact)?;
/// let again = initialise_telemetry(&Config::default())?;
///
/// assert_eq!(first.format(), LogFormat::Compact);
/// assert_eq!(again.format(), LogFormat::Compact);
/// # Ok(())
/// # }
/// ```
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    INSTALLED_FORMAT
        .get_or_try_init(|| install(config))
        .map(|format| TelemetryHandle { format: *format })
}

fn install(config: &Config) -> Result<LogFormat, TelemetryError> {
    let filter = parse_filter(config.log_filter())?;
    let format = config.log_format();
    tracing::subscriber::set_global_default(build_subscriber(filter, format))
        .map_err(TelemetryError::Subscriber)?;
    Ok(format)
}

fn parse_filter(expression: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(expression).map_err(|error| TelemetryError::Filter {
        filter: expression.to_owned(),
        message: error.to_string(),
    })
}

fn build_subscriber(filter: EnvFilter, format: LogFormat) -> BoxedSubscriber {
    // Thread names identify the surface executor in mixed output.
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(UtcTime::rfc_3339());

    match format {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn invalid_filter_names_the_expression() {
        let error = parse_filter("tealium=[").expect_err("filter should be invalid");

        assert!(matches!(
            &error,
            TelemetryError::Filter { filter, .. } if filter == "tealium=["
        ));
        assert!(error.to_string().contains("tealium=["));
    }

    #[rstest]
    #[case::default("info")]
    #[case::per_crate("warn,tealium_tag_management=debug")]
    fn accepts_filter_expressions(#[case] expression: &str) {
        assert!(parse_filter(expression).is_ok());
    }

    #[test]
    fn later_calls_report_the_installed_format() {
        let compact = Config {
            log_format: LogFormat::Compact,
            ..Config::default()
        };

        let first = initialise(&compact).expect("telemetry installs");
        let second = initialise(&Config::default()).expect("telemetry already installed");

        assert_eq!(first.format(), second.format());
    }
}

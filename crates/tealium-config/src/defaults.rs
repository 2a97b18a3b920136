use crate::environment::Environment;

/// Default log filter expression used by the SDK.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default interval, in seconds, after which a loaded tag-management page is
/// considered stale.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 900;

/// Host serving published tag-management profiles.
pub const TAG_MANAGEMENT_HOST: &str = "https://tags.tiqcdn.com/utag";

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format.
#[must_use]
pub const fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}

/// Default stale-page interval in seconds.
#[must_use]
pub const fn default_refresh_interval_secs() -> u64 {
    DEFAULT_REFRESH_INTERVAL_SECS
}

/// Tag management is enabled unless configured otherwise.
#[must_use]
pub const fn default_tag_management_enabled() -> bool {
    true
}

/// Builds the hosted `mobile.html` URL for a profile publish.
#[must_use]
pub fn tag_management_url(account: &str, profile: &str, environment: Environment) -> String {
    format!(
        "{TAG_MANAGEMENT_HOST}/{account}/{profile}/{}/mobile.html",
        environment.as_str()
    )
}

//! The embedded web surface and the factory that builds it.
//!
//! A platform binding implements [`WebSurface`] over its web view and
//! forwards the view's navigation and console callbacks to the
//! [`SurfaceClient`] it was created with.

use std::fmt;

use crate::controller::SurfaceClient;
use crate::error::SurfaceError;

/// Capabilities requested when a surface is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSettings {
    /// Allow page scripts to run.
    pub javascript_enabled: bool,
    /// Enable `localStorage` and `sessionStorage`.
    pub dom_storage_enabled: bool,
    /// Enable client-side databases.
    pub database_enabled: bool,
    /// Accept cookies, including third-party cookies.
    pub cookies_enabled: bool,
}

impl Default for SurfaceSettings {
    fn default() -> Self {
        Self {
            javascript_enabled: true,
            dom_storage_enabled: true,
            database_enabled: true,
            cookies_enabled: true,
        }
    }
}

/// An off-screen web rendering surface.
///
/// Methods are only called from the controller's [`MainExecutor`](crate::MainExecutor).
/// The controller holds no lock while calling them, so an implementation may
/// deliver [`SurfaceClient`] callbacks synchronously.
pub trait WebSurface: Send + Sync {
    /// Starts navigating to `url`.
    fn load_url(&self, url: &str);

    /// Evaluates `script` in the loaded page.
    fn evaluate_javascript(&self, script: &str);

    /// Releases the surface. No callbacks are expected afterwards.
    fn destroy(&self);
}

/// Builds surfaces for the controller.
pub trait SurfaceFactory: Send + Sync {
    /// Creates a surface whose callbacks are delivered to `client`.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Creation`] when the platform cannot provide a
    /// surface.
    fn create(
        &self,
        settings: &SurfaceSettings,
        client: SurfaceClient,
    ) -> Result<Box<dyn WebSurface>, SurfaceError>;
}

/// Severity of a page console message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    /// `console.debug`.
    Debug,
    /// `console.log`.
    Log,
    /// Informational hint.
    Tip,
    /// `console.warn`.
    Warning,
    /// `console.error`.
    Error,
}

impl fmt::Display for ConsoleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Debug => "debug",
            Self::Log => "log",
            Self::Tip => "tip",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// A locally served resource returned instead of a network request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptedResponse {
    /// MIME type of the body.
    pub mime_type: &'static str,
    /// Body bytes.
    pub body: Vec<u8>,
}

impl InterceptedResponse {
    /// An empty PNG response.
    #[must_use]
    pub const fn empty_png() -> Self {
        Self {
            mime_type: "image/png",
            body: Vec::new(),
        }
    }
}

/// Returns `true` for requests of the site icon, which the page never needs.
pub(crate) fn is_favicon(url: &str) -> bool {
    url.to_ascii_lowercase().contains("/favicon.ico")
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("https://tags.tiqcdn.com/favicon.ico", true)]
    #[case("https://tags.tiqcdn.com/FAVICON.ICO?v=2", true)]
    #[case("https://tags.tiqcdn.com/utag/acme/main/prod/mobile.html", false)]
    fn recognises_favicon_requests(#[case] url: &str, #[case] expected: bool) {
        assert_eq!(is_favicon(url), expected);
    }

    #[test]
    fn default_settings_enable_scripting_and_storage() {
        let settings = SurfaceSettings::default();

        assert!(settings.javascript_enabled);
        assert!(settings.dom_storage_enabled);
        assert!(settings.database_enabled);
    }
}

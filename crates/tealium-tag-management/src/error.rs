//! Surface error types.

use std::fmt;

use thiserror::Error;

/// Why a page load failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadFailure {
    /// Network or resource error reported by the surface.
    General {
        /// Platform error code.
        code: i32,
        /// Platform description.
        description: String,
    },
    /// The server answered with an HTTP error status.
    Http {
        /// HTTP status code.
        status: u16,
    },
    /// TLS negotiation failed.
    Ssl {
        /// Platform description.
        description: String,
    },
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::General { code, description } => write!(f, "error {code}: {description}"),
            Self::Http { status } => write!(f, "HTTP status {status}"),
            Self::Ssl { description } => write!(f, "SSL error: {description}"),
        }
    }
}

/// Errors raised by the embedded surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    /// The surface factory could not build a surface.
    #[error("failed to create surface: {message}")]
    Creation {
        /// Factory message.
        message: String,
    },

    /// A navigation was scheduled but no surface exists.
    #[error("no surface available to load {url}")]
    Unavailable {
        /// URL that could not be loaded.
        url: String,
    },

    /// The page failed to load.
    #[error("failed to load {url}: {failure}")]
    Load {
        /// Failing URL.
        url: String,
        /// Failure reported by the surface.
        failure: LoadFailure,
    },

    /// The rendering process terminated.
    #[error("surface render process gone (crashed: {crashed})")]
    RenderProcessGone {
        /// Whether the renderer crashed rather than being killed.
        crashed: bool,
    },
}

impl SurfaceError {
    /// Creates a creation error.
    pub fn creation(message: impl Into<String>) -> Self {
        Self::Creation {
            message: message.into(),
        }
    }
}

//! Publishing environment of the tag-management profile.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Environment segment of the hosted tag-management URL.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Hash, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Environment {
    /// Development profile publish.
    Dev,
    /// Quality assurance profile publish.
    Qa,
    /// Production profile publish.
    #[default]
    Prod,
}

impl Environment {
    /// Returns the canonical URL segment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Qa => "qa",
            Self::Prod => "prod",
        }
    }
}

//! Visual alarm tier for a usage percentage.

#![allow(missing_docs)]

use std::fmt;

use serde::{Deserialize, Serialize};

/// Percent above which a device is shown in the alarm color.
pub const DEFAULT_CRITICAL_ABOVE_PCT: u8 = 90;

/// Severity of a usage percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityTier {
    Normal,
    Critical,
}

impl SeverityTier {
    /// Stroke color the stat card paints its progress ring with.
    #[must_use]
    pub const fn color_token(self) -> &'static str {
        match self {
            Self::Normal => "#2599FF",
            Self::Critical => "#E14444",
        }
    }

    #[must_use]
    pub const fn is_critical(self) -> bool {
        matches!(self, Self::Critical)
    }
}

impl fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Normal => "normal",
            Self::Critical => "critical",
        })
    }
}

/// `Critical` iff `percent > 90`.
#[must_use]
pub const fn severity(percent: u8) -> SeverityTier {
    severity_with_threshold(percent, DEFAULT_CRITICAL_ABOVE_PCT)
}

/// `Critical` iff `percent` is strictly above `critical_above`.
#[must_use]
pub const fn severity_with_threshold(percent: u8, critical_above: u8) -> SeverityTier {
    if percent > critical_above {
        SeverityTier::Critical
    } else {
        SeverityTier::Normal
    }
}

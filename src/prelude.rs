//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use usage_gauge::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{GaugeError, Result};

// Size
pub use crate::size::humanize::{
    HumanizeOptions, HumanizedSize, humanize, humanize_signed, humanize_with,
};
pub use crate::size::quantity::ByteQuantity;
pub use crate::size::unit::{SizeBase, SizeUnit};

// Usage
pub use crate::usage::calculator::{
    UsageAnomaly, UsageCalculator, UsageOptions, UsageSnapshot, compute_usage, compute_usage_with,
};
pub use crate::usage::severity::{SeverityTier, severity, severity_with_threshold};

#![forbid(unsafe_code)]

//! usage_gauge: byte-quantity humanization and storage usage ratios.
//!
//! The pure core behind a storage-device summary card:
//! 1. **SizeHumanizer**: exact byte count → `{ value, unit }` in a fixed SI or IEC scale
//! 2. **UsageCalculator**: total + optional free → used, bounded percent, severity tier
//!
//! Neither performs I/O or keeps state; callers may recompute on every render.
//!
//! # Library usage
//!
//! ```rust
//! use usage_gauge::prelude::*;
//!
//! let size = humanize(ByteQuantity::new(1_500_000));
//! assert_eq!(size.to_string(), "1.5 MB");
//!
//! let snap = compute_usage(
//!     ByteQuantity::new(1_000_000_000),
//!     Some(ByteQuantity::new(250_000_000)),
//! );
//! assert_eq!(snap.percent, 75);
//! assert_eq!(snap.tier, SeverityTier::Normal);
//! ```

pub mod prelude;

pub mod core;
pub mod logger;
pub mod size;
pub mod usage;

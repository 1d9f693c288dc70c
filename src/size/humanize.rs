//! Byte count → human-scaled magnitude/unit pair.
//!
//! Scaling and rounding happen in integer arithmetic on the exact `u128`
//! count; the `f64` display value is derived once from the rounded integer, so
//! the same input always produces a bit-identical result.

#![allow(missing_docs)]

use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::core::config::HumanizeConfig;
use crate::core::errors::Result;
use crate::size::quantity::ByteQuantity;
use crate::size::unit::{SizeBase, SizeUnit};

/// Largest supported number of decimal places.
pub const MAX_PRECISION: u8 = 6;

/// Default number of decimal places.
pub const DEFAULT_PRECISION: u8 = 1;

/// Scale family and rounding used when humanizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HumanizeOptions {
    pub base: SizeBase,
    /// Decimal places kept in the display value; values above
    /// [`MAX_PRECISION`] are treated as `MAX_PRECISION`.
    pub precision: u8,
}

impl Default for HumanizeOptions {
    fn default() -> Self {
        Self {
            base: SizeBase::Decimal,
            precision: DEFAULT_PRECISION,
        }
    }
}

impl From<&HumanizeConfig> for HumanizeOptions {
    fn from(cfg: &HumanizeConfig) -> Self {
        Self {
            base: cfg.base,
            precision: cfg.precision,
        }
    }
}

impl HumanizeOptions {
    const fn effective_precision(self) -> u8 {
        if self.precision > MAX_PRECISION {
            MAX_PRECISION
        } else {
            self.precision
        }
    }
}

/// A byte count scaled into a display unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HumanizedSize {
    bytes: ByteQuantity,
    unit: SizeUnit,
    /// Display value times `10^precision`, already rounded.
    scaled: u128,
    precision: u8,
}

impl HumanizedSize {
    /// Display magnitude, rounded to [`precision`](Self::precision) decimal places.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn value(&self) -> f64 {
        self.scaled as f64 / pow10(self.precision) as f64
    }

    #[must_use]
    pub const fn unit(&self) -> SizeUnit {
        self.unit
    }

    /// The exact count this size was computed from.
    #[must_use]
    pub const fn bytes(&self) -> ByteQuantity {
        self.bytes
    }

    #[must_use]
    pub const fn precision(&self) -> u8 {
        self.precision
    }

    /// Long unit name such as `megabytes`.
    #[must_use]
    pub fn long_unit(&self) -> String {
        self.unit.long_name(self.value())
    }

    /// Rounded display value as an integer numerator over `10^precision`.
    pub(crate) const fn scaled(&self) -> u128 {
        self.scaled
    }
}

impl fmt::Display for HumanizedSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pow = pow10(self.precision);
        let whole = self.scaled / pow;
        let frac = self.scaled % pow;
        if frac == 0 {
            return write!(f, "{whole} {}", self.unit);
        }
        let digits = format!("{frac:0width$}", width = usize::from(self.precision));
        write!(f, "{whole}.{} {}", digits.trim_end_matches('0'), self.unit)
    }
}

impl Serialize for HumanizedSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("HumanizedSize", 4)?;
        state.serialize_field("value", &self.value())?;
        state.serialize_field("unit", &self.unit)?;
        state.serialize_field("long_unit", &self.long_unit())?;
        state.serialize_field("bytes", &self.bytes)?;
        state.end()
    }
}

/// Humanize with decimal units and one decimal place.
#[must_use]
pub fn humanize(bytes: ByteQuantity) -> HumanizedSize {
    humanize_with(bytes, &HumanizeOptions::default())
}

/// Humanize a signed count; negative input is rejected with `InvalidInput`.
pub fn humanize_signed(bytes: i128) -> Result<HumanizedSize> {
    ByteQuantity::from_signed(bytes).map(humanize)
}

/// Humanize with an explicit base and precision.
#[must_use]
pub fn humanize_with(bytes: ByteQuantity, options: &HumanizeOptions) -> HumanizedSize {
    let precision = options.effective_precision();
    let pow = pow10(precision);
    let step = options.base.step();

    let mut unit = options.base.base_unit();
    let mut rest = bytes.get();
    while rest >= step {
        match unit.larger() {
            Some(next) => {
                unit = next;
                rest /= step;
            }
            None => break,
        }
    }

    let mut scaled = scale_into(bytes.get(), unit, pow);
    // Rounding can carry 999.96 KB up to 1000.0 KB; show 1 MB instead.
    if scaled >= step * pow
        && let Some(next) = unit.larger()
    {
        unit = next;
        scaled = scale_into(bytes.get(), unit, pow);
    }

    HumanizedSize {
        bytes,
        unit,
        scaled,
        precision,
    }
}

/// `bytes / unit.divisor()` rounded half-up to `pow` steps, times `pow`.
fn scale_into(bytes: u128, unit: SizeUnit, pow: u128) -> u128 {
    let div = unit.divisor();
    let whole = bytes / div;
    let frac = bytes % div;
    // frac < div <= 2^80 and pow <= 10^6, so the numerator stays below 2^102.
    let rounded = (frac * pow * 2 + div) / (div * 2);
    whole.saturating_mul(pow).saturating_add(rounded)
}

pub(crate) const fn pow10(precision: u8) -> u128 {
    10_u128.pow(precision as u32)
}

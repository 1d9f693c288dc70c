//! Fixed, ordered unit scales for decimal (SI) and binary (IEC) sizes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::errors::{GaugeError, Result};

/// Divisor family used when stepping between units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeBase {
    /// Powers of 1000: B, KB, MB, ...
    #[default]
    Decimal,
    /// Powers of 1024: B, KiB, MiB, ...
    Binary,
}

const DECIMAL_SYMBOLS: [&str; SizeUnit::COUNT] =
    ["B", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];
const BINARY_SYMBOLS: [&str; SizeUnit::COUNT] = [
    "B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB", "ZiB", "YiB",
];
const DECIMAL_NAMES: [&str; SizeUnit::COUNT] = [
    "byte",
    "kilobyte",
    "megabyte",
    "gigabyte",
    "terabyte",
    "petabyte",
    "exabyte",
    "zettabyte",
    "yottabyte",
];
const BINARY_NAMES: [&str; SizeUnit::COUNT] = [
    "byte", "kibibyte", "mebibyte", "gibibyte", "tebibyte", "pebibyte", "exbibyte", "zebibyte",
    "yobibyte",
];

impl SizeBase {
    /// Ratio between two adjacent units.
    #[must_use]
    pub const fn step(self) -> u128 {
        match self {
            Self::Decimal => 1_000,
            Self::Binary => 1_024,
        }
    }

    /// Unit at scale position zero.
    #[must_use]
    pub const fn base_unit(self) -> SizeUnit {
        SizeUnit {
            base: self,
            index: 0,
        }
    }

    /// Largest unit in the table.
    #[must_use]
    pub const fn top_unit(self) -> SizeUnit {
        SizeUnit {
            base: self,
            index: SizeUnit::MAX_INDEX,
        }
    }

    /// Iterate the scale from bytes upward.
    pub fn units(self) -> impl Iterator<Item = SizeUnit> {
        (0..=SizeUnit::MAX_INDEX).map(move |index| SizeUnit { base: self, index })
    }
}

impl fmt::Display for SizeBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Decimal => "decimal",
            Self::Binary => "binary",
        })
    }
}

impl std::str::FromStr for SizeBase {
    type Err = GaugeError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "decimal" | "si" => Ok(Self::Decimal),
            "binary" | "iec" => Ok(Self::Binary),
            other => Err(GaugeError::ConfigParse {
                context: "size_base",
                details: format!("expected `decimal` or `binary`, got {other:?}"),
            }),
        }
    }
}

/// A position in a [`SizeBase`] scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SizeUnit {
    base: SizeBase,
    index: u8,
}

impl SizeUnit {
    /// Number of units in each scale.
    pub const COUNT: usize = 9;
    const MAX_INDEX: u8 = 8;

    /// Look up a scale position; `None` past the top unit.
    #[must_use]
    pub const fn new(base: SizeBase, index: u8) -> Option<Self> {
        if index > Self::MAX_INDEX {
            None
        } else {
            Some(Self { base, index })
        }
    }

    /// Scale family this unit belongs to.
    #[must_use]
    pub const fn base(self) -> SizeBase {
        self.base
    }

    /// Zero for bytes, one for kilo/kibi, and so on.
    #[must_use]
    pub const fn index(self) -> u8 {
        self.index
    }

    /// Plain bytes.
    #[must_use]
    pub const fn is_base_unit(self) -> bool {
        self.index == 0
    }

    /// Next larger unit, if the table has one.
    #[must_use]
    pub const fn larger(self) -> Option<Self> {
        Self::new(self.base, self.index + 1)
    }

    /// Number of bytes in one of this unit. Fits in `u128` for every entry.
    #[must_use]
    pub const fn divisor(self) -> u128 {
        self.base.step().pow(self.index as u32)
    }

    /// Short symbol such as `MB` or `MiB`.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self.base {
            SizeBase::Decimal => DECIMAL_SYMBOLS[self.index as usize],
            SizeBase::Binary => BINARY_SYMBOLS[self.index as usize],
        }
    }

    /// Long name, pluralized unless `value` is exactly one.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn long_name(self, value: f64) -> String {
        let singular = match self.base {
            SizeBase::Decimal => DECIMAL_NAMES[self.index as usize],
            SizeBase::Binary => BINARY_NAMES[self.index as usize],
        };
        if value == 1.0 {
            singular.to_string()
        } else {
            format!("{singular}s")
        }
    }
}

impl fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl Serialize for SizeUnit {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_scale_is_ordered() {
        let symbols: Vec<&str> = SizeBase::Decimal.units().map(SizeUnit::symbol).collect();
        assert_eq!(
            symbols,
            ["B", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"]
        );
    }

    #[test]
    fn divisors_follow_step() {
        let mb = SizeUnit::new(SizeBase::Decimal, 2).unwrap();
        assert_eq!(mb.divisor(), 1_000_000);
        let gib = SizeUnit::new(SizeBase::Binary, 3).unwrap();
        assert_eq!(gib.divisor(), 1_073_741_824);
        assert_eq!(SizeBase::Binary.top_unit().divisor(), 1_u128 << 80);
    }

    #[test]
    fn larger_stops_at_top_unit() {
        assert_eq!(SizeBase::Decimal.top_unit().larger(), None);
        assert_eq!(
            SizeBase::Decimal.base_unit().larger().map(SizeUnit::symbol),
            Some("KB")
        );
        assert!(SizeUnit::new(SizeBase::Decimal, 9).is_none());
    }

    #[test]
    fn long_name_pluralizes() {
        let gb = SizeUnit::new(SizeBase::Decimal, 3).unwrap();
        assert_eq!(gb.long_name(1.0), "gigabyte");
        assert_eq!(gb.long_name(2.5), "gigabytes");
        assert_eq!(SizeBase::Binary.base_unit().long_name(0.0), "bytes");
    }

    #[test]
    fn base_parses_aliases() {
        assert_eq!("decimal".parse::<SizeBase>().unwrap(), SizeBase::Decimal);
        assert_eq!(" IEC ".parse::<SizeBase>().unwrap(), SizeBase::Binary);
        let err = "octal".parse::<SizeBase>().unwrap_err();
        assert_eq!(err.code(), "UG-1003");
    }
}

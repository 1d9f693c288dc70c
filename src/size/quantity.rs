//! Exact, non-negative byte counts.
//!
//! Device totals arrive from several places in several shapes: native integers,
//! decimal strings, and pairs of big-endian `u32` limbs for 64-bit counts that
//! do not survive a round trip through a double. [`ByteQuantity`] is the single
//! validated representation all of them funnel into. It is backed by `u128`, so
//! the full 64-bit range and far beyond is exact.

#![allow(missing_docs)]

use std::fmt;
use std::str::FromStr;

use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::errors::{GaugeError, Result};

/// An immutable count of bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ByteQuantity(u128);

impl ByteQuantity {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(u128::MAX);

    #[must_use]
    pub const fn new(bytes: u128) -> Self {
        Self(bytes)
    }

    /// Accept a signed count; negative values are a caller bug, not zero.
    pub fn from_signed(bytes: i128) -> Result<Self> {
        u128::try_from(bytes)
            .map(Self)
            .map_err(|_| GaugeError::invalid_input(format!("negative byte count: {bytes}")))
    }

    /// Build from big-endian 32-bit limbs, most significant first.
    ///
    /// `[hi, lo]` is the usual shape for a 64-bit count. An empty slice is zero
    /// and leading zero limbs are ignored.
    pub fn from_be_limbs(limbs: &[u32]) -> Result<Self> {
        let significant: &[u32] = limbs
            .iter()
            .position(|&limb| limb != 0)
            .map_or(&[][..], |first| &limbs[first..]);
        if significant.len() > 4 {
            return Err(GaugeError::Overflow {
                details: format!("{} significant 32-bit limbs exceed 128 bits", significant.len()),
            });
        }
        let value = significant
            .iter()
            .fold(0_u128, |acc, &limb| (acc << 32) | u128::from(limb));
        Ok(Self(value))
    }

    #[must_use]
    pub const fn get(self) -> u128 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn checked_sub(self, rhs: Self) -> Option<Self> {
        match self.0.checked_sub(rhs.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// The count as `u64`, if it fits.
    #[must_use]
    pub fn to_u64(self) -> Option<u64> {
        u64::try_from(self.0).ok()
    }
}

impl From<u64> for ByteQuantity {
    fn from(value: u64) -> Self {
        Self(u128::from(value))
    }
}

impl From<u128> for ByteQuantity {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

impl From<ByteQuantity> for u128 {
    fn from(value: ByteQuantity) -> Self {
        value.0
    }
}

impl fmt::Display for ByteQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for ByteQuantity {
    type Err = GaugeError;

    fn from_str(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(GaugeError::invalid_input("empty byte count"));
        }
        if trimmed.starts_with('-') {
            return Err(GaugeError::invalid_input(format!(
                "negative byte count: {trimmed}"
            )));
        }

        let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
        let mut value: u128 = 0;
        let mut saw_digit = false;
        for ch in digits.chars() {
            if ch == '_' {
                continue;
            }
            let digit = ch.to_digit(10).ok_or_else(|| {
                GaugeError::invalid_input(format!("not a decimal byte count: {trimmed:?}"))
            })?;
            saw_digit = true;
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(u128::from(digit)))
                .ok_or_else(|| GaugeError::Overflow {
                    details: format!("{trimmed} exceeds {}", u128::MAX),
                })?;
        }
        if !saw_digit {
            return Err(GaugeError::invalid_input(format!(
                "not a decimal byte count: {trimmed:?}"
            )));
        }
        Ok(Self(value))
    }
}

impl Serialize for ByteQuantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ByteQuantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(ByteQuantityVisitor)
    }
}

struct ByteQuantityVisitor;

impl<'de> Visitor<'de> for ByteQuantityVisitor {
    type Value = ByteQuantity;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative integer, a decimal string, or big-endian u32 limbs")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Self::Value, E> {
        Ok(ByteQuantity::from(v))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> std::result::Result<Self::Value, E> {
        Ok(ByteQuantity(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Self::Value, E> {
        ByteQuantity::from_signed(i128::from(v)).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error> {
        let mut limbs = Vec::with_capacity(seq.size_hint().unwrap_or(2));
        while let Some(limb) = seq.next_element::<u32>()? {
            limbs.push(limb);
        }
        ByteQuantity::from_be_limbs(&limbs).map_err(de::Error::custom)
    }
}

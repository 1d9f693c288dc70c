//! Used/free/total derivation and usage percentage for a single device.

#![allow(missing_docs)]

use serde::Serialize;

use crate::core::config::Config;
use crate::size::humanize::{HumanizeOptions, HumanizedSize, humanize_with, pow10};
use crate::size::quantity::ByteQuantity;
use crate::usage::severity::{DEFAULT_CRITICAL_ABOVE_PCT, SeverityTier, severity_with_threshold};

/// Data-quality issue noticed while computing a snapshot.
///
/// These never fail the computation; callers decide whether to log them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UsageAnomaly {
    /// The free measurement is larger than the device; `used` was clamped to zero.
    /// Usually a stale or racing sample.
    FreeExceedsTotal { excess: ByteQuantity },
}

/// Display-ready usage figures for one device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UsageSnapshot {
    pub total: HumanizedSize,
    pub free: HumanizedSize,
    pub used: HumanizedSize,
    /// Whole percent in `0..=100`.
    pub percent: u8,
    pub tier: SeverityTier,
    /// False when only the capacity was known; `free` then mirrors `total`.
    pub free_known: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly: Option<UsageAnomaly>,
}

/// Humanize options plus the alarm threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageOptions {
    pub humanize: HumanizeOptions,
    pub critical_above_pct: u8,
}

impl Default for UsageOptions {
    fn default() -> Self {
        Self {
            humanize: HumanizeOptions::default(),
            critical_above_pct: DEFAULT_CRITICAL_ABOVE_PCT,
        }
    }
}

impl From<&Config> for UsageOptions {
    fn from(cfg: &Config) -> Self {
        Self {
            humanize: HumanizeOptions::from(&cfg.humanize),
            critical_above_pct: cfg.usage.critical_above_pct,
        }
    }
}

/// Computes snapshots with a fixed set of options.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsageCalculator {
    options: UsageOptions,
}

impl UsageCalculator {
    #[must_use]
    pub fn new(cfg: &Config) -> Self {
        Self::with_options(UsageOptions::from(cfg))
    }

    #[must_use]
    pub const fn with_options(options: UsageOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub const fn options(&self) -> &UsageOptions {
        &self.options
    }

    #[must_use]
    pub fn compute(&self, total: ByteQuantity, free: Option<ByteQuantity>) -> UsageSnapshot {
        compute_usage_with(total, free, &self.options)
    }

    #[must_use]
    pub fn humanize(&self, bytes: ByteQuantity) -> HumanizedSize {
        humanize_with(bytes, &self.options.humanize)
    }
}

/// Compute a snapshot with decimal units, one decimal place and the 90% alarm.
#[must_use]
pub fn compute_usage(total: ByteQuantity, free: Option<ByteQuantity>) -> UsageSnapshot {
    compute_usage_with(total, free, &UsageOptions::default())
}

/// Compute a snapshot with explicit options.
///
/// Without a free measurement the device is reported as `0%` used with `free`
/// equal to `total`. With one, `used = total - free`, clamped to zero.
#[must_use]
pub fn compute_usage_with(
    total: ByteQuantity,
    free: Option<ByteQuantity>,
    options: &UsageOptions,
) -> UsageSnapshot {
    let humanize = |bytes| humanize_with(bytes, &options.humanize);
    let total_h = humanize(total);

    let Some(free) = free else {
        return UsageSnapshot {
            total: total_h,
            free: total_h,
            used: humanize(ByteQuantity::ZERO),
            percent: 0,
            tier: severity_with_threshold(0, options.critical_above_pct),
            free_known: false,
            anomaly: None,
        };
    };

    let (used, anomaly) = match total.checked_sub(free) {
        Some(used) => (used, None),
        None => (
            ByteQuantity::ZERO,
            Some(UsageAnomaly::FreeExceedsTotal {
                excess: free.saturating_sub(total),
            }),
        ),
    };

    let percent = usage_percent(used, &total_h);
    UsageSnapshot {
        total: total_h,
        free: humanize(free),
        used: humanize(used),
        percent,
        tier: severity_with_threshold(percent, options.critical_above_pct),
        free_known: true,
        anomaly,
    }
}

/// Used bytes expressed in the total's display unit, over the total's rounded
/// display value, truncated and clamped to `0..=100`.
fn usage_percent(used: ByteQuantity, total: &HumanizedSize) -> u8 {
    if total.bytes().is_zero() {
        return 0;
    }

    let pow = pow10(total.precision());
    let div = total.unit().divisor();
    let exact = used
        .get()
        .checked_mul(100 * pow)
        .zip(div.checked_mul(total.scaled()))
        .map(|(num, den)| num / den);

    let pct = exact.unwrap_or_else(|| float_percent(used, total));
    u8::try_from(pct.min(100)).unwrap_or(100)
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn float_percent(used: ByteQuantity, total: &HumanizedSize) -> u128 {
    let used_in_unit = used.get() as f64 / total.unit().divisor() as f64;
    let pct = (used_in_unit / total.value() * 100.0).floor();
    pct.clamp(0.0, 100.0) as u128
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::size::unit::SizeBase;
    use crate::usage::severity::severity;

    fn q(n: u128) -> ByteQuantity {
        ByteQuantity::new(n)
    }

    #[test]
    fn three_quarters_used() {
        let snap = compute_usage(q(1_000_000_000), Some(q(250_000_000)));
        assert_eq!(snap.used.bytes(), q(750_000_000));
        assert_eq!(snap.percent, 75);
        assert_eq!(snap.tier, SeverityTier::Normal);
        assert!(snap.free_known);
        assert_eq!(snap.anomaly, None);
    }

    #[test]
    fn parts_are_scaled_independently() {
        let snap = compute_usage(q(1_000_000_000), Some(q(999_500_000)));
        assert_eq!(snap.total.unit().symbol(), "GB");
        assert_eq!(snap.free.unit().symbol(), "MB");
        assert_eq!(snap.used.unit().symbol(), "KB");
        assert_eq!(snap.used.to_string(), "500 KB");
        assert_eq!(snap.percent, 0);
    }

    #[test]
    fn free_larger_than_total_clamps_used() {
        let snap = compute_usage(q(500), Some(q(600)));
        assert_eq!(snap.used.bytes(), ByteQuantity::ZERO);
        assert_eq!(snap.percent, 0);
        assert_eq!(
            snap.anomaly,
            Some(UsageAnomaly::FreeExceedsTotal { excess: q(100) })
        );
    }

    #[test]
    fn missing_free_mirrors_total() {
        let snap = compute_usage(q(2_000_000_000_000), None);
        assert_eq!(snap.percent, 0);
        assert_eq!(snap.free.bytes(), q(2_000_000_000_000));
        assert_eq!(snap.used.bytes(), ByteQuantity::ZERO);
        assert!(!snap.free_known);
        assert_eq!(snap.tier, SeverityTier::Normal);
    }

    #[test]
    fn zero_total_is_zero_percent() {
        let snap = compute_usage(ByteQuantity::ZERO, Some(ByteQuantity::ZERO));
        assert_eq!(snap.percent, 0);
        assert_eq!(snap.used.bytes(), ByteQuantity::ZERO);
    }

    #[test]
    fn percent_truncates_toward_zero() {
        // 29% exactly would be 28.999... in naive float math.
        let snap = compute_usage(q(1_000_000_000), Some(q(710_000_000)));
        assert_eq!(snap.percent, 29);
        let snap = compute_usage(q(1_000_000_000), Some(q(1_000_001)));
        assert_eq!(snap.percent, 99);
    }

    #[test]
    fn display_rounding_overshoot_clamps_to_hundred() {
        // 1.049 MB displays as 1.0 MB, so a full device would read 104%.
        let snap = compute_usage(q(1_049_000), Some(ByteQuantity::ZERO));
        assert_eq!(snap.total.to_string(), "1 MB");
        assert_eq!(snap.percent, 100);
        assert_eq!(snap.tier, SeverityTier::Critical);
    }

    #[test]
    fn percent_follows_total_display_value() {
        // Total 1.96 GB displays as 2.0 GB; 0.98 GB used reads as 49%.
        let snap = compute_usage(q(1_960_000_000), Some(q(980_000_000)));
        assert_eq!(snap.percent, 49);
    }

    #[test]
    fn critical_tier_above_ninety() {
        let snap = compute_usage(q(1_000_000_000), Some(q(50_000_000)));
        assert_eq!(snap.percent, 95);
        assert_eq!(snap.tier, SeverityTier::Critical);
        assert_eq!(snap.tier, severity(snap.percent));

        let snap = compute_usage(q(1_000_000_000), Some(q(100_000_000)));
        assert_eq!(snap.percent, 90);
        assert_eq!(snap.tier, SeverityTier::Normal);
    }

    #[test]
    fn calculator_applies_config() {
        let mut cfg = Config::default();
        cfg.humanize.base = SizeBase::Binary;
        cfg.usage.critical_above_pct = 50;
        let calc = UsageCalculator::new(&cfg);
        let snap = calc.compute(q(1_073_741_824), Some(q(268_435_456)));
        assert_eq!(snap.total.to_string(), "1 GiB");
        assert_eq!(snap.used.to_string(), "768 MiB");
        assert_eq!(snap.percent, 75);
        assert_eq!(snap.tier, SeverityTier::Critical);
    }

    #[test]
    fn huge_counts_do_not_overflow() {
        let total = ByteQuantity::MAX;
        let snap = compute_usage(total, Some(q(1)));
        assert!(snap.percent >= 99, "got {}", snap.percent);
        assert!(snap.percent <= 100);
        assert_eq!(snap.used.bytes(), q(u128::MAX - 1));
    }

    #[test]
    fn snapshot_serializes_for_renderers() {
        let snap = compute_usage(q(500), Some(q(600)));
        let json = serde_json::to_value(snap).unwrap();
        assert_eq!(json["percent"], 0);
        assert_eq!(json["tier"], "normal");
        assert_eq!(json["anomaly"]["kind"], "free_exceeds_total");
        assert_eq!(json["anomaly"]["excess"], "100");
        assert_eq!(json["total"]["unit"], "B");
    }
}

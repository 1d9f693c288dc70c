//! Property-based checks for humanization and usage snapshots.

use proptest::prelude::*;

use usage_gauge::prelude::*;
use usage_gauge::size::humanize::MAX_PRECISION;

// ──────────────────── strategies ────────────────────

fn arb_base() -> impl Strategy<Value = SizeBase> {
    prop_oneof![Just(SizeBase::Decimal), Just(SizeBase::Binary)]
}

fn arb_options() -> impl Strategy<Value = HumanizeOptions> {
    (arb_base(), 0..=MAX_PRECISION).prop_map(|(base, precision)| HumanizeOptions { base, precision })
}

fn arb_usage_options() -> impl Strategy<Value = UsageOptions> {
    (arb_options(), 0u8..=100).prop_map(|(humanize, critical_above_pct)| UsageOptions {
        humanize,
        critical_above_pct,
    })
}

/// Byte counts spread across every unit magnitude, not just the top of u64.
fn arb_bytes() -> impl Strategy<Value = u128> {
    prop_oneof![
        0u128..1_000,
        (0u32..=26, any::<u64>()).prop_map(|(shift, raw)| u128::from(raw >> shift)),
        any::<u64>().prop_map(u128::from),
    ]
}

/// Largest `k` such that `step^k <= bytes`, capped at the top unit.
fn magnitude(bytes: u128, step: u128) -> u8 {
    let mut k = 0;
    let mut rest = bytes;
    while rest >= step && usize::from(k) + 1 < SizeUnit::COUNT {
        rest /= step;
        k += 1;
    }
    k
}

fn pow10(precision: u8) -> u128 {
    10_u128.pow(u32::from(precision))
}

// ──────────────────── humanize ────────────────────

proptest! {
    #[test]
    fn zero_always_renders_in_base_unit(opts in arb_options()) {
        let h = humanize_with(ByteQuantity::ZERO, &opts);
        prop_assert!(h.unit().is_base_unit());
        prop_assert_eq!(h.to_string(), format!("0 {}", opts.base.base_unit()));
    }

    #[test]
    fn unit_tracks_magnitude(bytes in arb_bytes(), opts in arb_options()) {
        let h = humanize_with(ByteQuantity::new(bytes), &opts);
        let k = magnitude(bytes, opts.base.step());
        let index = h.unit().index();

        // Rounding may carry the value into the next unit, never further.
        prop_assert!(index == k || index == k + 1, "bytes={} k={} index={}", bytes, k, index);
        prop_assert_eq!(h.unit().base(), opts.base);
        prop_assert_eq!(h.bytes().get(), bytes);

        let value = h.value();
        if bytes > 0 && index > 0 {
            prop_assert!(value >= 1.0, "value {} below 1 for {}", value, bytes);
        }
        prop_assert!(value < opts.base.step() as f64, "value {} not below step", value);
    }

    #[test]
    fn display_value_is_within_half_a_step(bytes in any::<u64>(), opts in arb_options()) {
        let bytes = u128::from(bytes);
        let h = humanize_with(ByteQuantity::new(bytes), &opts);
        let pow = pow10(opts.precision);
        let div = h.unit().divisor();

        // value * 10^p is bytes/div * 10^p rounded to the nearest integer.
        let shown = (h.value() * pow as f64).round() as u128;
        let exact = bytes * pow;
        let approx = shown * div;
        let error = exact.abs_diff(approx);
        prop_assert!(
            error * 2 <= div + div / 1_000_000,
            "bytes={} unit={} shown={} error={}",
            bytes, h.unit(), shown, error
        );
    }

    #[test]
    fn negative_signed_input_is_rejected(bytes in i128::MIN..0) {
        let err = humanize_signed(bytes).unwrap_err();
        prop_assert_eq!(err.code(), "UG-2001");
    }

    #[test]
    fn display_never_ends_in_a_dangling_point(bytes in arb_bytes(), opts in arb_options()) {
        let rendered = humanize_with(ByteQuantity::new(bytes), &opts).to_string();
        let number = rendered.split(' ').next().unwrap_or_default();
        prop_assert!(!number.ends_with('.'), "{}", rendered);
        if number.contains('.') {
            prop_assert!(!number.ends_with('0'), "{}", rendered);
        }
    }
}

// ──────────────────── usage ────────────────────

proptest! {
    #[test]
    fn used_plus_free_is_total(
        total in arb_bytes(),
        fraction in 0.0f64..=1.0,
        opts in arb_usage_options(),
    ) {
        let free = (total as f64 * fraction) as u128;
        let free = free.min(total);
        let snap = compute_usage_with(
            ByteQuantity::new(total),
            Some(ByteQuantity::new(free)),
            &opts,
        );

        prop_assert_eq!(snap.used.bytes().get() + snap.free.bytes().get(), total);
        prop_assert_eq!(snap.anomaly, None);
        prop_assert!(snap.free_known);
    }

    #[test]
    fn percent_is_bounded_and_tier_is_consistent(
        total in arb_bytes(),
        free in arb_bytes(),
        opts in arb_usage_options(),
    ) {
        let snap = compute_usage_with(
            ByteQuantity::new(total),
            Some(ByteQuantity::new(free)),
            &opts,
        );

        prop_assert!(snap.percent <= 100);
        prop_assert_eq!(
            snap.tier,
            severity_with_threshold(snap.percent, opts.critical_above_pct)
        );
        prop_assert_eq!(snap.tier.is_critical(), snap.percent > opts.critical_above_pct);
        if total == 0 {
            prop_assert_eq!(snap.percent, 0);
        }
    }

    #[test]
    fn free_above_total_clamps_used(total in arb_bytes(), extra in 1u128..1_000_000_000) {
        let free = total + extra;
        let snap = compute_usage(ByteQuantity::new(total), Some(ByteQuantity::new(free)));

        prop_assert!(snap.used.bytes().is_zero());
        prop_assert_eq!(snap.percent, 0);
        prop_assert_eq!(
            snap.anomaly,
            Some(UsageAnomaly::FreeExceedsTotal { excess: ByteQuantity::new(extra) })
        );
    }

    #[test]
    fn unknown_free_reports_idle_device(total in arb_bytes(), opts in arb_usage_options()) {
        let snap = compute_usage_with(ByteQuantity::new(total), None, &opts);

        prop_assert_eq!(snap.percent, 0);
        prop_assert_eq!(snap.free, snap.total);
        prop_assert!(snap.used.bytes().is_zero());
        prop_assert!(!snap.free_known);
        prop_assert_eq!(snap.tier, severity_with_threshold(0, opts.critical_above_pct));
    }

    #[test]
    fn percent_grows_as_free_shrinks(
        total in 1u128..=u128::from(u64::MAX),
        a in 0.0f64..=1.0,
        b in 0.0f64..=1.0,
        opts in arb_usage_options(),
    ) {
        let more_free = ((total as f64 * a.max(b)) as u128).min(total);
        let less_free = ((total as f64 * a.min(b)) as u128).min(more_free);
        let total = ByteQuantity::new(total);

        let light = compute_usage_with(total, Some(ByteQuantity::new(more_free)), &opts);
        let heavy = compute_usage_with(total, Some(ByteQuantity::new(less_free)), &opts);
        prop_assert!(light.percent <= heavy.percent);
    }
}

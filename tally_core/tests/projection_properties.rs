//! Property-based tests for the attendance projection engine.
//!
//! Verifies invariants of `project`:
//! - empty counters are vacuously safe
//! - clamping of attended > total and negative inputs
//! - monotonicity of percent and of the forecast curve
//! - skip budget and recovery count land exactly on the target boundary

use proptest::prelude::*;

use tally_core::projection::{project, FORECAST_HORIZON};

// =============================================================================
// Proptest strategies
// =============================================================================

/// A consistent counter: attended <= total
fn arb_counter() -> impl Strategy<Value = (i64, i64)> {
    (0i64..=2_000).prop_flat_map(|total| (0..=total, Just(total)))
}

/// A consistent counter near `1 << 62`, where f64 cannot hold every count
fn arb_large_counter() -> impl Strategy<Value = (i64, i64)> {
    let base = 1i64 << 62;
    ((base - 1_000_000)..=(base + 1_000_000), 0i64..=1_000)
        .prop_map(|(total, shortfall)| (total - shortfall, total))
}

/// A target inside the usable range
fn arb_target() -> impl Strategy<Value = i64> {
    1i64..=99
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn empty_counter_is_always_safe(target in -50i64..=150) {
        let result = project(0, 0, target);
        prop_assert_eq!(result.percent, 100.0);
        prop_assert!(result.is_safe);
    }

    #[test]
    fn attended_over_total_clamps(total in 0i64..=2_000, extra in 1i64..=500, target in arb_target()) {
        prop_assert_eq!(project(total + extra, total, target), project(total, total, target));
    }

    #[test]
    fn negative_counts_clamp_to_zero(attended in -1_000i64..0, total in -1_000i64..0, target in arb_target()) {
        prop_assert_eq!(project(attended, total, target), project(0, 0, target));
    }

    #[test]
    fn percent_stays_in_range((attended, total) in arb_counter(), target in -10i64..=110) {
        let result = project(attended, total, target);
        prop_assert!((0.0..=100.0).contains(&result.percent));
    }

    #[test]
    fn percent_non_decreasing_in_attended((attended, total) in arb_counter(), target in arb_target()) {
        prop_assume!(attended < total);
        let lower = project(attended, total, target);
        let higher = project(attended + 1, total, target);
        prop_assert!(lower.percent <= higher.percent);
    }

    #[test]
    fn forecast_is_non_decreasing((attended, total) in arb_counter(), target in arb_target()) {
        let result = project(attended, total, target);
        prop_assert_eq!(result.forecast.len(), FORECAST_HORIZON as usize + 1);
        for pair in result.forecast.windows(2) {
            prop_assert!(pair[0].projected_percent <= pair[1].projected_percent);
            prop_assert_eq!(pair[0].incremental_classes + 1, pair[1].incremental_classes);
        }
    }

    #[test]
    fn forecast_is_non_decreasing_at_large_counts((attended, total) in arb_large_counter(), target in arb_target()) {
        let result = project(attended, total, target);
        prop_assert!((0.0..=100.0).contains(&result.percent));
        prop_assert_eq!(result.forecast[0].projected_percent, result.percent);
        for pair in result.forecast.windows(2) {
            prop_assert!(pair[0].projected_percent <= pair[1].projected_percent);
        }
    }

    #[test]
    fn exactly_one_guidance_value_active((attended, total) in arb_counter(), target in arb_target()) {
        let result = project(attended, total, target);
        if result.is_safe {
            prop_assert_eq!(result.required_recoveries, 0);
        } else {
            prop_assert_eq!(result.safe_skips, 0);
            prop_assert!(result.required_recoveries > 0);
        }
    }

    #[test]
    fn verdict_agrees_with_percent((attended, total) in arb_counter(), target in arb_target()) {
        let result = project(attended, total, target);
        let eps = 1e-9;
        if result.is_safe {
            prop_assert!(result.percent >= target as f64 - eps);
        } else {
            prop_assert!(result.percent < target as f64 + eps);
        }
    }

    #[test]
    fn safe_skips_land_on_boundary((attended, total) in arb_counter(), target in arb_target()) {
        let result = project(attended, total, target);
        prop_assume!(result.is_safe);
        let skips = result.safe_skips as i64;

        let after_skipping = project(attended, total + skips, target);
        prop_assert!(after_skipping.is_safe);
        prop_assert!(after_skipping.percent >= target as f64 - 1e-9);

        let one_more = project(attended, total + skips + 1, target);
        prop_assert!(!one_more.is_safe);
    }

    #[test]
    fn recoveries_land_on_boundary((attended, total) in arb_counter(), target in arb_target()) {
        let result = project(attended, total, target);
        prop_assume!(!result.is_safe);
        let r = result.required_recoveries as i64;

        let recovered = project(attended + r, total + r, target);
        prop_assert!(recovered.is_safe);

        let one_fewer = project(attended + r - 1, total + r - 1, target);
        prop_assert!(!one_fewer.is_safe);
    }

    #[test]
    fn project_is_deterministic(attended in -10i64..=3_000, total in -10i64..=3_000, target in -10i64..=110) {
        prop_assert_eq!(project(attended, total, target), project(attended, total, target));
    }
}

// =============================================================================
// Concrete scenarios
// =============================================================================

#[test]
fn scenario_safe_with_two_skips() {
    let result = project(32, 40, 75);
    assert_eq!(result.percent, 80.0);
    assert!(result.is_safe);
    assert_eq!(result.safe_skips, 2);
}

#[test]
fn scenario_unsafe_needs_forty() {
    let result = project(20, 40, 75);
    assert_eq!(result.percent, 50.0);
    assert!(!result.is_safe);
    assert_eq!(result.required_recoveries, 40);
}

#[test]
fn scenario_no_classes_yet() {
    let result = project(0, 0, 75);
    assert_eq!(result.percent, 100.0);
    assert!(result.is_safe);
}

#[test]
fn scenario_full_attendance() {
    let result = project(10, 10, 75);
    assert_eq!(result.percent, 100.0);
    assert!(result.is_safe);
    assert_eq!(result.safe_skips, 3);
}

//! Attendance projection engine.
//!
//! Turns an `{attended, total}` pair and a target percentage into
//! forward-looking guidance:
//! - current percentage and a safe/unsafe verdict
//! - how many classes can still be skipped (when safe)
//! - how many consecutive presences are needed to recover (when unsafe)
//! - an 11-point forecast assuming every future class is attended
//!
//! Everything here is a pure function. Degenerate input is clamped rather
//! than rejected, so there is no error path.

use crate::AttendanceCounter;
use serde::Serialize;

/// Number of future classes covered by the forecast (points `0..=10`)
pub const FORECAST_HORIZON: u32 = 10;

/// Lowest usable target percentage
pub const MIN_TARGET: i64 = 1;

/// Highest usable target percentage; 100 would divide by zero in the
/// recovery formula
pub const MAX_TARGET: i64 = 99;

/// One point on the forecast curve
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ForecastPoint {
    /// Extra classes attended from now on
    pub incremental_classes: u32,
    /// Percentage after attending them
    pub projected_percent: f64,
    /// Whether the projected percentage reaches the target
    pub meets_target: bool,
}

/// Engine output for one counter
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProjectionResult {
    /// Current attendance percentage in `[0, 100]`
    pub percent: f64,
    /// Target actually used after clamping
    pub target: u32,
    pub is_safe: bool,
    /// Absences that keep the percentage at or above target; 0 when unsafe
    pub safe_skips: u64,
    /// Consecutive presences needed to reach target; 0 when safe
    pub required_recoveries: u64,
    pub forecast: Vec<ForecastPoint>,
}

impl ProjectionResult {
    /// First forecast point that reaches the target, if any within the horizon
    pub fn first_point_meeting_target(&self) -> Option<&ForecastPoint> {
        self.forecast.iter().find(|p| p.meets_target)
    }
}

/// Project attendance for raw counts
///
/// Clamps applied before computing:
/// - negative `attended` or `total` become 0
/// - `attended > total` becomes `attended = total`
/// - `target` is clamped to `[MIN_TARGET, MAX_TARGET]`
///
/// With no recorded classes the percentage is 100 and the verdict is safe.
///
/// The verdict, skip budget and recovery count are evaluated over integer
/// percent units (`100 * attended` against `target * total`). This gives
/// the same numbers as
/// `floor(attended / (target/100) - total)` and
/// `ceil((target/100 * total - attended) / (1 - target/100))`
/// without floating-point error at exact boundaries.
pub fn project(attended: i64, total: i64, target: i64) -> ProjectionResult {
    let total = total.max(0);
    let attended = attended.clamp(0, total);
    let target = clamp_target(target);

    let percent = if total == 0 {
        100.0
    } else {
        percent_of(attended as i128, total as i128)
    };

    let have = 100 * attended as i128;
    let need = target as i128 * total as i128;
    let is_safe = have >= need;

    let (safe_skips, required_recoveries) = if is_safe {
        (saturate((have - need) / target as i128), 0)
    } else {
        (0, saturate(div_ceil(need - have, (100 - target) as i128)))
    };

    let forecast = (0..=FORECAST_HORIZON)
        .map(|i| forecast_point(attended, total, target, i))
        .collect();

    ProjectionResult {
        percent,
        target: target as u32,
        is_safe,
        safe_skips,
        required_recoveries,
        forecast,
    }
}

/// Project a stored counter
pub fn project_counter(counter: AttendanceCounter, target: i64) -> ProjectionResult {
    project(counter.attended as i64, counter.total as i64, target)
}

/// Combined projection over several subjects
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AggregateProjection {
    /// Summed attended classes of subjects with at least one recorded class
    pub attended: u64,
    /// Summed total classes of the same subjects
    pub total: u64,
    /// Projection of the summed counts
    pub projection: ProjectionResult,
    /// Sum of each subject's own skip budget
    pub total_safe_skips: u64,
}

/// Aggregate counters into one overall projection
///
/// Subjects without recorded classes are ignored. The overall skip budget is
/// the sum of per-subject budgets, not the budget of the summed counter,
/// because each subject is held to the target on its own.
pub fn aggregate<I>(counters: I, target: i64) -> AggregateProjection
where
    I: IntoIterator<Item = AttendanceCounter>,
{
    let mut attended: u64 = 0;
    let mut total: u64 = 0;
    let mut total_safe_skips: u64 = 0;

    for counter in counters.into_iter().filter(|c| c.total > 0) {
        attended = attended.saturating_add(u64::from(counter.attended.min(counter.total)));
        total = total.saturating_add(u64::from(counter.total));
        total_safe_skips =
            total_safe_skips.saturating_add(project_counter(counter, target).safe_skips);
    }

    let to_i64 = |n: u64| i64::try_from(n).unwrap_or(i64::MAX);

    AggregateProjection {
        attended,
        total,
        projection: project(to_i64(attended), to_i64(total), target),
        total_safe_skips,
    }
}

/// Clamp a requested target into the usable range
pub fn clamp_target(target: i64) -> i64 {
    target.clamp(MIN_TARGET, MAX_TARGET)
}

fn forecast_point(attended: i64, total: i64, target: i64, i: u32) -> ForecastPoint {
    let projected_attended = attended as i128 + i as i128;
    let projected_total = total as i128 + i as i128;

    if projected_total == 0 {
        return ForecastPoint {
            incremental_classes: i,
            projected_percent: 0.0,
            meets_target: false,
        };
    }

    ForecastPoint {
        incremental_classes: i,
        projected_percent: percent_of(projected_attended, projected_total),
        meets_target: 100 * projected_attended >= target as i128 * projected_total,
    }
}

/// `100 * attended / total` computed from the integer shortfall
///
/// The shortfall is fixed along the forecast while the total grows, so the
/// rounded result never decreases. Converting both counts to f64 separately
/// loses that at large totals. `total` must be positive.
fn percent_of(attended: i128, total: i128) -> f64 {
    100.0 - (100 * (total - attended)) as f64 / total as f64
}

fn div_ceil(numerator: i128, denominator: i128) -> i128 {
    (numerator + denominator - 1) / denominator
}

fn saturate(value: i128) -> u64 {
    u64::try_from(value.max(0)).unwrap_or(u64::MAX)
}

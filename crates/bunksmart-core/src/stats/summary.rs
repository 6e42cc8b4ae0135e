//! Month summary and year-end projection.
//!
//! Counts and rate are scoped to one month, while the best streak and the
//! projection look at every record the user has.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::attendance::{AttendanceMap, AttendanceStatus};
use crate::calendar::YearMonth;

/// Length of the projection horizon.
pub const DAYS_PER_YEAR: u32 = 365;

/// Dashboard summary for one month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceStats {
    /// Present share of the month's marked days, 0..=100.
    pub rate: u32,
    pub present_count: u32,
    pub bunk_count: u32,
    /// Longest run of consecutive present records across all months.
    pub max_streak: u32,
}

/// Half-up rounding, matching the dashboard's display rounding.
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// `round(part / whole * 100)`, or 0 when `whole` is 0.
pub fn percentage(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    round_half_up(f64::from(part) / f64::from(whole) * 100.0) as u32
}

/// Summary for `month`. Pure: the same records always yield the same stats.
pub fn compute_stats(records: &AttendanceMap, month: YearMonth) -> AttendanceStats {
    let mut present_count = 0;
    let mut bunk_count = 0;
    for (key, record) in records {
        if !month.contains(key.date()) {
            continue;
        }
        match record.status {
            AttendanceStatus::Present => present_count += 1,
            AttendanceStatus::Bunked => bunk_count += 1,
        }
    }

    AttendanceStats {
        rate: percentage(present_count, present_count + bunk_count),
        present_count,
        bunk_count,
        max_streak: max_streak(records),
    }
}

/// Longest run of consecutive present days in date-key order. A bunked
/// record or an unmarked day between two records ends the run.
pub fn max_streak(records: &AttendanceMap) -> u32 {
    let mut best = 0;
    let mut current = 0;
    let mut previous: Option<NaiveDate> = None;
    for (key, record) in records {
        let date = key.date();
        if previous.and_then(|p| p.succ_opt()) != Some(date) {
            current = 0;
        }
        previous = Some(date);

        if record.is_present() {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}

/// Present rate of `month`, the figure the perfect-month challenge checks.
pub fn monthly_rate(records: &AttendanceMap, month: YearMonth) -> u32 {
    compute_stats(records, month).rate
}

/// Naive linear projection of the year-end rate over all records.
///
/// `current + (100 - current) * (365 - total) / 365`, rounded half-up. With
/// more than 365 records the remaining-days term goes negative and is not
/// clamped, so the result can fall below zero.
pub fn project_year_end_rate(records: &AttendanceMap) -> i64 {
    if records.is_empty() {
        return 0;
    }
    let total = records.len() as f64;
    let present = records.values().filter(|r| r.is_present()).count() as f64;
    let current_rate = present / total * 100.0;
    let remaining_days = f64::from(DAYS_PER_YEAR) - total;
    round_half_up(current_rate + (100.0 - current_rate) * (remaining_days / f64::from(DAYS_PER_YEAR)))
}

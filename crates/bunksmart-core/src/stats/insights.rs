//! Insights: per-month trend and the bunk log.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::attendance::{AttendanceMap, AttendanceStatus, DateKey};
use crate::calendar::YearMonth;

const DEFAULT_ACTIVITY: &str = "Did something productive";
const DEFAULT_MISSED: &str = "Missed lecture/class";

/// One point of the attendance trend chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBreakdown {
    pub month: YearMonth,
    pub present: u32,
    pub bunked: u32,
    pub total: u32,
    /// Unrounded, 0.0..=100.0
    pub present_pct: f64,
    pub bunk_pct: f64,
}

/// Per-month counts for every month that has records, oldest first.
pub fn monthly_breakdown(records: &AttendanceMap) -> Vec<MonthlyBreakdown> {
    let mut months: BTreeMap<YearMonth, (u32, u32)> = BTreeMap::new();
    for (key, record) in records {
        let entry = months.entry(key.year_month()).or_default();
        match record.status {
            AttendanceStatus::Present => entry.0 += 1,
            AttendanceStatus::Bunked => entry.1 += 1,
        }
    }

    months
        .into_iter()
        .map(|(month, (present, bunked))| {
            let total = present + bunked;
            let pct = |n: u32| {
                if total == 0 {
                    0.0
                } else {
                    f64::from(n) / f64::from(total) * 100.0
                }
            };
            MonthlyBreakdown {
                month,
                present,
                bunked,
                total,
                present_pct: pct(present),
                bunk_pct: pct(bunked),
            }
        })
        .collect()
}

/// A bunked day with its justification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BunkEntry {
    pub date: DateKey,
    pub activity: String,
    pub missed: String,
}

/// Bunked days in date order. Blank fields get placeholder text.
pub fn bunk_log(records: &AttendanceMap) -> Vec<BunkEntry> {
    let or_default = |value: &Option<String>, fallback: &str| {
        value
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(fallback)
            .to_string()
    };

    records
        .iter()
        .filter(|(_, record)| record.is_bunked())
        .map(|(key, record)| BunkEntry {
            date: *key,
            activity: or_default(&record.activity, DEFAULT_ACTIVITY),
            missed: or_default(&record.missed, DEFAULT_MISSED),
        })
        .collect()
}

//! Statistics module for Bunk Smart
//!
//! This module derives the numbers shown on the dashboard and insights pages:
//! the month summary (rate, counts, best streak), the year-end projection,
//! the per-month trend and the log of bunked days.

mod insights;
mod summary;

pub use summary::{
    compute_stats, max_streak, monthly_rate, percentage, project_year_end_rate, AttendanceStats,
    DAYS_PER_YEAR,
};

pub use insights::{bunk_log, monthly_breakdown, BunkEntry, MonthlyBreakdown};

//! Attendance challenges.
//!
//! Each challenge moves through a small state machine:
//!
//! ```text
//! Inactive -> Active -> Completed
//!                ^          |
//!                +- restart +
//! ```
//!
//! Starting (or restarting) resets the counters. A check-in needs today to be
//! marked present, and a few challenges override the generic progress rule.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::attendance::{AttendanceMap, DateKey};
use crate::calendar::YearMonth;
use crate::error::{CheckInError, ValidationError};
use crate::stats::monthly_rate;

/// Progress of every challenge the user has touched.
pub type ChallengeMap = BTreeMap<ChallengeId, ChallengeState>;

/// Target used when nothing more specific is known.
const FALLBACK_TOTAL_DAYS: u32 = 30;

/// Window the no-bunk-week challenge looks back over.
const NO_BUNK_WINDOW_DAYS: i64 = 7;

/// The fixed set of challenges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChallengeId {
    ThirtyDaysHard,
    SixtyDaysHard,
    NinetyDaysHard,
    SevenDayStreak,
    NoBunkWeek,
    PerfectMonth,
    TenTasksRage,
    Custom,
}

impl ChallengeId {
    pub const ALL: [ChallengeId; 8] = [
        ChallengeId::ThirtyDaysHard,
        ChallengeId::SixtyDaysHard,
        ChallengeId::NinetyDaysHard,
        ChallengeId::SevenDayStreak,
        ChallengeId::NoBunkWeek,
        ChallengeId::PerfectMonth,
        ChallengeId::TenTasksRage,
        ChallengeId::Custom,
    ];

    /// Stored identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeId::ThirtyDaysHard => "30_days_hard",
            ChallengeId::SixtyDaysHard => "60_days_hard",
            ChallengeId::NinetyDaysHard => "90_days_hard",
            ChallengeId::SevenDayStreak => "7_day_streak",
            ChallengeId::NoBunkWeek => "no_bunk_week",
            ChallengeId::PerfectMonth => "perfect_month",
            ChallengeId::TenTasksRage => "10_tasks_rage",
            ChallengeId::Custom => "custom_challenge",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ChallengeId::ThirtyDaysHard => "30 Days Hard",
            ChallengeId::SixtyDaysHard => "60 Days Hard",
            ChallengeId::NinetyDaysHard => "90 Days Hard",
            ChallengeId::SevenDayStreak => "7-Day Streak",
            ChallengeId::NoBunkWeek => "No-Bunk Week",
            ChallengeId::PerfectMonth => "Perfect Month",
            ChallengeId::TenTasksRage => "10 Tasks Rage",
            ChallengeId::Custom => "Custom Challenge",
        }
    }

    /// Fixed target. The custom challenge uses its goal once one is set.
    pub fn default_total_days(&self) -> u32 {
        match self {
            ChallengeId::ThirtyDaysHard => 30,
            ChallengeId::SixtyDaysHard => 60,
            ChallengeId::NinetyDaysHard => 90,
            ChallengeId::SevenDayStreak => 7,
            ChallengeId::NoBunkWeek => 7,
            ChallengeId::PerfectMonth => 1,
            ChallengeId::TenTasksRage => 10,
            ChallengeId::Custom => FALLBACK_TOTAL_DAYS,
        }
    }
}

impl fmt::Display for ChallengeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChallengeId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChallengeId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownChallenge(s.to_string()))
    }
}

impl Serialize for ChallengeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ChallengeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengePhase {
    Inactive,
    Active,
    Completed,
}

fn default_total_days() -> u32 {
    FALLBACK_TOTAL_DAYS
}

/// Stored progress of one challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeState {
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_days: u32,
    #[serde(default)]
    pub streak: u32,
    #[serde(default = "default_total_days")]
    pub total_days: u32,
    /// Custom challenge only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<u32>,
}

impl ChallengeState {
    /// Fresh, inactive state with zero progress.
    pub fn new(id: ChallengeId) -> Self {
        Self {
            active: false,
            start_date: None,
            completed_days: 0,
            streak: 0,
            total_days: id.default_total_days(),
            goal: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.total_days > 0 && self.completed_days >= self.total_days
    }

    pub fn phase(&self) -> ChallengePhase {
        if self.is_complete() {
            ChallengePhase::Completed
        } else if self.active {
            ChallengePhase::Active
        } else {
            ChallengePhase::Inactive
        }
    }

    /// 0.0..=100.0
    pub fn progress_pct(&self) -> f64 {
        if self.total_days == 0 {
            return 0.0;
        }
        (f64::from(self.completed_days) / f64::from(self.total_days) * 100.0).min(100.0)
    }
}

/// Result of [`start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartOutcome {
    Started,
    /// Custom challenge started without a positive goal; nothing changed.
    GoalRequired,
}

/// Activate (or restart) a challenge.
pub fn start(
    id: ChallengeId,
    state: &mut ChallengeState,
    goal: Option<u32>,
    now: DateTime<Utc>,
) -> StartOutcome {
    let total_days = if id == ChallengeId::Custom {
        match goal.filter(|g| *g > 0) {
            Some(goal) => {
                state.goal = Some(goal);
                goal
            }
            None => return StartOutcome::GoalRequired,
        }
    } else {
        id.default_total_days()
    };

    state.active = true;
    state.start_date = Some(now);
    state.completed_days = 0;
    state.streak = 0;
    state.total_days = total_days;
    StartOutcome::Started
}

/// What a successful check-in did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInOutcome {
    /// Progress recorded, target not reached yet.
    KeepGoing,
    /// This check-in reached the target.
    Completed,
    /// The target was already reached before this check-in.
    AlreadyComplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInReport {
    pub challenge: ChallengeId,
    pub outcome: CheckInOutcome,
    pub completed_days: u32,
    pub total_days: u32,
    pub streak: u32,
}

/// Advance `state` by one daily check-in.
///
/// Rejected, with `state` untouched, unless today's record is a present mark
/// and the challenge is active. The task-based challenge is gated the same way.
pub fn check_in(
    id: ChallengeId,
    state: &mut ChallengeState,
    records: &AttendanceMap,
    now: DateTime<Utc>,
) -> Result<CheckInReport, CheckInError> {
    let today = DateKey::from_datetime(now).ok_or(CheckInError::NotPresentToday)?;
    if !records.get(&today).is_some_and(|r| r.is_present()) {
        return Err(CheckInError::NotPresentToday);
    }
    if !state.active {
        return Err(CheckInError::NotActive(id));
    }

    let was_complete = state.is_complete();
    state.completed_days = (state.completed_days + 1).min(state.total_days);
    state.streak += 1;

    match id {
        ChallengeId::PerfectMonth => {
            let month = YearMonth::from_date(today.date());
            state.completed_days = if monthly_rate(records, month) == 100 { 1 } else { 0 };
        }
        ChallengeId::NoBunkWeek => {
            let window_start = now - Duration::days(NO_BUNK_WINDOW_DAYS);
            let bunked_recently = records
                .iter()
                .any(|(key, r)| r.is_bunked() && r.effective_date(*key) >= window_start);
            if bunked_recently {
                state.streak = 0;
            }
        }
        _ => {}
    }

    let outcome = match (was_complete, state.is_complete()) {
        (_, false) => CheckInOutcome::KeepGoing,
        (false, true) => CheckInOutcome::Completed,
        (true, true) => CheckInOutcome::AlreadyComplete,
    };

    Ok(CheckInReport {
        challenge: id,
        outcome,
        completed_days: state.completed_days,
        total_days: state.total_days,
        streak: state.streak,
    })
}

//! Explicit UI state.
//!
//! Everything a front end needs to draw is modelled here as plain values:
//! the mark dialog selection, challenge cards, notifications and the loading
//! overlay. Nothing is derived from rendered text.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::attendance::{AttendanceMap, AttendanceStatus, DateKey, MarkDetails};
use crate::challenge::{CheckInOutcome, ChallengeId, ChallengePhase, ChallengeState, StartOutcome};
use crate::error::{CheckInError, CoreError, ExportError, ImportError};
use crate::stats::monthly_rate;

/// How long a toast stays on screen.
pub const TOAST_DURATION_MS: u64 = 3_000;

/// Default force-hide timeout of the loading overlay.
pub const DEFAULT_LOADING_TIMEOUT_SECS: u64 = 10;

// ── Mark dialog ─────────────────────────────────────────────────────

/// Button selected in the mark dialog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkSelection {
    #[default]
    None,
    Present,
    Bunked,
}

impl MarkSelection {
    pub fn status(&self) -> Option<AttendanceStatus> {
        match self {
            MarkSelection::None => None,
            MarkSelection::Present => Some(AttendanceStatus::Present),
            MarkSelection::Bunked => Some(AttendanceStatus::Bunked),
        }
    }

    /// Bunk details are only shown (and kept) for a bunk.
    pub fn shows_details(&self) -> bool {
        *self == MarkSelection::Bunked
    }
}

/// State of the dialog opened by clicking a calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkDialog {
    pub date: DateKey,
    pub selection: MarkSelection,
    pub activity: String,
    pub missed: String,
}

impl MarkDialog {
    /// Open the dialog for `date`, pre-filled from an existing record.
    pub fn open(date: DateKey, records: &AttendanceMap) -> Self {
        match records.get(&date) {
            Some(record) if record.is_present() => Self {
                date,
                selection: MarkSelection::Present,
                activity: String::new(),
                missed: String::new(),
            },
            Some(record) => Self {
                date,
                selection: MarkSelection::Bunked,
                activity: record.activity.clone().unwrap_or_default(),
                missed: record.missed.clone().unwrap_or_default(),
            },
            None => Self {
                date,
                selection: MarkSelection::None,
                activity: String::new(),
                missed: String::new(),
            },
        }
    }

    pub fn select(&mut self, selection: MarkSelection) {
        self.selection = selection;
    }

    /// What saving the dialog would write, or `None` while nothing is selected.
    pub fn submission(&self) -> Option<(AttendanceStatus, MarkDetails)> {
        let status = self.selection.status()?;
        let details = if self.selection.shows_details() {
            MarkDetails::new(self.activity.clone(), self.missed.clone())
        } else {
            MarkDetails::default()
        };
        Some((status, details))
    }
}

// ── Challenge cards ─────────────────────────────────────────────────

/// The one button a card offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardAction {
    Start,
    CheckIn,
    Restart,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChallengeCard {
    pub id: ChallengeId,
    pub title: &'static str,
    pub phase: ChallengePhase,
    /// Progress bar fill, 0.0..=100.0
    pub progress_pct: f64,
    pub progress_text: String,
    pub action: CardAction,
    /// Completion badge unlocked.
    pub badge: bool,
}

/// Build the card for one challenge as of `now`.
pub fn challenge_card(
    id: ChallengeId,
    state: &ChallengeState,
    records: &AttendanceMap,
    now: DateTime<Utc>,
) -> ChallengeCard {
    let mut progress_pct = state.progress_pct();

    let progress_text = match id {
        ChallengeId::TenTasksRage => {
            format!("Task {}/{}", state.completed_days, state.total_days)
        }
        ChallengeId::SevenDayStreak | ChallengeId::NoBunkWeek => {
            format!("Streak: {}/{}", state.streak, state.total_days)
        }
        ChallengeId::PerfectMonth => {
            let month = DateKey::from_datetime(now).map(|k| k.year_month());
            let rate = month.map(|m| monthly_rate(records, m)).unwrap_or(0);
            progress_pct = f64::from(rate);
            format!("Attendance: {rate}%")
        }
        ChallengeId::Custom => match state.goal {
            Some(goal) => format!("Progress: {}/{goal}", state.completed_days),
            None => "Setup Required".to_string(),
        },
        ChallengeId::ThirtyDaysHard | ChallengeId::SixtyDaysHard | ChallengeId::NinetyDaysHard => {
            let elapsed = days_elapsed(state, now);
            format!("Day {}/{}", state.completed_days.min(elapsed), state.total_days)
        }
    };

    let phase = state.phase();
    let action = match phase {
        ChallengePhase::Inactive => CardAction::Start,
        ChallengePhase::Active => CardAction::CheckIn,
        ChallengePhase::Completed => CardAction::Restart,
    };

    ChallengeCard {
        id,
        title: id.title(),
        phase,
        progress_pct,
        progress_text,
        action,
        badge: phase == ChallengePhase::Completed,
    }
}

/// Whole days since the start, counting the start day as day 1.
fn days_elapsed(state: &ChallengeState, now: DateTime<Utc>) -> u32 {
    match (state.active, state.start_date) {
        (true, Some(start)) => {
            let days = (now - start).num_days().max(0) + 1;
            u32::try_from(days).unwrap_or(u32::MAX)
        }
        _ => 0,
    }
}

// ── Notifications ───────────────────────────────────────────────────

/// User-facing message. Toasts disappear on their own, alerts block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "lowercase")]
pub enum Notification {
    Toast(String),
    Alert(String),
}

impl Notification {
    pub fn message(&self) -> &str {
        match self {
            Notification::Toast(m) | Notification::Alert(m) => m,
        }
    }

    pub fn is_blocking(&self) -> bool {
        matches!(self, Notification::Alert(_))
    }

    fn toast(message: &str) -> Self {
        Notification::Toast(message.to_string())
    }

    fn alert(message: &str) -> Self {
        Notification::Alert(message.to_string())
    }

    pub fn attendance_saved() -> Self {
        Self::toast("Attendance saved successfully!")
    }

    pub fn attendance_save_failed() -> Self {
        Self::toast("Error saving attendance. Please try again.")
    }

    pub fn load_failed() -> Self {
        Self::toast("Error loading data. Please refresh.")
    }

    pub fn csv_exported() -> Self {
        Self::toast("CSV exported successfully!")
    }

    pub fn report_exported() -> Self {
        Self::toast("Report exported successfully!")
    }

    pub fn data_exported() -> Self {
        Self::alert("Data exported successfully!")
    }

    pub fn data_imported() -> Self {
        Self::alert("Data imported successfully!")
    }

    pub fn data_cleared() -> Self {
        Self::alert("All data cleared successfully!")
    }

    pub fn started(outcome: StartOutcome) -> Self {
        match outcome {
            StartOutcome::Started => Self::toast("Challenge started! Mark daily to progress."),
            StartOutcome::GoalRequired => {
                Self::toast("Enter a goal to start the custom challenge.")
            }
        }
    }

    pub fn checked_in(outcome: CheckInOutcome) -> Self {
        match outcome {
            CheckInOutcome::Completed => Self::toast("Challenge completed! 🎉 Unlocked badge."),
            CheckInOutcome::KeepGoing => Self::toast("Daily check-in successful! Keep going."),
            CheckInOutcome::AlreadyComplete => Self::toast("Challenge already completed."),
        }
    }

    /// Message shown for a failed operation.
    pub fn from_error(err: &CoreError) -> Self {
        match err {
            CoreError::CheckIn(CheckInError::NotPresentToday) => {
                Self::alert(&CheckInError::NotPresentToday.to_string())
            }
            CoreError::CheckIn(e @ CheckInError::NotActive(_)) => Self::toast(&e.to_string()),
            CoreError::Export(ExportError::NoData) => Self::toast("No data to export."),
            CoreError::Export(_) => Self::alert("Error exporting data. Please try again."),
            CoreError::Import(ImportError::UnrecognizedFormat) => {
                Self::alert("Invalid data format. Please select a valid Bunk Smart export file.")
            }
            CoreError::Import(_) => {
                Self::alert("Error importing data. Please check the file format.")
            }
            CoreError::Validation(e) => Self::toast(&e.to_string()),
            _ => Self::toast("Something went wrong. Please try again."),
        }
    }
}

// ── Loading overlay ─────────────────────────────────────────────────

/// Spinner shown while a store call is in flight.
///
/// Wall-clock driven: no thread, the caller passes `now`. The
/// overlay hides itself once `timeout` has passed even if the operation never
/// finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadingOverlay {
    shown_at: Option<DateTime<Utc>>,
    timeout_ms: i64,
}

impl LoadingOverlay {
    pub fn new(timeout: std::time::Duration) -> Self {
        Self {
            shown_at: None,
            timeout_ms: i64::try_from(timeout.as_millis()).unwrap_or(i64::MAX),
        }
    }

    pub fn show(&mut self, now: DateTime<Utc>) {
        self.shown_at = Some(now);
    }

    pub fn hide(&mut self) {
        self.shown_at = None;
    }

    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        self.shown_at.is_some() && !self.timed_out(now)
    }

    /// Shown, but past the force-hide deadline.
    pub fn timed_out(&self, now: DateTime<Utc>) -> bool {
        match self.shown_at {
            Some(at) => now - at >= Duration::milliseconds(self.timeout_ms),
            None => false,
        }
    }
}

impl Default for LoadingOverlay {
    fn default() -> Self {
        Self::new(std::time::Duration::from_secs(DEFAULT_LOADING_TIMEOUT_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::AttendanceRecord;
    use crate::challenge;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn dialog_prefills_existing_bunk() {
        let key = DateKey::parse("2026-01-07").unwrap();
        let mut records = AttendanceMap::new();
        records.insert(
            key,
            AttendanceRecord::new(key, AttendanceStatus::Bunked, MarkDetails::new("gym", "")),
        );

        let dialog = MarkDialog::open(key, &records);
        assert_eq!(dialog.selection, MarkSelection::Bunked);
        assert_eq!(dialog.activity, "gym");

        let empty = MarkDialog::open(DateKey::parse("2026-01-08").unwrap(), &records);
        assert_eq!(empty.selection, MarkSelection::None);
        assert!(empty.submission().is_none());
    }

    #[test]
    fn present_submission_drops_details() {
        let key = DateKey::parse("2026-01-07").unwrap();
        let mut dialog = MarkDialog::open(key, &AttendanceMap::new());
        dialog.activity = "ignored".into();
        dialog.select(MarkSelection::Present);
        let (status, details) = dialog.submission().unwrap();
        assert_eq!(status, AttendanceStatus::Present);
        assert_eq!(details, MarkDetails::default());
    }

    #[test]
    fn card_actions_follow_phase() {
        let now = at(2026, 1, 10, 12);
        let records = AttendanceMap::new();
        let mut state = ChallengeState::new(ChallengeId::ThirtyDaysHard);

        let card = challenge_card(ChallengeId::ThirtyDaysHard, &state, &records, now);
        assert_eq!(card.action, CardAction::Start);
        assert_eq!(card.progress_text, "Day 0/30");

        challenge::start(ChallengeId::ThirtyDaysHard, &mut state, None, at(2026, 1, 8, 9));
        state.completed_days = 5;
        let card = challenge_card(ChallengeId::ThirtyDaysHard, &state, &records, now);
        assert_eq!(card.action, CardAction::CheckIn);
        // Three calendar days elapsed caps the displayed count.
        assert_eq!(card.progress_text, "Day 3/30");

        state.completed_days = 30;
        let card = challenge_card(ChallengeId::ThirtyDaysHard, &state, &records, now);
        assert_eq!(card.action, CardAction::Restart);
        assert!(card.badge);
    }

    #[test]
    fn card_texts_per_challenge() {
        let now = at(2026, 1, 10, 12);
        let key = DateKey::parse("2026-01-10").unwrap();
        let mut records = AttendanceMap::new();
        records.insert(key, AttendanceRecord::new(key, AttendanceStatus::Present, MarkDetails::default()));

        let custom = ChallengeState::new(ChallengeId::Custom);
        assert_eq!(
            challenge_card(ChallengeId::Custom, &custom, &records, now).progress_text,
            "Setup Required"
        );

        let perfect = ChallengeState::new(ChallengeId::PerfectMonth);
        let card = challenge_card(ChallengeId::PerfectMonth, &perfect, &records, now);
        assert_eq!(card.progress_text, "Attendance: 100%");
        assert_eq!(card.progress_pct, 100.0);

        let mut streak = ChallengeState::new(ChallengeId::NoBunkWeek);
        streak.streak = 4;
        assert_eq!(
            challenge_card(ChallengeId::NoBunkWeek, &streak, &records, now).progress_text,
            "Streak: 4/7"
        );

        let tasks = ChallengeState::new(ChallengeId::TenTasksRage);
        assert_eq!(
            challenge_card(ChallengeId::TenTasksRage, &tasks, &records, now).progress_text,
            "Task 0/10"
        );
    }

    #[test]
    fn check_in_after_completion_does_not_say_keep_going() {
        let now = at(2026, 1, 12, 9);
        let today = DateKey::from_datetime(now).unwrap();
        let mut records = AttendanceMap::new();
        records.insert(
            today,
            AttendanceRecord::new(today, AttendanceStatus::Present, MarkDetails::default()),
        );

        let mut state = ChallengeState::new(ChallengeId::SevenDayStreak);
        challenge::start(ChallengeId::SevenDayStreak, &mut state, None, at(2026, 1, 5, 9));
        state.completed_days = 7;

        let report =
            challenge::check_in(ChallengeId::SevenDayStreak, &mut state, &records, now).unwrap();
        assert_eq!(report.outcome, CheckInOutcome::AlreadyComplete);
        let n = Notification::checked_in(report.outcome);
        assert_eq!(n.message(), "Challenge already completed.");
        assert!(!n.message().contains("Keep going"));

        assert_eq!(
            Notification::checked_in(CheckInOutcome::KeepGoing).message(),
            "Daily check-in successful! Keep going."
        );
    }

    #[test]
    fn notifications_for_errors() {
        let n = Notification::from_error(&CoreError::CheckIn(CheckInError::NotPresentToday));
        assert!(n.is_blocking());
        assert_eq!(n.message(), "You must mark today as present in attendance to check in!");

        let n = Notification::from_error(&CoreError::Export(ExportError::NoData));
        assert_eq!(n, Notification::Toast("No data to export.".into()));
    }

    #[test]
    fn overlay_force_hides_after_timeout() {
        let mut overlay = LoadingOverlay::default();
        let t0 = at(2026, 1, 1, 0);
        assert!(!overlay.is_visible(t0));

        overlay.show(t0);
        assert!(overlay.is_visible(t0 + Duration::seconds(9)));
        assert!(!overlay.is_visible(t0 + Duration::seconds(10)));
        assert!(overlay.timed_out(t0 + Duration::seconds(10)));

        overlay.show(t0);
        overlay.hide();
        assert!(!overlay.is_visible(t0));
        assert!(!overlay.timed_out(t0 + Duration::seconds(60)));
    }
}

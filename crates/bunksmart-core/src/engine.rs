//! The attendance engine.
//!
//! [`AttendanceEngine`] owns the signed-in user's document and a
//! [`RecordStore`] to persist it. Every mutation updates the local copy first
//! and then writes the changed top-level field through the store. A failed
//! write is returned to the caller while the local change is kept; there is
//! no rollback.
//!
//! Mutations without a signed-in user are skipped: they log a warning and
//! return `Ok(None)`.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::attendance::{AttendanceMap, AttendanceRecord, AttendanceStatus, DateKey, MarkDetails};
use crate::calendar::{month_grid, CalendarGrid, WeekStart, YearMonth};
use crate::challenge::{self, ChallengeId, ChallengeMap, ChallengeState, CheckInReport, StartOutcome};
use crate::error::{CoreError, Result, StoreError};
use crate::export::{self, ExportFormat, ImportSummary};
use crate::settings::{SettingKey, SettingsMap, UserPreferences};
use crate::stats::{self, AttendanceStats, BunkEntry, MonthlyBreakdown};
use crate::store::{RecordStore, UserDocument, UserId};
use crate::view::{challenge_card, ChallengeCard, LoadingOverlay};

/// Await a store write with the loading overlay shown.
async fn persist<F>(loading: &mut LoadingOverlay, operation: &str, write: F) -> Result<()>
where
    F: Future<Output = std::result::Result<(), StoreError>>,
{
    loading.show(Utc::now());
    let result = write.await;
    loading.hide();
    result.map_err(|e| {
        warn!(operation, error = %e, "store write failed; local state kept");
        CoreError::from(e)
    })
}

pub struct AttendanceEngine<S> {
    store: S,
    user: Option<UserId>,
    doc: UserDocument,
    default_week_start: WeekStart,
    loading: LoadingOverlay,
}

impl<S: RecordStore> AttendanceEngine<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            user: None,
            doc: UserDocument::default(),
            default_week_start: WeekStart::default(),
            loading: LoadingOverlay::default(),
        }
    }

    /// Week start used while the user has not chosen one.
    pub fn with_default_week_start(mut self, week_start: WeekStart) -> Self {
        self.default_week_start = week_start;
        self
    }

    pub fn with_loading_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.loading = LoadingOverlay::new(timeout);
        self
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn user(&self) -> Option<&UserId> {
        self.user.as_ref()
    }

    pub fn document(&self) -> &UserDocument {
        &self.doc
    }

    pub fn records(&self) -> &AttendanceMap {
        &self.doc.attendance
    }

    pub fn challenges(&self) -> &ChallengeMap {
        &self.doc.challenges
    }

    pub fn settings(&self) -> &SettingsMap {
        &self.doc.settings
    }

    pub fn preferences(&self) -> UserPreferences {
        UserPreferences::from_settings(&self.doc.settings)
    }

    pub fn loading(&self) -> &LoadingOverlay {
        &self.loading
    }

    /// Challenge state, or the fresh state a never-touched challenge has.
    pub fn challenge(&self, id: ChallengeId) -> ChallengeState {
        self.doc
            .challenges
            .get(&id)
            .cloned()
            .unwrap_or_else(|| ChallengeState::new(id))
    }

    fn require_user(&self, operation: &str) -> Option<UserId> {
        if self.user.is_none() {
            warn!(operation, "no signed-in user; skipping");
        }
        self.user.clone()
    }

    // ── Session ──────────────────────────────────────────────────────

    /// Load `user`'s document and make it the active one.
    pub async fn sign_in(&mut self, user: UserId) -> Result<()> {
        self.loading.show(Utc::now());
        let loaded = self.store.load_user_record_set(&user).await;
        self.loading.hide();
        let doc = loaded?;

        info!(
            user = %user,
            records = doc.attendance.len(),
            challenges = doc.challenges.len(),
            "loaded user document"
        );
        self.doc = doc;
        self.user = Some(user);
        Ok(())
    }

    /// Forget the user and drop the local copy. Nothing is written.
    pub fn sign_out(&mut self) {
        if let Some(user) = self.user.take() {
            debug!(user = %user, "signed out");
        }
        self.doc = UserDocument::default();
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Mark `date` and persist the whole attendance map.
    ///
    /// Overwrites any existing record. Details are kept only for bunks.
    pub async fn mark_date(
        &mut self,
        date: DateKey,
        status: AttendanceStatus,
        details: MarkDetails,
    ) -> Result<Option<AttendanceRecord>> {
        let Some(user) = self.require_user("mark_date") else {
            return Ok(None);
        };

        let record = AttendanceRecord::new(date, status, details);
        self.doc.attendance.insert(date, record.clone());
        debug!(date = %date, status = %status, "marked date");

        persist(
            &mut self.loading,
            "save_attendance",
            self.store.save_attendance(&user, &self.doc.attendance),
        )
        .await?;
        Ok(Some(record))
    }

    /// Activate (or restart) a challenge.
    pub async fn start_challenge(
        &mut self,
        id: ChallengeId,
        goal: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<Option<StartOutcome>> {
        let Some(user) = self.require_user("start_challenge") else {
            return Ok(None);
        };

        let mut state = self.challenge(id);
        let outcome = challenge::start(id, &mut state, goal, now);
        if outcome == StartOutcome::GoalRequired {
            debug!(challenge = %id, "start skipped: goal required");
            return Ok(Some(outcome));
        }
        self.doc.challenges.insert(id, state);
        info!(challenge = %id, "challenge started");

        self.save_challenges(&user).await?;
        Ok(Some(outcome))
    }

    /// Daily check-in for one challenge.
    ///
    /// Precondition failures are returned as [`CoreError::CheckIn`] with
    /// nothing changed.
    pub async fn check_in(
        &mut self,
        id: ChallengeId,
        now: DateTime<Utc>,
    ) -> Result<Option<CheckInReport>> {
        let Some(user) = self.require_user("check_in") else {
            return Ok(None);
        };

        let mut state = self.challenge(id);
        let report = challenge::check_in(id, &mut state, &self.doc.attendance, now)?;
        self.doc.challenges.insert(id, state);
        debug!(challenge = %id, outcome = ?report.outcome, "checked in");

        self.save_challenges(&user).await?;
        Ok(Some(report))
    }

    /// Check in every active challenge, as done after marking today present.
    ///
    /// Returns no reports when today is not marked present.
    pub async fn check_in_active(&mut self, now: DateTime<Utc>) -> Result<Option<Vec<CheckInReport>>> {
        let Some(user) = self.require_user("check_in_active") else {
            return Ok(None);
        };

        let active: Vec<ChallengeId> = self
            .doc
            .challenges
            .iter()
            .filter(|(_, state)| state.active)
            .map(|(id, _)| *id)
            .collect();

        let mut reports = Vec::new();
        for id in active {
            let mut state = self.challenge(id);
            match challenge::check_in(id, &mut state, &self.doc.attendance, now) {
                Ok(report) => {
                    self.doc.challenges.insert(id, state);
                    reports.push(report);
                }
                Err(e) => debug!(challenge = %id, reason = %e, "auto check-in skipped"),
            }
        }

        if !reports.is_empty() {
            self.save_challenges(&user).await?;
        }
        Ok(Some(reports))
    }

    async fn save_challenges(&mut self, user: &UserId) -> Result<()> {
        persist(
            &mut self.loading,
            "save_challenges",
            self.store.save_challenges(user, &self.doc.challenges),
        )
        .await
    }

    /// Validate and upsert one user setting.
    pub async fn save_setting(&mut self, key: &str, value: Value) -> Result<Option<()>> {
        let Some(user) = self.require_user("save_setting") else {
            return Ok(None);
        };

        let setting: SettingKey = key.parse()?;
        setting.validate(&value)?;
        self.doc.settings.insert(setting.as_str().to_string(), value.clone());
        debug!(key = setting.as_str(), "saved setting");

        persist(
            &mut self.loading,
            "save_setting",
            self.store.save_setting(&user, setting.as_str(), &value),
        )
        .await?;
        Ok(Some(()))
    }

    /// Replace the sections present in an exported JSON document.
    ///
    /// The payload is validated before anything changes.
    pub async fn import_json(&mut self, text: &str) -> Result<Option<ImportSummary>> {
        let Some(user) = self.require_user("import") else {
            return Ok(None);
        };

        let payload = export::parse_import(text)?;
        let summary = payload.summary();

        if let Some(attendance) = payload.attendance {
            self.doc.attendance = attendance;
            persist(
                &mut self.loading,
                "import attendance",
                self.store.save_attendance(&user, &self.doc.attendance),
            )
            .await?;
        }
        if let Some(settings) = payload.settings {
            self.doc.settings = settings;
            persist(
                &mut self.loading,
                "import settings",
                self.store.save_settings(&user, &self.doc.settings),
            )
            .await?;
        }
        if let Some(challenges) = payload.challenges {
            self.doc.challenges = challenges;
            self.save_challenges(&user).await?;
        }

        info!(?summary, "imported document");
        Ok(Some(summary))
    }

    /// Empty attendance, settings and challenges, locally and in the store.
    pub async fn clear_all(&mut self) -> Result<Option<()>> {
        let Some(user) = self.require_user("clear_all") else {
            return Ok(None);
        };

        self.doc = UserDocument::default();
        persist(
            &mut self.loading,
            "clear attendance",
            self.store.save_attendance(&user, &self.doc.attendance),
        )
        .await?;
        persist(
            &mut self.loading,
            "clear settings",
            self.store.save_settings(&user, &self.doc.settings),
        )
        .await?;
        self.save_challenges(&user).await?;

        info!("cleared all data");
        Ok(Some(()))
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn week_start(&self) -> WeekStart {
        if self.doc.settings.contains_key(SettingKey::StartWeek.as_str()) {
            self.preferences().week_start
        } else {
            self.default_week_start
        }
    }

    pub fn calendar(&self, month: YearMonth) -> CalendarGrid {
        month_grid(month, &self.doc.attendance, self.week_start())
    }

    pub fn stats(&self, month: YearMonth) -> AttendanceStats {
        stats::compute_stats(&self.doc.attendance, month)
    }

    pub fn projected_year_end_rate(&self) -> i64 {
        stats::project_year_end_rate(&self.doc.attendance)
    }

    pub fn monthly_breakdown(&self) -> Vec<MonthlyBreakdown> {
        stats::monthly_breakdown(&self.doc.attendance)
    }

    pub fn bunk_log(&self) -> Vec<BunkEntry> {
        stats::bunk_log(&self.doc.attendance)
    }

    /// One card per challenge, in the fixed challenge order.
    pub fn challenge_cards(&self, now: DateTime<Utc>) -> Vec<ChallengeCard> {
        ChallengeId::ALL
            .into_iter()
            .map(|id| challenge_card(id, &self.challenge(id), &self.doc.attendance, now))
            .collect()
    }

    /// Render the local document. Returns the suggested file name and body.
    pub fn export(&self, format: ExportFormat, today: NaiveDate) -> Result<(String, String)> {
        let body = export::render(format, &self.doc)?;
        Ok((format.file_name(today), body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    fn key(s: &str) -> DateKey {
        DateKey::parse(s).unwrap()
    }

    #[tokio::test]
    async fn mutations_without_user_are_skipped() {
        let mut engine = AttendanceEngine::new(MemoryStore::new());
        let marked = engine
            .mark_date(key("2026-01-01"), AttendanceStatus::Present, MarkDetails::default())
            .await
            .unwrap();
        assert!(marked.is_none());
        assert!(engine.records().is_empty());
        assert!(engine.clear_all().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_write_keeps_local_state() {
        let mut engine = AttendanceEngine::new(MemoryStore::new());
        let user = UserId::new("u").unwrap();
        engine.sign_in(user.clone()).await.unwrap();

        engine.store().set_fail_writes(true);
        let err = engine
            .mark_date(key("2026-01-01"), AttendanceStatus::Present, MarkDetails::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Store(_)));
        assert_eq!(engine.records().len(), 1);
        assert!(engine.store().snapshot(&user).unwrap().attendance.is_empty());
        assert!(!engine.loading().is_visible(Utc::now()));
    }

    #[tokio::test]
    async fn remarking_overwrites_instead_of_merging() {
        let mut engine = AttendanceEngine::new(MemoryStore::new());
        let user = UserId::new("u").unwrap();
        engine.sign_in(user.clone()).await.unwrap();
        let date = key("2026-02-10");

        let first = engine
            .mark_date(date, AttendanceStatus::Bunked, MarkDetails::new("gym", "lab"))
            .await
            .unwrap();
        let second = engine
            .mark_date(date, AttendanceStatus::Bunked, MarkDetails::new("gym", "lab"))
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(engine.records().len(), 1);
        let after_repeat = engine.document().clone();

        engine
            .mark_date(date, AttendanceStatus::Bunked, MarkDetails::new("gym", "lab"))
            .await
            .unwrap();
        assert_eq!(engine.document(), &after_repeat);

        engine
            .mark_date(date, AttendanceStatus::Present, MarkDetails::default())
            .await
            .unwrap();
        assert_eq!(engine.records().len(), 1);
        let record = &engine.records()[&date];
        assert_eq!(record.status, AttendanceStatus::Present);
        assert!(record.activity.is_none());
        assert!(record.missed.is_none());

        let stored = engine.store().snapshot(&user).unwrap();
        assert_eq!(stored.attendance, *engine.records());
    }

    #[tokio::test]
    async fn check_in_rejection_leaves_state() {
        let mut engine = AttendanceEngine::new(MemoryStore::new());
        engine.sign_in(UserId::new("u").unwrap()).await.unwrap();
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap();

        engine
            .start_challenge(ChallengeId::SevenDayStreak, None, now)
            .await
            .unwrap();
        let err = engine.check_in(ChallengeId::SevenDayStreak, now).await.unwrap_err();
        assert!(matches!(err, CoreError::CheckIn(crate::error::CheckInError::NotPresentToday)));
        assert_eq!(engine.challenge(ChallengeId::SevenDayStreak).streak, 0);
    }

    #[tokio::test]
    async fn unknown_setting_is_rejected() {
        let mut engine = AttendanceEngine::new(MemoryStore::new());
        engine.sign_in(UserId::new("u").unwrap()).await.unwrap();
        let err = engine.save_setting("colour", Value::Bool(true)).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(engine.settings().is_empty());
    }

    #[tokio::test]
    async fn week_start_prefers_user_setting() {
        let mut engine =
            AttendanceEngine::new(MemoryStore::new()).with_default_week_start(WeekStart::Monday);
        engine.sign_in(UserId::new("u").unwrap()).await.unwrap();
        assert_eq!(engine.week_start(), WeekStart::Monday);

        engine
            .save_setting("startWeek", Value::String("sunday".into()))
            .await
            .unwrap();
        assert_eq!(engine.week_start(), WeekStart::Sunday);
    }
}

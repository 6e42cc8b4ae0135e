//! End-to-end engine workflows over the real store backends.

use bunksmart_core::storage::session;
use bunksmart_core::{
    AttendanceEngine, AttendanceStatus, ChallengeId, CheckInOutcome, CoreError, Database,
    DateKey, ExportFormat, MarkDetails, MemoryStore, SqliteStore, StartOutcome, StoreError,
    UserDocument, UserId, YearMonth,
};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

fn user() -> UserId {
    UserId::new("student-42").unwrap()
}

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 9, 30, 0).unwrap()
}

fn key(s: &str) -> DateKey {
    DateKey::parse(s).unwrap()
}

#[tokio::test]
async fn sqlite_document_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bunksmart.db");
    let now = at(2026, 3, 10);

    let expected = {
        let store = SqliteStore::new(Database::open_at(&path).unwrap());
        let mut engine = AttendanceEngine::new(store);
        engine.sign_in(user()).await.unwrap();
        assert!(engine.records().is_empty());

        engine
            .mark_date(key("2026-03-09"), AttendanceStatus::Bunked, MarkDetails::new("gym", "lab"))
            .await
            .unwrap();
        engine
            .mark_date(key("2026-03-10"), AttendanceStatus::Present, MarkDetails::default())
            .await
            .unwrap();
        engine.save_setting("theme", json!("dark")).await.unwrap();

        let started = engine
            .start_challenge(ChallengeId::ThirtyDaysHard, None, now)
            .await
            .unwrap();
        assert_eq!(started, Some(StartOutcome::Started));
        let report = engine
            .check_in(ChallengeId::ThirtyDaysHard, now)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(report.outcome, CheckInOutcome::KeepGoing);
        assert_eq!(report.completed_days, 1);

        engine.document().clone()
    };

    let store = SqliteStore::new(Database::open_at(&path).unwrap());
    let mut engine = AttendanceEngine::new(store);
    engine.sign_in(user()).await.unwrap();
    assert_eq!(engine.document(), &expected);
    assert_eq!(engine.records()[&key("2026-03-09")].activity.as_deref(), Some("gym"));
    assert_eq!(engine.challenge(ChallengeId::ThirtyDaysHard).completed_days, 1);
    assert_eq!(engine.settings()["theme"], json!("dark"));
}

#[tokio::test]
async fn export_clear_import_restores_document() {
    let store = MemoryStore::new();
    let mut engine = AttendanceEngine::new(store);
    engine.sign_in(user()).await.unwrap();

    for (date, status) in [
        ("2026-01-05", AttendanceStatus::Present),
        ("2026-01-06", AttendanceStatus::Bunked),
        ("2026-02-02", AttendanceStatus::Present),
    ] {
        engine
            .mark_date(key(date), status, MarkDetails::default())
            .await
            .unwrap();
    }
    engine
        .start_challenge(ChallengeId::Custom, Some(12), at(2026, 2, 2))
        .await
        .unwrap();
    let before = engine.document().clone();

    let (file_name, json_text) = engine
        .export(ExportFormat::Json, at(2026, 2, 3).date_naive())
        .unwrap();
    assert_eq!(file_name, "bunk-smart-data-2026-02-03.json");

    engine.clear_all().await.unwrap();
    assert_eq!(engine.document(), &UserDocument::default());
    assert!(matches!(
        engine.export(ExportFormat::Csv, at(2026, 2, 3).date_naive()),
        Err(CoreError::Export(_))
    ));
    assert_eq!(
        engine.store().snapshot(&user()).unwrap(),
        UserDocument::default()
    );

    let summary = engine.import_json(&json_text).await.unwrap().unwrap();
    assert_eq!(summary.attendance, Some(3));
    assert_eq!(summary.challenges, Some(1));
    assert_eq!(engine.document(), &before);
    assert_eq!(engine.store().snapshot(&user()).unwrap(), before);
}

#[tokio::test]
async fn rejected_import_changes_nothing() {
    let mut engine = AttendanceEngine::new(MemoryStore::new());
    engine.sign_in(user()).await.unwrap();
    engine
        .mark_date(key("2026-05-04"), AttendanceStatus::Present, MarkDetails::default())
        .await
        .unwrap();
    let before = engine.document().clone();

    for bad in ["not json", "[]", r#"{"foo": 1}"#, r#"{"attendance": {"bad-key": {}}}"#] {
        assert!(matches!(
            engine.import_json(bad).await,
            Err(CoreError::Import(_))
        ));
        assert_eq!(engine.document(), &before);
    }
}

#[tokio::test]
async fn stats_follow_marks_across_months() {
    let mut engine = AttendanceEngine::new(MemoryStore::new());
    engine.sign_in(user()).await.unwrap();
    for (date, status) in [
        ("2026-01-30", AttendanceStatus::Present),
        ("2026-01-31", AttendanceStatus::Present),
        ("2026-02-01", AttendanceStatus::Present),
        ("2026-02-02", AttendanceStatus::Bunked),
    ] {
        engine
            .mark_date(key(date), status, MarkDetails::default())
            .await
            .unwrap();
    }

    let feb = engine.stats(YearMonth::new(2026, 1).unwrap());
    assert_eq!((feb.present_count, feb.bunk_count, feb.rate), (1, 1, 50));
    assert_eq!(feb.max_streak, 3);

    let breakdown = engine.monthly_breakdown();
    assert_eq!(breakdown.len(), 2);
    assert_eq!(engine.bunk_log().len(), 1);

    // 75% now, 361 of 365 days still to come
    assert_eq!(engine.projected_year_end_rate(), 100);
}

#[tokio::test]
async fn failed_write_surfaces_store_error() {
    let store = MemoryStore::new();
    store.set_fail_writes(true);
    let mut engine = AttendanceEngine::new(store);
    engine.sign_in(user()).await.unwrap();

    let err = engine
        .mark_date(key("2026-06-01"), AttendanceStatus::Present, MarkDetails::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Store(StoreError::Remote { status: 503, .. })));
    assert!(!engine.loading().is_visible(Utc::now()));
}

#[test]
fn session_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bunksmart.db");

    let db = Database::open_at(&path).unwrap();
    assert_eq!(session::current_user(&db).unwrap(), None);
    session::sign_in(&db, &user()).unwrap();
    drop(db);

    let db = Database::open_at(&path).unwrap();
    assert_eq!(session::current_user(&db).unwrap(), Some(user()));
    session::sign_out(&db).unwrap();
    assert_eq!(session::current_user(&db).unwrap(), None);
}

//! HttpStore against a mocked document service.

use std::time::Duration;

use bunksmart_core::{
    AttendanceMap, AttendanceRecord, AttendanceStatus, DateKey, HttpStore, MarkDetails,
    RecordStore, StoreError, UserDocument, UserId,
};
use mockito::Matcher;
use serde_json::json;

fn user() -> UserId {
    UserId::new("u1").unwrap()
}

fn store(server: &mockito::ServerGuard, token: Option<&str>) -> HttpStore {
    HttpStore::new(&server.url(), token, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn first_load_creates_empty_document() {
    let mut server = mockito::Server::new_async().await;
    let get = server
        .mock("GET", "/users/u1")
        .with_status(404)
        .create_async()
        .await;
    let put = server
        .mock("PUT", "/users/u1")
        .match_body(Matcher::Json(json!({
            "attendance": {},
            "settings": {},
            "challenges": {}
        })))
        .with_status(200)
        .create_async()
        .await;

    let doc = store(&server, None).load_user_record_set(&user()).await.unwrap();
    assert_eq!(doc, UserDocument::default());
    get.assert_async().await;
    put.assert_async().await;
}

#[tokio::test]
async fn load_parses_existing_document() {
    let mut server = mockito::Server::new_async().await;
    let get = server
        .mock("GET", "/users/u1")
        .match_header("authorization", "Bearer secret")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "attendance": {
                    "2026-01-05": { "status": "present" },
                    "2026-01-06": { "status": "bunk", "activity": "nap", "missed": "maths" }
                },
                "settings": { "theme": "dark" },
                "challenges": {
                    "7_day_streak": {
                        "active": true,
                        "startDate": "2026-01-05T08:00:00Z",
                        "completedDays": 1,
                        "streak": 1,
                        "totalDays": 7
                    }
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let doc = store(&server, Some("secret"))
        .load_user_record_set(&user())
        .await
        .unwrap();
    let bunk = &doc.attendance[&DateKey::parse("2026-01-06").unwrap()];
    assert_eq!(bunk.status, AttendanceStatus::Bunked);
    assert_eq!(bunk.missed.as_deref(), Some("maths"));
    assert_eq!(doc.challenges.len(), 1);
    get.assert_async().await;
}

#[tokio::test]
async fn save_attendance_patches_field() {
    let mut server = mockito::Server::new_async().await;
    let patch = server
        .mock("PATCH", "/users/u1")
        .match_body(Matcher::PartialJson(json!({
            "attendance": { "2026-01-05": { "status": "present" } }
        })))
        .with_status(204)
        .create_async()
        .await;

    let key = DateKey::parse("2026-01-05").unwrap();
    let mut records = AttendanceMap::new();
    records.insert(
        key,
        AttendanceRecord::new(key, AttendanceStatus::Present, MarkDetails::default()),
    );
    store(&server, None).save_attendance(&user(), &records).await.unwrap();
    patch.assert_async().await;
}

#[tokio::test]
async fn save_setting_puts_single_key() {
    let mut server = mockito::Server::new_async().await;
    let put = server
        .mock("PUT", "/users/u1/settings/streakGoal")
        .match_body(Matcher::Json(json!(80)))
        .with_status(200)
        .create_async()
        .await;

    store(&server, None)
        .save_setting(&user(), "streakGoal", &json!(80))
        .await
        .unwrap();
    put.assert_async().await;
}

#[tokio::test]
async fn error_statuses_map_to_store_errors() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/users/u1")
        .with_status(401)
        .create_async()
        .await;
    server
        .mock("PATCH", "/users/u1")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let s = store(&server, Some("expired"));
    assert!(matches!(
        s.load_user_record_set(&user()).await,
        Err(StoreError::Unauthorized { status: 401 })
    ));
    match s.save_challenges(&user(), &Default::default()).await {
        Err(StoreError::Remote { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected remote error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_document_is_corrupt() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/users/u1")
        .with_status(200)
        .with_body(r#"{"attendance": "nope"}"#)
        .create_async()
        .await;

    assert!(matches!(
        store(&server, None).load_user_record_set(&user()).await,
        Err(StoreError::CorruptDocument { .. })
    ));
}

//! Record store over the local SQLite document table.
//!
//! rusqlite is blocking, so every call runs on the blocking pool with the
//! connection behind a mutex.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::{RecordStore, UserDocument, UserId};
use crate::attendance::AttendanceMap;
use crate::challenge::ChallengeMap;
use crate::error::StoreError;
use crate::settings::SettingsMap;
use crate::storage::{Database, DocumentField};

#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<Mutex<Database>>,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    /// Run `f` against the database on the blocking pool.
    async fn with_db<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T, StoreError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let guard = db.lock().map_err(|_| StoreError::Locked)?;
            f(&guard)
        })
        .await?
    }

    async fn write_json<T: Serialize>(
        &self,
        user: &UserId,
        field: DocumentField,
        value: &T,
    ) -> Result<(), StoreError> {
        let json = serde_json::to_string(value).map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        let user = user.clone();
        self.with_db(move |db| db.write_field(&user, field, &json)).await
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn load_user_record_set(&self, user: &UserId) -> Result<UserDocument, StoreError> {
        let user = user.clone();
        self.with_db(move |db| match db.load_document(&user)? {
            Some(doc) => Ok(doc),
            None => {
                db.ensure_document(&user)?;
                Ok(UserDocument::default())
            }
        })
        .await
    }

    async fn save_attendance(
        &self,
        user: &UserId,
        records: &AttendanceMap,
    ) -> Result<(), StoreError> {
        self.write_json(user, DocumentField::Attendance, records).await
    }

    async fn save_challenges(
        &self,
        user: &UserId,
        challenges: &ChallengeMap,
    ) -> Result<(), StoreError> {
        self.write_json(user, DocumentField::Challenges, challenges).await
    }

    async fn save_setting(
        &self,
        user: &UserId,
        key: &str,
        value: &Value,
    ) -> Result<(), StoreError> {
        let (user, key, value) = (user.clone(), key.to_string(), value.clone());
        self.with_db(move |db| db.update_setting(&user, &key, &value)).await
    }

    async fn save_settings(
        &self,
        user: &UserId,
        settings: &SettingsMap,
    ) -> Result<(), StoreError> {
        self.write_json(user, DocumentField::Settings, settings).await
    }
}

//! In-process record store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use super::{RecordStore, UserDocument, UserId};
use crate::attendance::AttendanceMap;
use crate::challenge::ChallengeMap;
use crate::error::StoreError;
use crate::settings::SettingsMap;

/// Documents held in memory, lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Mutex<HashMap<UserId, UserDocument>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, to exercise error paths.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Current stored copy of `user`'s document.
    pub fn snapshot(&self, user: &UserId) -> Option<UserDocument> {
        self.docs.lock().ok()?.get(user).cloned()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<UserId, UserDocument>>, StoreError> {
        self.docs.lock().map_err(|_| StoreError::Locked)
    }

    fn write<F>(&self, user: &UserId, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut UserDocument),
    {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Remote {
                status: 503,
                body: "writes disabled".into(),
            });
        }
        let mut docs = self.lock()?;
        apply(docs.entry(user.clone()).or_default());
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn load_user_record_set(&self, user: &UserId) -> Result<UserDocument, StoreError> {
        let mut docs = self.lock()?;
        Ok(docs.entry(user.clone()).or_default().clone())
    }

    async fn save_attendance(
        &self,
        user: &UserId,
        records: &AttendanceMap,
    ) -> Result<(), StoreError> {
        self.write(user, |doc| doc.attendance = records.clone())
    }

    async fn save_challenges(
        &self,
        user: &UserId,
        challenges: &ChallengeMap,
    ) -> Result<(), StoreError> {
        self.write(user, |doc| doc.challenges = challenges.clone())
    }

    async fn save_setting(
        &self,
        user: &UserId,
        key: &str,
        value: &Value,
    ) -> Result<(), StoreError> {
        self.write(user, |doc| {
            doc.settings.insert(key.to_string(), value.clone());
        })
    }

    async fn save_settings(
        &self,
        user: &UserId,
        settings: &SettingsMap,
    ) -> Result<(), StoreError> {
        self.write(user, |doc| doc.settings = settings.clone())
    }
}

//! Persistence of user documents.
//!
//! The engine talks to a [`RecordStore`]: an opaque per-user document store
//! with whole-field overwrites and a single-key settings upsert. Three
//! backends are provided:
//!
//! - [`MemoryStore`]: in-process, for tests and embedding
//! - [`SqliteStore`]: the local document table
//! - [`HttpStore`]: a remote JSON document service

mod http;
mod memory;
mod sqlite;

pub use http::HttpStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::attendance::AttendanceMap;
use crate::challenge::ChallengeMap;
use crate::error::{CoreError, StoreError, ValidationError};
use crate::settings::SettingsMap;
use crate::storage::{Config, Database, StoreBackend};

/// Identity of a signed-in user, as issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Rejects blank ids.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "user".into(),
                message: "user id must not be empty".into(),
            });
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The whole per-user document; also the JSON export format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    #[serde(default)]
    pub attendance: AttendanceMap,
    #[serde(default)]
    pub settings: SettingsMap,
    #[serde(default)]
    pub challenges: ChallengeMap,
}

/// Per-user document persistence.
///
/// Writes replace the named top-level field wholesale. There is no
/// transaction spanning several calls.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Load the document of `user`. A user seen for the first time gets an
    /// empty document, which the backend creates.
    async fn load_user_record_set(&self, user: &UserId) -> Result<UserDocument, StoreError>;

    async fn save_attendance(&self, user: &UserId, records: &AttendanceMap)
        -> Result<(), StoreError>;

    async fn save_challenges(
        &self,
        user: &UserId,
        challenges: &ChallengeMap,
    ) -> Result<(), StoreError>;

    /// Upsert one settings key, leaving the others untouched.
    async fn save_setting(&self, user: &UserId, key: &str, value: &Value)
        -> Result<(), StoreError>;

    /// Replace the whole settings map.
    async fn save_settings(&self, user: &UserId, settings: &SettingsMap)
        -> Result<(), StoreError>;
}

macro_rules! forward_record_store {
    ($ty:ty) => {
        #[async_trait]
        impl<S: RecordStore + ?Sized> RecordStore for $ty {
            async fn load_user_record_set(
                &self,
                user: &UserId,
            ) -> Result<UserDocument, StoreError> {
                (**self).load_user_record_set(user).await
            }

            async fn save_attendance(
                &self,
                user: &UserId,
                records: &AttendanceMap,
            ) -> Result<(), StoreError> {
                (**self).save_attendance(user, records).await
            }

            async fn save_challenges(
                &self,
                user: &UserId,
                challenges: &ChallengeMap,
            ) -> Result<(), StoreError> {
                (**self).save_challenges(user, challenges).await
            }

            async fn save_setting(
                &self,
                user: &UserId,
                key: &str,
                value: &Value,
            ) -> Result<(), StoreError> {
                (**self).save_setting(user, key, value).await
            }

            async fn save_settings(
                &self,
                user: &UserId,
                settings: &SettingsMap,
            ) -> Result<(), StoreError> {
                (**self).save_settings(user, settings).await
            }
        }
    };
}

forward_record_store!(Arc<S>);
forward_record_store!(Box<S>);

/// Build the store selected by `config`.
pub fn open_configured(config: &Config) -> Result<Box<dyn RecordStore>, CoreError> {
    match config.store.backend {
        StoreBackend::Sqlite => {
            let db = Database::open()?;
            Ok(Box::new(SqliteStore::new(db)))
        }
        StoreBackend::Http => {
            let token = Some(config.store.api_token.as_str()).filter(|t| !t.is_empty());
            let store = HttpStore::new(
                &config.store.base_url,
                token,
                Duration::from_secs(config.store.timeout_secs),
            )?;
            Ok(Box::new(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_rejects_blank() {
        assert!(UserId::new("").is_err());
        assert!(UserId::new("   ").is_err());
        assert_eq!(UserId::new("abc").unwrap().as_str(), "abc");
    }

    #[test]
    fn document_tolerates_missing_fields() {
        let doc: UserDocument = serde_json::from_str(r#"{"settings":{"theme":"dark"}}"#).unwrap();
        assert!(doc.attendance.is_empty());
        assert!(doc.challenges.is_empty());
        assert_eq!(doc.settings.len(), 1);
    }

    #[test]
    fn document_uses_wire_names() {
        let doc: UserDocument = serde_json::from_str(
            r#"{"challenges":{"7_day_streak":{"active":true,"completedDays":2,"streak":2,"totalDays":7}}}"#,
        )
        .unwrap();
        let state = &doc.challenges[&crate::challenge::ChallengeId::SevenDayStreak];
        assert!(state.active);
        assert_eq!(state.completed_days, 2);
    }
}

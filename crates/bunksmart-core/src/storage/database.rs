//! SQLite-based document storage.
//!
//! Provides persistent storage for:
//! - Per-user documents (attendance, settings and challenges as JSON columns)
//! - Key-value store for application state (the signed-in session)

use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use crate::error::StoreError;
use crate::store::{UserDocument, UserId};

use super::data_dir;

/// File name of the local database inside the data directory.
pub const DB_FILE_NAME: &str = "bunksmart.db";

/// Top-level field of a user document, one column each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentField {
    Attendance,
    Settings,
    Challenges,
}

impl DocumentField {
    fn column(&self) -> &'static str {
        match self {
            DocumentField::Attendance => "attendance",
            DocumentField::Settings => "settings",
            DocumentField::Challenges => "challenges",
        }
    }
}

/// SQLite database for user documents.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/bunksmart/bunksmart.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory or database cannot be opened.
    pub fn open() -> Result<Self, crate::error::CoreError> {
        let path = data_dir()?.join(DB_FILE_NAME);
        Ok(Self::open_at(&path)?)
    }

    /// Open (or create) the database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS user_documents (
                user_id     TEXT PRIMARY KEY,
                attendance  TEXT NOT NULL DEFAULT '{}',
                settings    TEXT NOT NULL DEFAULT '{}',
                challenges  TEXT NOT NULL DEFAULT '{}',
                updated_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Load the document of `user`, or `None` if it was never created.
    pub fn load_document(&self, user: &UserId) -> Result<Option<UserDocument>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT attendance, settings, challenges FROM user_documents WHERE user_id = ?1",
                params![user.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((attendance, settings, challenges)) = row else {
            return Ok(None);
        };

        let corrupt = |e: serde_json::Error| StoreError::CorruptDocument {
            user: user.to_string(),
            message: e.to_string(),
        };
        Ok(Some(UserDocument {
            attendance: serde_json::from_str(&attendance).map_err(corrupt)?,
            settings: serde_json::from_str(&settings).map_err(corrupt)?,
            challenges: serde_json::from_str(&challenges).map_err(corrupt)?,
        }))
    }

    /// Create an empty document for `user` unless one exists.
    pub fn ensure_document(&self, user: &UserId) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO user_documents (user_id, updated_at) VALUES (?1, ?2)",
            params![user.as_str(), Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Overwrite one top-level field with already-serialized JSON.
    pub fn write_field(
        &self,
        user: &UserId,
        field: DocumentField,
        json: &str,
    ) -> Result<(), StoreError> {
        self.ensure_document(user)?;
        let sql = format!(
            "UPDATE user_documents SET {} = ?1, updated_at = ?2 WHERE user_id = ?3",
            field.column()
        );
        self.conn
            .execute(&sql, params![json, Utc::now().to_rfc3339(), user.as_str()])?;
        Ok(())
    }

    /// Upsert a single key of the settings map.
    pub fn update_setting(&self, user: &UserId, key: &str, value: &Value) -> Result<(), StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        let mut settings = self
            .load_document(user)?
            .map(|doc| doc.settings)
            .unwrap_or_default();
        settings.insert(key.to_string(), value.clone());
        let json = serde_json::to_string(&settings).map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        self.write_field(user, DocumentField::Settings, &json)?;
        tx.commit()?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a key from the kv store. Missing keys are not an error.
    pub fn kv_delete(&self, key: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user() -> UserId {
        UserId::new("u-1").unwrap()
    }

    #[test]
    fn missing_document_is_none() {
        let db = Database::open_memory().unwrap();
        assert!(db.load_document(&user()).unwrap().is_none());
        db.ensure_document(&user()).unwrap();
        assert_eq!(db.load_document(&user()).unwrap(), Some(UserDocument::default()));
    }

    #[test]
    fn write_field_replaces_column() {
        let db = Database::open_memory().unwrap();
        db.write_field(
            &user(),
            DocumentField::Attendance,
            r#"{"2026-01-01":{"status":"present"}}"#,
        )
        .unwrap();
        let doc = db.load_document(&user()).unwrap().unwrap();
        assert_eq!(doc.attendance.len(), 1);
        assert!(doc.settings.is_empty());
    }

    #[test]
    fn update_setting_merges_keys() {
        let db = Database::open_memory().unwrap();
        db.update_setting(&user(), "theme", &json!("dark")).unwrap();
        db.update_setting(&user(), "streakGoal", &json!(80)).unwrap();
        let doc = db.load_document(&user()).unwrap().unwrap();
        assert_eq!(doc.settings["theme"], json!("dark"));
        assert_eq!(doc.settings["streakGoal"], json!(80));
    }

    #[test]
    fn corrupt_column_is_reported() {
        let db = Database::open_memory().unwrap();
        db.write_field(&user(), DocumentField::Challenges, "not json").unwrap();
        assert!(matches!(
            db.load_document(&user()),
            Err(StoreError::CorruptDocument { .. })
        ));
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        db.kv_delete("test").unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
    }
}

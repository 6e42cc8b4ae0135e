//! Signed-in user, kept in the local kv table.
//!
//! Authentication happens elsewhere: signing in records a user
//! id, signing out forgets it.

use crate::error::StoreError;
use crate::store::UserId;

use super::Database;

pub const SESSION_KEY: &str = "session.user";

/// The signed-in user, if any.
pub fn current_user(db: &Database) -> Result<Option<UserId>, StoreError> {
    let stored = db.kv_get(SESSION_KEY)?;
    Ok(stored.and_then(|id| UserId::new(id).ok()))
}

pub fn sign_in(db: &Database, user: &UserId) -> Result<(), StoreError> {
    db.kv_set(SESSION_KEY, user.as_str())?;
    tracing::info!(user = %user, "session stored");
    Ok(())
}

pub fn sign_out(db: &Database) -> Result<(), StoreError> {
    db.kv_delete(SESSION_KEY)?;
    Ok(())
}

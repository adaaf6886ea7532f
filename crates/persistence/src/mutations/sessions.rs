// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Session mutations. All times are supplied by the caller.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::backend::PersistenceBackend;
use crate::data_models::encode_timestamp;
use crate::diesel_schema::sessions;
use crate::error::PersistenceError;

backend_fn! {
/// Creates a new session for a user.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `session_token` - The unique session token
/// * `user_id` - The user ID
/// * `created_at` - Creation time, also the first activity time
/// * `expires_at` - Expiration time
///
/// # Errors
///
/// Returns an error if the session cannot be created.
pub fn create_session(
    conn: &mut _,
    session_token: &str,
    user_id: i64,
    created_at: OffsetDateTime,
    expires_at: OffsetDateTime,
) -> Result<i64, PersistenceError> {
    let created_text: String = encode_timestamp(created_at)?;

    diesel::insert_into(sessions::table)
        .values((
            sessions::session_token.eq(session_token),
            sessions::user_id.eq(user_id),
            sessions::created_at.eq(&created_text),
            sessions::last_activity_at.eq(&created_text),
            sessions::expires_at.eq(encode_timestamp(expires_at)?),
        ))
        .execute(conn)?;

    let session_id: i64 = conn.get_last_insert_rowid()?;
    debug!(session_id, user_id, %expires_at, "Session created");
    Ok(session_id)
}
}

backend_fn! {
/// Records activity on a session.
///
/// # Errors
///
/// Returns an error if the database update fails.
pub fn update_session_activity(
    conn: &mut _,
    session_id: i64,
    now: OffsetDateTime,
) -> Result<(), PersistenceError> {
    diesel::update(sessions::table.filter(sessions::session_id.eq(session_id)))
        .set(sessions::last_activity_at.eq(encode_timestamp(now)?))
        .execute(conn)?;
    Ok(())
}
}

backend_fn! {
/// Deletes a session by token. Deleting an unknown token is not an error.
///
/// # Errors
///
/// Returns an error if the database delete fails.
pub fn delete_session(conn: &mut _, session_token: &str) -> Result<(), PersistenceError> {
    diesel::delete(sessions::table.filter(sessions::session_token.eq(session_token)))
        .execute(conn)?;
    debug!("Deleted session");
    Ok(())
}
}

backend_fn! {
/// Deletes every session that has expired at `now`.
///
/// # Errors
///
/// Returns an error if the database delete fails.
pub fn delete_expired_sessions(
    conn: &mut _,
    now: OffsetDateTime,
) -> Result<usize, PersistenceError> {
    let now_text: String = encode_timestamp(now)?;

    let removed: usize = diesel::delete(sessions::table.filter(sessions::expires_at.le(&now_text)))
        .execute(conn)?;

    info!(removed, "Deleted expired sessions");
    Ok(removed)
}
}

backend_fn! {
/// Deletes all sessions of a user.
///
/// # Errors
///
/// Returns an error if the database delete fails.
pub fn delete_sessions_for_user(conn: &mut _, user_id: i64) -> Result<usize, PersistenceError> {
    let removed: usize = diesel::delete(sessions::table.filter(sessions::user_id.eq(user_id)))
        .execute(conn)?;

    info!(user_id, removed, "Deleted sessions for user");
    Ok(removed)
}
}

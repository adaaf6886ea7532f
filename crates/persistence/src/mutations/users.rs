// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! User and credential mutations.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use roster_domain::User;
use tracing::info;

use crate::backend::PersistenceBackend;
use crate::data_models::NewUserRow;
use crate::diesel_schema::{group_members, sessions, users};
use crate::error::PersistenceError;

/// Hashes a plain-text password with bcrypt at the default cost.
///
/// # Errors
///
/// Returns an error if hashing fails.
pub fn hash_password(password: &str) -> Result<String, PersistenceError> {
    Ok(bcrypt::hash(password, bcrypt::DEFAULT_COST)?)
}

backend_fn! {
/// Inserts a user with an already hashed password and returns the new id.
///
/// # Errors
///
/// Returns `ConstraintViolation` if the email is taken, or another error if
/// the insert fails.
pub fn insert_user(
    conn: &mut _,
    user: &User,
    password_hash: &str,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(users::table)
        .values(NewUserRow::from_user(user, password_hash)?)
        .execute(conn)?;
    let user_id: i64 = conn.get_last_insert_rowid()?;

    info!(user_id, role = %user.role, "Created user");
    Ok(user_id)
}
}

backend_fn! {
/// Replaces a user's profile fields. The password hash is untouched.
///
/// # Errors
///
/// Returns `UserNotFound` if no row was updated, or `ConstraintViolation`
/// if the new email is taken.
pub fn update_user(conn: &mut _, user: &User) -> Result<(), PersistenceError> {
    let user_id: i64 = user
        .user_id
        .ok_or_else(|| PersistenceError::NotFound(String::from("user without id")))?;

    let updated: usize = diesel::update(users::table.filter(users::user_id.eq(user_id)))
        .set((
            users::full_name.eq(&user.full_name),
            users::email.eq(&user.email),
            users::rank_label.eq(user.rank.as_ref().map(roster_domain::Rank::label)),
            users::role.eq(user.role.as_str()),
        ))
        .execute(conn)?;
    if updated == 0 {
        return Err(PersistenceError::UserNotFound(user_id));
    }

    info!(user_id, "Updated user");
    Ok(())
}
}

backend_fn! {
/// Deletes a user together with their sessions and group memberships.
///
/// Duties are kept and keep pointing at the old id.
///
/// # Errors
///
/// Returns `UserNotFound` if no user was deleted.
pub fn delete_user(conn: &mut _, user_id: i64) -> Result<(), PersistenceError> {
    let sessions_removed: usize =
        diesel::delete(sessions::table.filter(sessions::user_id.eq(user_id))).execute(conn)?;
    let memberships_removed: usize =
        diesel::delete(group_members::table.filter(group_members::user_id.eq(user_id)))
            .execute(conn)?;
    let deleted: usize =
        diesel::delete(users::table.filter(users::user_id.eq(user_id))).execute(conn)?;
    if deleted == 0 {
        return Err(PersistenceError::UserNotFound(user_id));
    }

    info!(
        user_id,
        sessions_removed, memberships_removed, "Deleted user"
    );
    Ok(())
}
}

backend_fn! {
/// Sets a new password for a user.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `user_id` - The user ID
/// * `new_password` - The new password (will be hashed)
///
/// # Errors
///
/// Returns an error if hashing fails, or `UserNotFound` if no row was
/// updated.
pub fn update_password(
    conn: &mut _,
    user_id: i64,
    new_password: &str,
) -> Result<(), PersistenceError> {
    let password_hash: String = hash_password(new_password)?;

    let updated: usize = diesel::update(users::table.filter(users::user_id.eq(user_id)))
        .set(users::password_hash.eq(&password_hash))
        .execute(conn)?;
    if updated == 0 {
        return Err(PersistenceError::UserNotFound(user_id));
    }

    info!(user_id, "Updated password");
    Ok(())
}
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! User and credential queries.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use roster_domain::User;
use tracing::debug;

use crate::data_models::UserRow;
use crate::diesel_schema::users;
use crate::error::PersistenceError;

backend_fn! {
/// Lists all users ordered by full name, then id.
///
/// # Errors
///
/// Returns an error if the query fails or a row is invalid.
pub fn list_users(conn: &mut _) -> Result<Vec<User>, PersistenceError> {
    debug!("Listing users");

    users::table
        .order((users::full_name.asc(), users::user_id.asc()))
        .select(UserRow::as_select())
        .load::<UserRow>(conn)?
        .into_iter()
        .map(UserRow::into_user)
        .collect()
}
}

backend_fn! {
/// Retrieves a user by id.
///
/// # Errors
///
/// Returns an error if the query fails.
/// Returns `Ok(None)` if the user does not exist.
pub fn get_user_by_id(conn: &mut _, user_id: i64) -> Result<Option<User>, PersistenceError> {
    debug!(user_id, "Looking up user");

    users::table
        .filter(users::user_id.eq(user_id))
        .select(UserRow::as_select())
        .first::<UserRow>(conn)
        .optional()?
        .map(UserRow::into_user)
        .transpose()
}
}

backend_fn! {
/// Retrieves a user and their password hash by login email.
///
/// The email is trimmed and lowercased, matching how it is stored.
///
/// # Errors
///
/// Returns an error if the query fails.
/// Returns `Ok(None)` if no user has this email.
pub fn get_credentials_by_email(
    conn: &mut _,
    email: &str,
) -> Result<Option<(User, String)>, PersistenceError> {
    let normalized: String = email.trim().to_lowercase();
    debug!(email = %normalized, "Looking up credentials");

    users::table
        .filter(users::email.eq(&normalized))
        .select(UserRow::as_select())
        .first::<UserRow>(conn)
        .optional()?
        .map(|row| {
            let password_hash = row.password_hash.clone();
            row.into_user().map(|user| (user, password_hash))
        })
        .transpose()
}
}

backend_fn! {
/// Retrieves the password hash of a user.
///
/// # Errors
///
/// Returns an error if the query fails.
/// Returns `Ok(None)` if the user does not exist.
pub fn get_password_hash(conn: &mut _, user_id: i64) -> Result<Option<String>, PersistenceError> {
    Ok(users::table
        .filter(users::user_id.eq(user_id))
        .select(users::password_hash)
        .first::<String>(conn)
        .optional()?)
}
}

backend_fn! {
/// Counts all users.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_users(conn: &mut _) -> Result<i64, PersistenceError> {
    Ok(users::table.count().get_result::<i64>(conn)?)
}
}

/// Checks a plain-text password against a bcrypt hash.
///
/// # Errors
///
/// Returns an error if the hash is malformed.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, PersistenceError> {
    Ok(bcrypt::verify(password, password_hash)?)
}

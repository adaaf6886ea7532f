// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Duty queries. Every list is ordered by shift start, then id.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use roster_domain::Duty;
use time::OffsetDateTime;
use tracing::debug;

use crate::data_models::{DutyRow, encode_timestamp};
use crate::diesel_schema::duties;
use crate::error::PersistenceError;

backend_fn! {
/// Lists every duty.
///
/// # Errors
///
/// Returns an error if the query fails or a row is invalid.
pub fn list_duties(conn: &mut _) -> Result<Vec<Duty>, PersistenceError> {
    debug!("Listing all duties");

    duties::table
        .order((duties::shift_start.asc(), duties::duty_id.asc()))
        .select(DutyRow::as_select())
        .load::<DutyRow>(conn)?
        .into_iter()
        .map(DutyRow::into_duty)
        .collect()
}
}

backend_fn! {
/// Lists the duties owned by `user_id`, whether or not the user still
/// exists.
///
/// # Errors
///
/// Returns an error if the query fails or a row is invalid.
pub fn list_duties_for_user(conn: &mut _, user_id: i64) -> Result<Vec<Duty>, PersistenceError> {
    debug!(user_id, "Listing duties for user");

    duties::table
        .filter(duties::user_id.eq(user_id))
        .order((duties::shift_start.asc(), duties::duty_id.asc()))
        .select(DutyRow::as_select())
        .load::<DutyRow>(conn)?
        .into_iter()
        .map(DutyRow::into_duty)
        .collect()
}
}

backend_fn! {
/// Lists duties of the given users whose window intersects `[from, to)`.
///
/// # Errors
///
/// Returns an error if the query fails or a row is invalid.
pub fn list_duties_between(
    conn: &mut _,
    user_ids: &[i64],
    from: OffsetDateTime,
    to: OffsetDateTime,
) -> Result<Vec<Duty>, PersistenceError> {
    debug!(users = user_ids.len(), %from, %to, "Listing duties in window");

    let from_text: String = encode_timestamp(from)?;
    let to_text: String = encode_timestamp(to)?;

    duties::table
        .filter(duties::user_id.eq_any(user_ids))
        .filter(duties::shift_end.gt(&from_text))
        .filter(duties::shift_start.lt(&to_text))
        .order((duties::shift_start.asc(), duties::duty_id.asc()))
        .select(DutyRow::as_select())
        .load::<DutyRow>(conn)?
        .into_iter()
        .map(DutyRow::into_duty)
        .collect()
}
}

backend_fn! {
/// Retrieves a duty by id.
///
/// # Errors
///
/// Returns an error if the query fails.
/// Returns `Ok(None)` if the duty does not exist.
pub fn get_duty(conn: &mut _, duty_id: i64) -> Result<Option<Duty>, PersistenceError> {
    debug!(duty_id, "Looking up duty");

    duties::table
        .filter(duties::duty_id.eq(duty_id))
        .select(DutyRow::as_select())
        .first::<DutyRow>(conn)
        .optional()?
        .map(DutyRow::into_duty)
        .transpose()
}
}

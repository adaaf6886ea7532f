// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Duty mutations.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use roster_domain::Duty;
use tracing::info;

use crate::backend::PersistenceBackend;
use crate::data_models::DutyValues;
use crate::diesel_schema::duties;
use crate::error::PersistenceError;

backend_fn! {
/// Inserts duties in order and returns their new ids in the same order.
///
/// Callers wanting all-or-nothing semantics run this inside a transaction.
///
/// # Errors
///
/// Returns an error if any insert fails.
pub fn insert_duties(conn: &mut _, new_duties: &[Duty]) -> Result<Vec<i64>, PersistenceError> {
    let mut ids: Vec<i64> = Vec::with_capacity(new_duties.len());

    for duty in new_duties {
        diesel::insert_into(duties::table)
            .values(DutyValues::from_duty(duty)?)
            .execute(conn)?;
        ids.push(conn.get_last_insert_rowid()?);
    }

    info!(count = ids.len(), "Inserted duties");
    Ok(ids)
}
}

backend_fn! {
/// Replaces every stored field of an existing duty.
///
/// # Errors
///
/// Returns `DutyNotFound` if the duty has no id or no row was updated.
pub fn update_duty(conn: &mut _, duty: &Duty) -> Result<(), PersistenceError> {
    let duty_id: i64 = duty
        .duty_id
        .ok_or_else(|| PersistenceError::NotFound(String::from("duty without id")))?;

    let updated: usize = diesel::update(duties::table.filter(duties::duty_id.eq(duty_id)))
        .set(DutyValues::from_duty(duty)?)
        .execute(conn)?;
    if updated == 0 {
        return Err(PersistenceError::DutyNotFound(duty_id));
    }

    info!(duty_id, "Updated duty");
    Ok(())
}
}

backend_fn! {
/// Deletes a duty.
///
/// # Errors
///
/// Returns `DutyNotFound` if no row was deleted.
pub fn delete_duty(conn: &mut _, duty_id: i64) -> Result<(), PersistenceError> {
    let deleted: usize = diesel::delete(duties::table.filter(duties::duty_id.eq(duty_id)))
        .execute(conn)?;
    if deleted == 0 {
        return Err(PersistenceError::DutyNotFound(duty_id));
    }

    info!(duty_id, "Deleted duty");
    Ok(())
}
}

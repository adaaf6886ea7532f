// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Group and membership queries.
//!
//! Groups are loaded in two steps: the group rows, then every membership row
//! of those groups ordered by position.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use roster_domain::Group;
use tracing::debug;

use crate::data_models::{GroupMemberRow, GroupRow, assemble_groups};
use crate::diesel_schema::{group_members, roster_groups};
use crate::error::PersistenceError;

backend_fn! {
/// Lists all groups ordered by name, then id.
///
/// # Errors
///
/// Returns an error if the query fails or a row is invalid.
pub fn list_groups(conn: &mut _) -> Result<Vec<Group>, PersistenceError> {
    debug!("Listing groups");

    let rows: Vec<GroupRow> = roster_groups::table
        .order((roster_groups::name.asc(), roster_groups::group_id.asc()))
        .select(GroupRow::as_select())
        .load(conn)?;
    let members: Vec<GroupMemberRow> = group_members::table
        .order((group_members::group_id.asc(), group_members::position.asc()))
        .select(GroupMemberRow::as_select())
        .load(conn)?;

    assemble_groups(rows, &members)
}
}

backend_fn! {
/// Retrieves a group with its members.
///
/// # Errors
///
/// Returns an error if the query fails.
/// Returns `Ok(None)` if the group does not exist.
pub fn get_group(conn: &mut _, group_id: i64) -> Result<Option<Group>, PersistenceError> {
    debug!(group_id, "Looking up group");

    let Some(row) = roster_groups::table
        .filter(roster_groups::group_id.eq(group_id))
        .select(GroupRow::as_select())
        .first::<GroupRow>(conn)
        .optional()?
    else {
        return Ok(None);
    };
    let members: Vec<GroupMemberRow> = group_members::table
        .filter(group_members::group_id.eq(group_id))
        .order(group_members::position.asc())
        .select(GroupMemberRow::as_select())
        .load(conn)?;

    Ok(assemble_groups(vec![row], &members)?.pop())
}
}

backend_fn! {
/// Lists the groups `user_id` belongs to, ordered by name, then id.
///
/// # Errors
///
/// Returns an error if the query fails or a row is invalid.
pub fn list_groups_for_user(conn: &mut _, user_id: i64) -> Result<Vec<Group>, PersistenceError> {
    debug!(user_id, "Listing groups for user");

    let group_ids: Vec<i64> = group_members::table
        .filter(group_members::user_id.eq(user_id))
        .select(group_members::group_id)
        .load(conn)?;
    let rows: Vec<GroupRow> = roster_groups::table
        .filter(roster_groups::group_id.eq_any(&group_ids))
        .order((roster_groups::name.asc(), roster_groups::group_id.asc()))
        .select(GroupRow::as_select())
        .load(conn)?;
    let members: Vec<GroupMemberRow> = group_members::table
        .filter(group_members::group_id.eq_any(&group_ids))
        .order((group_members::group_id.asc(), group_members::position.asc()))
        .select(GroupMemberRow::as_select())
        .load(conn)?;

    assemble_groups(rows, &members)
}
}

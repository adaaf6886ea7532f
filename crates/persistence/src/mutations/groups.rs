// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Group and membership mutations.
//!
//! Membership is always rewritten as a whole: old rows are deleted and the
//! new list is inserted with fresh positions.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use roster_domain::Group;
use tracing::info;

use crate::backend::PersistenceBackend;
use crate::data_models::{GroupMemberRow, encode_timestamp};
use crate::diesel_schema::{group_members, roster_groups};
use crate::error::PersistenceError;

backend_fn! {
/// Inserts a group with its members and returns the new id.
///
/// # Errors
///
/// Returns an error if an insert fails, including when a member id does not
/// reference a user.
pub fn insert_group(conn: &mut _, group: &Group) -> Result<i64, PersistenceError> {
    diesel::insert_into(roster_groups::table)
        .values((
            roster_groups::name.eq(&group.name),
            roster_groups::description.eq(group.description.as_deref()),
            roster_groups::created_at.eq(encode_timestamp(group.created_at)?),
        ))
        .execute(conn)?;
    let group_id: i64 = conn.get_last_insert_rowid()?;

    let members: Vec<GroupMemberRow> = GroupMemberRow::for_members(group_id, &group.member_ids)?;
    if !members.is_empty() {
        diesel::insert_into(group_members::table)
            .values(&members)
            .execute(conn)?;
    }

    info!(group_id, name = %group.name, "Created group");
    Ok(group_id)
}
}

backend_fn! {
/// Replaces a group's name, description and membership.
///
/// # Errors
///
/// Returns `GroupNotFound` if the group does not exist, or a constraint error
/// if a member id does not reference a user.
pub fn update_group(conn: &mut _, group: &Group) -> Result<(), PersistenceError> {
    let group_id: i64 = group
        .group_id
        .ok_or_else(|| PersistenceError::NotFound(String::from("group without id")))?;

    let updated: usize =
        diesel::update(roster_groups::table.filter(roster_groups::group_id.eq(group_id)))
            .set((
                roster_groups::name.eq(&group.name),
                roster_groups::description.eq(group.description.as_deref()),
            ))
            .execute(conn)?;
    if updated == 0 {
        return Err(PersistenceError::GroupNotFound(group_id));
    }

    diesel::delete(group_members::table.filter(group_members::group_id.eq(group_id)))
        .execute(conn)?;
    let members: Vec<GroupMemberRow> = GroupMemberRow::for_members(group_id, &group.member_ids)?;
    if !members.is_empty() {
        diesel::insert_into(group_members::table)
            .values(&members)
            .execute(conn)?;
    }

    info!(group_id, members = members.len(), "Updated group");
    Ok(())
}
}

backend_fn! {
/// Deletes a group and its membership rows.
///
/// # Errors
///
/// Returns `GroupNotFound` if no group was deleted.
pub fn delete_group(conn: &mut _, group_id: i64) -> Result<(), PersistenceError> {
    diesel::delete(group_members::table.filter(group_members::group_id.eq(group_id)))
        .execute(conn)?;
    let deleted: usize =
        diesel::delete(roster_groups::table.filter(roster_groups::group_id.eq(group_id)))
            .execute(conn)?;
    if deleted == 0 {
        return Err(PersistenceError::GroupNotFound(group_id));
    }

    info!(group_id, "Deleted group");
    Ok(())
}
}

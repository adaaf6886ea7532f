// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Row types and conversions between stored rows and domain values.

use diesel::prelude::*;
use roster_audit::AuditEvent;
use roster_domain::{Duty, Group, Rank, Role, RotationCycle, ShiftWindow, User};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::diesel_schema::{duties, group_members, roster_groups, sessions, users};
use crate::error::PersistenceError;

/// Fixed-width UTC timestamp layout used for every stored instant.
///
/// Lexical order of the encoded text equals chronological order, which the
/// range and expiry filters rely on.
const TIMESTAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:9]Z");

/// Encodes an instant as stored timestamp text.
///
/// # Errors
///
/// Returns an error if the instant cannot be formatted.
pub fn encode_timestamp(instant: OffsetDateTime) -> Result<String, PersistenceError> {
    instant
        .to_offset(UtcOffset::UTC)
        .format(TIMESTAMP_FORMAT)
        .map_err(|e| PersistenceError::SerializationError(format!("timestamp {instant}: {e}")))
}

/// Decodes stored timestamp text.
///
/// # Errors
///
/// Returns an error if the text is not in the stored layout.
pub fn decode_timestamp(text: &str) -> Result<OffsetDateTime, PersistenceError> {
    PrimitiveDateTime::parse(text, TIMESTAMP_FORMAT)
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|e| PersistenceError::ReconstructionError(format!("timestamp '{text}': {e}")))
}

/// Diesel Queryable struct for user rows.
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = users)]
pub struct UserRow {
    pub user_id: i64,
    pub full_name: String,
    pub email: String,
    pub rank_label: Option<String>,
    pub role: String,
    pub password_hash: String,
    pub created_at: String,
}

impl UserRow {
    /// Rebuilds the domain user, dropping the password hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored role, rank, or timestamp is invalid.
    pub fn into_user(self) -> Result<User, PersistenceError> {
        let role = Role::from_str(&self.role)
            .map_err(|e| PersistenceError::ReconstructionError(e.to_string()))?;
        let rank = self
            .rank_label
            .as_deref()
            .map(Rank::parse)
            .transpose()
            .map_err(|e| PersistenceError::ReconstructionError(e.to_string()))?;

        Ok(User::with_id(
            self.user_id,
            self.full_name,
            self.email,
            rank,
            role,
            decode_timestamp(&self.created_at)?,
        ))
    }
}

/// Insertable user row.
#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRow<'a> {
    pub full_name: &'a str,
    pub email: &'a str,
    pub rank_label: Option<&'a str>,
    pub role: &'a str,
    pub password_hash: &'a str,
    pub created_at: String,
}

impl<'a> NewUserRow<'a> {
    /// Builds the row for a not yet persisted user.
    ///
    /// # Errors
    ///
    /// Returns an error if the creation time cannot be encoded.
    pub fn from_user(user: &'a User, password_hash: &'a str) -> Result<Self, PersistenceError> {
        Ok(Self {
            full_name: &user.full_name,
            email: &user.email,
            rank_label: user.rank.as_ref().map(Rank::label),
            role: user.role.as_str(),
            password_hash,
            created_at: encode_timestamp(user.created_at)?,
        })
    }
}

/// Diesel Queryable struct for group rows. Membership is loaded separately.
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = roster_groups)]
pub struct GroupRow {
    pub group_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
}

/// One membership row. `position` keeps the display order of members.
#[derive(Debug, Queryable, Selectable, Insertable)]
#[diesel(table_name = group_members)]
pub struct GroupMemberRow {
    pub group_id: i64,
    pub user_id: i64,
    pub position: i32,
}

impl GroupMemberRow {
    /// Rows for a complete membership list, numbered in list order.
    ///
    /// # Errors
    ///
    /// Returns an error if the list is too long to number.
    pub fn for_members(group_id: i64, member_ids: &[i64]) -> Result<Vec<Self>, PersistenceError> {
        member_ids
            .iter()
            .enumerate()
            .map(|(index, user_id)| {
                let position = i32::try_from(index).map_err(|_| {
                    PersistenceError::SerializationError(format!(
                        "group {group_id} has too many members"
                    ))
                })?;
                Ok(Self {
                    group_id,
                    user_id: *user_id,
                    position,
                })
            })
            .collect()
    }
}

/// Rebuilds groups from their rows and all of their membership rows.
///
/// `members` must be ordered by position; rows of other groups are ignored.
///
/// # Errors
///
/// Returns an error if a stored timestamp is invalid.
pub fn assemble_groups(
    rows: Vec<GroupRow>,
    members: &[GroupMemberRow],
) -> Result<Vec<Group>, PersistenceError> {
    rows.into_iter()
        .map(|row| {
            let member_ids = members
                .iter()
                .filter(|m| m.group_id == row.group_id)
                .map(|m| m.user_id)
                .collect();
            Ok(Group::with_id(
                row.group_id,
                row.name,
                row.description,
                member_ids,
                decode_timestamp(&row.created_at)?,
            ))
        })
        .collect()
}

/// Diesel Queryable struct for duty rows.
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = duties)]
pub struct DutyRow {
    pub duty_id: i64,
    pub user_id: i64,
    pub duty_type: String,
    pub position: String,
    pub shift_start: String,
    pub shift_end: String,
    pub rotation_cycle: String,
    pub notes: Option<String>,
    pub created_at: String,
}

impl DutyRow {
    /// Rebuilds the domain duty.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored window, rotation, or timestamps are
    /// invalid.
    pub fn into_duty(self) -> Result<Duty, PersistenceError> {
        let window = ShiftWindow::new(
            decode_timestamp(&self.shift_start)?,
            decode_timestamp(&self.shift_end)?,
        )
        .map_err(|e| PersistenceError::ReconstructionError(e.to_string()))?;
        let rotation_cycle = RotationCycle::from_str(&self.rotation_cycle)
            .map_err(|e| PersistenceError::ReconstructionError(e.to_string()))?;

        let mut duty = Duty::new(
            self.user_id,
            self.duty_type,
            self.position,
            window,
            rotation_cycle,
            self.notes,
            decode_timestamp(&self.created_at)?,
        );
        duty.duty_id = Some(self.duty_id);
        Ok(duty)
    }
}

/// Insertable or replacement duty row.
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = duties, treat_none_as_null = true)]
pub struct DutyValues<'a> {
    pub user_id: i64,
    pub duty_type: &'a str,
    pub position: &'a str,
    pub shift_start: String,
    pub shift_end: String,
    pub rotation_cycle: &'a str,
    pub notes: Option<&'a str>,
    pub created_at: String,
}

impl<'a> DutyValues<'a> {
    /// Builds the stored columns of a duty.
    ///
    /// # Errors
    ///
    /// Returns an error if a timestamp cannot be encoded.
    pub fn from_duty(duty: &'a Duty) -> Result<Self, PersistenceError> {
        Ok(Self {
            user_id: duty.user_id,
            duty_type: &duty.duty_type,
            position: &duty.position,
            shift_start: encode_timestamp(duty.window.start())?,
            shift_end: encode_timestamp(duty.window.end())?,
            rotation_cycle: duty.rotation_cycle.as_str(),
            notes: duty.notes.as_deref(),
            created_at: encode_timestamp(duty.created_at)?,
        })
    }
}

/// Diesel Queryable struct for session rows.
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = sessions)]
pub struct SessionRow {
    pub session_id: i64,
    pub session_token: String,
    pub user_id: i64,
    pub created_at: String,
    pub last_activity_at: String,
    pub expires_at: String,
}

/// A login session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub session_id: i64,
    pub session_token: String,
    pub user_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_activity_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl SessionData {
    /// Returns true if the session has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }
}

impl TryFrom<SessionRow> for SessionData {
    type Error = PersistenceError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            session_id: row.session_id,
            session_token: row.session_token,
            user_id: row.user_id,
            created_at: decode_timestamp(&row.created_at)?,
            last_activity_at: decode_timestamp(&row.last_activity_at)?,
            expires_at: decode_timestamp(&row.expires_at)?,
        })
    }
}

/// A stored audit event and the time it was recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub event: AuditEvent,
    pub recorded_at: OffsetDateTime,
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use roster_domain::{Rank, Role, RotationCycle};
use time::{Date, OffsetDateTime, Time};

/// When a single duty takes place, as supplied by the caller.
///
/// Both forms become a `ShiftWindow`. A bare date is the full local day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftSpec {
    /// An explicit start and end.
    Window {
        /// Shift start.
        start: OffsetDateTime,
        /// Shift end.
        end: OffsetDateTime,
    },
    /// A whole calendar day in the roster timezone.
    Date(Date),
}

/// Partial update of a duty. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DutyPatch {
    /// Reassign to another user.
    pub user_id: Option<i64>,
    /// New duty type.
    pub duty_type: Option<String>,
    /// New position.
    pub position: Option<String>,
    /// New window.
    pub shift: Option<ShiftSpec>,
    /// New rotation label.
    pub rotation_cycle: Option<RotationCycle>,
    /// New notes. An empty string clears them.
    pub notes: Option<String>,
}

impl DutyPatch {
    /// Returns true if the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.user_id.is_none()
            && self.duty_type.is_none()
            && self.position.is_none()
            && self.shift.is_none()
            && self.rotation_cycle.is_none()
            && self.notes.is_none()
    }
}

/// A command represents user or system intent as data only.
///
/// Commands are the only way to request state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a single duty.
    CreateDuty {
        /// Owner.
        user_id: i64,
        /// Duty type.
        duty_type: String,
        /// Position.
        position: String,
        /// When.
        shift: ShiftSpec,
        /// Rotation label.
        rotation_cycle: RotationCycle,
        /// Optional notes.
        notes: Option<String>,
    },
    /// Create one duty per date, all sharing the same time of day.
    CreateBulkDuties {
        /// Owner.
        user_id: i64,
        /// Duty type.
        duty_type: String,
        /// Position.
        position: String,
        /// Dates, in the order the duties are created.
        dates: Vec<Date>,
        /// Local start time of day.
        start_time: Time,
        /// Local end time of day. Earlier than `start_time` means next day.
        end_time: Time,
        /// Rotation label.
        rotation_cycle: RotationCycle,
        /// Optional notes.
        notes: Option<String>,
    },
    /// Partially update a duty.
    UpdateDuty {
        /// Target duty.
        duty_id: i64,
        /// Fields to change.
        patch: DutyPatch,
    },
    /// Delete a duty.
    DeleteDuty {
        /// Target duty.
        duty_id: i64,
    },
    /// Create an empty group.
    CreateGroup {
        /// Group name.
        name: String,
        /// Optional description.
        description: Option<String>,
    },
    /// Replace a group's name, description and membership.
    UpdateGroup {
        /// Target group.
        group_id: i64,
        /// New name.
        name: String,
        /// New description.
        description: Option<String>,
        /// Complete new membership.
        member_ids: Vec<i64>,
    },
    /// Delete a group.
    DeleteGroup {
        /// Target group.
        group_id: i64,
    },
    /// Add the user to the group if absent, remove them if present.
    ToggleMember {
        /// Target group.
        group_id: i64,
        /// User to flip.
        user_id: i64,
    },
    /// Create a user with an already hashed password.
    CreateUser {
        /// Full name.
        full_name: String,
        /// Login email.
        email: String,
        /// Optional rank.
        rank: Option<Rank>,
        /// Role.
        role: Role,
        /// bcrypt hash of the initial password.
        password_hash: String,
    },
    /// Update a user's profile attributes.
    UpdateUser {
        /// Target user.
        user_id: i64,
        /// New full name.
        full_name: Option<String>,
        /// New email.
        email: Option<String>,
        /// `Some(None)` clears the rank.
        rank: Option<Option<Rank>>,
        /// New role.
        role: Option<Role>,
    },
    /// Delete a user and remove them from every group.
    DeleteUser {
        /// Target user.
        user_id: i64,
    },
}

impl Command {
    /// Name recorded as the audit action.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CreateDuty { .. } => "CreateDuty",
            Self::CreateBulkDuties { .. } => "CreateBulkDuties",
            Self::UpdateDuty { .. } => "UpdateDuty",
            Self::DeleteDuty { .. } => "DeleteDuty",
            Self::CreateGroup { .. } => "CreateGroup",
            Self::UpdateGroup { .. } => "UpdateGroup",
            Self::DeleteGroup { .. } => "DeleteGroup",
            Self::ToggleMember { .. } => "ToggleMember",
            Self::CreateUser { .. } => "CreateUser",
            Self::UpdateUser { .. } => "UpdateUser",
            Self::DeleteUser { .. } => "DeleteUser",
        }
    }
}

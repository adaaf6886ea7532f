// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use chrono_tz::Tz;
use roster_audit::AuditEvent;
use roster_domain::{Duty, Group, User};
use time::OffsetDateTime;

/// Environment a command is applied in.
///
/// Supplying `now` explicitly keeps `apply` deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyContext {
    /// Roster timezone used for dates and times of day.
    pub timezone: Tz,
    /// Reference time, used as the creation timestamp.
    pub now: OffsetDateTime,
}

impl ApplyContext {
    #[must_use]
    pub const fn new(timezone: Tz, now: OffsetDateTime) -> Self {
        Self { timezone, now }
    }
}

/// The roster as seen by a command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct State {
    /// All users.
    pub users: Vec<User>,
    /// All groups.
    pub groups: Vec<Group>,
    /// All duties.
    pub duties: Vec<Duty>,
}

impl State {
    /// Creates an empty roster.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            users: Vec::new(),
            groups: Vec::new(),
            duties: Vec::new(),
        }
    }

    /// Looks up a user by id.
    #[must_use]
    pub fn user(&self, user_id: i64) -> Option<&User> {
        self.users.iter().find(|u| u.user_id == Some(user_id))
    }

    /// Looks up a group by id.
    #[must_use]
    pub fn group(&self, group_id: i64) -> Option<&Group> {
        self.groups.iter().find(|g| g.group_id == Some(group_id))
    }

    /// Looks up a duty by id.
    #[must_use]
    pub fn duty(&self, duty_id: i64) -> Option<&Duty> {
        self.duties.iter().find(|d| d.duty_id == Some(duty_id))
    }

    /// Number of administrators.
    #[must_use]
    pub fn admin_count(&self) -> usize {
        self.users.iter().filter(|u| u.is_admin()).count()
    }
}

/// The effect of a command, to be written by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// New duties, in creation order. Written all or nothing.
    DutiesCreated(Vec<Duty>),
    /// Replacement for an existing duty.
    DutyUpdated(Duty),
    /// Removed duty id.
    DutyDeleted(i64),
    /// New group.
    GroupCreated(Group),
    /// Replacement for an existing group, membership included.
    GroupUpdated(Group),
    /// Removed group id.
    GroupDeleted(i64),
    /// New user with their password hash.
    UserCreated {
        /// The user.
        user: User,
        /// bcrypt hash.
        password_hash: String,
    },
    /// Replacement profile for an existing user.
    UserUpdated(User),
    /// Removed user id. Memberships and sessions go with it, duties stay.
    UserDeleted(i64),
}

/// The result of a successful state transition.
///
/// Transitions are atomic: they either succeed completely or fail without side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    /// What to write.
    pub change: Change,
    /// The audit event recording this transition.
    pub audit_event: AuditEvent,
}

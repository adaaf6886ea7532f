// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::rank::Rank;
use crate::shift::{DutyStatus, ShiftWindow};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;

/// Display name used for duties whose owner no longer exists.
pub const FORMER_MEMBER_NAME: &str = "former member";

/// Role of a user.
///
/// Admins manage the roster. Users can read their own duties and the groups
/// they belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular member.
    #[default]
    User,
    /// Roster administrator.
    Admin,
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(DomainError::InvalidRole(s.to_string())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Role {
    /// Converts this role to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

/// Descriptive rotation label on a duty.
///
/// Never triggers generation of further duties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RotationCycle {
    /// Every day.
    #[default]
    Daily,
    /// Every week.
    Weekly,
    /// Every month.
    Monthly,
}

impl FromStr for RotationCycle {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            _ => Err(DomainError::InvalidRotationCycle(s.to_string())),
        }
    }
}

impl std::fmt::Display for RotationCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl RotationCycle {
    /// Converts this rotation cycle to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

/// A member of the unit.
///
/// Credentials are not part of this record; they live with the identity
/// store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Canonical identifier. `None` until persisted.
    pub user_id: Option<i64>,
    /// Full display name.
    pub full_name: String,
    /// Login email, unique across users.
    pub email: String,
    /// Military rank, if known.
    pub rank: Option<Rank>,
    /// Access role.
    pub role: Role,
    /// Creation time.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl User {
    /// Creates a new `User` without a persisted `user_id`.
    #[must_use]
    pub const fn new(
        full_name: String,
        email: String,
        rank: Option<Rank>,
        role: Role,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            user_id: None,
            full_name,
            email,
            rank,
            role,
            created_at,
        }
    }

    /// Creates a `User` with an existing `user_id` (from persistence).
    #[must_use]
    pub const fn with_id(
        user_id: i64,
        full_name: String,
        email: String,
        rank: Option<Rank>,
        role: Role,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            user_id: Some(user_id),
            full_name,
            email,
            rank,
            role,
            created_at,
        }
    }

    /// Returns true if this user is an administrator.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}

/// An organisational subdivision used to scope schedule views.
///
/// `member_ids` behaves as a set. Order is kept for display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Canonical identifier. `None` until persisted.
    pub group_id: Option<i64>,
    /// Group name, never empty.
    pub name: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Member user ids, without duplicates.
    pub member_ids: Vec<i64>,
    /// Creation time.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Group {
    /// Creates a new, empty `Group` without a persisted `group_id`.
    #[must_use]
    pub const fn new(name: String, description: Option<String>, created_at: OffsetDateTime) -> Self {
        Self {
            group_id: None,
            name,
            description,
            member_ids: Vec::new(),
            created_at,
        }
    }

    /// Creates a `Group` with an existing `group_id` (from persistence).
    #[must_use]
    pub const fn with_id(
        group_id: i64,
        name: String,
        description: Option<String>,
        member_ids: Vec<i64>,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            group_id: Some(group_id),
            name,
            description,
            member_ids,
            created_at,
        }
    }

    /// Returns true if `user_id` is a member.
    #[must_use]
    pub fn has_member(&self, user_id: i64) -> bool {
        self.member_ids.contains(&user_id)
    }
}

/// A single shift assignment for one user at one position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Duty {
    /// Canonical identifier. `None` until persisted.
    pub duty_id: Option<i64>,
    /// Owning user. May refer to a deleted user.
    pub user_id: i64,
    /// Free-text category, e.g. "Patrol".
    pub duty_type: String,
    /// Free-text post or location.
    pub position: String,
    /// When the duty takes place.
    pub window: ShiftWindow,
    /// Descriptive rotation label.
    pub rotation_cycle: RotationCycle,
    /// Optional notes.
    pub notes: Option<String>,
    /// Creation time.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Duty {
    /// Creates a new `Duty` without a persisted `duty_id`.
    #[must_use]
    pub const fn new(
        user_id: i64,
        duty_type: String,
        position: String,
        window: ShiftWindow,
        rotation_cycle: RotationCycle,
        notes: Option<String>,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            duty_id: None,
            user_id,
            duty_type,
            position,
            window,
            rotation_cycle,
            notes,
            created_at,
        }
    }

    /// Derived status at the reference time `now`.
    #[must_use]
    pub fn status_at(&self, now: OffsetDateTime) -> DutyStatus {
        self.window.status_at(now)
    }

    /// Ordering key used everywhere duties are listed: start, then id.
    #[must_use]
    pub const fn sort_key(&self) -> (OffsetDateTime, Option<i64>) {
        (self.window.start(), self.duty_id)
    }
}

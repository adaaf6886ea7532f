// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.
//!
//! Dates travel as `YYYY-MM-DD` strings and instants as RFC 3339 text.
//! Requests are parsed and validated by the handlers, not here.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

// ========================================================================
// Identity
// ========================================================================

/// API request to register a new account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterRequest {
    /// Full display name.
    pub full_name: String,
    /// Login email.
    pub email: String,
    /// Plain text password.
    pub password: String,
    /// Password confirmation.
    pub password_confirmation: String,
    /// Optional rank label from the rank catalog.
    #[serde(default)]
    pub rank: Option<String>,
}

/// API request to log in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequest {
    /// Login email.
    pub email: String,
    /// Plain text password.
    pub password: String,
}

/// API response for a successful login or registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests.
    pub session_token: String,
    /// When the session stops being accepted.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    /// The logged in user.
    pub user: UserInfo,
}

/// A user as exposed by the API. Never carries credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Canonical user id.
    pub user_id: i64,
    /// Full display name.
    pub full_name: String,
    /// Login email.
    pub email: String,
    /// Rank label, if any.
    pub rank: Option<String>,
    /// Category of the rank, if any.
    pub rank_category: Option<String>,
    /// `user` or `admin`.
    pub role: String,
    /// Creation time.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// API response for the current session's user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhoAmIResponse {
    /// The user behind the session.
    pub user: UserInfo,
    /// What this user may do.
    pub capabilities: GlobalCapabilities,
}

/// API request to edit one's own profile.
///
/// Omitted fields are left unchanged. An empty `rank` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UpdateProfileRequest {
    /// New full name.
    #[serde(default)]
    pub full_name: Option<String>,
    /// New email.
    #[serde(default)]
    pub email: Option<String>,
    /// New rank label.
    #[serde(default)]
    pub rank: Option<String>,
    /// New password.
    #[serde(default)]
    pub password: Option<String>,
    /// Confirmation of the new password.
    #[serde(default)]
    pub password_confirmation: Option<String>,
}

/// API response describing whether the first administrator still has to be
/// created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapStatusResponse {
    /// True while no user exists.
    pub needs_bootstrap: bool,
}

/// API request to create the first administrator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateFirstAdminRequest {
    /// Full display name.
    pub full_name: String,
    /// Login email.
    pub email: String,
    /// Plain text password.
    pub password: String,
    /// Password confirmation.
    pub password_confirmation: String,
}

// ========================================================================
// User administration
// ========================================================================

/// API request for an admin to create a user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateUserRequest {
    /// Full display name.
    pub full_name: String,
    /// Login email. A placeholder is generated when omitted.
    #[serde(default)]
    pub email: Option<String>,
    /// Optional rank label.
    #[serde(default)]
    pub rank: Option<String>,
    /// `user` or `admin`.
    pub role: String,
    /// Initial password.
    pub password: String,
}

/// API request for an admin to edit a user.
///
/// Omitted fields are left unchanged. An empty `rank` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UpdateUserRequest {
    /// New full name.
    #[serde(default)]
    pub full_name: Option<String>,
    /// New email.
    #[serde(default)]
    pub email: Option<String>,
    /// New rank label.
    #[serde(default)]
    pub rank: Option<String>,
    /// New role.
    #[serde(default)]
    pub role: Option<String>,
    /// New password.
    #[serde(default)]
    pub password: Option<String>,
}

/// API response carrying a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    /// The user after the operation.
    pub user: UserInfo,
    /// A success message.
    pub message: String,
}

/// One entry of the user list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserListEntry {
    /// The user.
    #[serde(flatten)]
    pub user: UserInfo,
    /// What the caller may do with this user.
    pub capabilities: UserCapabilities,
}

/// API response for listing users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListUsersResponse {
    /// Users ordered by full name, then id.
    pub users: Vec<UserListEntry>,
}

/// API response for any delete operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    /// Id of the removed entity.
    pub id: i64,
    /// A success message.
    pub message: String,
}

/// One category of the rank catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankCategoryInfo {
    /// Category label.
    pub category: String,
    /// Rank labels in order.
    pub ranks: Vec<String>,
}

/// API response for the rank catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankCatalogResponse {
    /// Categories in order.
    pub categories: Vec<RankCategoryInfo>,
}

// ========================================================================
// Duties
// ========================================================================

/// API request to create a single duty.
///
/// Exactly one of the `shift_start`/`shift_end` pair or `duty_date` must be
/// given.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateDutyRequest {
    /// Owner.
    pub user_id: i64,
    /// Duty type, e.g. "Patrol".
    pub duty_type: String,
    /// Post or location.
    pub position: String,
    /// Shift start, RFC 3339 or local `YYYY-MM-DDTHH:MM`.
    #[serde(default)]
    pub shift_start: Option<String>,
    /// Shift end, same formats as `shift_start`.
    #[serde(default)]
    pub shift_end: Option<String>,
    /// Whole-day duty date, `YYYY-MM-DD`.
    #[serde(default)]
    pub duty_date: Option<String>,
    /// `daily`, `weekly`, or `monthly`.
    pub rotation_cycle: String,
    /// Free text notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// API request to create one duty per date.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateBulkDutiesRequest {
    /// Owner.
    pub user_id: i64,
    /// Duty type.
    pub duty_type: String,
    /// Post or location.
    pub position: String,
    /// Dates, `YYYY-MM-DD`, in the order duties are created.
    pub dates: Vec<String>,
    /// Local start time of day, `HH:MM`.
    pub start_time: String,
    /// Local end time of day, `HH:MM`. Earlier than `start_time` rolls to
    /// the next day.
    pub end_time: String,
    /// `daily`, `weekly`, or `monthly`.
    pub rotation_cycle: String,
    /// Free text notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// API request to edit a duty. Omitted fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UpdateDutyRequest {
    /// New owner.
    #[serde(default)]
    pub user_id: Option<i64>,
    /// New duty type.
    #[serde(default)]
    pub duty_type: Option<String>,
    /// New post.
    #[serde(default)]
    pub position: Option<String>,
    /// New shift start. Requires `shift_end`.
    #[serde(default)]
    pub shift_start: Option<String>,
    /// New shift end. Requires `shift_start`.
    #[serde(default)]
    pub shift_end: Option<String>,
    /// New whole-day date, instead of a start and end.
    #[serde(default)]
    pub duty_date: Option<String>,
    /// New rotation label.
    #[serde(default)]
    pub rotation_cycle: Option<String>,
    /// New notes. An empty string clears them.
    #[serde(default)]
    pub notes: Option<String>,
}

/// A duty as exposed by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutyInfo {
    /// Canonical duty id.
    pub duty_id: i64,
    /// Owner id. The owner may have been deleted.
    pub user_id: i64,
    /// Owner's full name, or "former member".
    pub owner_name: String,
    /// Duty type.
    pub duty_type: String,
    /// Post.
    pub position: String,
    /// Shift start.
    #[serde(with = "time::serde::rfc3339")]
    pub shift_start: OffsetDateTime,
    /// Shift end.
    #[serde(with = "time::serde::rfc3339")]
    pub shift_end: OffsetDateTime,
    /// Rotation label.
    pub rotation_cycle: String,
    /// Notes.
    pub notes: Option<String>,
    /// `upcoming`, `active`, or `past` at the request time.
    pub status: String,
    /// Creation time.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// API response carrying a single duty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutyResponse {
    /// The duty after the operation.
    pub duty: DutyInfo,
    /// A success message.
    pub message: String,
}

/// API response for listing or bulk-creating duties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListDutiesResponse {
    /// The duties.
    pub duties: Vec<DutyInfo>,
}

// ========================================================================
// Groups
// ========================================================================

/// API request to create a group.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateGroupRequest {
    /// Group name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
}

/// API request to replace a group's name, description and members.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateGroupRequest {
    /// New name.
    pub name: String,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// Complete new membership.
    #[serde(default)]
    pub member_ids: Vec<i64>,
}

/// API request to add or remove one member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ToggleMemberRequest {
    /// The user to flip.
    pub user_id: i64,
}

/// A group as exposed by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInfo {
    /// Canonical group id.
    pub group_id: i64,
    /// Name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Member ids in display order.
    pub member_ids: Vec<i64>,
    /// Creation time.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// API response carrying a single group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupResponse {
    /// The group after the operation.
    pub group: GroupInfo,
    /// A success message.
    pub message: String,
}

/// API response for listing groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListGroupsResponse {
    /// Groups ordered by name.
    pub groups: Vec<GroupInfo>,
}

/// API response for a group's members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMembersResponse {
    /// The group.
    pub group_id: i64,
    /// Existing members in display order.
    pub members: Vec<UserInfo>,
}

// ========================================================================
// Schedule
// ========================================================================

/// API request for a group schedule.
///
/// The range is one of: `start` and `end`, `month` (`YYYY-MM`), or
/// `week_of` (any date of the Monday-to-Sunday week).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GroupScheduleRequest {
    /// Groups whose members form the rows.
    pub group_ids: Vec<i64>,
    /// First day, inclusive.
    #[serde(default)]
    pub start: Option<String>,
    /// Last day, inclusive.
    #[serde(default)]
    pub end: Option<String>,
    /// Whole calendar month.
    #[serde(default)]
    pub month: Option<String>,
    /// A date in the wanted week.
    #[serde(default)]
    pub week_of: Option<String>,
}

/// One member row of a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRowInfo {
    /// Member id.
    pub user_id: i64,
    /// Member name.
    pub full_name: String,
    /// Per date, the ids of the member's duties touching that date.
    pub cells: Vec<Vec<i64>>,
}

/// Two duties of one member whose windows intersect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapInfo {
    /// The member.
    pub user_id: i64,
    /// Duty starting first.
    pub first_duty_id: i64,
    /// Duty starting second.
    pub second_duty_id: i64,
}

/// API response for a group schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupScheduleResponse {
    /// Column dates.
    pub dates: Vec<String>,
    /// One row per distinct member.
    pub rows: Vec<ScheduleRowInfo>,
    /// Every duty referenced by a cell, ordered by start.
    pub duties: Vec<DutyInfo>,
    /// Dates no member covers.
    pub uncovered_dates: Vec<String>,
    /// Overlapping duty pairs.
    pub overlaps: Vec<OverlapInfo>,
}

// ========================================================================
// Audit
// ========================================================================

/// One audit event as exposed by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEventInfo {
    /// Event id.
    pub event_id: i64,
    /// Who.
    pub actor_id: String,
    /// Actor kind.
    pub actor_type: String,
    /// Why.
    pub cause_description: String,
    /// What.
    pub action: String,
    /// Action details.
    pub details: Option<String>,
    /// Snapshot before, absent for creations.
    pub before: Option<String>,
    /// Snapshot after, absent for deletions.
    pub after: Option<String>,
    /// When the event was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
}

/// API response for the audit timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTimelineResponse {
    /// Events, most recent first.
    pub events: Vec<AuditEventInfo>,
}

// ========================================================================
// Capability Model
// ========================================================================

/// Represents whether a specific action is permitted.
///
/// Serializes to JSON as true/false.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// The action is permitted.
    Allowed,
    /// The action is not permitted.
    Denied,
}

impl Capability {
    /// Returns true if the capability is allowed.
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Creates a capability from a boolean value.
    #[must_use]
    pub const fn from_bool(value: bool) -> Self {
        if value { Self::Allowed } else { Self::Denied }
    }
}

impl Serialize for Capability {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bool(self.is_allowed())
    }
}

impl<'de> Deserialize<'de> for Capability {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let b = bool::deserialize(deserializer)?;
        Ok(Self::from_bool(b))
    }
}

/// What classes of actions a user may perform.
///
/// Advisory only; handlers check authorization themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalCapabilities {
    /// Create, edit and delete users.
    pub can_manage_users: Capability,
    /// Create, edit and delete groups.
    pub can_manage_groups: Capability,
    /// Create, edit and delete duties.
    pub can_manage_duties: Capability,
    /// See every duty and group.
    pub can_view_all: Capability,
    /// Read the audit timeline.
    pub can_view_audit: Capability,
}

/// What the caller may do with one particular user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCapabilities {
    /// Edit the user's profile.
    pub can_edit: Capability,
    /// Change the user's role.
    pub can_change_role: Capability,
    /// Delete the user.
    pub can_delete: Capability,
}

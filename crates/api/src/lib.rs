// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Transport-agnostic API for the duty roster.
//!
//! Every operation is a plain function taking the persistence layer, the
//! authenticated actor and, for mutations, an `ApplyContext` carrying the
//! roster timezone and the current time. The HTTP server is a thin adapter
//! over these functions.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod auth;
mod capabilities;
mod error;
mod handlers;
mod password_policy;
mod request_response;

#[cfg(test)]
mod tests;

pub use auth::{
    AuthenticatedActor, AuthenticationService, AuthorizationService, DEFAULT_SESSION_LIFETIME,
};
pub use capabilities::{compute_global_capabilities, compute_user_capabilities};
pub use error::{ApiError, AuthError, translate_core_error, translate_domain_error};
pub use handlers::{
    DEFAULT_AUDIT_LIMIT, MAX_AUDIT_LIMIT, audit_timeline, authenticate, create_bulk_duties,
    create_duty, create_first_admin, create_group, create_user, delete_duty, delete_group,
    delete_user, get_bootstrap_status, get_group, group_schedule, list_all_duties,
    list_duties_for_user, list_groups, list_groups_for_user, list_members, list_my_duties,
    list_users, login, logout, rank_catalog, register, toggle_member, update_duty, update_group,
    update_profile, update_user, whoami,
};
pub use password_policy::{PasswordPolicy, PasswordPolicyError};
pub use request_response::{
    AuditEventInfo, AuditTimelineResponse, BootstrapStatusResponse, Capability,
    CreateBulkDutiesRequest, CreateDutyRequest, CreateFirstAdminRequest, CreateGroupRequest,
    CreateUserRequest, DeleteResponse, DutyInfo, DutyResponse, GlobalCapabilities, GroupInfo,
    GroupResponse, GroupScheduleRequest, GroupScheduleResponse, ListDutiesResponse,
    ListGroupsResponse, ListMembersResponse, ListUsersResponse, LoginRequest, LoginResponse,
    OverlapInfo, RankCatalogResponse, RankCategoryInfo, RegisterRequest, ScheduleRowInfo,
    ToggleMemberRequest, UpdateDutyRequest, UpdateGroupRequest, UpdateProfileRequest,
    UpdateUserRequest, UserCapabilities, UserInfo, UserListEntry, UserResponse, WhoAmIResponse,
};

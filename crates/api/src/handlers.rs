// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request handlers.
//!
//! Handlers authorize the actor first, translate the request into a core
//! command or a query, and map every failure to `ApiError`. They never read
//! the wall clock: the reference time arrives through `ApplyContext::now` or
//! an explicit `now` argument.

use chrono_tz::Tz;
use roster::{ApplyContext, Change, Command, DutyPatch, ShiftSpec, State, TransitionResult, apply};
use roster_audit::{Actor, Cause, StateSnapshot};
use roster_domain::{
    DateRange, Duty, FORMER_MEMBER_NAME, Group, Rank, RankCategory, Role, RotationCycle,
    ScheduleMatrix, User, build_range_matrix, merge_members, parse_date, parse_dates,
    parse_instant, parse_optional_rank, parse_time_of_day, resolve_members,
};
use roster_persistence::{AuditEntry, PersistTransitionResult, SqlitePersistence, hash_password};
use std::str::FromStr;
use time::{Date, Duration, Month, OffsetDateTime};
use tracing::{debug, info};

use crate::auth::{AuthenticatedActor, AuthenticationService, AuthorizationService};
use crate::capabilities::{compute_global_capabilities, compute_user_capabilities};
use crate::error::{ApiError, translate_core_error, translate_domain_error};
use crate::password_policy::PasswordPolicy;
use crate::request_response::{
    AuditEventInfo, AuditTimelineResponse, BootstrapStatusResponse, CreateBulkDutiesRequest,
    CreateDutyRequest, CreateFirstAdminRequest, CreateGroupRequest, CreateUserRequest,
    DeleteResponse, DutyInfo, DutyResponse, GroupInfo, GroupResponse, GroupScheduleRequest,
    GroupScheduleResponse, ListDutiesResponse, ListGroupsResponse, ListMembersResponse,
    ListUsersResponse, LoginRequest, LoginResponse, OverlapInfo, RankCatalogResponse,
    RankCategoryInfo, RegisterRequest, ScheduleRowInfo, ToggleMemberRequest, UpdateDutyRequest,
    UpdateGroupRequest, UpdateProfileRequest, UpdateUserRequest, UserInfo, UserListEntry,
    UserResponse, WhoAmIResponse,
};

/// Events returned by the audit timeline when no limit is given.
pub const DEFAULT_AUDIT_LIMIT: i64 = 50;

/// Largest accepted audit timeline limit.
pub const MAX_AUDIT_LIMIT: i64 = 500;

/// Domain of the placeholder address given to users created without email.
const PLACEHOLDER_EMAIL_DOMAIN: &str = "roster.invalid";

// ========================================================================
// Shared plumbing
// ========================================================================

/// Applies a command to the current roster and persists the transition.
fn execute(
    persistence: &mut SqlitePersistence,
    ctx: &ApplyContext,
    command: Command,
    actor: Actor,
    cause: Cause,
) -> Result<(TransitionResult, PersistTransitionResult), ApiError> {
    let name: &'static str = command.name();
    let state: State = persistence.get_current_state()?;
    let result: TransitionResult =
        apply(&state, ctx, command, actor, cause).map_err(translate_core_error)?;
    let persisted: PersistTransitionResult = persistence.persist_transition(&result, ctx.now)?;
    debug!(action = name, event_id = persisted.event_id, "Command executed");
    Ok((result, persisted))
}

fn first_entity_id(persisted: &PersistTransitionResult) -> Result<i64, ApiError> {
    persisted
        .entity_ids
        .first()
        .copied()
        .ok_or_else(|| ApiError::Internal {
            message: String::from("Transition reported no entity id"),
        })
}

fn unexpected_change(expected: &str) -> ApiError {
    ApiError::Internal {
        message: format!("Transition did not produce {expected}"),
    }
}

fn missing_id(resource: &str) -> ApiError {
    ApiError::Internal {
        message: format!("{resource} has no id"),
    }
}

fn invalid_input(field: &str, message: &str) -> ApiError {
    ApiError::InvalidInput {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn not_found(resource_type: &str, id: i64) -> ApiError {
    ApiError::ResourceNotFound {
        resource_type: resource_type.to_string(),
        message: format!("{resource_type} {id} does not exist"),
    }
}

fn load_user(persistence: &mut SqlitePersistence, user_id: i64) -> Result<User, ApiError> {
    persistence
        .get_user_by_id(user_id)?
        .ok_or_else(|| not_found("User", user_id))
}

fn load_group(persistence: &mut SqlitePersistence, group_id: i64) -> Result<Group, ApiError> {
    persistence
        .get_group(group_id)?
        .ok_or_else(|| not_found("Group", group_id))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn placeholder_email() -> String {
    format!(
        "pending-{}@{PLACEHOLDER_EMAIL_DOMAIN}",
        AuthenticationService::generate_session_token()
    )
}

fn parse_role(value: &str) -> Result<Role, ApiError> {
    Role::from_str(value.trim()).map_err(translate_domain_error)
}

fn parse_rotation(value: &str) -> Result<RotationCycle, ApiError> {
    RotationCycle::from_str(value).map_err(translate_domain_error)
}

fn parse_rank(value: Option<&str>) -> Result<Option<Rank>, ApiError> {
    parse_optional_rank(value).map_err(translate_domain_error)
}

/// Reads the shift of a duty request: a start and end pair, or a date.
fn parse_shift(
    start: Option<&str>,
    end: Option<&str>,
    date: Option<&str>,
    tz: Tz,
) -> Result<Option<ShiftSpec>, ApiError> {
    match (start, end, date) {
        (None, None, None) => Ok(None),
        (Some(start), Some(end), None) => {
            let start: OffsetDateTime = parse_instant(start, tz).map_err(translate_domain_error)?;
            let end: OffsetDateTime = parse_instant(end, tz).map_err(translate_domain_error)?;
            Ok(Some(ShiftSpec::Window { start, end }))
        }
        (None, None, Some(date)) => {
            let date: Date = parse_date(date).map_err(translate_domain_error)?;
            Ok(Some(ShiftSpec::Date(date)))
        }
        (Some(_), None, None) => Err(invalid_input(
            "shift_end",
            "shift_end is required with shift_start",
        )),
        (None, Some(_), None) => Err(invalid_input(
            "shift_start",
            "shift_start is required with shift_end",
        )),
        _ => Err(invalid_input(
            "duty_date",
            "Give either shift_start and shift_end, or duty_date, not both",
        )),
    }
}

/// Parses a `YYYY-MM` month.
fn parse_month(value: &str) -> Result<DateRange, ApiError> {
    let malformed = || invalid_input("month", "Month must be YYYY-MM");
    let (year, month) = value.trim().split_once('-').ok_or_else(malformed)?;
    let year: i32 = year.parse().map_err(|_| malformed())?;
    let month: u8 = month.parse().map_err(|_| malformed())?;
    let month: Month = Month::try_from(month).map_err(|_| malformed())?;
    DateRange::month(year, month).map_err(translate_domain_error)
}

fn resolve_date_range(request: &GroupScheduleRequest) -> Result<DateRange, ApiError> {
    match (
        request.start.as_deref(),
        request.end.as_deref(),
        request.month.as_deref(),
        request.week_of.as_deref(),
    ) {
        (Some(start), Some(end), None, None) => {
            let start: Date = parse_date(start).map_err(translate_domain_error)?;
            let end: Date = parse_date(end).map_err(translate_domain_error)?;
            DateRange::new(start, end).map_err(translate_domain_error)
        }
        (None, None, Some(month), None) => parse_month(month),
        (None, None, None, Some(day)) => {
            let day: Date = parse_date(day).map_err(translate_domain_error)?;
            DateRange::week_of(day).map_err(translate_domain_error)
        }
        _ => Err(invalid_input(
            "date_range",
            "Give exactly one of: start and end, month, or week_of",
        )),
    }
}

/// UTC bounds wide enough to catch every duty touching `range` in any zone.
fn query_bounds(range: &DateRange) -> Result<(OffsetDateTime, OffsetDateTime), ApiError> {
    let overflow = || ApiError::InvalidInput {
        field: String::from("date_range"),
        message: String::from("Date range is out of bounds"),
    };
    let from: Date = range
        .start()
        .checked_sub(Duration::days(1))
        .ok_or_else(overflow)?;
    let to: Date = range
        .end()
        .checked_add(Duration::days(2))
        .ok_or_else(overflow)?;
    Ok((from.midnight().assume_utc(), to.midnight().assume_utc()))
}

// ========================================================================
// Response builders
// ========================================================================

fn user_info(user: &User) -> Result<UserInfo, ApiError> {
    let user_id: i64 = user.user_id.ok_or_else(|| missing_id("User"))?;
    Ok(UserInfo {
        user_id,
        full_name: user.full_name.clone(),
        email: user.email.clone(),
        rank: user.rank.as_ref().map(|r| r.label().to_string()),
        rank_category: user.rank.as_ref().map(|r| r.category().label().to_string()),
        role: user.role.as_str().to_string(),
        created_at: user.created_at,
    })
}

fn group_info(group: &Group) -> Result<GroupInfo, ApiError> {
    let group_id: i64 = group.group_id.ok_or_else(|| missing_id("Group"))?;
    Ok(GroupInfo {
        group_id,
        name: group.name.clone(),
        description: group.description.clone(),
        member_ids: group.member_ids.clone(),
        created_at: group.created_at,
    })
}

fn duty_info(duty: &Duty, users: &[User], now: OffsetDateTime) -> Result<DutyInfo, ApiError> {
    let duty_id: i64 = duty.duty_id.ok_or_else(|| missing_id("Duty"))?;
    let owner_name: String = users
        .iter()
        .find(|u| u.user_id == Some(duty.user_id))
        .map_or_else(|| FORMER_MEMBER_NAME.to_string(), |u| u.full_name.clone());
    Ok(DutyInfo {
        duty_id,
        user_id: duty.user_id,
        owner_name,
        duty_type: duty.duty_type.clone(),
        position: duty.position.clone(),
        shift_start: duty.window.start(),
        shift_end: duty.window.end(),
        rotation_cycle: duty.rotation_cycle.as_str().to_string(),
        notes: duty.notes.clone(),
        status: duty.status_at(now).as_str().to_string(),
        created_at: duty.created_at,
    })
}

fn duty_infos<'a, I>(duties: I, users: &[User], now: OffsetDateTime) -> Result<Vec<DutyInfo>, ApiError>
where
    I: IntoIterator<Item = &'a Duty>,
{
    duties
        .into_iter()
        .map(|duty| duty_info(duty, users, now))
        .collect()
}

/// Pairs newly created duties with the ids persistence assigned them.
fn created_duties(
    result: TransitionResult,
    persisted: PersistTransitionResult,
) -> Result<Vec<Duty>, ApiError> {
    let Change::DutiesCreated(duties) = result.change else {
        return Err(unexpected_change("new duties"));
    };
    if duties.len() != persisted.entity_ids.len() {
        return Err(ApiError::Internal {
            message: format!(
                "Created {} duties but received {} ids",
                duties.len(),
                persisted.entity_ids.len()
            ),
        });
    }
    Ok(duties
        .into_iter()
        .zip(persisted.entity_ids)
        .map(|(mut duty, duty_id)| {
            duty.duty_id = Some(duty_id);
            duty
        })
        .collect())
}

fn updated_group(result: TransitionResult) -> Result<Group, ApiError> {
    match result.change {
        Change::GroupUpdated(group) => Ok(group),
        _ => Err(unexpected_change("an updated group")),
    }
}

fn snapshot_text(snapshot: &StateSnapshot) -> Option<String> {
    if snapshot.is_absent() {
        None
    } else {
        Some(snapshot.data.clone())
    }
}

fn audit_event_info(entry: AuditEntry) -> Result<AuditEventInfo, ApiError> {
    let event_id: i64 = entry.event.event_id.ok_or_else(|| missing_id("Audit event"))?;
    Ok(AuditEventInfo {
        event_id,
        before: snapshot_text(&entry.event.before),
        after: snapshot_text(&entry.event.after),
        actor_id: entry.event.actor.id,
        actor_type: entry.event.actor.actor_type,
        cause_description: entry.event.cause.description,
        action: entry.event.action.name,
        details: entry.event.action.details,
        recorded_at: entry.recorded_at,
    })
}

// ========================================================================
// Identity
// ========================================================================

/// Registers a new account with the `user` role and opens a session.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `ctx` - Roster timezone and the current time
/// * `request` - The registration request
/// * `session_lifetime` - How long the new session stays valid
/// * `cause` - The cause of this action
///
/// # Errors
///
/// Returns an error if:
/// - The password violates the password policy
/// - The rank is not in the rank catalog
/// - The name or email is invalid, or the email is already registered
pub fn register(
    persistence: &mut SqlitePersistence,
    ctx: &ApplyContext,
    request: &RegisterRequest,
    session_lifetime: Duration,
    cause: Cause,
) -> Result<LoginResponse, ApiError> {
    let email: String = normalize_email(&request.email);
    PasswordPolicy::default().validate(
        &request.password,
        &request.password_confirmation,
        &email,
        &request.full_name,
    )?;
    let rank: Option<Rank> = parse_rank(request.rank.as_deref())?;
    let password_hash: String = hash_password(&request.password)?;

    let command: Command = Command::CreateUser {
        full_name: request.full_name.clone(),
        email,
        rank,
        role: Role::User,
        password_hash,
    };
    let (_, persisted) = execute(persistence, ctx, command, Actor::system(), cause)?;
    let user_id: i64 = first_entity_id(&persisted)?;

    let user: User = load_user(persistence, user_id)?;
    let session =
        AuthenticationService::open_session(persistence, user_id, ctx.now, session_lifetime)?;

    info!(user_id, "User registered");
    Ok(LoginResponse {
        session_token: session.session_token,
        expires_at: session.expires_at,
        user: user_info(&user)?,
    })
}

/// Authenticates by email and password and opens a session.
///
/// # Errors
///
/// Returns `AuthenticationFailed` for an unknown email or a wrong password,
/// without saying which.
pub fn login(
    persistence: &mut SqlitePersistence,
    request: &LoginRequest,
    now: OffsetDateTime,
    session_lifetime: Duration,
) -> Result<LoginResponse, ApiError> {
    let (session, _, user) = AuthenticationService::login(
        persistence,
        &normalize_email(&request.email),
        &request.password,
        now,
        session_lifetime,
    )?;
    Ok(LoginResponse {
        session_token: session.session_token,
        expires_at: session.expires_at,
        user: user_info(&user)?,
    })
}

/// Resolves a bearer token to the acting user.
///
/// # Errors
///
/// Returns `AuthenticationFailed` if the session is unknown or expired, or
/// its user has been deleted.
pub fn authenticate(
    persistence: &mut SqlitePersistence,
    session_token: &str,
    now: OffsetDateTime,
) -> Result<(AuthenticatedActor, User), ApiError> {
    AuthenticationService::validate_session(persistence, session_token, now).map_err(ApiError::from)
}

/// Ends a session.
///
/// # Errors
///
/// Returns an error if the session cannot be deleted.
pub fn logout(persistence: &mut SqlitePersistence, session_token: &str) -> Result<(), ApiError> {
    AuthenticationService::logout(persistence, session_token)?;
    info!("User logged out");
    Ok(())
}

/// Returns the current user and their global capabilities.
///
/// # Errors
///
/// Returns an error if the user no longer exists.
pub fn whoami(
    persistence: &mut SqlitePersistence,
    authenticated_actor: &AuthenticatedActor,
) -> Result<WhoAmIResponse, ApiError> {
    let user: User = load_user(persistence, authenticated_actor.user_id)?;
    Ok(WhoAmIResponse {
        user: user_info(&user)?,
        capabilities: compute_global_capabilities(authenticated_actor),
    })
}

/// Edits the caller's own profile and, optionally, password.
///
/// The password is checked against the policy before anything changes.
///
/// # Errors
///
/// Returns an error if:
/// - The new password violates the password policy
/// - The name, email or rank is invalid, or the email is taken
pub fn update_profile(
    persistence: &mut SqlitePersistence,
    ctx: &ApplyContext,
    request: &UpdateProfileRequest,
    authenticated_actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<UserResponse, ApiError> {
    let user_id: i64 = authenticated_actor.user_id;
    let current: User = load_user(persistence, user_id)?;

    let email: Option<String> = request.email.as_deref().map(normalize_email);
    let rank: Option<Option<Rank>> = request
        .rank
        .as_deref()
        .map(|r| parse_rank(Some(r)))
        .transpose()?;

    if let Some(password) = request.password.as_deref() {
        PasswordPolicy::default().validate(
            password,
            request.password_confirmation.as_deref().unwrap_or_default(),
            email.as_deref().unwrap_or(&current.email),
            request.full_name.as_deref().unwrap_or(&current.full_name),
        )?;
    }

    if request.full_name.is_some() || email.is_some() || rank.is_some() {
        let command: Command = Command::UpdateUser {
            user_id,
            full_name: request.full_name.clone(),
            email,
            rank,
            role: None,
        };
        execute(
            persistence,
            ctx,
            command,
            authenticated_actor.to_audit_actor(),
            cause,
        )?;
    }

    if let Some(password) = request.password.as_deref() {
        persistence.update_password(user_id, password)?;
        info!(user_id, "Password changed");
    }

    let user: User = load_user(persistence, user_id)?;
    info!(user_id, "Profile updated");
    Ok(UserResponse {
        user: user_info(&user)?,
        message: String::from("Profile updated"),
    })
}

/// Reports whether the first administrator still has to be created.
///
/// # Errors
///
/// Returns an error if the user count cannot be read.
pub fn get_bootstrap_status(
    persistence: &mut SqlitePersistence,
) -> Result<BootstrapStatusResponse, ApiError> {
    Ok(BootstrapStatusResponse {
        needs_bootstrap: persistence.count_users()? == 0,
    })
}

/// Creates the first administrator and opens a session for them.
///
/// Only allowed while no user exists.
///
/// # Errors
///
/// Returns an error if:
/// - Any user already exists
/// - The password violates the password policy
/// - The name or email is invalid
pub fn create_first_admin(
    persistence: &mut SqlitePersistence,
    ctx: &ApplyContext,
    request: &CreateFirstAdminRequest,
    session_lifetime: Duration,
    cause: Cause,
) -> Result<LoginResponse, ApiError> {
    if persistence.count_users()? > 0 {
        return Err(ApiError::DomainRuleViolation {
            rule: String::from("bootstrap_complete"),
            message: String::from("An administrator already exists"),
        });
    }

    let email: String = normalize_email(&request.email);
    PasswordPolicy::default().validate(
        &request.password,
        &request.password_confirmation,
        &email,
        &request.full_name,
    )?;
    let password_hash: String = hash_password(&request.password)?;

    let command: Command = Command::CreateUser {
        full_name: request.full_name.clone(),
        email,
        rank: None,
        role: Role::Admin,
        password_hash,
    };
    let (_, persisted) = execute(persistence, ctx, command, Actor::system(), cause)?;
    let user_id: i64 = first_entity_id(&persisted)?;

    let user: User = load_user(persistence, user_id)?;
    let session =
        AuthenticationService::open_session(persistence, user_id, ctx.now, session_lifetime)?;

    info!(user_id, "First administrator created");
    Ok(LoginResponse {
        session_token: session.session_token,
        expires_at: session.expires_at,
        user: user_info(&user)?,
    })
}

// ========================================================================
// User administration
// ========================================================================

/// Lists all users with per-user capabilities for the caller.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the query fails.
pub fn list_users(
    persistence: &mut SqlitePersistence,
    authenticated_actor: &AuthenticatedActor,
) -> Result<ListUsersResponse, ApiError> {
    AuthorizationService::require_admin(authenticated_actor, "list_users")?;

    let users: Vec<User> = persistence.list_users()?;
    let admin_count: usize = users.iter().filter(|u| u.is_admin()).count();

    let users: Vec<UserListEntry> = users
        .iter()
        .map(|user| {
            Ok(UserListEntry {
                user: user_info(user)?,
                capabilities: compute_user_capabilities(authenticated_actor, user, admin_count),
            })
        })
        .collect::<Result<_, ApiError>>()?;

    Ok(ListUsersResponse { users })
}

/// Creates a user on behalf of an admin.
///
/// A missing email is replaced with a unique placeholder address.
///
/// # Errors
///
/// Returns an error if:
/// - The actor is not an admin
/// - The role or rank is invalid
/// - The password violates the password policy
/// - The name or email is invalid, or the email is taken
pub fn create_user(
    persistence: &mut SqlitePersistence,
    ctx: &ApplyContext,
    request: &CreateUserRequest,
    authenticated_actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<UserResponse, ApiError> {
    // Enforce authorization - only admins can create users
    AuthorizationService::require_admin(authenticated_actor, "create_user")?;

    let role: Role = parse_role(&request.role)?;
    let rank: Option<Rank> = parse_rank(request.rank.as_deref())?;
    let email: String = request
        .email
        .as_deref()
        .map(normalize_email)
        .filter(|e| !e.is_empty())
        .unwrap_or_else(placeholder_email);

    PasswordPolicy::default().validate(
        &request.password,
        &request.password,
        &email,
        &request.full_name,
    )?;
    let password_hash: String = hash_password(&request.password)?;

    let command: Command = Command::CreateUser {
        full_name: request.full_name.clone(),
        email,
        rank,
        role,
        password_hash,
    };
    let (_, persisted) = execute(
        persistence,
        ctx,
        command,
        authenticated_actor.to_audit_actor(),
        cause,
    )?;
    let user_id: i64 = first_entity_id(&persisted)?;
    let user: User = load_user(persistence, user_id)?;

    info!(user_id, actor = authenticated_actor.user_id, "User created");
    Ok(UserResponse {
        user: user_info(&user)?,
        message: format!("Created user {}", user.full_name),
    })
}

/// Edits a user on behalf of an admin. Omitted fields stay unchanged.
///
/// # Errors
///
/// Returns an error if:
/// - The actor is not an admin
/// - The user does not exist
/// - A field is invalid or the email is taken
/// - The change would demote the last administrator
/// - The new password violates the password policy
pub fn update_user(
    persistence: &mut SqlitePersistence,
    ctx: &ApplyContext,
    user_id: i64,
    request: &UpdateUserRequest,
    authenticated_actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<UserResponse, ApiError> {
    AuthorizationService::require_admin(authenticated_actor, "update_user")?;

    let current: User = load_user(persistence, user_id)?;
    let role: Option<Role> = request.role.as_deref().map(parse_role).transpose()?;
    let email: Option<String> = request.email.as_deref().map(normalize_email);
    let rank: Option<Option<Rank>> = request
        .rank
        .as_deref()
        .map(|r| parse_rank(Some(r)))
        .transpose()?;

    if let Some(password) = request.password.as_deref() {
        PasswordPolicy::default().validate(
            password,
            password,
            email.as_deref().unwrap_or(&current.email),
            request.full_name.as_deref().unwrap_or(&current.full_name),
        )?;
    }

    if request.full_name.is_some() || email.is_some() || rank.is_some() || role.is_some() {
        let command: Command = Command::UpdateUser {
            user_id,
            full_name: request.full_name.clone(),
            email,
            rank,
            role,
        };
        execute(
            persistence,
            ctx,
            command,
            authenticated_actor.to_audit_actor(),
            cause,
        )?;
    }

    if let Some(password) = request.password.as_deref() {
        persistence.update_password(user_id, password)?;
        info!(user_id, actor = authenticated_actor.user_id, "Password reset");
    }

    let user: User = load_user(persistence, user_id)?;
    info!(user_id, actor = authenticated_actor.user_id, "User updated");
    Ok(UserResponse {
        user: user_info(&user)?,
        message: format!("Updated user {}", user.full_name),
    })
}

/// Deletes a user, their sessions and their group memberships.
///
/// Their duties stay and are shown as belonging to a former member.
///
/// # Errors
///
/// Returns an error if:
/// - The actor is not an admin
/// - The actor tries to delete themselves
/// - The user does not exist or is the last administrator
pub fn delete_user(
    persistence: &mut SqlitePersistence,
    ctx: &ApplyContext,
    user_id: i64,
    authenticated_actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<DeleteResponse, ApiError> {
    AuthorizationService::require_admin(authenticated_actor, "delete_user")?;

    if user_id == authenticated_actor.user_id {
        return Err(ApiError::DomainRuleViolation {
            rule: String::from("self_delete"),
            message: String::from("Administrators cannot delete their own account"),
        });
    }

    execute(
        persistence,
        ctx,
        Command::DeleteUser { user_id },
        authenticated_actor.to_audit_actor(),
        cause,
    )?;

    info!(user_id, actor = authenticated_actor.user_id, "User deleted");
    Ok(DeleteResponse {
        id: user_id,
        message: format!("Deleted user {user_id}"),
    })
}

/// Returns the rank catalog, category by category.
#[must_use]
pub fn rank_catalog() -> RankCatalogResponse {
    RankCatalogResponse {
        categories: RankCategory::ALL
            .iter()
            .map(|category| RankCategoryInfo {
                category: category.label().to_string(),
                ranks: category.ranks().iter().map(|r| (*r).to_string()).collect(),
            })
            .collect(),
    }
}

// ========================================================================
// Duties
// ========================================================================

/// Creates a single duty.
///
/// # Errors
///
/// Returns an error if:
/// - The actor is not an admin
/// - The shift is missing, malformed, or ends before it starts
/// - The type or position is empty
/// - The owner does not exist
pub fn create_duty(
    persistence: &mut SqlitePersistence,
    ctx: &ApplyContext,
    request: &CreateDutyRequest,
    authenticated_actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<DutyResponse, ApiError> {
    AuthorizationService::require_admin(authenticated_actor, "create_duty")?;

    let shift: ShiftSpec = parse_shift(
        request.shift_start.as_deref(),
        request.shift_end.as_deref(),
        request.duty_date.as_deref(),
        ctx.timezone,
    )?
    .ok_or_else(|| {
        invalid_input(
            "shift_start",
            "Give shift_start and shift_end, or duty_date",
        )
    })?;

    let command: Command = Command::CreateDuty {
        user_id: request.user_id,
        duty_type: request.duty_type.clone(),
        position: request.position.clone(),
        shift,
        rotation_cycle: parse_rotation(&request.rotation_cycle)?,
        notes: request.notes.clone(),
    };
    let (result, persisted) = execute(
        persistence,
        ctx,
        command,
        authenticated_actor.to_audit_actor(),
        cause,
    )?;
    let duty: Duty = created_duties(result, persisted)?
        .into_iter()
        .next()
        .ok_or_else(|| unexpected_change("a duty"))?;

    let users: Vec<User> = persistence.list_users()?;
    let duty: DutyInfo = duty_info(&duty, &users, ctx.now)?;
    info!(
        duty_id = duty.duty_id,
        user_id = duty.user_id,
        actor = authenticated_actor.user_id,
        "Duty created"
    );
    Ok(DutyResponse {
        duty,
        message: String::from("Duty created"),
    })
}

/// Creates one duty per date, all sharing the same times of day.
///
/// The whole batch is validated first and written atomically. An end time
/// earlier than the start time rolls over to the next day. The response
/// lists the duties in request order.
///
/// # Errors
///
/// Returns an error if:
/// - The actor is not an admin
/// - The date list is empty, or any date is malformed or repeated
/// - A time of day is malformed, or start and end are equal
/// - The type or position is empty, or the owner does not exist
pub fn create_bulk_duties(
    persistence: &mut SqlitePersistence,
    ctx: &ApplyContext,
    request: &CreateBulkDutiesRequest,
    authenticated_actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<ListDutiesResponse, ApiError> {
    AuthorizationService::require_admin(authenticated_actor, "create_bulk_duties")?;

    let dates: Vec<Date> = parse_dates(&request.dates).map_err(translate_domain_error)?;
    let start_time = parse_time_of_day(&request.start_time).map_err(translate_domain_error)?;
    let end_time = parse_time_of_day(&request.end_time).map_err(translate_domain_error)?;

    let command: Command = Command::CreateBulkDuties {
        user_id: request.user_id,
        duty_type: request.duty_type.clone(),
        position: request.position.clone(),
        dates,
        start_time,
        end_time,
        rotation_cycle: parse_rotation(&request.rotation_cycle)?,
        notes: request.notes.clone(),
    };
    let (result, persisted) = execute(
        persistence,
        ctx,
        command,
        authenticated_actor.to_audit_actor(),
        cause,
    )?;
    let duties: Vec<Duty> = created_duties(result, persisted)?;

    let users: Vec<User> = persistence.list_users()?;
    info!(
        count = duties.len(),
        user_id = request.user_id,
        actor = authenticated_actor.user_id,
        "Bulk duties created"
    );
    Ok(ListDutiesResponse {
        duties: duty_infos(&duties, &users, ctx.now)?,
    })
}

/// Applies a partial update to a duty.
///
/// A new shift is given as a start and end pair or as a date.
///
/// # Errors
///
/// Returns an error if:
/// - The actor is not an admin
/// - The request changes nothing or a field is invalid
/// - The duty or the new owner does not exist
pub fn update_duty(
    persistence: &mut SqlitePersistence,
    ctx: &ApplyContext,
    duty_id: i64,
    request: &UpdateDutyRequest,
    authenticated_actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<DutyResponse, ApiError> {
    AuthorizationService::require_admin(authenticated_actor, "update_duty")?;

    let patch: DutyPatch = DutyPatch {
        user_id: request.user_id,
        duty_type: request.duty_type.clone(),
        position: request.position.clone(),
        shift: parse_shift(
            request.shift_start.as_deref(),
            request.shift_end.as_deref(),
            request.duty_date.as_deref(),
            ctx.timezone,
        )?,
        rotation_cycle: request
            .rotation_cycle
            .as_deref()
            .map(parse_rotation)
            .transpose()?,
        notes: request.notes.clone(),
    };
    if patch.is_empty() {
        return Err(invalid_input("duty", "Nothing to update"));
    }

    let (result, _) = execute(
        persistence,
        ctx,
        Command::UpdateDuty { duty_id, patch },
        authenticated_actor.to_audit_actor(),
        cause,
    )?;
    let Change::DutyUpdated(duty) = result.change else {
        return Err(unexpected_change("an updated duty"));
    };

    let users: Vec<User> = persistence.list_users()?;
    info!(duty_id, actor = authenticated_actor.user_id, "Duty updated");
    Ok(DutyResponse {
        duty: duty_info(&duty, &users, ctx.now)?,
        message: String::from("Duty updated"),
    })
}

/// Deletes a duty.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the duty does not exist.
pub fn delete_duty(
    persistence: &mut SqlitePersistence,
    ctx: &ApplyContext,
    duty_id: i64,
    authenticated_actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<DeleteResponse, ApiError> {
    AuthorizationService::require_admin(authenticated_actor, "delete_duty")?;

    execute(
        persistence,
        ctx,
        Command::DeleteDuty { duty_id },
        authenticated_actor.to_audit_actor(),
        cause,
    )?;

    info!(duty_id, actor = authenticated_actor.user_id, "Duty deleted");
    Ok(DeleteResponse {
        id: duty_id,
        message: format!("Deleted duty {duty_id}"),
    })
}

/// Lists every duty, ordered by start.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the query fails.
pub fn list_all_duties(
    persistence: &mut SqlitePersistence,
    authenticated_actor: &AuthenticatedActor,
    now: OffsetDateTime,
) -> Result<ListDutiesResponse, ApiError> {
    AuthorizationService::require_admin(authenticated_actor, "list_all_duties")?;

    let duties: Vec<Duty> = persistence.list_duties()?;
    let users: Vec<User> = persistence.list_users()?;
    Ok(ListDutiesResponse {
        duties: duty_infos(&duties, &users, now)?,
    })
}

/// Lists one user's duties, ordered by start.
///
/// Works for deleted users too, so their retained duties stay reachable.
///
/// # Errors
///
/// Returns an error if a non-admin asks for someone else's duties or the
/// query fails.
pub fn list_duties_for_user(
    persistence: &mut SqlitePersistence,
    authenticated_actor: &AuthenticatedActor,
    user_id: i64,
    now: OffsetDateTime,
) -> Result<ListDutiesResponse, ApiError> {
    AuthorizationService::require_self_or_admin(
        authenticated_actor,
        user_id,
        "list_duties_for_user",
    )?;

    let duties: Vec<Duty> = persistence.list_duties_for_user(user_id)?;
    let users: Vec<User> = persistence.list_users()?;
    debug!(user_id, count = duties.len(), "Listed duties for user");
    Ok(ListDutiesResponse {
        duties: duty_infos(&duties, &users, now)?,
    })
}

/// Lists the caller's own duties.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_my_duties(
    persistence: &mut SqlitePersistence,
    authenticated_actor: &AuthenticatedActor,
    now: OffsetDateTime,
) -> Result<ListDutiesResponse, ApiError> {
    list_duties_for_user(
        persistence,
        authenticated_actor,
        authenticated_actor.user_id,
        now,
    )
}

// ========================================================================
// Groups
// ========================================================================

/// Creates an empty group.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the name is invalid.
pub fn create_group(
    persistence: &mut SqlitePersistence,
    ctx: &ApplyContext,
    request: &CreateGroupRequest,
    authenticated_actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<GroupResponse, ApiError> {
    AuthorizationService::require_admin(authenticated_actor, "create_group")?;

    let command: Command = Command::CreateGroup {
        name: request.name.clone(),
        description: request.description.clone(),
    };
    let (result, persisted) = execute(
        persistence,
        ctx,
        command,
        authenticated_actor.to_audit_actor(),
        cause,
    )?;
    let Change::GroupCreated(mut group) = result.change else {
        return Err(unexpected_change("a new group"));
    };
    group.group_id = Some(first_entity_id(&persisted)?);

    let group: GroupInfo = group_info(&group)?;
    info!(
        group_id = group.group_id,
        actor = authenticated_actor.user_id,
        "Group created"
    );
    Ok(GroupResponse {
        message: format!("Created group {}", group.name),
        group,
    })
}

/// Replaces a group's name, description and complete membership.
///
/// # Errors
///
/// Returns an error if:
/// - The actor is not an admin
/// - The group or any member does not exist
/// - The name is invalid
pub fn update_group(
    persistence: &mut SqlitePersistence,
    ctx: &ApplyContext,
    group_id: i64,
    request: &UpdateGroupRequest,
    authenticated_actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<GroupResponse, ApiError> {
    AuthorizationService::require_admin(authenticated_actor, "update_group")?;

    let command: Command = Command::UpdateGroup {
        group_id,
        name: request.name.clone(),
        description: request.description.clone(),
        member_ids: request.member_ids.clone(),
    };
    let (result, _) = execute(
        persistence,
        ctx,
        command,
        authenticated_actor.to_audit_actor(),
        cause,
    )?;
    let group: GroupInfo = group_info(&updated_group(result)?)?;

    info!(
        group_id,
        members = group.member_ids.len(),
        actor = authenticated_actor.user_id,
        "Group updated"
    );
    Ok(GroupResponse {
        message: format!("Updated group {}", group.name),
        group,
    })
}

/// Deletes a group. Its members are not affected.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the group does not
/// exist.
pub fn delete_group(
    persistence: &mut SqlitePersistence,
    ctx: &ApplyContext,
    group_id: i64,
    authenticated_actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<DeleteResponse, ApiError> {
    AuthorizationService::require_admin(authenticated_actor, "delete_group")?;

    execute(
        persistence,
        ctx,
        Command::DeleteGroup { group_id },
        authenticated_actor.to_audit_actor(),
        cause,
    )?;

    info!(group_id, actor = authenticated_actor.user_id, "Group deleted");
    Ok(DeleteResponse {
        id: group_id,
        message: format!("Deleted group {group_id}"),
    })
}

/// Adds the user to the group if absent, removes them if present.
///
/// # Errors
///
/// Returns an error if:
/// - The actor is not an admin
/// - The group does not exist
/// - The user is being added and does not exist
pub fn toggle_member(
    persistence: &mut SqlitePersistence,
    ctx: &ApplyContext,
    group_id: i64,
    request: &ToggleMemberRequest,
    authenticated_actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<GroupResponse, ApiError> {
    AuthorizationService::require_admin(authenticated_actor, "toggle_member")?;

    let command: Command = Command::ToggleMember {
        group_id,
        user_id: request.user_id,
    };
    let (result, _) = execute(
        persistence,
        ctx,
        command,
        authenticated_actor.to_audit_actor(),
        cause,
    )?;
    let group: GroupInfo = group_info(&updated_group(result)?)?;

    let added: bool = group.member_ids.contains(&request.user_id);
    info!(
        group_id,
        user_id = request.user_id,
        added,
        actor = authenticated_actor.user_id,
        "Group membership toggled"
    );
    Ok(GroupResponse {
        message: if added {
            format!("Added user {} to {}", request.user_id, group.name)
        } else {
            format!("Removed user {} from {}", request.user_id, group.name)
        },
        group,
    })
}

/// Lists every group, ordered by name.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the query fails.
pub fn list_groups(
    persistence: &mut SqlitePersistence,
    authenticated_actor: &AuthenticatedActor,
) -> Result<ListGroupsResponse, ApiError> {
    AuthorizationService::require_admin(authenticated_actor, "list_groups")?;

    let groups: Vec<GroupInfo> = persistence
        .list_groups()?
        .iter()
        .map(group_info)
        .collect::<Result<_, _>>()?;
    Ok(ListGroupsResponse { groups })
}

/// Returns one group.
///
/// # Errors
///
/// Returns an error if the group does not exist, or the actor is neither a
/// member nor an admin.
pub fn get_group(
    persistence: &mut SqlitePersistence,
    authenticated_actor: &AuthenticatedActor,
    group_id: i64,
) -> Result<GroupInfo, ApiError> {
    let group: Group = load_group(persistence, group_id)?;
    AuthorizationService::require_member_or_admin(authenticated_actor, &group, "get_group")?;
    group_info(&group)
}

/// Resolves a group's members in membership order.
///
/// Member ids without a user are skipped.
///
/// # Errors
///
/// Returns an error if the group does not exist, or the actor is neither a
/// member nor an admin.
pub fn list_members(
    persistence: &mut SqlitePersistence,
    authenticated_actor: &AuthenticatedActor,
    group_id: i64,
) -> Result<ListMembersResponse, ApiError> {
    let group: Group = load_group(persistence, group_id)?;
    AuthorizationService::require_member_or_admin(authenticated_actor, &group, "list_members")?;

    let users: Vec<User> = persistence.list_users()?;
    let members: Vec<UserInfo> = resolve_members(&group, &users)
        .into_iter()
        .map(user_info)
        .collect::<Result<_, _>>()?;
    Ok(ListMembersResponse { group_id, members })
}

/// Lists the groups a user belongs to, ordered by name.
///
/// # Errors
///
/// Returns an error if a non-admin asks about someone else or the query
/// fails.
pub fn list_groups_for_user(
    persistence: &mut SqlitePersistence,
    authenticated_actor: &AuthenticatedActor,
    user_id: i64,
) -> Result<ListGroupsResponse, ApiError> {
    AuthorizationService::require_self_or_admin(
        authenticated_actor,
        user_id,
        "list_groups_for_user",
    )?;

    let groups: Vec<GroupInfo> = persistence
        .list_groups_for_user(user_id)?
        .iter()
        .map(group_info)
        .collect::<Result<_, _>>()?;
    Ok(ListGroupsResponse { groups })
}

// ========================================================================
// Schedule
// ========================================================================

/// Builds the members × dates schedule of one or more groups.
///
/// Members appearing in several groups get a single row, in first-seen
/// order. Coverage gaps and overlapping duties are reported, not rejected.
///
/// # Errors
///
/// Returns an error if:
/// - No group is given, or any group does not exist
/// - The actor is neither an admin nor a member of every group
/// - The date range is malformed or too long
pub fn group_schedule(
    persistence: &mut SqlitePersistence,
    ctx: &ApplyContext,
    request: &GroupScheduleRequest,
    authenticated_actor: &AuthenticatedActor,
) -> Result<GroupScheduleResponse, ApiError> {
    if request.group_ids.is_empty() {
        return Err(invalid_input("group_ids", "At least one group is required"));
    }

    let mut groups: Vec<Group> = Vec::with_capacity(request.group_ids.len());
    for group_id in &request.group_ids {
        let group: Group = load_group(persistence, *group_id)?;
        AuthorizationService::require_member_or_admin(
            authenticated_actor,
            &group,
            "group_schedule",
        )?;
        groups.push(group);
    }

    let range: DateRange = resolve_date_range(request)?;
    let (from, to) = query_bounds(&range)?;

    let users: Vec<User> = persistence.list_users()?;
    let members: Vec<&User> = merge_members(groups.iter().map(|g| resolve_members(g, &users)));
    let member_ids: Vec<i64> = members.iter().filter_map(|u| u.user_id).collect();
    let duties: Vec<Duty> = persistence.list_duties_between(&member_ids, from, to)?;

    let matrix: ScheduleMatrix<'_> =
        build_range_matrix(&members, &duties, &range, ctx.timezone)
            .map_err(translate_domain_error)?;

    let rows: Vec<ScheduleRowInfo> = matrix
        .rows
        .iter()
        .map(|row| {
            Ok(ScheduleRowInfo {
                user_id: row.user.user_id.ok_or_else(|| missing_id("User"))?,
                full_name: row.user.full_name.clone(),
                cells: row
                    .cells
                    .iter()
                    .map(|cell| cell.iter().filter_map(|d| d.duty_id).collect())
                    .collect(),
            })
        })
        .collect::<Result<_, ApiError>>()?;

    let mut visible: Vec<&Duty> = matrix.rows.iter().flat_map(|row| row.duties()).collect();
    visible.sort_by_key(|d| d.sort_key());

    let overlaps: Vec<OverlapInfo> = matrix
        .overlaps()
        .iter()
        .map(|overlap| {
            Ok(OverlapInfo {
                user_id: overlap.user_id,
                first_duty_id: overlap.first.duty_id.ok_or_else(|| missing_id("Duty"))?,
                second_duty_id: overlap.second.duty_id.ok_or_else(|| missing_id("Duty"))?,
            })
        })
        .collect::<Result<_, ApiError>>()?;

    debug!(
        groups = groups.len(),
        members = rows.len(),
        days = matrix.dates.len(),
        staffed = matrix.staffed_cell_count(),
        "Built group schedule"
    );
    Ok(GroupScheduleResponse {
        dates: matrix.dates.iter().map(ToString::to_string).collect(),
        rows,
        duties: duty_infos(visible, &users, ctx.now)?,
        uncovered_dates: matrix
            .uncovered_dates()
            .iter()
            .map(ToString::to_string)
            .collect(),
        overlaps,
    })
}

// ========================================================================
// Audit
// ========================================================================

/// Lists recent audit events, most recent first.
///
/// `limit` defaults to `DEFAULT_AUDIT_LIMIT` and is clamped to
/// `1..=MAX_AUDIT_LIMIT`.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the query fails.
pub fn audit_timeline(
    persistence: &mut SqlitePersistence,
    authenticated_actor: &AuthenticatedActor,
    limit: Option<i64>,
) -> Result<AuditTimelineResponse, ApiError> {
    AuthorizationService::require_admin(authenticated_actor, "audit_timeline")?;

    let limit: i64 = limit
        .unwrap_or(DEFAULT_AUDIT_LIMIT)
        .clamp(1, MAX_AUDIT_LIMIT);
    let events: Vec<AuditEventInfo> = persistence
        .get_audit_timeline(limit)?
        .into_iter()
        .map(audit_event_info)
        .collect::<Result<_, _>>()?;
    Ok(AuditTimelineResponse { events })
}

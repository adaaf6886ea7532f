// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::command::{Command, DutyPatch, ShiftSpec};
use crate::error::CoreError;
use crate::state::{ApplyContext, Change, State, TransitionResult};
use chrono_tz::Tz;
use roster_audit::{Action, Actor, AuditEvent, Cause, StateSnapshot};
use roster_domain::{
    DomainError, Duty, Group, Rank, Role, RotationCycle, ShiftWindow, User, expand_bulk_windows,
    normalize_member_ids, normalize_optional_text, toggle_member, unknown_member_ids,
    validate_duty_fields, validate_email_unique, validate_group_fields, validate_user_fields,
};
use serde::Serialize;
use time::{Date, Time};

/// What a command handler produced, before the audit event is assembled.
struct Outcome {
    change: Change,
    before: StateSnapshot,
    after: StateSnapshot,
    details: String,
}

/// Applies a command to the roster, producing the change to persist and its
/// audit event.
///
/// This function is pure: it reads `state` and `ctx` only, and performs no
/// I/O. Every check runs before anything is produced, so a failed command has
/// no effect.
///
/// # Arguments
///
/// * `state` - The current roster (immutable)
/// * `ctx` - Timezone and reference time
/// * `command` - The command to apply
/// * `actor` - The actor performing this action
/// * `cause` - The cause or reason for this action
///
/// # Errors
///
/// Returns an error if:
/// - The command input is malformed (validation)
/// - A referenced user, group, or duty does not exist
/// - The command collides with existing state (duplicate email, last admin)
pub fn apply(
    state: &State,
    ctx: &ApplyContext,
    command: Command,
    actor: Actor,
    cause: Cause,
) -> Result<TransitionResult, CoreError> {
    let name: &'static str = command.name();

    let outcome: Outcome = match command {
        Command::CreateDuty {
            user_id,
            duty_type,
            position,
            shift,
            rotation_cycle,
            notes,
        } => create_duty(
            state,
            ctx,
            DutyTemplate {
                user_id,
                duty_type,
                position,
                rotation_cycle,
                notes,
            },
            shift,
        )?,
        Command::CreateBulkDuties {
            user_id,
            duty_type,
            position,
            dates,
            start_time,
            end_time,
            rotation_cycle,
            notes,
        } => create_bulk_duties(
            state,
            ctx,
            DutyTemplate {
                user_id,
                duty_type,
                position,
                rotation_cycle,
                notes,
            },
            &dates,
            start_time,
            end_time,
        )?,
        Command::UpdateDuty { duty_id, patch } => update_duty(state, ctx, duty_id, patch)?,
        Command::DeleteDuty { duty_id } => delete_duty(state, duty_id)?,
        Command::CreateGroup { name, description } => create_group(ctx, name, description)?,
        Command::UpdateGroup {
            group_id,
            name,
            description,
            member_ids,
        } => update_group(state, group_id, name, description, &member_ids)?,
        Command::DeleteGroup { group_id } => delete_group(state, group_id)?,
        Command::ToggleMember { group_id, user_id } => toggle_group_member(state, group_id, user_id)?,
        Command::CreateUser {
            full_name,
            email,
            rank,
            role,
            password_hash,
        } => create_user(state, ctx, full_name, &email, rank, role, password_hash)?,
        Command::UpdateUser {
            user_id,
            full_name,
            email,
            rank,
            role,
        } => update_user(state, user_id, full_name, email.as_deref(), rank, role)?,
        Command::DeleteUser { user_id } => delete_user(state, user_id)?,
    };

    let action: Action = Action::new(String::from(name), Some(outcome.details));
    let audit_event: AuditEvent =
        AuditEvent::new(actor, cause, action, outcome.before, outcome.after);

    Ok(TransitionResult {
        change: outcome.change,
        audit_event,
    })
}

/// Fields shared by single and bulk duty creation.
struct DutyTemplate {
    user_id: i64,
    duty_type: String,
    position: String,
    rotation_cycle: RotationCycle,
    notes: Option<String>,
}

impl DutyTemplate {
    fn build(&self, window: ShiftWindow, ctx: &ApplyContext) -> Result<Duty, DomainError> {
        let duty = Duty::new(
            self.user_id,
            self.duty_type.trim().to_string(),
            self.position.trim().to_string(),
            window,
            self.rotation_cycle,
            normalize_optional_text(self.notes.clone()),
            ctx.now,
        );
        validate_duty_fields(&duty)?;
        Ok(duty)
    }
}

fn snapshot<T: Serialize + ?Sized>(value: &T) -> Result<StateSnapshot, CoreError> {
    StateSnapshot::of(value).map_err(|e| CoreError::Snapshot(e.to_string()))
}

fn require_user(state: &State, user_id: i64) -> Result<&User, DomainError> {
    state
        .user(user_id)
        .ok_or(DomainError::UserNotFound(user_id))
}

fn require_group(state: &State, group_id: i64) -> Result<&Group, DomainError> {
    state
        .group(group_id)
        .ok_or(DomainError::GroupNotFound(group_id))
}

fn require_duty(state: &State, duty_id: i64) -> Result<&Duty, DomainError> {
    state
        .duty(duty_id)
        .ok_or(DomainError::DutyNotFound(duty_id))
}

fn resolve_shift(shift: ShiftSpec, tz: Tz) -> Result<ShiftWindow, DomainError> {
    match shift {
        ShiftSpec::Window { start, end } => ShiftWindow::new(start, end),
        ShiftSpec::Date(date) => ShiftWindow::all_day(date, tz),
    }
}

fn create_duty(
    state: &State,
    ctx: &ApplyContext,
    template: DutyTemplate,
    shift: ShiftSpec,
) -> Result<Outcome, CoreError> {
    let window = resolve_shift(shift, ctx.timezone)?;
    let duty = template.build(window, ctx)?;
    let owner = require_user(state, template.user_id)?;

    let details = format!(
        "Assigned {} at {} to {} from {} to {}",
        duty.duty_type,
        duty.position,
        owner.full_name,
        window.start(),
        window.end()
    );
    let after = snapshot(&duty)?;

    Ok(Outcome {
        change: Change::DutiesCreated(vec![duty]),
        before: StateSnapshot::absent(),
        after,
        details,
    })
}

fn create_bulk_duties(
    state: &State,
    ctx: &ApplyContext,
    template: DutyTemplate,
    dates: &[Date],
    start_time: Time,
    end_time: Time,
) -> Result<Outcome, CoreError> {
    let windows = expand_bulk_windows(dates, start_time, end_time, ctx.timezone)?;
    let duties: Vec<Duty> = windows
        .into_iter()
        .map(|window| template.build(window, ctx))
        .collect::<Result<_, _>>()?;
    let owner = require_user(state, template.user_id)?;

    let details = format!(
        "Assigned {} {} duties at {} to {} ({start_time}-{end_time})",
        duties.len(),
        template.duty_type.trim(),
        template.position.trim(),
        owner.full_name
    );
    let after = snapshot(&duties)?;

    Ok(Outcome {
        change: Change::DutiesCreated(duties),
        before: StateSnapshot::absent(),
        after,
        details,
    })
}

fn update_duty(
    state: &State,
    ctx: &ApplyContext,
    duty_id: i64,
    patch: DutyPatch,
) -> Result<Outcome, CoreError> {
    let existing = require_duty(state, duty_id)?;
    let mut updated = existing.clone();

    if let Some(user_id) = patch.user_id {
        require_user(state, user_id)?;
        updated.user_id = user_id;
    }
    if let Some(duty_type) = patch.duty_type {
        updated.duty_type = duty_type.trim().to_string();
    }
    if let Some(position) = patch.position {
        updated.position = position.trim().to_string();
    }
    if let Some(shift) = patch.shift {
        updated.window = resolve_shift(shift, ctx.timezone)?;
    }
    if let Some(rotation_cycle) = patch.rotation_cycle {
        updated.rotation_cycle = rotation_cycle;
    }
    if let Some(notes) = patch.notes {
        updated.notes = normalize_optional_text(Some(notes));
    }
    validate_duty_fields(&updated)?;

    Ok(Outcome {
        before: snapshot(existing)?,
        after: snapshot(&updated)?,
        details: format!("Updated duty {duty_id}"),
        change: Change::DutyUpdated(updated),
    })
}

fn delete_duty(state: &State, duty_id: i64) -> Result<Outcome, CoreError> {
    let existing = require_duty(state, duty_id)?;

    Ok(Outcome {
        change: Change::DutyDeleted(duty_id),
        before: snapshot(existing)?,
        after: StateSnapshot::absent(),
        details: format!(
            "Deleted {} duty {duty_id} at {}",
            existing.duty_type, existing.position
        ),
    })
}

fn create_group(
    ctx: &ApplyContext,
    name: String,
    description: Option<String>,
) -> Result<Outcome, CoreError> {
    let group = Group::new(
        name.trim().to_string(),
        normalize_optional_text(description),
        ctx.now,
    );
    validate_group_fields(&group)?;

    Ok(Outcome {
        before: StateSnapshot::absent(),
        after: snapshot(&group)?,
        details: format!("Created group '{}'", group.name),
        change: Change::GroupCreated(group),
    })
}

fn update_group(
    state: &State,
    group_id: i64,
    name: String,
    description: Option<String>,
    member_ids: &[i64],
) -> Result<Outcome, CoreError> {
    let existing = require_group(state, group_id)?;

    let member_ids = normalize_member_ids(member_ids);
    if let Some(unknown) = unknown_member_ids(&member_ids, &state.users).first() {
        return Err(DomainError::UserNotFound(*unknown).into());
    }

    let updated = Group::with_id(
        group_id,
        name.trim().to_string(),
        normalize_optional_text(description),
        member_ids,
        existing.created_at,
    );
    validate_group_fields(&updated)?;

    Ok(Outcome {
        before: snapshot(existing)?,
        after: snapshot(&updated)?,
        details: format!(
            "Updated group '{}' ({} members)",
            updated.name,
            updated.member_ids.len()
        ),
        change: Change::GroupUpdated(updated),
    })
}

fn delete_group(state: &State, group_id: i64) -> Result<Outcome, CoreError> {
    let existing = require_group(state, group_id)?;

    Ok(Outcome {
        change: Change::GroupDeleted(group_id),
        before: snapshot(existing)?,
        after: StateSnapshot::absent(),
        details: format!("Deleted group '{}'", existing.name),
    })
}

fn toggle_group_member(state: &State, group_id: i64, user_id: i64) -> Result<Outcome, CoreError> {
    let existing = require_group(state, group_id)?;

    let removing = existing.has_member(user_id);
    if !removing {
        require_user(state, user_id)?;
    }

    let mut updated = existing.clone();
    updated.member_ids = toggle_member(&existing.member_ids, user_id);

    let verb = if removing { "Removed" } else { "Added" };
    Ok(Outcome {
        before: snapshot(existing)?,
        after: snapshot(&updated)?,
        details: format!("{verb} user {user_id} in group '{}'", updated.name),
        change: Change::GroupUpdated(updated),
    })
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn create_user(
    state: &State,
    ctx: &ApplyContext,
    full_name: String,
    email: &str,
    rank: Option<Rank>,
    role: Role,
    password_hash: String,
) -> Result<Outcome, CoreError> {
    let email = normalize_email(email);
    let user = User::new(full_name.trim().to_string(), email, rank, role, ctx.now);
    validate_user_fields(&user)?;
    validate_email_unique(&state.users, &user.email, None)?;

    Ok(Outcome {
        before: StateSnapshot::absent(),
        after: snapshot(&user)?,
        details: format!("Created {} '{}'", user.role, user.full_name),
        change: Change::UserCreated {
            user,
            password_hash,
        },
    })
}

fn update_user(
    state: &State,
    user_id: i64,
    full_name: Option<String>,
    email: Option<&str>,
    rank: Option<Option<Rank>>,
    role: Option<Role>,
) -> Result<Outcome, CoreError> {
    let existing = require_user(state, user_id)?;
    let mut updated = existing.clone();

    if let Some(full_name) = full_name {
        updated.full_name = full_name.trim().to_string();
    }
    if let Some(email) = email {
        updated.email = normalize_email(email);
    }
    validate_user_fields(&updated)?;
    if updated.email != existing.email {
        validate_email_unique(&state.users, &updated.email, Some(user_id))?;
    }
    if let Some(rank) = rank {
        updated.rank = rank;
    }
    if let Some(role) = role {
        if existing.is_admin() && role != Role::Admin && state.admin_count() <= 1 {
            return Err(DomainError::LastAdmin(user_id).into());
        }
        updated.role = role;
    }

    Ok(Outcome {
        before: snapshot(existing)?,
        after: snapshot(&updated)?,
        details: format!("Updated user {user_id}"),
        change: Change::UserUpdated(updated),
    })
}

fn delete_user(state: &State, user_id: i64) -> Result<Outcome, CoreError> {
    let existing = require_user(state, user_id)?;
    if existing.is_admin() && state.admin_count() <= 1 {
        return Err(DomainError::LastAdmin(user_id).into());
    }

    let memberships = state
        .groups
        .iter()
        .filter(|g| g.has_member(user_id))
        .count();
    let retained_duties = state.duties.iter().filter(|d| d.user_id == user_id).count();

    Ok(Outcome {
        change: Change::UserDeleted(user_id),
        before: snapshot(existing)?,
        after: StateSnapshot::absent(),
        details: format!(
            "Deleted user '{}', removed from {memberships} groups, {retained_duties} duties retained",
            existing.full_name
        ),
    })
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{ApplyContext, Change, Command, CoreError, State, TransitionResult, apply};
use roster_audit::{Actor, Cause};
use roster_domain::{Duty, Group, Role, RotationCycle, ShiftWindow, User};
use time::OffsetDateTime;
use time::macros::datetime;

pub const NOW: OffsetDateTime = datetime!(2024-03-01 10:00 UTC);

pub fn create_test_actor() -> Actor {
    Actor::user(1, "admin")
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("req-456"), String::from("Admin request"))
}

pub fn create_test_context() -> ApplyContext {
    ApplyContext::new(chrono_tz::UTC, NOW)
}

pub fn create_test_user(user_id: i64, full_name: &str, role: Role) -> User {
    User::with_id(
        user_id,
        full_name.to_string(),
        format!("user{user_id}@example.com"),
        None,
        role,
        datetime!(2024-01-01 00:00 UTC),
    )
}

pub fn create_test_duty(duty_id: i64, user_id: i64) -> Duty {
    let mut duty = Duty::new(
        user_id,
        String::from("Patrol"),
        String::from("Post-1"),
        ShiftWindow::new(
            datetime!(2024-03-01 08:00 UTC),
            datetime!(2024-03-01 16:00 UTC),
        )
        .unwrap(),
        RotationCycle::Daily,
        None,
        datetime!(2024-02-01 00:00 UTC),
    );
    duty.duty_id = Some(duty_id);
    duty
}

/// Admin 1, users 2 and 3, group 10 holding user 2, duty 100 owned by user 2.
pub fn create_test_state() -> State {
    State {
        users: vec![
            create_test_user(1, "Admin", Role::Admin),
            create_test_user(2, "Bravo", Role::User),
            create_test_user(3, "Charlie", Role::User),
        ],
        groups: vec![Group::with_id(
            10,
            String::from("First Platoon"),
            None,
            vec![2],
            datetime!(2024-01-01 00:00 UTC),
        )],
        duties: vec![create_test_duty(100, 2)],
    }
}

pub fn run(state: &State, command: Command) -> Result<TransitionResult, CoreError> {
    apply(
        state,
        &create_test_context(),
        command,
        create_test_actor(),
        create_test_cause(),
    )
}

pub fn created_duties(result: &TransitionResult) -> &[Duty] {
    match &result.change {
        Change::DutiesCreated(duties) => duties,
        other => panic!("expected DutiesCreated, got {other:?}"),
    }
}

pub fn updated_group(result: &TransitionResult) -> &Group {
    match &result.change {
        Change::GroupUpdated(group) => group,
        other => panic!("expected GroupUpdated, got {other:?}"),
    }
}

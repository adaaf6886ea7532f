// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod backend_validation_tests;
mod initialization_tests;

use roster::{ApplyContext, Command, ShiftSpec, apply};
use roster_audit::{Actor, Cause};
use roster_domain::{Role, RotationCycle};
use time::OffsetDateTime;
use time::macros::datetime;

use crate::{PersistTransitionResult, SqlitePersistence};

/// Reference time for every test.
pub const NOW: OffsetDateTime = datetime!(2024-03-01 10:00 UTC);

pub fn create_test_actor() -> Actor {
    Actor::user(1, "admin")
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("test-cause"), String::from("Test operation"))
}

pub fn create_test_context() -> ApplyContext {
    ApplyContext::new(chrono_tz::UTC, NOW)
}

/// Applies a command against the stored state and persists the result.
pub fn run(persistence: &mut SqlitePersistence, command: Command) -> PersistTransitionResult {
    let state = persistence.get_current_state().unwrap();
    let result = apply(
        &state,
        &create_test_context(),
        command,
        create_test_actor(),
        create_test_cause(),
    )
    .unwrap();
    persistence.persist_transition(&result, NOW).unwrap()
}

/// Creates a user with a placeholder password hash and returns their id.
pub fn create_test_user(persistence: &mut SqlitePersistence, full_name: &str, role: Role) -> i64 {
    let email = format!(
        "{}@example.com",
        full_name.to_lowercase().replace(' ', ".")
    );
    let result = run(
        persistence,
        Command::CreateUser {
            full_name: full_name.to_string(),
            email,
            rank: None,
            role,
            password_hash: String::from("not-a-real-hash"),
        },
    );
    result.entity_ids[0]
}

/// Creates a duty from `start` to `end` and returns its id.
pub fn create_test_duty(
    persistence: &mut SqlitePersistence,
    user_id: i64,
    start: OffsetDateTime,
    end: OffsetDateTime,
) -> i64 {
    let result = run(
        persistence,
        Command::CreateDuty {
            user_id,
            duty_type: String::from("Patrol"),
            position: String::from("Gate 1"),
            shift: ShiftSpec::Window { start, end },
            rotation_cycle: RotationCycle::Daily,
            notes: None,
        },
    );
    result.entity_ids[0]
}

/// Creates an empty group and returns its id.
pub fn create_test_group(persistence: &mut SqlitePersistence, name: &str) -> i64 {
    let result = run(
        persistence,
        Command::CreateGroup {
            name: name.to_string(),
            description: None,
        },
    );
    result.entity_ids[0]
}

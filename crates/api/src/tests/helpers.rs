// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use roster::{ApplyContext, Command, apply};
use roster_audit::{Actor, Cause};
use roster_domain::Role;
use roster_persistence::SqlitePersistence;
use time::OffsetDateTime;
use time::macros::datetime;

use crate::{AuthenticatedActor, CreateDutyRequest};

/// Reference time for every test.
pub const NOW: OffsetDateTime = datetime!(2024-03-01 10:00 UTC);

/// A password that satisfies the default policy.
pub const TEST_PASSWORD: &str = "Correct-Horse-42";

pub fn setup_test_persistence() -> SqlitePersistence {
    SqlitePersistence::new_in_memory().expect("Failed to create in-memory persistence")
}

pub fn create_test_context() -> ApplyContext {
    ApplyContext::new(chrono_tz::UTC, NOW)
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("api-req-456"), String::from("API request"))
}

/// Stores a user directly, skipping password hashing, and returns the actor
/// they would authenticate as.
pub fn seed_user(persistence: &mut SqlitePersistence, full_name: &str, role: Role) -> AuthenticatedActor {
    let email = format!("{}@example.com", full_name.to_lowercase().replace(' ', "."));
    let state = persistence.get_current_state().unwrap();
    let result = apply(
        &state,
        &create_test_context(),
        Command::CreateUser {
            full_name: full_name.to_string(),
            email,
            rank: None,
            role,
            password_hash: String::from("not-a-real-hash"),
        },
        Actor::system(),
        create_test_cause(),
    )
    .unwrap();
    let persisted = persistence.persist_transition(&result, NOW).unwrap();
    AuthenticatedActor::new(persisted.entity_ids[0], role)
}

pub fn seed_admin(persistence: &mut SqlitePersistence) -> AuthenticatedActor {
    seed_user(persistence, "Olena Admin", Role::Admin)
}

/// A single-duty request with an explicit window in local roster time.
pub fn window_request(user_id: i64, start: &str, end: &str) -> CreateDutyRequest {
    CreateDutyRequest {
        user_id,
        duty_type: String::from("Patrol"),
        position: String::from("Post-1"),
        shift_start: Some(start.to_string()),
        shift_end: Some(end.to_string()),
        duty_date: None,
        rotation_cycle: String::from("daily"),
        notes: None,
    }
}

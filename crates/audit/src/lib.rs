// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

//! Audit events for roster mutations.
//!
//! Every successful change to users, groups, or duties produces exactly one
//! `AuditEvent`, stored in the same transaction as the change itself.

use serde::{Deserialize, Serialize};

/// Who performed an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Identifier of the actor, usually a user id.
    pub id: String,
    /// Kind of actor, usually the role it acted with.
    pub actor_type: String,
}

impl Actor {
    #[must_use]
    pub const fn new(id: String, actor_type: String) -> Self {
        Self { id, actor_type }
    }

    /// An actor that is a roster user acting with `role`.
    #[must_use]
    pub fn user(user_id: i64, role: &str) -> Self {
        Self::new(user_id.to_string(), role.to_string())
    }

    /// The system itself, e.g. during first-admin bootstrap.
    #[must_use]
    pub fn system() -> Self {
        Self::new(String::from("system"), String::from("system"))
    }
}

/// Why an action was performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cause {
    /// Correlation id of the request.
    pub id: String,
    /// Human-readable reason.
    pub description: String,
}

impl Cause {
    #[must_use]
    pub const fn new(id: String, description: String) -> Self {
        Self { id, description }
    }
}

/// What was done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Action name, e.g. `CreateBulkDuties`.
    pub name: String,
    /// Optional free-text details.
    pub details: Option<String>,
}

impl Action {
    #[must_use]
    pub const fn new(name: String, details: Option<String>) -> Self {
        Self { name, details }
    }
}

/// Serialized view of the affected records before or after an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// JSON document.
    pub data: String,
}

impl StateSnapshot {
    #[must_use]
    pub const fn new(data: String) -> Self {
        Self { data }
    }

    /// Snapshot of a record that does not exist on this side of the action.
    #[must_use]
    pub fn absent() -> Self {
        Self::new(String::from("null"))
    }

    /// Serializes `value` as the snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` cannot be represented as JSON.
    pub fn of<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_string(value).map(Self::new)
    }

    /// Returns true if this snapshot records an absent value.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        self.data == "null"
    }
}

/// A single audited action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Identifier assigned when persisted.
    pub event_id: Option<i64>,
    pub actor: Actor,
    pub cause: Cause,
    pub action: Action,
    pub before: StateSnapshot,
    pub after: StateSnapshot,
}

impl AuditEvent {
    #[must_use]
    pub const fn new(
        actor: Actor,
        cause: Cause,
        action: Action,
        before: StateSnapshot,
        after: StateSnapshot,
    ) -> Self {
        Self {
            event_id: None,
            actor,
            cause,
            action,
            before,
            after,
        }
    }

    /// Returns a copy carrying the persisted identifier.
    #[must_use]
    pub fn with_id(mut self, event_id: i64) -> Self {
        self.event_id = Some(event_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_event() -> AuditEvent {
        AuditEvent::new(
            Actor::user(7, "admin"),
            Cause::new(String::from("req-1"), String::from("Weekly roster")),
            Action::new(String::from("CreateDuty"), None),
            StateSnapshot::absent(),
            StateSnapshot::new(String::from("{\"duty_id\":1}")),
        )
    }

    #[test]
    fn test_actor_user_uses_id_and_role() {
        let actor: Actor = Actor::user(42, "admin");

        assert_eq!(actor.id, "42");
        assert_eq!(actor.actor_type, "admin");
        assert_eq!(Actor::system().id, "system");
    }

    #[test]
    fn test_action_creation_with_details() {
        let action: Action = Action::new(
            String::from("CreateBulkDuties"),
            Some(String::from("3 duties")),
        );

        assert_eq!(action.name, "CreateBulkDuties");
        assert_eq!(action.details, Some(String::from("3 duties")));
    }

    #[test]
    fn test_state_snapshot_of_serializes_json() {
        let snapshot = StateSnapshot::of(&vec![1, 2, 3]).unwrap_or_else(|_| StateSnapshot::absent());

        assert_eq!(snapshot.data, "[1,2,3]");
        assert!(!snapshot.is_absent());
        assert!(StateSnapshot::absent().is_absent());
    }

    #[test]
    fn test_audit_event_starts_unpersisted() {
        let event: AuditEvent = create_test_event();

        assert_eq!(event.event_id, None);
        assert_eq!(event.clone().with_id(5).event_id, Some(5));
        assert_eq!(event.actor, Actor::user(7, "admin"));
    }

    #[test]
    fn test_audit_event_round_trips_through_json() {
        let event: AuditEvent = create_test_event().with_id(3);

        let json = serde_json::to_string(&event).unwrap_or_default();
        let parsed: Option<AuditEvent> = serde_json::from_str(&json).ok();

        assert_eq!(parsed, Some(event));
    }
}

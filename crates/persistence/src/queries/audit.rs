// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Audit event queries.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use roster_audit::{Action, Actor, AuditEvent, Cause, StateSnapshot};
use tracing::debug;

use crate::data_models::{AuditEntry, decode_timestamp};
use crate::diesel_schema::audit_events;
use crate::error::PersistenceError;

/// Stored audit event columns, in select order.
type AuditEventRow = (i64, String, String, String, String, String, String);

fn audit_entry_from_row(row: AuditEventRow) -> Result<AuditEntry, PersistenceError> {
    let (event_id, actor_json, cause_json, action_json, before_json, after_json, created_at) = row;

    let actor: Actor = serde_json::from_str(&actor_json)?;
    let cause: Cause = serde_json::from_str(&cause_json)?;
    let action: Action = serde_json::from_str(&action_json)?;
    let event = AuditEvent::new(
        actor,
        cause,
        action,
        StateSnapshot::new(before_json),
        StateSnapshot::new(after_json),
    )
    .with_id(event_id);

    Ok(AuditEntry {
        event,
        recorded_at: decode_timestamp(&created_at)?,
    })
}

backend_fn! {
/// Retrieves an audit event by id.
///
/// # Errors
///
/// Returns an error if the event does not exist or cannot be deserialized.
pub fn get_audit_event(conn: &mut _, event_id: i64) -> Result<AuditEntry, PersistenceError> {
    let row: AuditEventRow = audit_events::table
        .filter(audit_events::event_id.eq(event_id))
        .select((
            audit_events::event_id,
            audit_events::actor_json,
            audit_events::cause_json,
            audit_events::action_json,
            audit_events::before_snapshot_json,
            audit_events::after_snapshot_json,
            audit_events::created_at,
        ))
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound(format!("audit event {event_id}")))?;

    audit_entry_from_row(row)
}
}

backend_fn! {
/// Lists up to `limit` audit events, most recent first.
///
/// # Errors
///
/// Returns an error if the query fails or an event cannot be deserialized.
pub fn get_audit_timeline(conn: &mut _, limit: i64) -> Result<Vec<AuditEntry>, PersistenceError> {
    debug!(limit, "Retrieving audit timeline");

    audit_events::table
        .order(audit_events::event_id.desc())
        .limit(limit)
        .select((
            audit_events::event_id,
            audit_events::actor_json,
            audit_events::cause_json,
            audit_events::action_json,
            audit_events::before_snapshot_json,
            audit_events::after_snapshot_json,
            audit_events::created_at,
        ))
        .load::<AuditEventRow>(conn)?
        .into_iter()
        .map(audit_entry_from_row)
        .collect()
}
}

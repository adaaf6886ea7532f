// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Transition persistence.
//!
//! A transition is written in a single database transaction: the row
//! changes and the audit event commit together or not at all. A bulk duty
//! batch is never visible half-written.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use roster::{Change, TransitionResult};
use time::OffsetDateTime;
use tracing::info;

use crate::error::PersistenceError;
use crate::mutations::audit::{persist_audit_event_mysql, persist_audit_event_sqlite};
use crate::mutations::duties::{
    delete_duty_mysql, delete_duty_sqlite, insert_duties_mysql, insert_duties_sqlite,
    update_duty_mysql, update_duty_sqlite,
};
use crate::mutations::groups::{
    delete_group_mysql, delete_group_sqlite, insert_group_mysql, insert_group_sqlite,
    update_group_mysql, update_group_sqlite,
};
use crate::mutations::users::{
    delete_user_mysql, delete_user_sqlite, insert_user_mysql, insert_user_sqlite,
    update_user_mysql, update_user_sqlite,
};

/// Result of persisting a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistTransitionResult {
    /// The event ID of the persisted audit event.
    pub event_id: i64,
    /// Ids of the rows the change created or touched, in change order.
    /// For bulk creation this is one id per duty, in date order.
    pub entity_ids: Vec<i64>,
}

/// Generates `persist_transition_<backend>` for one connection type.
///
/// Unlike `backend_fn!`, the body calls other generated functions, so the
/// backend suffix has to be pasted into each call.
macro_rules! transition_fn {
    ($suffix:ident, $conn_ty:ty) => {
        pastey::paste! {
            #[doc = concat!(
                "Writes a transition and its audit event atomically (",
                stringify!($suffix),
                " version)."
            )]
            ///
            /// # Errors
            ///
            /// Returns an error if any write fails; nothing is committed.
            pub fn [<persist_transition_ $suffix>](
                conn: &mut $conn_ty,
                result: &TransitionResult,
                recorded_at: OffsetDateTime,
            ) -> Result<PersistTransitionResult, PersistenceError> {
                conn.transaction::<_, PersistenceError, _>(|conn| {
                    let entity_ids: Vec<i64> = match &result.change {
                        Change::DutiesCreated(duties) => [<insert_duties_ $suffix>](conn, duties)?,
                        Change::DutyUpdated(duty) => {
                            [<update_duty_ $suffix>](conn, duty)?;
                            duty.duty_id.into_iter().collect()
                        }
                        Change::DutyDeleted(duty_id) => {
                            [<delete_duty_ $suffix>](conn, *duty_id)?;
                            vec![*duty_id]
                        }
                        Change::GroupCreated(group) => vec![[<insert_group_ $suffix>](conn, group)?],
                        Change::GroupUpdated(group) => {
                            [<update_group_ $suffix>](conn, group)?;
                            group.group_id.into_iter().collect()
                        }
                        Change::GroupDeleted(group_id) => {
                            [<delete_group_ $suffix>](conn, *group_id)?;
                            vec![*group_id]
                        }
                        Change::UserCreated {
                            user,
                            password_hash,
                        } => vec![[<insert_user_ $suffix>](conn, user, password_hash)?],
                        Change::UserUpdated(user) => {
                            [<update_user_ $suffix>](conn, user)?;
                            user.user_id.into_iter().collect()
                        }
                        Change::UserDeleted(user_id) => {
                            [<delete_user_ $suffix>](conn, *user_id)?;
                            vec![*user_id]
                        }
                    };

                    let event_id: i64 =
                        [<persist_audit_event_ $suffix>](conn, &result.audit_event, recorded_at)?;

                    info!(
                        event_id,
                        action = %result.audit_event.action.name,
                        entities = entity_ids.len(),
                        "Persisted transition"
                    );
                    Ok(PersistTransitionResult {
                        event_id,
                        entity_ids,
                    })
                })
            }
        }
    };
}

transition_fn!(sqlite, SqliteConnection);
transition_fn!(mysql, MysqlConnection);

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! State-changing operations.
//!
//! - `audit`: audit event rows
//! - `duties`, `groups`, `users`: row writes for each kind of change
//! - `sessions`: session lifecycle
//! - `transition`: `persist_transition`, which wraps a change and its audit
//!   event in one transaction
//!
//! Backend-specific helpers such as `get_last_insert_rowid()` come from the
//! `backend` module; everything else is Diesel DSL.

pub mod audit;
pub mod duties;
pub mod groups;
pub mod sessions;
pub mod transition;
pub mod users;

pub use sessions::{
    create_session_mysql, create_session_sqlite, delete_expired_sessions_mysql,
    delete_expired_sessions_sqlite, delete_session_mysql, delete_session_sqlite,
    delete_sessions_for_user_mysql, delete_sessions_for_user_sqlite,
    update_session_activity_mysql, update_session_activity_sqlite,
};
pub use transition::{
    PersistTransitionResult, persist_transition_mysql, persist_transition_sqlite,
};
pub use users::{hash_password, update_password_mysql, update_password_sqlite};

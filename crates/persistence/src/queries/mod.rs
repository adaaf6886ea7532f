// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-only queries.
//!
//! Every query exists in two monomorphic versions generated by `backend_fn!`,
//! suffixed `_sqlite` and `_mysql`. The `Persistence` adapter in `lib.rs`
//! dispatches to the one matching its connection.

pub mod audit;
pub mod duties;
pub mod groups;
pub mod sessions;
pub mod users;

pub use audit::{
    get_audit_event_mysql, get_audit_event_sqlite, get_audit_timeline_mysql,
    get_audit_timeline_sqlite,
};
pub use duties::{
    get_duty_mysql, get_duty_sqlite, list_duties_between_mysql, list_duties_between_sqlite,
    list_duties_for_user_mysql, list_duties_for_user_sqlite, list_duties_mysql,
    list_duties_sqlite,
};
pub use groups::{
    get_group_mysql, get_group_sqlite, list_groups_for_user_mysql, list_groups_for_user_sqlite,
    list_groups_mysql, list_groups_sqlite,
};
pub use sessions::{get_session_by_token_mysql, get_session_by_token_sqlite};
pub use users::{
    count_users_mysql, count_users_sqlite, get_credentials_by_email_mysql,
    get_credentials_by_email_sqlite, get_password_hash_mysql, get_password_hash_sqlite,
    get_user_by_id_mysql, get_user_by_id_sqlite, list_users_mysql, list_users_sqlite,
    verify_password,
};

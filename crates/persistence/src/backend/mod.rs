// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Database backend-specific code.
//!
//! Only what cannot be written in backend-agnostic Diesel DSL lives here:
//! connection setup, embedded migrations, PRAGMA / system variable checks,
//! and the last-insert-id lookup. Roster queries and mutations live in
//! `queries/` and `mutations/` and run unchanged on every backend.
//!
//! - `sqlite`: default backend, used in-memory by the test suite
//! - `mysql`: MySQL/MariaDB, validated by opt-in tests

pub mod mysql;
pub mod sqlite;

use diesel::{Connection, MysqlConnection, SqliteConnection};

use crate::error::PersistenceError;

/// Operations whose SQL differs per backend.
///
/// Implemented for both connection types so that a single `backend_fn!`
/// body can call them on either.
pub trait PersistenceBackend: Connection {
    /// Id generated by the most recent insert on this connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn get_last_insert_rowid(&mut self) -> Result<i64, PersistenceError>;

    /// Startup check that referential integrity is enforced. Group
    /// memberships and sessions depend on cascading deletes.
    ///
    /// # Errors
    ///
    /// Returns an error if foreign key enforcement is not enabled.
    fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError>;
}

impl PersistenceBackend for SqliteConnection {
    fn get_last_insert_rowid(&mut self) -> Result<i64, PersistenceError> {
        sqlite::get_last_insert_rowid(self)
    }

    fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        sqlite::verify_foreign_key_enforcement(self)
    }
}

impl PersistenceBackend for MysqlConnection {
    fn get_last_insert_rowid(&mut self) -> Result<i64, PersistenceError> {
        mysql::get_last_insert_rowid(self)
    }

    fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        mysql::verify_foreign_key_enforcement(self)
    }
}

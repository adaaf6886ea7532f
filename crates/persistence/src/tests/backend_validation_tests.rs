// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Backend validation tests for `MariaDB`/`MySQL`.
//!
//! These check schema compatibility, not roster rules: migrations apply,
//! constraints fire, transactions roll back. Roster behaviour is covered by
//! the rest of the suite running against `SQLite`.
//!
//! Every test here is `#[ignore]` and runs only via `cargo xtask test-mariadb`,
//! which provisions the database and sets:
//! - `DATABASE_URL`
//! - `ROSTER_TEST_BACKEND=mariadb`
//!
//! Tests fail fast if either is missing. Writes happen inside a test
//! transaction so the shared database stays clean between runs.

use diesel::MysqlConnection;
use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use std::env;

use crate::backend::mysql;

/// Result type for COUNT queries.
#[derive(QueryableByName)]
struct CountResult {
    #[diesel(sql_type = BigInt)]
    count: i64,
}

/// Result type for `LAST_INSERT_ID` queries.
#[derive(QueryableByName)]
struct LastInsertIdResult {
    #[diesel(sql_type = BigInt)]
    id: i64,
}

const TS: &str = "2024-03-01T10:00:00.000000000Z";

/// # Panics
///
/// Panics if `DATABASE_URL` is not set.
fn get_mariadb_url() -> String {
    env::var("DATABASE_URL")
        .expect("DATABASE_URL not set - MariaDB tests must be run via `cargo xtask test-mariadb`")
}

/// # Panics
///
/// Panics if `ROSTER_TEST_BACKEND` is not `mariadb`.
fn verify_mariadb_test_environment() {
    let backend = env::var("ROSTER_TEST_BACKEND").expect(
        "ROSTER_TEST_BACKEND not set - MariaDB tests must be run via `cargo xtask test-mariadb`",
    );
    assert_eq!(backend, "mariadb", "ROSTER_TEST_BACKEND must be 'mariadb'");
}

/// Connects, migrates, and opens a transaction that is never committed.
fn test_connection() -> MysqlConnection {
    verify_mariadb_test_environment();
    let url = get_mariadb_url();
    let mut conn = mysql::initialize_database(&url).expect("Failed to initialize MariaDB database");
    conn.begin_test_transaction()
        .expect("Failed to begin test transaction");
    conn
}

fn insert_user(conn: &mut MysqlConnection, email: &str) -> i64 {
    diesel::sql_query(format!(
        "INSERT INTO users (full_name, email, rank_label, role, password_hash, created_at)
         VALUES ('Test User', '{email}', NULL, 'admin', 'hash', '{TS}')"
    ))
    .execute(conn)
    .expect("Failed to insert user");

    diesel::sql_query("SELECT LAST_INSERT_ID() as id")
        .get_result::<LastInsertIdResult>(conn)
        .map(|r| r.id)
        .expect("Failed to read user id")
}

#[test]
#[ignore = "requires MariaDB via cargo xtask test-mariadb"]
fn test_mariadb_connection() {
    verify_mariadb_test_environment();
    let url = get_mariadb_url();

    let result = MysqlConnection::establish(&url);
    assert!(
        result.is_ok(),
        "Failed to connect to MariaDB: {:?}",
        result.err()
    );
}

#[test]
#[ignore = "requires MariaDB via cargo xtask test-mariadb"]
fn test_mariadb_migrations_apply_cleanly() {
    verify_mariadb_test_environment();
    let url = get_mariadb_url();

    let result = mysql::initialize_database(&url);
    assert!(
        result.is_ok(),
        "Failed to initialize MariaDB and run migrations: {:?}",
        result.err()
    );
}

#[test]
#[ignore = "requires MariaDB via cargo xtask test-mariadb"]
fn test_mariadb_foreign_key_enforcement() {
    let mut conn = test_connection();

    let result = mysql::verify_foreign_key_enforcement(&mut conn);
    assert!(
        result.is_ok(),
        "Foreign key enforcement verification failed: {:?}",
        result.err()
    );
}

#[test]
#[ignore = "requires MariaDB via cargo xtask test-mariadb"]
fn test_mariadb_user_email_unique() {
    let mut conn = test_connection();
    insert_user(&mut conn, "unique@example.com");

    let duplicate = diesel::sql_query(format!(
        "INSERT INTO users (full_name, email, rank_label, role, password_hash, created_at)
         VALUES ('Another', 'unique@example.com', NULL, 'user', 'hash2', '{TS}')"
    ))
    .execute(&mut conn);

    assert!(
        duplicate.is_err(),
        "Duplicate email should fail due to UNIQUE constraint"
    );
}

#[test]
#[ignore = "requires MariaDB via cargo xtask test-mariadb"]
fn test_mariadb_group_member_foreign_keys() {
    let mut conn = test_connection();

    let result = diesel::sql_query(
        "INSERT INTO group_members (group_id, user_id, position) VALUES (99999, 99999, 0)",
    )
    .execute(&mut conn);

    assert!(
        result.is_err(),
        "Membership of a non-existent group should fail due to foreign key constraint"
    );
}

#[test]
#[ignore = "requires MariaDB via cargo xtask test-mariadb"]
fn test_mariadb_session_foreign_key() {
    let mut conn = test_connection();

    let result = diesel::sql_query(format!(
        "INSERT INTO sessions (session_token, user_id, created_at, last_activity_at, expires_at)
         VALUES ('orphan-token', 99999, '{TS}', '{TS}', '{TS}')"
    ))
    .execute(&mut conn);

    assert!(
        result.is_err(),
        "Session of a non-existent user should fail due to foreign key constraint"
    );
}

#[test]
#[ignore = "requires MariaDB via cargo xtask test-mariadb"]
fn test_mariadb_duty_owner_is_not_a_foreign_key() {
    let mut conn = test_connection();

    let result = diesel::sql_query(format!(
        "INSERT INTO duties
         (user_id, duty_type, position, shift_start, shift_end, rotation_cycle, notes, created_at)
         VALUES (99999, 'Patrol', 'Gate', '2024-03-01T08:00:00.000000000Z',
                 '2024-03-01T16:00:00.000000000Z', 'daily', NULL, '{TS}')"
    ))
    .execute(&mut conn);

    assert!(
        result.is_ok(),
        "Duties must accept owners that no longer exist: {:?}",
        result.err()
    );
}

#[test]
#[ignore = "requires MariaDB via cargo xtask test-mariadb"]
fn test_mariadb_member_rows_cascade_with_user() {
    let mut conn = test_connection();
    let user_id = insert_user(&mut conn, "cascade@example.com");
    diesel::sql_query(format!(
        "INSERT INTO roster_groups (name, description, created_at) VALUES ('Cascade', NULL, '{TS}')"
    ))
    .execute(&mut conn)
    .expect("Failed to insert group");
    let group_id: i64 = diesel::sql_query("SELECT LAST_INSERT_ID() as id")
        .get_result::<LastInsertIdResult>(&mut conn)
        .map(|r| r.id)
        .expect("Failed to read group id");
    diesel::sql_query(format!(
        "INSERT INTO group_members (group_id, user_id, position) VALUES ({group_id}, {user_id}, 0)"
    ))
    .execute(&mut conn)
    .expect("Failed to insert membership");

    diesel::sql_query(format!("DELETE FROM users WHERE user_id = {user_id}"))
        .execute(&mut conn)
        .expect("Failed to delete user");

    let count: i64 = diesel::sql_query(format!(
        "SELECT COUNT(*) as count FROM group_members WHERE group_id = {group_id}"
    ))
    .get_result::<CountResult>(&mut conn)
    .map(|r| r.count)
    .expect("Failed to count memberships");
    assert_eq!(count, 0, "Membership rows should cascade with their user");
}

#[test]
#[ignore = "requires MariaDB via cargo xtask test-mariadb"]
fn test_mariadb_transaction_rollback() {
    verify_mariadb_test_environment();
    let url = get_mariadb_url();

    let mut conn = mysql::initialize_database(&url).expect("Failed to initialize MariaDB database");
    conn.begin_test_transaction()
        .expect("Failed to begin transaction");

    insert_user(&mut conn, "rollback@example.com");

    let count: i64 = diesel::sql_query(
        "SELECT COUNT(*) as count FROM users WHERE email = 'rollback@example.com'",
    )
    .get_result::<CountResult>(&mut conn)
    .map(|r| r.count)
    .expect("Failed to count users");
    assert_eq!(count, 1, "User should exist within transaction");

    // test transactions roll back on drop
    drop(conn);

    let mut new_conn = mysql::initialize_database(&url).expect("Failed to reconnect to MariaDB");
    let count_after: i64 = diesel::sql_query(
        "SELECT COUNT(*) as count FROM users WHERE email = 'rollback@example.com'",
    )
    .get_result::<CountResult>(&mut new_conn)
    .map(|r| r.count)
    .expect("Failed to count users after rollback");

    assert_eq!(count_after, 0, "User should not exist after rollback");
}

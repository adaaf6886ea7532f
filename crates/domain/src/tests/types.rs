// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::helpers::{create_test_duty, create_test_group};
use crate::{DomainError, Duty, DutyStatus, ErrorKind, Role, RotationCycle};
use std::str::FromStr;
use time::macros::datetime;

#[test]
fn test_role_round_trips_through_strings() {
    assert_eq!(Role::from_str("admin").unwrap(), Role::Admin);
    assert_eq!(Role::from_str("user").unwrap(), Role::User);
    assert_eq!(Role::Admin.to_string(), "admin");
    assert!(matches!(
        Role::from_str("root"),
        Err(DomainError::InvalidRole(_))
    ));
}

#[test]
fn test_rotation_cycle_parsing() {
    assert_eq!(
        RotationCycle::from_str("weekly").unwrap(),
        RotationCycle::Weekly
    );
    assert_eq!(RotationCycle::Monthly.as_str(), "monthly");
    assert!(matches!(
        RotationCycle::from_str("hourly"),
        Err(DomainError::InvalidRotationCycle(_))
    ));
}

#[test]
fn test_domain_error_kinds() {
    assert_eq!(DomainError::UserNotFound(1).kind(), ErrorKind::NotFound);
    assert_eq!(DomainError::DutyNotFound(1).kind(), ErrorKind::NotFound);
    assert_eq!(DomainError::GroupNotFound(1).kind(), ErrorKind::NotFound);
    assert_eq!(DomainError::EmptyDateList.kind(), ErrorKind::Validation);
    assert_eq!(DomainError::EmptyField("position").kind(), ErrorKind::Validation);
    assert_eq!(
        DomainError::DuplicateEmail(String::from("a@b.c")).kind(),
        ErrorKind::Conflict
    );
}

#[test]
fn test_domain_error_display() {
    assert_eq!(
        DomainError::EmptyField("duty_type").to_string(),
        "Field 'duty_type' must not be empty"
    );
    assert_eq!(DomainError::DutyNotFound(7).to_string(), "Duty 7 not found");
}

#[test]
fn test_duty_status_scenario() {
    let patrol = create_test_duty(
        1,
        1,
        datetime!(2024-03-01 08:00 UTC),
        datetime!(2024-03-01 16:00 UTC),
    );
    let kitchen = create_test_duty(
        2,
        1,
        datetime!(2024-03-03 06:00 UTC),
        datetime!(2024-03-03 14:00 UTC),
    );
    let now = datetime!(2024-03-01 10:00 UTC);

    assert_eq!(patrol.status_at(now), DutyStatus::Active);
    assert_eq!(kitchen.status_at(now), DutyStatus::Upcoming);
    assert_eq!(
        patrol.status_at(datetime!(2024-03-02 00:00 UTC)),
        DutyStatus::Past
    );
}

#[test]
fn test_sort_key_orders_by_start_then_id() {
    let mut duties = vec![
        create_test_duty(
            3,
            1,
            datetime!(2024-03-03 06:00 UTC),
            datetime!(2024-03-03 14:00 UTC),
        ),
        create_test_duty(
            2,
            1,
            datetime!(2024-03-01 08:00 UTC),
            datetime!(2024-03-01 16:00 UTC),
        ),
        create_test_duty(
            1,
            1,
            datetime!(2024-03-01 08:00 UTC),
            datetime!(2024-03-01 12:00 UTC),
        ),
    ];

    duties.sort_by_key(Duty::sort_key);

    let ids: Vec<Option<i64>> = duties.iter().map(|d| d.duty_id).collect();
    assert_eq!(ids, vec![Some(1), Some(2), Some(3)]);
}

#[test]
fn test_group_has_member() {
    let group = create_test_group(1, vec![4, 5]);
    assert!(group.has_member(4));
    assert!(!group.has_member(6));
}

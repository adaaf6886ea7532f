// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Group schedule matrices.

use roster::ApplyContext;
use roster_domain::Role;
use roster_persistence::SqlitePersistence;

use crate::{
    ApiError, AuthenticatedActor, CreateGroupRequest, GroupScheduleRequest, UpdateGroupRequest,
    create_duty, create_group, group_schedule, update_group,
};

use super::helpers::{
    NOW, create_test_cause, create_test_context, seed_admin, seed_user, setup_test_persistence,
    window_request,
};

struct Roster {
    persistence: SqlitePersistence,
    admin: AuthenticatedActor,
    andrii: AuthenticatedActor,
    bohdan: AuthenticatedActor,
    dmytro: AuthenticatedActor,
    alpha: i64,
    bravo: i64,
    /// Andrii, 03-04 08:00-16:00.
    early: i64,
    /// Andrii, 03-04 12:00-20:00, overlapping `early`.
    late: i64,
    /// Bohdan, 03-05 22:00 to 03-06 06:00.
    night: i64,
}

fn group_with(
    persistence: &mut SqlitePersistence,
    admin: &AuthenticatedActor,
    name: &str,
    member_ids: Vec<i64>,
) -> i64 {
    let ctx = create_test_context();
    let group_id = create_group(
        persistence,
        &ctx,
        &CreateGroupRequest {
            name: name.to_string(),
            description: None,
        },
        admin,
        create_test_cause(),
    )
    .unwrap()
    .group
    .group_id;
    update_group(
        persistence,
        &ctx,
        group_id,
        &UpdateGroupRequest {
            name: name.to_string(),
            description: None,
            member_ids,
        },
        admin,
        create_test_cause(),
    )
    .unwrap();
    group_id
}

fn duty(
    persistence: &mut SqlitePersistence,
    admin: &AuthenticatedActor,
    user_id: i64,
    start: &str,
    end: &str,
) -> i64 {
    create_duty(
        persistence,
        &create_test_context(),
        &window_request(user_id, start, end),
        admin,
        create_test_cause(),
    )
    .unwrap()
    .duty
    .duty_id
}

fn setup_roster() -> Roster {
    let mut persistence = setup_test_persistence();
    let admin = seed_admin(&mut persistence);
    let andrii = seed_user(&mut persistence, "Andrii Bondar", Role::User);
    let bohdan = seed_user(&mut persistence, "Bohdan Savchuk", Role::User);
    let dmytro = seed_user(&mut persistence, "Dmytro Hnatiuk", Role::User);

    let alpha = group_with(
        &mut persistence,
        &admin,
        "Alpha",
        vec![andrii.user_id, bohdan.user_id],
    );
    let bravo = group_with(
        &mut persistence,
        &admin,
        "Bravo",
        vec![bohdan.user_id, dmytro.user_id],
    );

    let late = duty(
        &mut persistence,
        &admin,
        andrii.user_id,
        "2024-03-04T12:00",
        "2024-03-04T20:00",
    );
    let early = duty(
        &mut persistence,
        &admin,
        andrii.user_id,
        "2024-03-04T08:00",
        "2024-03-04T16:00",
    );
    let night = duty(
        &mut persistence,
        &admin,
        bohdan.user_id,
        "2024-03-05T22:00",
        "2024-03-06T06:00",
    );
    duty(
        &mut persistence,
        &admin,
        dmytro.user_id,
        "2024-03-09T08:00",
        "2024-03-09T16:00",
    );
    duty(
        &mut persistence,
        &admin,
        andrii.user_id,
        "2024-03-12T08:00",
        "2024-03-12T16:00",
    );

    Roster {
        persistence,
        admin,
        andrii,
        bohdan,
        dmytro,
        alpha,
        bravo,
        early,
        late,
        night,
    }
}

fn week_request(group_ids: Vec<i64>) -> GroupScheduleRequest {
    GroupScheduleRequest {
        group_ids,
        week_of: Some(String::from("2024-03-06")),
        ..GroupScheduleRequest::default()
    }
}

#[test]
fn test_week_schedule_for_one_group() {
    let mut roster = setup_roster();

    let schedule = group_schedule(
        &mut roster.persistence,
        &create_test_context(),
        &week_request(vec![roster.alpha]),
        &roster.admin,
    )
    .unwrap();

    assert_eq!(schedule.dates.len(), 7);
    assert_eq!(schedule.dates[0], "2024-03-04");
    assert_eq!(schedule.dates[6], "2024-03-10");

    let row_users: Vec<i64> = schedule.rows.iter().map(|r| r.user_id).collect();
    assert_eq!(row_users, vec![roster.andrii.user_id, roster.bohdan.user_id]);

    let andrii = &schedule.rows[0];
    assert_eq!(andrii.full_name, "Andrii Bondar");
    assert_eq!(andrii.cells[0], vec![roster.early, roster.late]);
    assert!(andrii.cells[1..].iter().all(Vec::is_empty));

    let bohdan = &schedule.rows[1];
    assert!(bohdan.cells[0].is_empty());
    assert_eq!(bohdan.cells[1], vec![roster.night]);
    assert_eq!(bohdan.cells[2], vec![roster.night]);

    assert_eq!(
        schedule.uncovered_dates,
        vec!["2024-03-07", "2024-03-08", "2024-03-09", "2024-03-10"]
    );

    assert_eq!(schedule.overlaps.len(), 1);
    assert_eq!(schedule.overlaps[0].user_id, roster.andrii.user_id);
    assert_eq!(schedule.overlaps[0].first_duty_id, roster.early);
    assert_eq!(schedule.overlaps[0].second_duty_id, roster.late);

    let duty_ids: Vec<i64> = schedule.duties.iter().map(|d| d.duty_id).collect();
    assert_eq!(duty_ids, vec![roster.early, roster.late, roster.night]);
}

#[test]
fn test_schedule_merges_members_across_groups() {
    let mut roster = setup_roster();

    let schedule = group_schedule(
        &mut roster.persistence,
        &create_test_context(),
        &week_request(vec![roster.alpha, roster.bravo]),
        &roster.admin,
    )
    .unwrap();

    let row_users: Vec<i64> = schedule.rows.iter().map(|r| r.user_id).collect();
    assert_eq!(
        row_users,
        vec![
            roster.andrii.user_id,
            roster.bohdan.user_id,
            roster.dmytro.user_id
        ]
    );
    assert_eq!(
        schedule.uncovered_dates,
        vec!["2024-03-07", "2024-03-08", "2024-03-10"]
    );
}

#[test]
fn test_schedule_is_repeatable() {
    let mut roster = setup_roster();
    let ctx = create_test_context();
    let request = week_request(vec![roster.alpha, roster.bravo]);

    let first = group_schedule(&mut roster.persistence, &ctx, &request, &roster.admin).unwrap();
    let second = group_schedule(&mut roster.persistence, &ctx, &request, &roster.admin).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_schedule_buckets_by_roster_timezone() {
    let mut roster = setup_roster();
    let kyiv = ApplyContext::new(chrono_tz::Europe::Kyiv, NOW);

    // 22:00 UTC on 03-05 is already 03-06 in Kyiv (UTC+2)
    let schedule = group_schedule(
        &mut roster.persistence,
        &kyiv,
        &week_request(vec![roster.alpha]),
        &roster.admin,
    )
    .unwrap();

    let bohdan = &schedule.rows[1];
    assert!(bohdan.cells[1].is_empty());
    assert_eq!(bohdan.cells[2], vec![roster.night]);
}

#[test]
fn test_month_schedule_covers_whole_month() {
    let mut roster = setup_roster();

    let schedule = group_schedule(
        &mut roster.persistence,
        &create_test_context(),
        &GroupScheduleRequest {
            group_ids: vec![roster.alpha],
            month: Some(String::from("2024-02")),
            ..GroupScheduleRequest::default()
        },
        &roster.admin,
    )
    .unwrap();

    assert_eq!(schedule.dates.len(), 29);
    assert_eq!(schedule.uncovered_dates.len(), 29);
    assert!(schedule.duties.is_empty());
}

#[test]
fn test_schedule_members_only() {
    let mut roster = setup_roster();
    let ctx = create_test_context();

    assert!(
        group_schedule(
            &mut roster.persistence,
            &ctx,
            &week_request(vec![roster.alpha]),
            &roster.andrii,
        )
        .is_ok()
    );
    assert!(matches!(
        group_schedule(
            &mut roster.persistence,
            &ctx,
            &week_request(vec![roster.alpha, roster.bravo]),
            &roster.andrii,
        ),
        Err(ApiError::Unauthorized { .. })
    ));
    assert!(matches!(
        group_schedule(
            &mut roster.persistence,
            &ctx,
            &week_request(vec![4242]),
            &roster.admin,
        ),
        Err(ApiError::ResourceNotFound { .. })
    ));
}

#[test]
fn test_schedule_rejects_bad_ranges() {
    let mut roster = setup_roster();
    let ctx = create_test_context();
    let alpha = roster.alpha;

    let requests = [
        GroupScheduleRequest {
            group_ids: vec![alpha],
            start: Some(String::from("2024-03-10")),
            end: Some(String::from("2024-03-01")),
            ..GroupScheduleRequest::default()
        },
        GroupScheduleRequest {
            group_ids: vec![alpha],
            start: Some(String::from("2024-01-01")),
            end: Some(String::from("2025-01-02")),
            ..GroupScheduleRequest::default()
        },
        GroupScheduleRequest {
            group_ids: vec![alpha],
            month: Some(String::from("2024-13")),
            ..GroupScheduleRequest::default()
        },
        GroupScheduleRequest {
            group_ids: vec![alpha],
            month: Some(String::from("2024-03")),
            week_of: Some(String::from("2024-03-06")),
            ..GroupScheduleRequest::default()
        },
        GroupScheduleRequest {
            group_ids: vec![alpha],
            ..GroupScheduleRequest::default()
        },
        GroupScheduleRequest {
            group_ids: vec![],
            week_of: Some(String::from("2024-03-06")),
            ..GroupScheduleRequest::default()
        },
    ];

    for request in &requests {
        let result = group_schedule(&mut roster.persistence, &ctx, request, &roster.admin);
        assert!(
            matches!(result, Err(ApiError::InvalidInput { .. })),
            "{request:?} gave {result:?}"
        );
    }
}

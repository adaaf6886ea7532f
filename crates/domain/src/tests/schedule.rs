// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::helpers::{create_test_duty, create_test_group, create_test_user};
use crate::{
    DateRange, DomainError, Duty, MAX_RANGE_DAYS, ScheduleMatrix, ShiftWindow, User,
    build_range_matrix, resolve_members,
};
use time::Month;
use time::macros::{date, datetime};

fn cell_ids(matrix: &ScheduleMatrix<'_>) -> Vec<Vec<Vec<Option<i64>>>> {
    matrix
        .rows
        .iter()
        .map(|row| {
            row.cells
                .iter()
                .map(|cell| cell.iter().map(|d| d.duty_id).collect())
                .collect()
        })
        .collect()
}

fn march_duties() -> Vec<Duty> {
    vec![
        create_test_duty(
            1,
            1,
            datetime!(2024-03-01 08:00 UTC),
            datetime!(2024-03-01 16:00 UTC),
        ),
        create_test_duty(
            2,
            1,
            datetime!(2024-03-03 06:00 UTC),
            datetime!(2024-03-03 14:00 UTC),
        ),
        create_test_duty(
            3,
            2,
            datetime!(2024-03-01 22:00 UTC),
            datetime!(2024-03-02 06:00 UTC),
        ),
    ]
}

#[test]
fn test_matrix_places_duties_by_member_and_date() {
    let users = vec![create_test_user(1, "Alpha"), create_test_user(2, "Bravo")];
    let members: Vec<&User> = users.iter().collect();
    let duties = march_duties();
    let range = DateRange::new(date!(2024 - 03 - 01), date!(2024 - 03 - 04)).unwrap();

    let matrix = build_range_matrix(&members, &duties, &range, chrono_tz::UTC).unwrap();

    assert_eq!(matrix.dates.len(), 4);
    assert_eq!(matrix.rows.len(), 2);
    assert_eq!(
        cell_ids(&matrix),
        vec![
            vec![vec![Some(1)], vec![], vec![Some(2)], vec![]],
            vec![vec![Some(3)], vec![Some(3)], vec![], vec![]],
        ]
    );
}

#[test]
fn test_matrix_is_deterministic_and_ignores_duty_order() {
    let users = vec![create_test_user(1, "Alpha"), create_test_user(2, "Bravo")];
    let members: Vec<&User> = users.iter().collect();
    let duties = march_duties();
    let mut reversed = march_duties();
    reversed.reverse();
    let range = DateRange::new(date!(2024 - 03 - 01), date!(2024 - 03 - 04)).unwrap();

    let first = build_range_matrix(&members, &duties, &range, chrono_tz::UTC).unwrap();
    let second = build_range_matrix(&members, &duties, &range, chrono_tz::UTC).unwrap();
    let permuted = build_range_matrix(&members, &reversed, &range, chrono_tz::UTC).unwrap();

    assert_eq!(first, second);
    assert_eq!(cell_ids(&first), cell_ids(&permuted));
}

#[test]
fn test_matrix_cell_orders_duties_by_start() {
    let users = vec![create_test_user(1, "Alpha")];
    let members: Vec<&User> = users.iter().collect();
    let duties = vec![
        create_test_duty(
            9,
            1,
            datetime!(2024-03-01 18:00 UTC),
            datetime!(2024-03-01 20:00 UTC),
        ),
        create_test_duty(
            4,
            1,
            datetime!(2024-03-01 06:00 UTC),
            datetime!(2024-03-01 08:00 UTC),
        ),
    ];
    let range = DateRange::new(date!(2024 - 03 - 01), date!(2024 - 03 - 01)).unwrap();

    let matrix = build_range_matrix(&members, &duties, &range, chrono_tz::UTC).unwrap();

    assert_eq!(cell_ids(&matrix), vec![vec![vec![Some(4), Some(9)]]]);
}

#[test]
fn test_matrix_uses_timezone_for_day_boundaries() {
    let users = vec![create_test_user(1, "Alpha")];
    let members: Vec<&User> = users.iter().collect();
    // 23:00 UTC on the 1st is 01:00 on the 2nd in Kyiv
    let duties = vec![create_test_duty(
        1,
        1,
        datetime!(2024-03-01 23:00 UTC),
        datetime!(2024-03-02 03:00 UTC),
    )];
    let range = DateRange::new(date!(2024 - 03 - 01), date!(2024 - 03 - 02)).unwrap();
    let kyiv: chrono_tz::Tz = "Europe/Kyiv".parse().unwrap();

    let utc_matrix = build_range_matrix(&members, &duties, &range, chrono_tz::UTC).unwrap();
    let kyiv_matrix = build_range_matrix(&members, &duties, &range, kyiv).unwrap();

    assert_eq!(
        cell_ids(&utc_matrix),
        vec![vec![vec![Some(1)], vec![Some(1)]]]
    );
    assert_eq!(cell_ids(&kyiv_matrix), vec![vec![vec![], vec![Some(1)]]]);
}

#[test]
fn test_matrix_date_only_duty_matches_its_date_exactly() {
    let users = vec![create_test_user(1, "Alpha")];
    let members: Vec<&User> = users.iter().collect();
    let mut duty = create_test_duty(
        1,
        1,
        datetime!(2024-03-01 00:00 UTC),
        datetime!(2024-03-01 01:00 UTC),
    );
    duty.window = ShiftWindow::all_day(date!(2024 - 03 - 02), chrono_tz::UTC).unwrap();
    let duties = vec![duty];
    let range = DateRange::new(date!(2024 - 03 - 01), date!(2024 - 03 - 03)).unwrap();

    let matrix = build_range_matrix(&members, &duties, &range, chrono_tz::UTC).unwrap();

    assert_eq!(
        cell_ids(&matrix),
        vec![vec![vec![], vec![Some(1)], vec![]]]
    );
}

#[test]
fn test_matrix_clips_duties_to_range_and_ignores_non_members() {
    let users = vec![create_test_user(1, "Alpha")];
    let members: Vec<&User> = users.iter().collect();
    let duties = vec![
        create_test_duty(
            1,
            1,
            datetime!(2024-02-28 08:00 UTC),
            datetime!(2024-03-02 08:00 UTC),
        ),
        create_test_duty(
            2,
            99,
            datetime!(2024-03-01 08:00 UTC),
            datetime!(2024-03-01 09:00 UTC),
        ),
    ];
    let range = DateRange::new(date!(2024 - 03 - 01), date!(2024 - 03 - 03)).unwrap();

    let matrix = build_range_matrix(&members, &duties, &range, chrono_tz::UTC).unwrap();

    assert_eq!(
        cell_ids(&matrix),
        vec![vec![vec![Some(1)], vec![Some(1)], vec![]]]
    );
}

#[test]
fn test_matrix_deduplicates_members() {
    let users = vec![create_test_user(1, "Alpha"), create_test_user(2, "Bravo")];
    let members = vec![&users[1], &users[0], &users[1]];
    let duties = march_duties();
    let range = DateRange::new(date!(2024 - 03 - 01), date!(2024 - 03 - 01)).unwrap();

    let matrix = build_range_matrix(&members, &duties, &range, chrono_tz::UTC).unwrap();

    let row_ids: Vec<Option<i64>> = matrix.rows.iter().map(|r| r.user.user_id).collect();
    assert_eq!(row_ids, vec![Some(2), Some(1)]);
}

#[test]
fn test_uncovered_dates_surface_gaps() {
    let users = vec![create_test_user(1, "Alpha"), create_test_user(2, "Bravo")];
    let members: Vec<&User> = users.iter().collect();
    let duties = march_duties();
    let range = DateRange::new(date!(2024 - 03 - 01), date!(2024 - 03 - 05)).unwrap();

    let matrix = build_range_matrix(&members, &duties, &range, chrono_tz::UTC).unwrap();

    assert_eq!(
        matrix.uncovered_dates(),
        vec![date!(2024 - 03 - 04), date!(2024 - 03 - 05)]
    );
    assert_eq!(matrix.staffed_cell_count(), 4);
}

#[test]
fn test_overlaps_are_reported_per_member() {
    let users = vec![create_test_user(1, "Alpha"), create_test_user(2, "Bravo")];
    let members: Vec<&User> = users.iter().collect();
    let duties = vec![
        create_test_duty(
            1,
            1,
            datetime!(2024-03-01 08:00 UTC),
            datetime!(2024-03-01 16:00 UTC),
        ),
        create_test_duty(
            2,
            1,
            datetime!(2024-03-01 12:00 UTC),
            datetime!(2024-03-01 20:00 UTC),
        ),
        create_test_duty(
            3,
            1,
            datetime!(2024-03-01 20:00 UTC),
            datetime!(2024-03-01 22:00 UTC),
        ),
        create_test_duty(
            4,
            2,
            datetime!(2024-03-01 12:00 UTC),
            datetime!(2024-03-01 20:00 UTC),
        ),
    ];
    let range = DateRange::new(date!(2024 - 03 - 01), date!(2024 - 03 - 01)).unwrap();

    let matrix = build_range_matrix(&members, &duties, &range, chrono_tz::UTC).unwrap();
    let overlaps = matrix.overlaps();

    assert_eq!(overlaps.len(), 1);
    assert_eq!(overlaps[0].user_id, 1);
    assert_eq!(overlaps[0].first.duty_id, Some(1));
    assert_eq!(overlaps[0].second.duty_id, Some(2));
}

#[test]
fn test_group_matrix_resolves_members_in_group_order() {
    let users = vec![create_test_user(1, "Alpha"), create_test_user(2, "Bravo")];
    let group = create_test_group(10, vec![2, 42, 1]);
    let duties = march_duties();
    let range = DateRange::new(date!(2024 - 03 - 01), date!(2024 - 03 - 02)).unwrap();

    let members = resolve_members(&group, &users);
    let matrix = build_range_matrix(&members, &duties, &range, chrono_tz::UTC).unwrap();

    let row_ids: Vec<Option<i64>> = matrix.rows.iter().map(|r| r.user.user_id).collect();
    assert_eq!(row_ids, vec![Some(2), Some(1)]);
    assert_eq!(matrix.cell(0, 1).unwrap().len(), 1);
    assert!(matrix.cell(5, 0).is_none());
}

#[test]
fn test_date_range_rejects_reversed_bounds() {
    let result = DateRange::new(date!(2024 - 03 - 02), date!(2024 - 03 - 01));
    assert!(matches!(result, Err(DomainError::InvalidDateRange { .. })));
}

#[test]
fn test_date_range_rejects_overlong_range() {
    let result = DateRange::new(date!(2024 - 01 - 01), date!(2025 - 06 - 01));
    assert!(matches!(
        result,
        Err(DomainError::DateRangeTooLong { max: MAX_RANGE_DAYS, .. })
    ));
}

#[test]
fn test_date_range_month_handles_leap_year_and_december() {
    let february = DateRange::month(2024, Month::February).unwrap();
    assert_eq!(february.start(), date!(2024 - 02 - 01));
    assert_eq!(february.end(), date!(2024 - 02 - 29));
    assert_eq!(february.dates().len(), 29);

    let december = DateRange::month(2024, Month::December).unwrap();
    assert_eq!(december.end(), date!(2024 - 12 - 31));
}

#[test]
fn test_date_range_week_runs_monday_to_sunday() {
    // 2024-03-06 is a Wednesday
    let week = DateRange::week_of(date!(2024 - 03 - 06)).unwrap();
    assert_eq!(week.start(), date!(2024 - 03 - 04));
    assert_eq!(week.end(), date!(2024 - 03 - 10));
    assert_eq!(week.len_days(), 7);
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Schedule matrix projection.
//!
//! Builds a dense members × dates grid of duties for calendar views. The
//! grid is computed from its arguments only: the same members, duties, range
//! and timezone always produce the same matrix, whatever order the duties
//! arrive in.
//!
//! A duty lands in every cell whose date lies between the first and last
//! local calendar day its window touches (see `ShiftWindow::local_days`).
//! Within a cell duties are ordered by start, then id.

use crate::error::DomainError;
use crate::membership::merge_members;
use crate::types::{Duty, User};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use time::{Date, Duration, Month};

/// Longest date range a matrix may cover.
pub const MAX_RANGE_DAYS: i64 = 366;

/// An inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    start: Date,
    end: Date,
}

impl DateRange {
    /// Creates an inclusive range `start..=end`.
    ///
    /// # Errors
    ///
    /// Returns an error if `end < start` or the range exceeds
    /// `MAX_RANGE_DAYS` days.
    pub fn new(start: Date, end: Date) -> Result<Self, DomainError> {
        if end < start {
            return Err(DomainError::InvalidDateRange { start, end });
        }
        let days = (end - start).whole_days() + 1;
        if days > MAX_RANGE_DAYS {
            return Err(DomainError::DateRangeTooLong {
                days,
                max: MAX_RANGE_DAYS,
            });
        }
        Ok(Self { start, end })
    }

    /// The whole calendar month.
    ///
    /// # Errors
    ///
    /// Returns an error if the month lies outside the representable range.
    pub fn month(year: i32, month: Month) -> Result<Self, DomainError> {
        let overflow = || DomainError::DateArithmeticOverflow {
            operation: format!("month {year}-{:02}", u8::from(month)),
        };
        let start = Date::from_calendar_date(year, month, 1).map_err(|_| overflow())?;
        let next_month_start = if month == Month::December {
            Date::from_calendar_date(year + 1, Month::January, 1)
        } else {
            Date::from_calendar_date(year, month.next(), 1)
        }
        .map_err(|_| overflow())?;
        let end = next_month_start.previous_day().ok_or_else(overflow)?;
        Self::new(start, end)
    }

    /// The Monday-to-Sunday week containing `date`.
    ///
    /// # Errors
    ///
    /// Returns an error if the week lies outside the representable range.
    pub fn week_of(date: Date) -> Result<Self, DomainError> {
        let overflow = || DomainError::DateArithmeticOverflow {
            operation: format!("week of {date}"),
        };
        let back = i64::from(date.weekday().number_days_from_monday());
        let start = date
            .checked_sub(Duration::days(back))
            .ok_or_else(overflow)?;
        let end = start.checked_add(Duration::days(6)).ok_or_else(overflow)?;
        Self::new(start, end)
    }

    /// First day.
    #[must_use]
    pub const fn start(&self) -> Date {
        self.start
    }

    /// Last day.
    #[must_use]
    pub const fn end(&self) -> Date {
        self.end
    }

    /// Number of days in the range.
    #[must_use]
    pub fn len_days(&self) -> usize {
        usize::try_from((self.end - self.start).whole_days() + 1).unwrap_or(0)
    }

    /// Returns true if `date` lies within the range.
    #[must_use]
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }

    /// Every date of the range, in order.
    #[must_use]
    pub fn dates(&self) -> Vec<Date> {
        let mut dates = Vec::with_capacity(self.len_days());
        let mut current = Some(self.start);
        while let Some(date) = current.filter(|d| *d <= self.end) {
            dates.push(date);
            current = date.next_day();
        }
        dates
    }

    fn index_of(&self, date: Date) -> Option<usize> {
        if self.contains(date) {
            usize::try_from((date - self.start).whole_days()).ok()
        } else {
            None
        }
    }
}

/// One member's row of the matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixRow<'a> {
    /// The member.
    pub user: &'a User,
    /// One cell per date of the range. Each cell lists the member's duties
    /// touching that date.
    pub cells: Vec<Vec<&'a Duty>>,
}

impl<'a> MatrixRow<'a> {
    /// Distinct duties in this row, ordered by start then id.
    #[must_use]
    pub fn duties(&self) -> Vec<&'a Duty> {
        distinct_row_duties(self)
    }
}

/// Two duties of the same member whose windows intersect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DutyOverlap<'a> {
    /// Owner of both duties.
    pub user_id: i64,
    /// The duty starting first.
    pub first: &'a Duty,
    /// The duty starting second.
    pub second: &'a Duty,
}

/// Dense members × dates grid of duties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleMatrix<'a> {
    /// The dates forming the columns.
    pub dates: Vec<Date>,
    /// One row per member, in member order.
    pub rows: Vec<MatrixRow<'a>>,
}

impl<'a> ScheduleMatrix<'a> {
    /// The cell for a member row and date column.
    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> Option<&[&'a Duty]> {
        self.rows
            .get(row)
            .and_then(|r| r.cells.get(column))
            .map(Vec::as_slice)
    }

    /// Dates on which no member holds any duty.
    #[must_use]
    pub fn uncovered_dates(&self) -> Vec<Date> {
        self.dates
            .iter()
            .enumerate()
            .filter(|(column, _)| {
                self.rows
                    .iter()
                    .all(|row| row.cells.get(*column).is_none_or(Vec::is_empty))
            })
            .map(|(_, date)| *date)
            .collect()
    }

    /// Pairs of duties held by the same member at the same time.
    ///
    /// Only duties visible in the matrix are considered. Overlaps are
    /// reported for review; nothing prevents them from being created.
    #[must_use]
    pub fn overlaps(&self) -> Vec<DutyOverlap<'a>> {
        let mut overlaps = Vec::new();
        for row in &self.rows {
            let Some(user_id) = row.user.user_id else {
                continue;
            };
            let duties = distinct_row_duties(row);
            for (i, &first) in duties.iter().enumerate() {
                for &second in duties.iter().skip(i + 1) {
                    // sorted by start: nothing later can overlap `first`
                    if second.window.start() >= first.window.end() {
                        break;
                    }
                    if first.window.overlaps(&second.window) {
                        overlaps.push(DutyOverlap {
                            user_id,
                            first,
                            second,
                        });
                    }
                }
            }
        }
        overlaps
    }

    /// Number of (member, date) cells holding at least one duty.
    #[must_use]
    pub fn staffed_cell_count(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|row| row.cells.iter())
            .filter(|cell| !cell.is_empty())
            .count()
    }
}

fn distinct_row_duties<'a>(row: &MatrixRow<'a>) -> Vec<&'a Duty> {
    let mut duties: Vec<&'a Duty> = Vec::new();
    for duty in row.cells.iter().flatten() {
        if !duties.iter().any(|d| std::ptr::eq(*d, *duty)) {
            duties.push(duty);
        }
    }
    duties.sort_by(|a, b| compare_duties(a, b));
    duties
}

/// Total order on duties: start, id, end, type, position.
fn compare_duties(a: &Duty, b: &Duty) -> Ordering {
    a.window
        .start()
        .cmp(&b.window.start())
        .then_with(|| a.duty_id.cmp(&b.duty_id))
        .then_with(|| a.window.end().cmp(&b.window.end()))
        .then_with(|| a.duty_type.cmp(&b.duty_type))
        .then_with(|| a.position.cmp(&b.position))
}

/// Builds the members × dates matrix.
///
/// Members are de-duplicated by id, keeping first-seen order. Duties owned by
/// anyone outside `members`, or not touching the range, are ignored.
///
/// # Errors
///
/// Returns an error if a duty window cannot be converted to local dates in
/// `tz`.
pub fn build_range_matrix<'a>(
    members: &[&'a User],
    duties: &'a [Duty],
    range: &DateRange,
    tz: Tz,
) -> Result<ScheduleMatrix<'a>, DomainError> {
    let members = merge_members([members.to_vec()]);
    let columns = range.len_days();

    let mut rows: Vec<MatrixRow<'a>> = members
        .iter()
        .map(|user| MatrixRow {
            user: *user,
            cells: vec![Vec::new(); columns],
        })
        .collect();

    let row_by_user: HashMap<i64, usize> = members
        .iter()
        .enumerate()
        .filter_map(|(index, user)| user.user_id.map(|id| (id, index)))
        .collect();

    let mut ordered: Vec<&'a Duty> = duties
        .iter()
        .filter(|duty| row_by_user.contains_key(&duty.user_id))
        .collect();
    ordered.sort_by(|a, b| compare_duties(a, b));

    for duty in ordered {
        let Some(row) = row_by_user.get(&duty.user_id).and_then(|i| rows.get_mut(*i)) else {
            continue;
        };
        let (first, last) = duty.window.local_days(tz)?;
        if last < range.start() || first > range.end() {
            continue;
        }
        let from = first.max(range.start());
        let to = last.min(range.end());
        let (Some(from_index), Some(to_index)) = (range.index_of(from), range.index_of(to))
        else {
            continue;
        };
        for cell in row.cells.iter_mut().take(to_index + 1).skip(from_index) {
            cell.push(duty);
        }
    }

    Ok(ScheduleMatrix {
        dates: range.dates(),
        rows,
    })
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Shift windows and their calendar arithmetic.
//!
//! A duty is always stored as a UTC timestamp window. Wall-clock input
//! (a calendar date, a time of day, a naive local timestamp) is interpreted
//! in the single roster timezone and converted once, at the boundary.
//!
//! ## Invariants
//!
//! - `end` is strictly after `start`
//! - A date-only duty is the window `[date 00:00, next day 00:00)` in the
//!   roster timezone
//! - A bulk shift whose end time of day is earlier than its start time of day
//!   ends on the following calendar day, for every date in the batch
//! - Calendar-day bounds resolve to the first instant of that local day, even
//!   where a DST transition skips or repeats midnight
//! - Explicit local times that are ambiguous or skipped by a DST transition
//!   are rejected

use crate::error::DomainError;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time};

const MINUTES_PER_DAY: i64 = 24 * 60;

/// A validated shift window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShiftWindow {
    #[serde(with = "time::serde::rfc3339")]
    start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    end: OffsetDateTime,
}

/// Read-time classification of a duty relative to a reference instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DutyStatus {
    /// Starts after the reference time.
    Upcoming,
    /// The reference time lies within the window, bounds included.
    Active,
    /// Ended before the reference time.
    Past,
}

impl DutyStatus {
    /// Converts this status to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Active => "active",
            Self::Past => "past",
        }
    }
}

impl std::fmt::Display for DutyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ShiftWindow {
    /// Creates a shift window, normalising both bounds to UTC.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidShiftWindow` unless `end > start`.
    pub fn new(start: OffsetDateTime, end: OffsetDateTime) -> Result<Self, DomainError> {
        if end <= start {
            return Err(DomainError::InvalidShiftWindow { start, end });
        }
        Ok(Self {
            start: start.to_offset(time::UtcOffset::UTC),
            end: end.to_offset(time::UtcOffset::UTC),
        })
    }

    /// The full calendar day `date` in `tz`, from the start of that local day
    /// to the start of the next one.
    ///
    /// Where a DST transition skips midnight the day starts at the first
    /// valid local time; where it repeats midnight the earlier one is used.
    ///
    /// # Errors
    ///
    /// Returns an error if the date is the last representable day, or if the
    /// whole day is skipped in `tz`.
    pub fn all_day(date: Date, tz: Tz) -> Result<Self, DomainError> {
        let next = date
            .next_day()
            .ok_or_else(|| DomainError::DateArithmeticOverflow {
                operation: format!("day after {date}"),
            })?;
        Self::new(day_start(date, tz)?, day_start(next, tz)?)
    }

    /// Window start (UTC).
    #[must_use]
    pub const fn start(&self) -> OffsetDateTime {
        self.start
    }

    /// Window end (UTC).
    #[must_use]
    pub const fn end(&self) -> OffsetDateTime {
        self.end
    }

    /// Derives the status of this window at `now`.
    #[must_use]
    pub fn status_at(&self, now: OffsetDateTime) -> DutyStatus {
        if self.start > now {
            DutyStatus::Upcoming
        } else if self.end < now {
            DutyStatus::Past
        } else {
            DutyStatus::Active
        }
    }

    /// Returns true if both windows share some instant other than a touching
    /// boundary.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// First and last local calendar days touched by this window in `tz`.
    ///
    /// An end that falls exactly on the start of a local day does not touch
    /// that day, so a full-day window covers exactly one date.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::DateArithmeticOverflow` if the conversion leaves
    /// the representable range.
    pub fn local_days(&self, tz: Tz) -> Result<(Date, Date), DomainError> {
        let (first, _) = instant_to_local(self.start, tz)?;
        let (mut last, _) = instant_to_local(self.end, tz)?;
        if last > first && self.end == day_start(last, tz)? {
            last = last
                .previous_day()
                .ok_or_else(|| DomainError::DateArithmeticOverflow {
                    operation: format!("day before {last}"),
                })?;
        }
        Ok((first, last))
    }
}

/// Parses an IANA timezone name.
///
/// # Errors
///
/// Returns `DomainError::InvalidTimezone` for unknown names.
pub fn parse_timezone(name: &str) -> Result<Tz, DomainError> {
    name.trim()
        .parse()
        .map_err(|_| DomainError::InvalidTimezone(name.to_string()))
}

/// Parses a `YYYY-MM-DD` calendar date.
///
/// # Errors
///
/// Returns `DomainError::DateParseError` on malformed input.
pub fn parse_date(input: &str) -> Result<Date, DomainError> {
    Date::parse(input.trim(), format_description!("[year]-[month]-[day]")).map_err(|e| {
        DomainError::DateParseError {
            input: input.to_string(),
            error: e.to_string(),
        }
    })
}

/// Parses a `HH:MM` or `HH:MM:SS` time of day.
///
/// # Errors
///
/// Returns `DomainError::DateParseError` on malformed input.
pub fn parse_time_of_day(input: &str) -> Result<Time, DomainError> {
    let trimmed = input.trim();
    Time::parse(trimmed, format_description!("[hour]:[minute]:[second]"))
        .or_else(|_| Time::parse(trimmed, format_description!("[hour]:[minute]")))
        .map_err(|e| DomainError::DateParseError {
            input: input.to_string(),
            error: e.to_string(),
        })
}

/// Parses a timestamp.
///
/// RFC 3339 input carries its own offset. Naive input such as
/// `2024-03-01T08:00` is wall-clock time in `tz`.
///
/// # Errors
///
/// Returns `DomainError::DateParseError` on malformed input, or
/// `DomainError::UnresolvableLocalTime` if a naive time falls in a DST gap
/// or overlap.
pub fn parse_instant(input: &str, tz: Tz) -> Result<OffsetDateTime, DomainError> {
    let trimmed = input.trim();
    if let Ok(instant) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Ok(instant);
    }

    let naive = PrimitiveDateTime::parse(
        trimmed,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    )
    .or_else(|_| {
        PrimitiveDateTime::parse(
            trimmed,
            format_description!("[year]-[month]-[day]T[hour]:[minute]"),
        )
    })
    .map_err(|e| DomainError::DateParseError {
        input: input.to_string(),
        error: e.to_string(),
    })?;

    local_to_instant(naive.date(), naive.time(), tz)
}

/// Parses every date of a bulk request, failing on the first malformed one.
///
/// # Errors
///
/// Returns `DomainError::DateParseError` naming the malformed entry.
pub fn parse_dates<S: AsRef<str>>(inputs: &[S]) -> Result<Vec<Date>, DomainError> {
    inputs.iter().map(|s| parse_date(s.as_ref())).collect()
}

/// Expands a bulk request into one window per date, in input order.
///
/// Each window combines its date with `start_time`, and with `end_time` on the
/// same date or, when `end_time` is earlier than `start_time`, on the next
/// date. The whole batch is validated before anything is returned.
///
/// # Errors
///
/// Returns an error if:
/// - `dates` is empty
/// - `dates` contains a duplicate
/// - `start_time == end_time`
/// - any local time cannot be resolved in `tz`
pub fn expand_bulk_windows(
    dates: &[Date],
    start_time: Time,
    end_time: Time,
    tz: Tz,
) -> Result<Vec<ShiftWindow>, DomainError> {
    if dates.is_empty() {
        return Err(DomainError::EmptyDateList);
    }
    if start_time == end_time {
        return Err(DomainError::ZeroLengthShift { time: start_time });
    }

    let rolls_over = end_time < start_time;
    let mut seen: HashSet<Date> = HashSet::with_capacity(dates.len());

    dates
        .iter()
        .map(|date| {
            if !seen.insert(*date) {
                return Err(DomainError::DuplicateDate(*date));
            }
            let end_date = if rolls_over {
                date.next_day()
                    .ok_or_else(|| DomainError::DateArithmeticOverflow {
                        operation: format!("day after {date}"),
                    })?
            } else {
                *date
            };
            let start = local_to_instant(*date, start_time, tz)?;
            let end = local_to_instant(end_date, end_time, tz)?;
            ShiftWindow::new(start, end)
        })
        .collect()
}

/// Resolves a wall-clock date and time in `tz` to an instant.
///
/// # Errors
///
/// Returns `DomainError::UnresolvableLocalTime` when the local time is
/// skipped or repeated by a DST transition.
pub fn local_to_instant(date: Date, time: Time, tz: Tz) -> Result<OffsetDateTime, DomainError> {
    let naive = to_naive_date(date)?.and_time(to_naive_time(time)?);

    let local = tz
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| DomainError::UnresolvableLocalTime {
            date,
            time,
            timezone: tz.name().to_string(),
        })?;

    to_instant(&local, naive, tz)
}

/// The first instant of the local calendar day `date` in `tz`.
///
/// A repeated midnight resolves to its earlier occurrence. A skipped midnight
/// resolves to the first local time after the gap, searched minute by minute
/// for up to one day.
///
/// # Errors
///
/// Returns `DomainError::UnresolvableLocalTime` if no local time of that day
/// exists in `tz`.
pub fn day_start(date: Date, tz: Tz) -> Result<OffsetDateTime, DomainError> {
    let midnight = to_naive_date(date)?.and_time(NaiveTime::MIN);

    let resolved = (0..MINUTES_PER_DAY).find_map(|minute| {
        let naive = midnight.checked_add_signed(chrono::Duration::minutes(minute))?;
        tz.from_local_datetime(&naive)
            .earliest()
            .map(|local| (local, naive))
    });

    let (local, naive) = resolved.ok_or_else(|| DomainError::UnresolvableLocalTime {
        date,
        time: Time::MIDNIGHT,
        timezone: tz.name().to_string(),
    })?;
    to_instant(&local, naive, tz)
}

fn to_instant(
    local: &chrono::DateTime<Tz>,
    naive: NaiveDateTime,
    tz: Tz,
) -> Result<OffsetDateTime, DomainError> {
    OffsetDateTime::from_unix_timestamp(local.timestamp())
        .and_then(|instant| instant.replace_nanosecond(local.timestamp_subsec_nanos()))
        .map_err(|e| DomainError::DateArithmeticOverflow {
            operation: format!("convert {naive} in {}: {e}", tz.name()),
        })
}

/// Returns the local calendar date and time of day of `instant` in `tz`.
///
/// # Errors
///
/// Returns `DomainError::DateArithmeticOverflow` if the conversion fails.
pub fn instant_to_local(instant: OffsetDateTime, tz: Tz) -> Result<(Date, Time), DomainError> {
    let utc = chrono::DateTime::from_timestamp(instant.unix_timestamp(), instant.nanosecond())
        .ok_or_else(|| DomainError::DateArithmeticOverflow {
            operation: format!("convert {instant} to {}", tz.name()),
        })?;
    let local = utc.with_timezone(&tz).naive_local();
    Ok((from_naive_date(local.date())?, from_naive_time(local.time())?))
}

fn to_naive_date(date: Date) -> Result<NaiveDate, DomainError> {
    NaiveDate::from_ymd_opt(
        date.year(),
        u32::from(u8::from(date.month())),
        u32::from(date.day()),
    )
    .ok_or_else(|| DomainError::DateArithmeticOverflow {
        operation: format!("convert date {date}"),
    })
}

fn to_naive_time(time: Time) -> Result<NaiveTime, DomainError> {
    NaiveTime::from_hms_nano_opt(
        u32::from(time.hour()),
        u32::from(time.minute()),
        u32::from(time.second()),
        time.nanosecond(),
    )
    .ok_or_else(|| DomainError::DateArithmeticOverflow {
        operation: format!("convert time {time}"),
    })
}

fn from_naive_date(date: NaiveDate) -> Result<Date, DomainError> {
    use chrono::Datelike;

    let overflow = || DomainError::DateArithmeticOverflow {
        operation: format!("convert date {date}"),
    };
    let month = u8::try_from(date.month())
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .ok_or_else(overflow)?;
    let day = u8::try_from(date.day()).map_err(|_| overflow())?;
    Date::from_calendar_date(date.year(), month, day).map_err(|_| overflow())
}

fn from_naive_time(time: NaiveTime) -> Result<Time, DomainError> {
    use chrono::Timelike;

    let overflow = || DomainError::DateArithmeticOverflow {
        operation: format!("convert time {time}"),
    };
    let hour = u8::try_from(time.hour()).map_err(|_| overflow())?;
    let minute = u8::try_from(time.minute()).map_err(|_| overflow())?;
    let second = u8::try_from(time.second()).map_err(|_| overflow())?;
    // chrono encodes leap seconds as nanosecond >= 1e9
    let nanos = time.nanosecond().min(999_999_999);
    Time::from_hms_nano(hour, minute, second, nanos).map_err(|_| overflow())
}

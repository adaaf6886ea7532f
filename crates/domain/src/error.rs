// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::{Date, OffsetDateTime, Time};

/// Broad classification of a domain error, used by outer layers to pick a
/// response without matching on every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input. Nothing was applied.
    Validation,
    /// A referenced user, group, or duty does not exist.
    NotFound,
    /// The input is well formed but collides with existing state.
    Conflict,
}

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required text field is empty or whitespace.
    EmptyField(&'static str),
    /// A full name is empty or too long.
    InvalidName(String),
    /// An email address is malformed.
    InvalidEmail(String),
    /// A role string is not recognised.
    InvalidRole(String),
    /// A rank label is not part of the rank catalog.
    InvalidRank(String),
    /// A rotation cycle string is not recognised.
    InvalidRotationCycle(String),
    /// A group name is empty or too long.
    InvalidGroupName(String),
    /// A timezone name is not a known IANA zone.
    InvalidTimezone(String),
    /// A shift window does not end strictly after it starts.
    InvalidShiftWindow {
        /// Window start.
        start: OffsetDateTime,
        /// Window end.
        end: OffsetDateTime,
    },
    /// A bulk request repeats a start and end time of day.
    ZeroLengthShift {
        /// The shared time of day.
        time: Time,
    },
    /// A bulk request carries no dates.
    EmptyDateList,
    /// A bulk request lists the same date twice.
    DuplicateDate(Date),
    /// A date, time, or timestamp string failed to parse.
    DateParseError {
        /// The offending input.
        input: String,
        /// Parser message.
        error: String,
    },
    /// A wall-clock time does not exist, or exists twice, in the roster
    /// timezone because of a DST transition.
    UnresolvableLocalTime {
        /// Local date.
        date: Date,
        /// Local time of day.
        time: Time,
        /// Timezone name.
        timezone: String,
    },
    /// A date range ends before it starts.
    InvalidDateRange {
        /// First day.
        start: Date,
        /// Last day.
        end: Date,
    },
    /// A date range covers more days than allowed.
    DateRangeTooLong {
        /// Requested number of days.
        days: i64,
        /// Maximum number of days.
        max: i64,
    },
    /// Date arithmetic overflow.
    DateArithmeticOverflow {
        /// Description of the operation that failed.
        operation: String,
    },
    /// User does not exist.
    UserNotFound(i64),
    /// Group does not exist.
    GroupNotFound(i64),
    /// Duty does not exist.
    DutyNotFound(i64),
    /// Email already belongs to another user.
    DuplicateEmail(String),
    /// The change would leave the roster without an administrator.
    LastAdmin(i64),
}

impl DomainError {
    /// Returns the broad classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UserNotFound(_) | Self::GroupNotFound(_) | Self::DutyNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::DuplicateEmail(_) | Self::LastAdmin(_) => ErrorKind::Conflict,
            _ => ErrorKind::Validation,
        }
    }
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "Field '{field}' must not be empty"),
            Self::InvalidName(msg) => write!(f, "Invalid name: {msg}"),
            Self::InvalidEmail(email) => write!(f, "Invalid email address: {email}"),
            Self::InvalidRole(role) => write!(f, "Invalid role: {role}"),
            Self::InvalidRank(rank) => write!(f, "Unknown rank: {rank}"),
            Self::InvalidRotationCycle(cycle) => write!(f, "Invalid rotation cycle: {cycle}"),
            Self::InvalidGroupName(msg) => write!(f, "Invalid group name: {msg}"),
            Self::InvalidTimezone(tz) => write!(f, "Invalid timezone: {tz}"),
            Self::InvalidShiftWindow { start, end } => {
                write!(f, "Shift end {end} must be after shift start {start}")
            }
            Self::ZeroLengthShift { time } => {
                write!(f, "Shift start and end time of day are both {time}")
            }
            Self::EmptyDateList => write!(f, "Bulk duty request must contain at least one date"),
            Self::DuplicateDate(date) => write!(f, "Date {date} appears more than once"),
            Self::DateParseError { input, error } => {
                write!(f, "Failed to parse '{input}': {error}")
            }
            Self::UnresolvableLocalTime {
                date,
                time,
                timezone,
            } => write!(
                f,
                "Local time {date} {time} is ambiguous or does not exist in {timezone}"
            ),
            Self::InvalidDateRange { start, end } => {
                write!(f, "Date range end {end} is before start {start}")
            }
            Self::DateRangeTooLong { days, max } => {
                write!(f, "Date range covers {days} days, maximum is {max}")
            }
            Self::DateArithmeticOverflow { operation } => {
                write!(f, "Date arithmetic overflow in operation: {operation}")
            }
            Self::UserNotFound(id) => write!(f, "User {id} not found"),
            Self::GroupNotFound(id) => write!(f, "Group {id} not found"),
            Self::DutyNotFound(id) => write!(f, "Duty {id} not found"),
            Self::DuplicateEmail(email) => write!(f, "Email {email} is already registered"),
            Self::LastAdmin(id) => {
                write!(f, "User {id} is the last administrator and must stay one")
            }
        }
    }
}

impl std::error::Error for DomainError {}

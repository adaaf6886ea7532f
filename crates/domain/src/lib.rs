// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod error;
mod membership;
mod rank;
mod schedule;
mod shift;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use error::{DomainError, ErrorKind};
pub use membership::{
    merge_members, normalize_member_ids, resolve_members, toggle_member, unknown_member_ids,
};
pub use rank::{Rank, RankCategory, parse_optional_rank};
pub use schedule::{
    DateRange, DutyOverlap, MAX_RANGE_DAYS, MatrixRow, ScheduleMatrix, build_range_matrix,
};
pub use shift::{
    DutyStatus, ShiftWindow, expand_bulk_windows, parse_date, parse_dates, parse_instant,
    parse_time_of_day, parse_timezone,
};

// Re-export public types
pub use types::{Duty, FORMER_MEMBER_NAME, Group, Role, RotationCycle, User};
pub use validation::{
    normalize_optional_text, validate_duty_fields, validate_email_unique, validate_group_fields,
    validate_user_fields,
};

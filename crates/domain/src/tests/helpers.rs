// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{Duty, Group, Role, RotationCycle, ShiftWindow, User};
use time::OffsetDateTime;
use time::macros::datetime;

pub const CREATED: OffsetDateTime = datetime!(2024-01-01 00:00 UTC);

pub fn create_test_user(user_id: i64, full_name: &str) -> User {
    User::with_id(
        user_id,
        full_name.to_string(),
        format!("user{user_id}@example.com"),
        None,
        Role::User,
        CREATED,
    )
}

pub fn create_test_group(group_id: i64, member_ids: Vec<i64>) -> Group {
    Group::with_id(
        group_id,
        format!("Group {group_id}"),
        None,
        member_ids,
        CREATED,
    )
}

pub fn create_test_duty(
    duty_id: i64,
    user_id: i64,
    start: OffsetDateTime,
    end: OffsetDateTime,
) -> Duty {
    let mut duty = Duty::new(
        user_id,
        String::from("Patrol"),
        String::from("Post-1"),
        ShiftWindow::new(start, end).unwrap(),
        RotationCycle::Daily,
        None,
        CREATED,
    );
    duty.duty_id = Some(duty_id);
    duty
}

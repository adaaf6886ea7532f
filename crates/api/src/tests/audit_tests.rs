// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use roster_domain::Role;

use crate::{
    ApiError, CreateGroupRequest, ToggleMemberRequest, audit_timeline, create_group,
    toggle_member,
};

use super::helpers::{
    create_test_cause, create_test_context, seed_admin, seed_user, setup_test_persistence,
};

#[test]
fn test_audit_timeline_most_recent_first() {
    let mut persistence = setup_test_persistence();
    let admin = seed_admin(&mut persistence);
    let member = seed_user(&mut persistence, "Andrii Bondar", Role::User);
    let ctx = create_test_context();

    let group_id = create_group(
        &mut persistence,
        &ctx,
        &CreateGroupRequest {
            name: String::from("Alpha"),
            description: None,
        },
        &admin,
        create_test_cause(),
    )
    .unwrap()
    .group
    .group_id;
    toggle_member(
        &mut persistence,
        &ctx,
        group_id,
        &ToggleMemberRequest {
            user_id: member.user_id,
        },
        &admin,
        create_test_cause(),
    )
    .unwrap();

    let timeline = audit_timeline(&mut persistence, &admin, None).unwrap();

    let actions: Vec<&str> = timeline.events.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(
        actions,
        vec!["ToggleMember", "CreateGroup", "CreateUser", "CreateUser"]
    );
    assert!(
        timeline
            .events
            .windows(2)
            .all(|pair| pair[0].event_id > pair[1].event_id)
    );

    let toggle = &timeline.events[0];
    assert_eq!(toggle.actor_id, admin.user_id.to_string());
    assert_eq!(toggle.actor_type, "admin");
    assert_eq!(toggle.cause_description, "API request");
    assert!(toggle.before.is_some());
    assert!(toggle.after.is_some());

    let creation = &timeline.events[1];
    assert!(creation.before.is_none());
    assert!(creation.after.as_deref().unwrap().contains("Alpha"));
}

#[test]
fn test_audit_timeline_requires_admin() {
    let mut persistence = setup_test_persistence();
    seed_admin(&mut persistence);
    let user = seed_user(&mut persistence, "Andrii Bondar", Role::User);

    assert!(matches!(
        audit_timeline(&mut persistence, &user, None),
        Err(ApiError::Unauthorized { .. })
    ));
}

#[test]
fn test_audit_timeline_limit_is_clamped() {
    let mut persistence = setup_test_persistence();
    let admin = seed_admin(&mut persistence);
    seed_user(&mut persistence, "Andrii Bondar", Role::User);
    seed_user(&mut persistence, "Bohdan Savchuk", Role::User);

    assert_eq!(
        audit_timeline(&mut persistence, &admin, Some(0))
            .unwrap()
            .events
            .len(),
        1
    );
    assert_eq!(
        audit_timeline(&mut persistence, &admin, Some(2))
            .unwrap()
            .events
            .len(),
        2
    );
    assert_eq!(
        audit_timeline(&mut persistence, &admin, Some(10_000))
            .unwrap()
            .events
            .len(),
        3
    );
}

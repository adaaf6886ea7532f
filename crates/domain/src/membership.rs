// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Group membership set operations and resolution.

use crate::types::{Group, User};
use std::collections::HashSet;

/// Removes duplicate ids, keeping the first occurrence of each.
#[must_use]
pub fn normalize_member_ids(member_ids: &[i64]) -> Vec<i64> {
    let mut seen: HashSet<i64> = HashSet::with_capacity(member_ids.len());
    member_ids
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Flips membership of `user_id`: removes it if present, appends it otherwise.
///
/// Applying it twice restores the original set.
#[must_use]
pub fn toggle_member(member_ids: &[i64], user_id: i64) -> Vec<i64> {
    if member_ids.contains(&user_id) {
        member_ids
            .iter()
            .copied()
            .filter(|id| *id != user_id)
            .collect()
    } else {
        let mut toggled = member_ids.to_vec();
        toggled.push(user_id);
        toggled
    }
}

/// Resolves a group's member ids to user records, in membership order.
///
/// Ids without a matching user are skipped.
#[must_use]
pub fn resolve_members<'a>(group: &Group, users: &'a [User]) -> Vec<&'a User> {
    group
        .member_ids
        .iter()
        .filter_map(|id| users.iter().find(|u| u.user_id == Some(*id)))
        .collect()
}

/// Concatenates member lists from several groups, dropping users already
/// seen and keeping first-seen order.
#[must_use]
pub fn merge_members<'a, I>(member_lists: I) -> Vec<&'a User>
where
    I: IntoIterator<Item = Vec<&'a User>>,
{
    let mut seen: HashSet<Option<i64>> = HashSet::new();
    member_lists
        .into_iter()
        .flatten()
        .filter(|user| seen.insert(user.user_id))
        .collect()
}

/// Returns the ids in `member_ids` that do not belong to any user.
#[must_use]
pub fn unknown_member_ids(member_ids: &[i64], users: &[User]) -> Vec<i64> {
    let known: HashSet<i64> = users.iter().filter_map(|u| u.user_id).collect();
    member_ids
        .iter()
        .copied()
        .filter(|id| !known.contains(id))
        .collect()
}

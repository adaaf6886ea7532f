// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Capability computation for authorization-aware UI gating.
//!
//! Capabilities expose what actions a user is permitted to perform without
//! leaking domain internals. They are advisory only and do not replace
//! backend authorization checks.

use crate::auth::AuthenticatedActor;
use crate::request_response::{Capability, GlobalCapabilities, UserCapabilities};
use roster_domain::User;

/// Computes global capabilities for an authenticated user.
#[must_use]
pub const fn compute_global_capabilities(actor: &AuthenticatedActor) -> GlobalCapabilities {
    let admin = Capability::from_bool(actor.is_admin());
    GlobalCapabilities {
        can_manage_users: admin,
        can_manage_groups: admin,
        can_manage_duties: admin,
        can_view_all: admin,
        can_view_audit: admin,
    }
}

/// Computes what `actor` may do with `target`.
///
/// Target-specific capabilities depend on:
/// - The actor's role
/// - Whether the target is the actor
/// - The "last admin" rule
///
/// # Arguments
///
/// * `actor` - The authenticated actor
/// * `target` - The user being evaluated
/// * `admin_count` - Number of administrators in the roster
#[must_use]
pub fn compute_user_capabilities(
    actor: &AuthenticatedActor,
    target: &User,
    admin_count: usize,
) -> UserCapabilities {
    if !actor.is_admin() {
        return UserCapabilities {
            can_edit: Capability::Denied,
            can_change_role: Capability::Denied,
            can_delete: Capability::Denied,
        };
    }

    let is_self: bool = target.user_id == Some(actor.user_id);
    let is_last_admin: bool = target.is_admin() && admin_count <= 1;

    UserCapabilities {
        can_edit: Capability::Allowed,
        can_change_role: Capability::from_bool(!is_last_admin),
        can_delete: Capability::from_bool(!is_self && !is_last_admin),
    }
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Authentication and authorization types and services.

use roster_audit::Actor;
use roster_domain::{Group, Role, User};
use roster_persistence::{PersistenceError, SessionData, SqlitePersistence};
use time::{Duration, OffsetDateTime};
use tracing::{debug, info, warn};

use crate::error::AuthError;

/// Default session lifetime.
pub const DEFAULT_SESSION_LIFETIME: Duration = Duration::days(7);

/// The principal behind a request: a roster user and the role they act with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedActor {
    /// The user's canonical id.
    pub user_id: i64,
    /// The role held when the session was validated.
    pub role: Role,
}

impl AuthenticatedActor {
    /// Creates a new authenticated actor.
    #[must_use]
    pub const fn new(user_id: i64, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Builds the actor for a stored user.
    ///
    /// # Errors
    ///
    /// Returns an error if the user has no id.
    pub fn for_user(user: &User) -> Result<Self, AuthError> {
        let user_id: i64 = user.user_id.ok_or_else(|| AuthError::AuthenticationFailed {
            reason: String::from("User has no id"),
        })?;
        Ok(Self::new(user_id, user.role))
    }

    /// Returns true if the actor is an administrator.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }

    /// Converts this authenticated actor into an audit Actor.
    #[must_use]
    pub fn to_audit_actor(&self) -> Actor {
        Actor::user(self.user_id, self.role.as_str())
    }
}

/// Authorization service for enforcing role-based access control.
///
/// Admins may do everything. Users may read their own duties and groups,
/// and the groups they belong to.
pub struct AuthorizationService;

impl AuthorizationService {
    /// Requires the Admin role.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is not an admin.
    pub fn require_admin(actor: &AuthenticatedActor, action: &str) -> Result<(), AuthError> {
        if actor.is_admin() {
            return Ok(());
        }
        Err(AuthError::Unauthorized {
            action: action.to_string(),
            required_role: String::from("admin role"),
        })
    }

    /// Requires the actor to be `user_id` or an admin.
    ///
    /// # Errors
    ///
    /// Returns an error if a non-admin asks about someone else.
    pub fn require_self_or_admin(
        actor: &AuthenticatedActor,
        user_id: i64,
        action: &str,
    ) -> Result<(), AuthError> {
        if actor.is_admin() || actor.user_id == user_id {
            return Ok(());
        }
        Err(AuthError::Unauthorized {
            action: action.to_string(),
            required_role: String::from("admin role or the same user"),
        })
    }

    /// Requires the actor to belong to `group` or be an admin.
    ///
    /// # Errors
    ///
    /// Returns an error if a non-admin is not a member.
    pub fn require_member_or_admin(
        actor: &AuthenticatedActor,
        group: &Group,
        action: &str,
    ) -> Result<(), AuthError> {
        if actor.is_admin() || group.has_member(actor.user_id) {
            return Ok(());
        }
        Err(AuthError::Unauthorized {
            action: action.to_string(),
            required_role: String::from("admin role or group membership"),
        })
    }
}

/// Authentication service for session-based authentication.
pub struct AuthenticationService;

impl AuthenticationService {
    /// Authenticates a user by email and password and opens a session.
    ///
    /// Unknown email and wrong password fail with the same reason.
    ///
    /// # Arguments
    ///
    /// * `persistence` - The persistence layer
    /// * `email` - The login email
    /// * `password` - The plain text password
    /// * `now` - The current time
    /// * `session_lifetime` - How long the session stays valid
    ///
    /// # Returns
    ///
    /// A tuple of (`session`, `authenticated_actor`, `user`)
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails.
    pub fn login(
        persistence: &mut SqlitePersistence,
        email: &str,
        password: &str,
        now: OffsetDateTime,
        session_lifetime: Duration,
    ) -> Result<(SessionData, AuthenticatedActor, User), AuthError> {
        let invalid = || AuthError::AuthenticationFailed {
            reason: String::from("Invalid email or password"),
        };

        let (user, password_hash): (User, String) = persistence
            .get_credentials_by_email(email)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| {
                debug!("Login for unknown email");
                invalid()
            })?;

        let password_valid: bool = persistence
            .verify_password(password, &password_hash)
            .map_err(Self::map_persistence_error)?;
        if !password_valid {
            warn!(user_id = ?user.user_id, "Login with wrong password");
            return Err(invalid());
        }

        let actor: AuthenticatedActor = AuthenticatedActor::for_user(&user)?;
        let session: SessionData = Self::open_session(persistence, actor.user_id, now, session_lifetime)?;

        info!(user_id = actor.user_id, "User logged in");
        Ok((session, actor, user))
    }

    /// Opens a new session for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be stored.
    pub fn open_session(
        persistence: &mut SqlitePersistence,
        user_id: i64,
        now: OffsetDateTime,
        session_lifetime: Duration,
    ) -> Result<SessionData, AuthError> {
        let session_token: String = Self::generate_session_token();
        let expires_at: OffsetDateTime = now + session_lifetime;

        let session_id: i64 = persistence
            .create_session(&session_token, user_id, now, expires_at)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Failed to create session: {e}"),
            })?;

        Ok(SessionData {
            session_id,
            session_token,
            user_id,
            created_at: now,
            last_activity_at: now,
            expires_at,
        })
    }

    /// Validates a session token and returns the authenticated actor.
    ///
    /// Expired sessions are removed. A successful validation refreshes the
    /// session's last activity time.
    ///
    /// # Arguments
    ///
    /// * `persistence` - The persistence layer
    /// * `session_token` - The session token to validate
    /// * `now` - The current time
    ///
    /// # Returns
    ///
    /// A tuple of (`authenticated_actor`, `user`)
    ///
    /// # Errors
    ///
    /// Returns an error if the session is invalid or expired, or its user no
    /// longer exists.
    pub fn validate_session(
        persistence: &mut SqlitePersistence,
        session_token: &str,
        now: OffsetDateTime,
    ) -> Result<(AuthenticatedActor, User), AuthError> {
        let session: SessionData = persistence
            .get_session_by_token(session_token)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: String::from("Invalid session token"),
            })?;

        if session.is_expired_at(now) {
            persistence
                .delete_session(session_token)
                .map_err(Self::map_persistence_error)?;
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Session expired"),
            });
        }

        let user: User = persistence
            .get_user_by_id(session.user_id)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: String::from("User not found"),
            })?;

        persistence
            .update_session_activity(session.session_id, now)
            .map_err(Self::map_persistence_error)?;

        let actor: AuthenticatedActor = AuthenticatedActor::for_user(&user)?;
        Ok((actor, user))
    }

    /// Logs out by deleting the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the logout fails.
    pub fn logout(
        persistence: &mut SqlitePersistence,
        session_token: &str,
    ) -> Result<(), AuthError> {
        persistence
            .delete_session(session_token)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Failed to delete session: {e}"),
            })
    }

    /// Generates a random 128-bit session token.
    #[must_use]
    pub fn generate_session_token() -> String {
        format!(
            "{:016x}{:016x}",
            rand::random::<u64>(),
            rand::random::<u64>()
        )
    }

    fn map_persistence_error(err: PersistenceError) -> AuthError {
        AuthError::AuthenticationFailed {
            reason: format!("Database error: {err}"),
        }
    }
}

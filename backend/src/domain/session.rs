//! Authenticated administrator context.
//!
//! An [`AdminSession`] is created by a successful login and handed to every
//! protected operation. It is the only source of "who is asking": services
//! never read ambient state. Inbound adapters persist it between requests and
//! clear it on logout.

use serde::Serialize;

use super::user::{Email, Role, UserId};

/// Identity of the signed-in administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSession {
    user_id: UserId,
    role: Role,
    email: Email,
}

impl AdminSession {
    /// Start a session for an authenticated account.
    pub fn init(user_id: UserId, role: Role, email: Email) -> Self {
        Self {
            user_id,
            role,
            email,
        }
    }

    /// Account identifier.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Role recorded at login.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Email used to scope the inbox.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Copy of the session pointing at a new email after a profile change.
    #[must_use]
    pub fn with_email(mut self, email: Email) -> Self {
        self.email = email;
        self
    }
}

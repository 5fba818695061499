//! Cookie persistence for the administrator session.
//!
//! [`SessionContext`] stores an [`AdminSession`] in the private session
//! cookie and rebuilds it on every request, so handlers receive an explicit
//! context instead of reading individual keys.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::domain::{AdminSession, Email, Error, Role, UserId};

pub(crate) const IS_AUTHENTICATED_KEY: &str = "is_authenticated";
pub(crate) const USER_ID_KEY: &str = "user_id";
pub(crate) const USER_ROLE_KEY: &str = "user_role";
pub(crate) const ADMIN_EMAIL_KEY: &str = "admin_email";
pub(crate) const RESET_USER_ID_KEY: &str = "reset_user_id";

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    fn insert(&self, key: &str, value: impl serde::Serialize) -> Result<(), Error> {
        self.0
            .insert(key, value)
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, Error> {
        self.0
            .get::<T>(key)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))
    }

    /// Persist a freshly authenticated administrator.
    pub fn persist(&self, admin: &AdminSession) -> Result<(), Error> {
        self.0.renew();
        self.insert(IS_AUTHENTICATED_KEY, true)?;
        self.insert(USER_ID_KEY, admin.user_id().as_ref())?;
        self.insert(USER_ROLE_KEY, admin.role().as_str())?;
        self.insert(ADMIN_EMAIL_KEY, admin.email().as_str())
    }

    /// Rebuild the session context, if one is stored.
    ///
    /// Tampered or partial entries read as "not signed in".
    pub fn admin(&self) -> Result<Option<AdminSession>, Error> {
        if self.get::<bool>(IS_AUTHENTICATED_KEY)? != Some(true) {
            return Ok(None);
        }
        let (Some(id), Some(role), Some(email)) = (
            self.get::<String>(USER_ID_KEY)?,
            self.get::<String>(USER_ROLE_KEY)?,
            self.get::<String>(ADMIN_EMAIL_KEY)?,
        ) else {
            warn!("incomplete admin session cookie");
            return Ok(None);
        };
        let parsed = UserId::new(id).map_err(|e| e.to_string()).and_then(|id| {
            let role = role.parse::<Role>().map_err(|e| e.to_string())?;
            let email = Email::new(email).map_err(|e| e.to_string())?;
            Ok(AdminSession::init(id, role, email))
        });
        match parsed {
            Ok(admin) => Ok(Some(admin)),
            Err(error) => {
                warn!(error = %error, "invalid admin session cookie");
                Ok(None)
            }
        }
    }

    /// Require a signed-in administrator or return `401 Unauthorized`.
    pub fn require_admin(&self) -> Result<AdminSession, Error> {
        self.admin()?
            .ok_or_else(|| Error::unauthorized("login required"))
    }

    /// Remember which account a password reset targets.
    pub fn stash_reset_target(&self, user_id: &UserId) -> Result<(), Error> {
        self.insert(RESET_USER_ID_KEY, user_id.as_ref())
    }

    /// The pending password reset target, if any.
    pub fn reset_target(&self) -> Result<Option<UserId>, Error> {
        Ok(self
            .get::<String>(RESET_USER_ID_KEY)?
            .and_then(|raw| UserId::new(raw).ok()))
    }

    /// Forget the pending password reset.
    pub fn clear_reset_target(&self) {
        self.0.remove(RESET_USER_ID_KEY);
    }

    /// Drop every key and expire the cookie.
    pub fn purge(&self) {
        self.0.purge();
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}

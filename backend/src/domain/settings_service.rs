//! Administrator profile and avatar management.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::auth_service::{hash_off_thread, map_user_error};
use crate::domain::ports::{
    AccountUpdate, AvatarStorage, AvatarStorageError, ProfileCommand, ProfileQuery, UserRepository,
};
use crate::domain::{
    AVATAR_PROBE_EXTENSIONS, AdminProfile, AdminSession, AvatarFormat, Error, PersonName,
    ProfileUpdate, SettingsValidationError, UserAccount, avatar_path,
};

fn map_storage_error(error: AvatarStorageError) -> Error {
    match error {
        AvatarStorageError::Connection { message } => {
            Error::service_unavailable(format!("avatar storage unavailable: {message}"))
        }
        AvatarStorageError::Rejected { message } => {
            Error::internal(format!("avatar upload failed: {message}"))
        }
    }
}

/// Settings service over the account repository and avatar storage.
#[derive(Clone)]
pub struct SettingsService<U, S> {
    users: Arc<U>,
    storage: Arc<S>,
}

impl<U, S> SettingsService<U, S> {
    /// Create a service.
    pub fn new(users: Arc<U>, storage: Arc<S>) -> Self {
        Self { users, storage }
    }
}

impl<U: UserRepository, S: AvatarStorage> SettingsService<U, S> {
    /// First avatar found over the probe extensions, in order.
    async fn find_avatar(&self, account: &UserAccount) -> Option<String> {
        for extension in AVATAR_PROBE_EXTENSIONS {
            let path = avatar_path(&account.id, extension);
            match self.storage.exists(&path).await {
                Ok(true) => return Some(self.storage.public_url(&path)),
                Ok(false) => {}
                Err(err) => {
                    warn!(user_id = %account.id, error = %err, "avatar probe failed");
                    return None;
                }
            }
        }
        None
    }

    async fn build_profile(&self, account: UserAccount) -> AdminProfile {
        let avatar_url = self.find_avatar(&account).await;
        AdminProfile {
            name: PersonName::split(account.full_name.as_deref().unwrap_or_default()),
            display_name: account.display_name(),
            id: account.id,
            username: account.username,
            full_name: account.full_name,
            email: account.email,
            avatar_url,
        }
    }
}

#[async_trait]
impl<U, S> ProfileQuery for SettingsService<U, S>
where
    U: UserRepository,
    S: AvatarStorage,
{
    async fn profile(&self, session: &AdminSession) -> Result<AdminProfile, Error> {
        let account = self
            .users
            .find_by_id(session.user_id())
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found("account no longer exists"))?;
        Ok(self.build_profile(account).await)
    }
}

#[async_trait]
impl<U, S> ProfileCommand for SettingsService<U, S>
where
    U: UserRepository,
    S: AvatarStorage,
{
    async fn update_profile(
        &self,
        session: &AdminSession,
        update: ProfileUpdate,
    ) -> Result<AdminProfile, Error> {
        let taken = self
            .users
            .is_taken(
                &update.email,
                &update.username,
                Some(session.user_id().clone()),
            )
            .await
            .map_err(map_user_error)?;
        if taken {
            return Err(Error::conflict("email or username already exists"));
        }
        let password_hash = match update.new_password {
            Some(password) => Some(hash_off_thread(password).await?),
            None => None,
        };
        let changes = AccountUpdate {
            username: update.username,
            full_name: update.name.full(),
            email: update.email,
            password_hash,
        };
        let account = self
            .users
            .update_profile(session.user_id(), &changes)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found("account no longer exists"))?;
        info!(
            user_id = %account.id,
            password_changed = changes.password_hash.is_some(),
            "profile updated"
        );
        Ok(self.build_profile(account).await)
    }

    async fn upload_avatar(
        &self,
        session: &AdminSession,
        format: AvatarFormat,
        bytes: Vec<u8>,
    ) -> Result<String, Error> {
        if bytes.is_empty() {
            let err = SettingsValidationError::EmptyImage;
            return Err(Error::invalid_request(err.to_string()).with_details(
                serde_json::json!({ "field": err.field(), "code": err.code() }),
            ));
        }
        let path = avatar_path(session.user_id(), format.extension());
        self.storage
            .upload(&path, bytes, format.content_type())
            .await
            .map_err(map_storage_error)?;
        info!(user_id = %session.user_id(), path = %path, "avatar uploaded");
        Ok(self.storage.public_url(&path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::domain::ports::{MockAvatarStorage, MockUserRepository};
    use crate::domain::{Email, ErrorCode, ProfileForm, Role, UserId};

    fn session() -> AdminSession {
        AdminSession::init(
            UserId::new("17").expect("id"),
            Role::Admin,
            Email::new("ada@clinic.test").expect("email"),
        )
    }

    fn account() -> UserAccount {
        UserAccount {
            id: UserId::new("17").expect("id"),
            username: None,
            full_name: Some("Ada Marie Admin".into()),
            email: Email::new("ada@clinic.test").expect("email"),
            role: Role::Admin,
            created_at: None,
        }
    }

    fn storage_with(existing: &'static str) -> MockAvatarStorage {
        let mut storage = MockAvatarStorage::new();
        storage
            .expect_exists()
            .returning(move |path| Ok(path == existing));
        storage
            .expect_public_url()
            .returning(|path| format!("https://cdn.test/{path}"));
        storage
    }

    #[tokio::test]
    async fn profile_probes_extensions_in_order() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().return_once(|_| Ok(Some(account())));
        let service = SettingsService::new(Arc::new(users), Arc::new(storage_with("avatars/17.png")));

        let profile = service.profile(&session()).await.expect("profile");
        assert_eq!(
            profile.avatar_url.as_deref(),
            Some("https://cdn.test/avatars/17.png")
        );
        assert_eq!(profile.name.middle.as_deref(), Some("Marie"));
        assert_eq!(profile.display_name, "Ada Marie Admin");
    }

    #[tokio::test]
    async fn update_excludes_own_row_from_conflicts_and_hashes_password() {
        let mut users = MockUserRepository::new();
        users
            .expect_is_taken()
            .withf(|_, _, except| except.as_ref().is_some_and(|id| id.as_ref() == "17"))
            .return_once(|_, _, _| Ok(false));
        users.expect_update_profile().times(1).returning(|_, changes| {
            let hash = changes.password_hash.as_ref().expect("hash present");
            assert!(hash.as_str().starts_with("$2b$"));
            Ok(Some(UserAccount {
                username: Some(changes.username.clone()),
                full_name: Some(changes.full_name.clone()),
                email: changes.email.clone(),
                ..account()
            }))
        });
        let service = SettingsService::new(Arc::new(users), Arc::new(storage_with("none")));
        let update = ProfileUpdate::try_from_form(ProfileForm {
            first_name: "Ada".into(),
            middle_name: None,
            last_name: "Lovelace".into(),
            username: "ada".into(),
            email: "ada.l@clinic.test".into(),
            password: Some("n3w".into()),
            confirm_password: Some("n3w".into()),
        })
        .expect("valid form");

        let profile = service
            .update_profile(&session(), update)
            .await
            .expect("updated");
        assert_eq!(profile.email.as_str(), "ada.l@clinic.test");
        assert_eq!(profile.display_name, "ada");
        assert!(profile.avatar_url.is_none());
    }

    #[tokio::test]
    async fn avatar_upload_uses_user_path() {
        let mut storage = MockAvatarStorage::new();
        storage
            .expect_upload()
            .withf(|path, bytes, content_type| {
                path == "avatars/17.jpeg"
                    && bytes.as_slice() == [1_u8, 2, 3]
                    && content_type == "image/jpeg"
            })
            .times(1)
            .return_once(|_, _, _| Ok(()));
        storage
            .expect_public_url()
            .returning(|path| format!("https://cdn.test/{path}"));
        let service = SettingsService::new(Arc::new(MockUserRepository::new()), Arc::new(storage));

        let url = service
            .upload_avatar(&session(), AvatarFormat::Jpeg, vec![1, 2, 3])
            .await
            .expect("uploaded");
        assert_eq!(url, "https://cdn.test/avatars/17.jpeg");
    }

    #[tokio::test]
    async fn empty_avatar_is_rejected() {
        let service = SettingsService::new(
            Arc::new(MockUserRepository::new()),
            Arc::new(MockAvatarStorage::new()),
        );
        let err = service
            .upload_avatar(&session(), AvatarFormat::Png, Vec::new())
            .await
            .expect_err("empty");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }
}

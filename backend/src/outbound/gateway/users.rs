//! `UserRepository` over the `users` table.

use async_trait::async_trait;

use super::client::{GatewayError, RestGateway, eq, like_literal, quoted};
use super::rows::{CredentialRow, NewUserRow, UserPatch, UserRow};
use crate::domain::ports::{
    AccountUpdate, NewAccount, StoredAccount, UserPersistenceError, UserRepository,
};
use crate::domain::{Email, PasswordHash, StoredCredential, UserAccount, UserId};

const USERS: &str = "users";

/// Gateway-backed user repository.
#[derive(Debug, Clone)]
pub struct GatewayUserRepository {
    gateway: RestGateway,
}

impl GatewayUserRepository {
    /// Wrap a shared gateway client.
    pub fn new(gateway: RestGateway) -> Self {
        Self { gateway }
    }

    async fn first(&self, column: &str, value: &str) -> Result<Option<UserRow>, GatewayError> {
        let rows: Vec<UserRow> = self
            .gateway
            .select(
                USERS,
                &[
                    ("select", "*".to_owned()),
                    (column, eq(value)),
                    ("limit", "1".to_owned()),
                ],
            )
            .await?;
        Ok(rows.into_iter().next())
    }
}

/// Filter matching either the email, ignoring case, or the username.
fn identity_filter(email: &Email, username: &str) -> String {
    format!(
        "(email.ilike.{},username.eq.{})",
        quoted(&like_literal(email.as_str())),
        quoted(username)
    )
}

#[async_trait]
impl UserRepository for GatewayUserRepository {
    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<StoredAccount>, UserPersistenceError> {
        let row = self.first("email", email.trim()).await?;
        Ok(row
            .map(UserRow::into_stored)
            .transpose()
            .map_err(GatewayError::decode)?)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserAccount>, UserPersistenceError> {
        let row = self.first("id", id.as_ref()).await?;
        Ok(row
            .map(UserRow::into_account)
            .transpose()
            .map_err(GatewayError::decode)?)
    }

    async fn is_taken(
        &self,
        email: &Email,
        username: &str,
        except: Option<UserId>,
    ) -> Result<bool, UserPersistenceError> {
        let mut query = vec![
            ("select", "id".to_owned()),
            ("or", identity_filter(email, username)),
            ("limit", "1".to_owned()),
        ];
        if let Some(id) = except {
            query.push(("id", format!("neq.{id}")));
        }
        let rows: Vec<serde_json::Value> = self.gateway.select(USERS, &query).await?;
        Ok(!rows.is_empty())
    }

    async fn insert(&self, account: &NewAccount) -> Result<UserAccount, UserPersistenceError> {
        let rows: Vec<UserRow> = self
            .gateway
            .insert(USERS, &NewUserRow::from(account))
            .await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::decode("user insert returned no row"))?;
        Ok(row.into_account().map_err(GatewayError::decode)?)
    }

    async fn update_password(
        &self,
        id: &UserId,
        hash: &PasswordHash,
    ) -> Result<(), UserPersistenceError> {
        let patch = UserPatch {
            username: None,
            full_name: None,
            email: None,
            password: Some(hash.as_str()),
        };
        let _: Vec<serde_json::Value> = self
            .gateway
            .update(USERS, &[("id", eq(id))], &patch)
            .await?;
        Ok(())
    }

    async fn update_profile(
        &self,
        id: &UserId,
        update: &AccountUpdate,
    ) -> Result<Option<UserAccount>, UserPersistenceError> {
        let patch = UserPatch {
            username: Some(&update.username),
            full_name: Some(&update.full_name),
            email: Some(update.email.as_str()),
            password: update.password_hash.as_ref().map(PasswordHash::as_str),
        };
        let rows: Vec<UserRow> = self
            .gateway
            .update(USERS, &[("id", eq(id))], &patch)
            .await?;
        Ok(rows
            .into_iter()
            .next()
            .map(UserRow::into_account)
            .transpose()
            .map_err(GatewayError::decode)?)
    }

    async fn credentials(&self) -> Result<Vec<(UserId, StoredCredential)>, UserPersistenceError> {
        let rows: Vec<CredentialRow> = self
            .gateway
            .select(USERS, &[("select", "id,password".to_owned())])
            .await?;
        Ok(rows
            .into_iter()
            .map(CredentialRow::into_domain)
            .collect::<Result<Vec<_>, _>>()
            .map_err(GatewayError::decode)?)
    }
}

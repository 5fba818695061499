//! One-pass migration of legacy plaintext credentials.
//!
//! Login already upgrades a legacy value the first time its owner signs in.
//! This service sweeps the accounts that have not signed in since, so the
//! plaintext column can be retired without waiting for every user.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::Error;
use crate::domain::StoredCredential;
use crate::domain::auth_service::{hash_off_thread, map_user_error};
use crate::domain::ports::UserRepository;

/// Whether the sweep writes hashes or only counts candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationMode {
    DryRun,
    Apply,
}

/// Totals reported once the sweep finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationSummary {
    /// Accounts inspected.
    pub scanned: usize,
    /// Accounts still holding a plaintext value.
    pub legacy: usize,
    /// Plaintext values replaced by a hash.
    pub migrated: usize,
    /// Plaintext values that could not be hashed or written.
    pub failed: usize,
}

/// Sweeps every account through a [`UserRepository`].
pub struct CredentialMigrationService<U> {
    users: Arc<U>,
}

impl<U> CredentialMigrationService<U> {
    /// Create a service over `users`.
    pub fn new(users: Arc<U>) -> Self {
        Self { users }
    }
}

impl<U: UserRepository> CredentialMigrationService<U> {
    /// Hash every legacy credential, or count them under
    /// [`MigrationMode::DryRun`].
    ///
    /// A failure on one account is logged and counted; the sweep continues.
    /// Only failing to list the accounts aborts.
    pub async fn run(&self, mode: MigrationMode) -> Result<MigrationSummary, Error> {
        let credentials = self.users.credentials().await.map_err(map_user_error)?;
        let mut summary = MigrationSummary {
            scanned: credentials.len(),
            ..MigrationSummary::default()
        };

        for (user_id, credential) in credentials {
            let StoredCredential::LegacyPlaintext(password) = credential else {
                continue;
            };
            summary.legacy += 1;
            if mode == MigrationMode::DryRun {
                continue;
            }
            let hash = match hash_off_thread(password).await {
                Ok(hash) => hash,
                Err(err) => {
                    warn!(user_id = %user_id, error = %err, "could not hash legacy credential");
                    summary.failed += 1;
                    continue;
                }
            };
            match self.users.update_password(&user_id, &hash).await {
                Ok(()) => summary.migrated += 1,
                Err(err) => {
                    warn!(user_id = %user_id, error = %err, "legacy credential rewrite failed");
                    summary.failed += 1;
                }
            }
        }

        info!(
            scanned = summary.scanned,
            legacy = summary.legacy,
            migrated = summary.migrated,
            failed = summary.failed,
            ?mode,
            "credential sweep finished"
        );
        Ok(summary)
    }
}

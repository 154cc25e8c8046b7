//! In-memory identity directory.
//!
//! Stands in for the user table: it holds argon2 password hashes, never the
//! plaintext, and answers the two lookups the auth routes need.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use credentials::{IdentityDirectory, UserIdentity};
use std::collections::HashMap;

struct Account {
    email: String,
    password_hash: String,
    identity: UserIdentity,
}

#[derive(Default)]
pub struct InMemoryDirectory {
    accounts: HashMap<i64, Account>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account, hashing its password.
    pub fn insert(
        &mut self,
        identity: UserIdentity,
        email: impl Into<String>,
        password: &str,
    ) -> eyre::Result<()> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| eyre::eyre!("Failed to hash password: {}", e))?
            .to_string();

        self.accounts.insert(
            identity.id,
            Account {
                email: email.into(),
                password_hash,
                identity,
            },
        );
        Ok(())
    }
}

#[async_trait]
impl IdentityDirectory for InMemoryDirectory {
    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> eyre::Result<Option<UserIdentity>> {
        let Some(account) = self
            .accounts
            .values()
            .find(|account| account.email.eq_ignore_ascii_case(email))
        else {
            tracing::debug!("Login attempt for unknown email");
            return Ok(None);
        };

        let parsed = PasswordHash::new(&account.password_hash)
            .map_err(|e| eyre::eyre!("Stored password hash is invalid: {}", e))?;

        let matches = Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok();

        Ok(matches.then(|| account.identity.clone()))
    }

    async fn find_by_id(&self, id: i64) -> eyre::Result<Option<UserIdentity>> {
        Ok(self.accounts.get(&id).map(|account| account.identity.clone()))
    }
}

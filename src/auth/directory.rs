//! In-memory user directory backed by argon2 password hashes from configuration

use crate::auth::traits::{CredentialVerifier, IdentityResolver};
use crate::models::UserId;
use crate::settings::UserSettings;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use rand::rngs::OsRng;
use rand::TryRngCore;
use std::collections::HashMap;
use thiserror::Error;

/// Salt length used when hashing new passwords
const SALT_BYTES: usize = 16;

/// User lookup and password verification errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("unknown user: {0}")]
    UnknownUser(String),

    #[error("duplicate user: {0}")]
    DuplicateUser(String),

    #[error("stored password hash for {username} is invalid: {reason}")]
    InvalidHash { username: String, reason: String },

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

#[derive(Debug, Clone)]
struct UserRecord {
    user_id: UserId,
    password_hash: String,
}

/// Username -> (user id, password hash) table
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    users: HashMap<String, UserRecord>,
}

impl UserDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the directory from configured users, validating every stored hash
    ///
    /// # Errors
    ///
    /// Returns an error if a username repeats or a hash is not a valid PHC string
    pub fn from_settings(users: &[UserSettings]) -> Result<Self, DirectoryError> {
        let mut directory = Self::new();
        for user in users {
            directory.insert(&user.username, UserId(user.user_id), &user.password_hash)?;
        }
        Ok(directory)
    }

    /// Add a user
    ///
    /// # Errors
    ///
    /// Returns an error if the username exists or the hash does not parse
    pub fn insert(
        &mut self,
        username: &str,
        user_id: UserId,
        password_hash: &str,
    ) -> Result<(), DirectoryError> {
        PasswordHash::new(password_hash).map_err(|e| DirectoryError::InvalidHash {
            username: username.to_string(),
            reason: e.to_string(),
        })?;

        if self.users.contains_key(username) {
            return Err(DirectoryError::DuplicateUser(username.to_string()));
        }

        self.users.insert(
            username.to_string(),
            UserRecord {
                user_id,
                password_hash: password_hash.to_string(),
            },
        );
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn check_password(&self, username: &str, secret: &str) -> Result<bool, DirectoryError> {
        let Some(record) = self.users.get(username) else {
            return Ok(false);
        };

        let parsed =
            PasswordHash::new(&record.password_hash).map_err(|e| DirectoryError::InvalidHash {
                username: username.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Argon2::default()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok())
    }
}

#[async_trait]
impl CredentialVerifier for UserDirectory {
    async fn verify(&self, username: &str, secret: &str) -> Result<bool, DirectoryError> {
        self.check_password(username, secret)
    }
}

#[async_trait]
impl IdentityResolver for UserDirectory {
    async fn resolve_user_id(&self, owner: &str) -> Result<UserId, DirectoryError> {
        self.users
            .get(owner)
            .map(|record| record.user_id)
            .ok_or_else(|| DirectoryError::UnknownUser(owner.to_string()))
    }
}

/// Hash a password with the default argon2id parameters
///
/// # Errors
///
/// Returns an error if salt generation or hashing fails
pub fn hash_password(plain: &str) -> Result<String, DirectoryError> {
    hash_password_with(&Argon2::default(), plain)
}

/// Hash a password with explicit argon2 parameters
///
/// # Errors
///
/// Returns an error if salt generation or hashing fails
pub fn hash_password_with(argon2: &Argon2<'_>, plain: &str) -> Result<String, DirectoryError> {
    let mut salt_bytes = [0u8; SALT_BYTES];
    OsRng
        .try_fill_bytes(&mut salt_bytes)
        .map_err(|e| DirectoryError::Hashing(e.to_string()))?;
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|e| DirectoryError::Hashing(e.to_string()))?;

    argon2
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DirectoryError::Hashing(e.to_string()))
}

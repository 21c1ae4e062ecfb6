//! Authentication collaborator traits
//!
//! The session core never touches password storage or the user table directly.
//! It consumes these two capabilities instead, so a database-backed implementation
//! can replace the in-memory [`UserDirectory`](crate::auth::UserDirectory).

use crate::auth::DirectoryError;
use crate::models::UserId;
use async_trait::async_trait;

/// Confirms a user's identity from a plaintext secret
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Check `secret` against the stored hash for `username`
    ///
    /// Returns `Ok(false)` for unknown users as well as wrong secrets so callers
    /// cannot tell the two apart.
    ///
    /// # Errors
    /// Returns an error only when the backing store itself fails
    async fn verify(&self, username: &str, secret: &str) -> Result<bool, DirectoryError>;
}

/// Maps a session owner to the numeric user id business handlers work with
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Resolve the owner recorded in the token store
    ///
    /// # Errors
    /// Returns an error if the owner is unknown or the lookup fails
    async fn resolve_user_id(&self, owner: &str) -> Result<UserId, DirectoryError>;
}

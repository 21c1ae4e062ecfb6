//! Authentication collaborators
//!
//! Credential verification and identity resolution are consumed by the request
//! dispatcher and the login handler through the traits in [`traits`]. The
//! [`directory`] module provides a configuration-backed implementation of both.

pub mod directory;
pub mod traits;

pub use directory::{hash_password, hash_password_with, DirectoryError, UserDirectory};
pub use traits::{CredentialVerifier, IdentityResolver};

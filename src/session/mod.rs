//! Session Management Module
//!
//! This module owns every authentication credential the service hands out.
//!
//! # Modules
//!
//! - [`tokenizer`] - The token store: issue, authorize, rotate, revoke
//! - [`token`] - Random token generation
//! - [`bearer`] - `Authorization: Bearer` header parsing
//! - [`clock`] - Injectable time source used for expiry checks
//! - [`errors`] - Session error taxonomy

pub mod bearer;
pub mod clock;
pub mod errors;
pub mod token;
pub mod tokenizer;

// Re-export commonly used items for convenience
pub use bearer::{bearer_from_request, extract_bearer, BEARER_PREFIX};
pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::TokenError;
pub use tokenizer::{
    StoreStats, TokenConfig, TokenConfigError, TokenPair, TokenStore, DEFAULT_ACCESS_TTL_MINUTES,
    DEFAULT_REFRESH_TTL_HOURS,
};

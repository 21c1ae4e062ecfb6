// Centralized logging helpers for token and dispatch events
use log::{debug, info, warn};

use crate::session::TokenError;

/// Number of leading token characters that may appear in logs
const FINGERPRINT_LEN: usize = 8;

pub struct LoggingHelper;

impl LoggingHelper {
    /// Short, log-safe prefix of a token value
    #[must_use]
    pub fn fingerprint(token: &str) -> &str {
        token.get(..FINGERPRINT_LEN).unwrap_or(token)
    }

    /// Log a freshly issued pair
    pub fn log_pair_issued(owner: &str, access_token: &str) {
        info!(
            "Issued token pair for {owner} (access {}…)",
            Self::fingerprint(access_token)
        );
    }

    /// Log a successful refresh rotation
    pub fn log_rotation(owner: &str, old_refresh: &str, new_access: &str) {
        info!(
            "Rotated session for {owner}: refresh {}… consumed, access {}… issued",
            Self::fingerprint(old_refresh),
            Self::fingerprint(new_access)
        );
    }

    /// Log an explicit logout
    pub fn log_revocation(owner: &str, existed: bool) {
        if existed {
            info!("Revoked session for {owner}");
        } else {
            debug!("Revoke requested for {owner} without an active session");
        }
    }

    /// Log an unknown path
    pub fn log_path_not_found(path: &str) {
        warn!("path {path} not found");
    }

    /// Log a known path hit with an unregistered method
    pub fn log_method_not_allowed(method: &str, path: &str) {
        warn!("method {method} does not exist on path {path}");
    }

    /// Log why a protected request was turned away; the client only sees a generic 401
    pub fn log_auth_rejected(method: &str, path: &str, reason: &TokenError) {
        debug!("Rejected {method} {path}: {reason}");
    }

    /// Log caller identity resolution failures
    pub fn log_identity_unresolved(owner: &str, reason: &dyn std::fmt::Display) {
        warn!("Could not resolve user id for {owner}: {reason}");
    }

    /// Log a request handed to its handler
    pub fn log_dispatch(method: &str, path: &str, request_id: &uuid::Uuid, caller: Option<i64>) {
        match caller {
            Some(user_id) => debug!("Dispatching {method} {path} [{request_id}] for user {user_id}"),
            None => debug!("Dispatching {method} {path} [{request_id}] (public)"),
        }
    }
}

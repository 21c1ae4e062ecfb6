//! Token Store - in-process issuance, validation and rotation of session credentials
//!
//! The `TokenStore` is the single owner of every session and access grant. Callers
//! only ever see opaque token strings.
//!
//! ## State
//!
//! - **Session**: one per owner, holds the current refresh token and its expiry.
//! - **Access grant**: short lived, keyed by access token, remembers the owner and the
//!   refresh token of the session it was issued with. A grant is only honoured while
//!   that exact session is still the owner's current one.
//!
//! ## Locking
//!
//! All tables sit behind one `parking_lot::RwLock`. `authorize` takes the read lock
//! and only upgrades to the write lock on the expired-session path. `issue_pair`,
//! `rotate`, `revoke` and `purge_expired` hold the write lock for their whole
//! mutation, which is what makes rotation single-use under contention. `issue_pair`
//! and `rotate` sweep expired records while they hold it.

use crate::session::clock::{Clock, SystemClock};
use crate::session::errors::TokenError;
use crate::session::token::generate_token;
use crate::utils::logging::LoggingHelper;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Default lifetime of an access token
pub const DEFAULT_ACCESS_TTL_MINUTES: i64 = 15;

/// Default lifetime of a refresh token (7 days)
pub const DEFAULT_REFRESH_TTL_HOURS: i64 = 7 * 24;

// =============================================================================
// Configuration
// =============================================================================

/// Lifetimes applied to newly issued token pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenConfig {
    access_ttl: Duration,
    refresh_ttl: Duration,
}

/// Rejected token lifetimes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("access ttl ({access_ttl}) must be positive and shorter than refresh ttl ({refresh_ttl})")]
pub struct TokenConfigError {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl TokenConfig {
    /// Build a config, requiring `0 < access_ttl < refresh_ttl`
    ///
    /// # Errors
    ///
    /// Returns `TokenConfigError` if the access lifetime is not positive or not
    /// strictly shorter than the refresh lifetime
    pub fn new(access_ttl: Duration, refresh_ttl: Duration) -> Result<Self, TokenConfigError> {
        if access_ttl <= Duration::zero() || access_ttl >= refresh_ttl {
            return Err(TokenConfigError {
                access_ttl,
                refresh_ttl,
            });
        }
        Ok(Self {
            access_ttl,
            refresh_ttl,
        })
    }

    #[must_use]
    pub const fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    #[must_use]
    pub const fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_ttl: Duration::minutes(DEFAULT_ACCESS_TTL_MINUTES),
            refresh_ttl: Duration::hours(DEFAULT_REFRESH_TTL_HOURS),
        }
    }
}

// =============================================================================
// Records
// =============================================================================

/// Freshly issued credentials handed back to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

/// Live record counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub sessions: usize,
    pub grants: usize,
}

#[derive(Debug, Clone)]
struct Session {
    refresh_token: String,
    refresh_expiry: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct AccessGrant {
    owner: String,
    // Session generation this grant belongs to
    refresh_token: String,
    access_expiry: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct TokenTables {
    /// owner -> current session
    sessions: HashMap<String, Session>,
    /// refresh token -> owner
    refresh_index: HashMap<String, String>,
    /// access token -> grant
    grants: HashMap<String, AccessGrant>,
}

impl TokenTables {
    fn install(
        &mut self,
        owner: &str,
        access_token: String,
        refresh_token: String,
        access_expiry: DateTime<Utc>,
        refresh_expiry: DateTime<Utc>,
    ) -> TokenPair {
        if let Some(previous) = self.sessions.insert(
            owner.to_string(),
            Session {
                refresh_token: refresh_token.clone(),
                refresh_expiry,
            },
        ) {
            self.refresh_index.remove(&previous.refresh_token);
        }
        self.refresh_index
            .insert(refresh_token.clone(), owner.to_string());
        self.grants.insert(
            access_token.clone(),
            AccessGrant {
                owner: owner.to_string(),
                refresh_token: refresh_token.clone(),
                access_expiry,
            },
        );

        TokenPair {
            access_token,
            refresh_token,
            access_expires_at: access_expiry,
            refresh_expires_at: refresh_expiry,
        }
    }

    fn remove_session(&mut self, owner: &str) -> Option<Session> {
        let session = self.sessions.remove(owner)?;
        self.refresh_index.remove(&session.refresh_token);
        Some(session)
    }

    /// Settle a grant whose session looked expired under the read lock
    ///
    /// The session is only removed if it is still the generation the grant was
    /// issued with and still expired.
    fn reap_expired_session(
        &mut self,
        owner: &str,
        refresh_token: &str,
        now: DateTime<Utc>,
    ) -> TokenError {
        match self.sessions.get(owner) {
            Some(session) if session.refresh_token != refresh_token => {
                TokenError::NoActiveSession
            }
            Some(session) if now >= session.refresh_expiry => {
                self.remove_session(owner);
                log::debug!("Removed expired session for {owner}");
                TokenError::SessionExpired
            }
            Some(_) => TokenError::SessionExpired,
            None => TokenError::NoActiveSession,
        }
    }

    fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let expired_owners: Vec<String> = self
            .sessions
            .iter()
            .filter(|(_, session)| now >= session.refresh_expiry)
            .map(|(owner, _)| owner.clone())
            .collect();
        for owner in &expired_owners {
            self.remove_session(owner);
        }

        let grants_before = self.grants.len();
        self.grants.retain(|_, grant| now < grant.access_expiry);

        expired_owners.len() + (grants_before - self.grants.len())
    }
}

// =============================================================================
// Token Store
// =============================================================================

/// Sole authority for issuing, validating, rotating and revoking credentials
pub struct TokenStore {
    config: TokenConfig,
    clock: Arc<dyn Clock>,
    tables: RwLock<TokenTables>,
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new(TokenConfig::default())
    }
}

impl TokenStore {
    /// Create a store backed by the system clock
    #[must_use]
    pub fn new(config: TokenConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a store with an explicit time source
    #[must_use]
    pub fn with_clock(config: TokenConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            tables: RwLock::new(TokenTables::default()),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Issue a new access/refresh pair for `owner`, replacing any prior session
    ///
    /// # Errors
    ///
    /// Returns `TokenGenerationFailure` if the random source is unavailable; the
    /// store is left untouched in that case
    pub fn issue_pair(&self, owner: &str) -> Result<TokenPair, TokenError> {
        let now = self.clock.now();
        self.issue_pair_with_expiry(
            owner,
            now + self.config.access_ttl,
            now + self.config.refresh_ttl,
        )
    }

    /// Issue a pair with explicit expiry instants
    ///
    /// # Errors
    ///
    /// Returns `TokenGenerationFailure` if the random source is unavailable
    pub(crate) fn issue_pair_with_expiry(
        &self,
        owner: &str,
        access_expiry: DateTime<Utc>,
        refresh_expiry: DateTime<Utc>,
    ) -> Result<TokenPair, TokenError> {
        let access_token = generate_token("access")?;
        let refresh_token = generate_token("refresh")?;
        let now = self.clock.now();

        let mut tables = self.tables.write();
        let purged = tables.purge_expired(now);
        if purged > 0 {
            log::debug!("Purged {purged} expired token records");
        }
        let pair = tables.install(
            owner,
            access_token,
            refresh_token,
            access_expiry,
            refresh_expiry,
        );
        drop(tables);

        LoggingHelper::log_pair_issued(owner, &pair.access_token);
        Ok(pair)
    }

    /// Validate an access token and return the owner it was issued to
    ///
    /// Access tokens are not extended on use. When the grant is live but its session
    /// has passed the refresh expiry, the session is deleted before returning.
    ///
    /// # Errors
    ///
    /// - `TokenNotFound` if no grant carries this token
    /// - `TokenExpired` if the grant is at or past its expiry
    /// - `NoActiveSession` if the grant's session was superseded or removed
    /// - `SessionExpired` if the grant's session is at or past its refresh expiry
    pub fn authorize(&self, access_token: &str) -> Result<String, TokenError> {
        let now = self.clock.now();

        let (owner, refresh_token) = {
            let tables = self.tables.read();
            let grant = tables
                .grants
                .get(access_token)
                .ok_or(TokenError::TokenNotFound)?;

            if now >= grant.access_expiry {
                return Err(TokenError::TokenExpired);
            }

            let session = tables
                .sessions
                .get(&grant.owner)
                .filter(|session| session.refresh_token == grant.refresh_token)
                .ok_or(TokenError::NoActiveSession)?;

            if now < session.refresh_expiry {
                return Ok(grant.owner.clone());
            }

            (grant.owner.clone(), grant.refresh_token.clone())
        };

        // Read-triggered cleanup: another writer may have replaced the session in between
        Err(self
            .tables
            .write()
            .reap_expired_session(&owner, &refresh_token, now))
    }

    /// Exchange a refresh token for a new pair; the presented token stops working
    ///
    /// # Errors
    ///
    /// - `TokenNotFound` if no session currently holds this refresh token, including
    ///   a token that was already rotated away
    /// - `SessionExpired` if the session is at or past its refresh expiry (the
    ///   session is deleted)
    /// - `TokenGenerationFailure` if the random source is unavailable
    pub fn rotate(&self, old_refresh_token: &str) -> Result<TokenPair, TokenError> {
        // Draw entropy before taking the lock so a generation failure never leaves
        // the owner without a session.
        let access_token = generate_token("access")?;
        let refresh_token = generate_token("refresh")?;

        let mut tables = self.tables.write();
        let now = self.clock.now();

        let owner = tables
            .refresh_index
            .get(old_refresh_token)
            .cloned()
            .ok_or(TokenError::TokenNotFound)?;

        let refresh_expiry = tables
            .sessions
            .get(&owner)
            .filter(|session| session.refresh_token == old_refresh_token)
            .map(|session| session.refresh_expiry)
            .ok_or(TokenError::TokenNotFound)?;

        tables.remove_session(&owner);

        if now >= refresh_expiry {
            log::debug!("Refresh attempted on expired session for {owner}");
            return Err(TokenError::SessionExpired);
        }

        let purged = tables.purge_expired(now);
        if purged > 0 {
            log::debug!("Purged {purged} expired token records");
        }
        let pair = tables.install(
            &owner,
            access_token,
            refresh_token,
            now + self.config.access_ttl,
            now + self.config.refresh_ttl,
        );
        drop(tables);

        LoggingHelper::log_rotation(&owner, old_refresh_token, &pair.access_token);
        Ok(pair)
    }

    /// Look up the owner of an access grant without validating it
    #[must_use]
    pub fn owner_of(&self, access_token: &str) -> Option<String> {
        self.tables
            .read()
            .grants
            .get(access_token)
            .map(|grant| grant.owner.clone())
    }

    /// End the owner's session and drop every grant issued to them
    ///
    /// Returns `true` if a session existed.
    pub fn revoke(&self, owner: &str) -> bool {
        let mut tables = self.tables.write();
        let existed = tables.remove_session(owner).is_some();
        tables.grants.retain(|_, grant| grant.owner != owner);
        drop(tables);

        LoggingHelper::log_revocation(owner, existed);
        existed
    }

    /// Remove every expired session and grant, returning how many records went
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        self.tables.write().purge_expired(now)
    }

    #[must_use]
    pub fn stats(&self) -> StoreStats {
        let tables = self.tables.read();
        StoreStats {
            sessions: tables.sessions.len(),
            grants: tables.grants.len(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::clock::ManualClock;

    fn store_with_clock() -> (TokenStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let store = TokenStore::with_clock(TokenConfig::default(), clock.clone());
        (store, clock)
    }

    #[test]
    fn test_token_config_requires_access_shorter_than_refresh() {
        assert!(TokenConfig::new(Duration::minutes(15), Duration::days(7)).is_ok());
        assert!(TokenConfig::new(Duration::days(7), Duration::days(7)).is_err());
        assert!(TokenConfig::new(Duration::days(8), Duration::days(7)).is_err());
        assert!(TokenConfig::new(Duration::zero(), Duration::days(7)).is_err());

        let defaults = TokenConfig::default();
        assert_eq!(defaults.access_ttl(), Duration::minutes(15));
        assert_eq!(defaults.refresh_ttl(), Duration::days(7));
    }

    #[test]
    fn test_issue_then_authorize_round_trip() {
        let (store, clock) = store_with_clock();
        let pair = store.issue_pair("alice").unwrap();

        assert_ne!(pair.access_token, pair.refresh_token);
        assert_eq!(pair.access_expires_at, clock.now() + Duration::minutes(15));
        assert_eq!(pair.refresh_expires_at, clock.now() + Duration::days(7));
        assert_eq!(store.authorize(&pair.access_token).unwrap(), "alice");
    }

    #[test]
    fn test_unknown_access_token_is_not_found() {
        let store = TokenStore::default();
        assert_eq!(store.authorize("nope"), Err(TokenError::TokenNotFound));
    }

    #[test]
    fn test_access_expiry_boundary() {
        let (store, clock) = store_with_clock();
        let now = clock.now();

        let expired = store
            .issue_pair_with_expiry(
                "alice",
                now - Duration::nanoseconds(1),
                now + Duration::days(7),
            )
            .unwrap();
        assert_eq!(
            store.authorize(&expired.access_token),
            Err(TokenError::TokenExpired)
        );

        let live = store
            .issue_pair_with_expiry("bob", now + Duration::hours(1), now + Duration::days(7))
            .unwrap();
        assert_eq!(store.authorize(&live.access_token).unwrap(), "bob");
    }

    #[test]
    fn test_access_expires_at_exact_instant() {
        let (store, clock) = store_with_clock();
        let pair = store.issue_pair("alice").unwrap();

        clock.advance(Duration::minutes(15) - Duration::nanoseconds(1));
        assert!(store.authorize(&pair.access_token).is_ok());

        clock.advance(Duration::nanoseconds(1));
        assert_eq!(
            store.authorize(&pair.access_token),
            Err(TokenError::TokenExpired)
        );
    }

    #[test]
    fn test_authorize_does_not_extend_access() {
        let (store, clock) = store_with_clock();
        let pair = store.issue_pair("alice").unwrap();

        clock.advance(Duration::minutes(10));
        assert!(store.authorize(&pair.access_token).is_ok());
        clock.advance(Duration::minutes(10));
        assert_eq!(
            store.authorize(&pair.access_token),
            Err(TokenError::TokenExpired)
        );
    }

    #[test]
    fn test_expired_session_is_deleted_on_authorize() {
        let (store, clock) = store_with_clock();
        let now = clock.now();
        let pair = store
            .issue_pair_with_expiry("alice", now + Duration::hours(1), now + Duration::minutes(30))
            .unwrap();
        assert_eq!(store.stats().sessions, 1);

        clock.advance(Duration::minutes(30));
        assert_eq!(
            store.authorize(&pair.access_token),
            Err(TokenError::SessionExpired)
        );
        assert_eq!(store.stats().sessions, 0);

        // Session is gone now, so the grant has nothing to hang off
        assert_eq!(
            store.authorize(&pair.access_token),
            Err(TokenError::NoActiveSession)
        );
        assert_eq!(store.rotate(&pair.refresh_token), Err(TokenError::TokenNotFound));
    }

    #[test]
    fn test_second_issue_invalidates_first_pair() {
        let store = TokenStore::default();
        let first = store.issue_pair("alice").unwrap();
        let second = store.issue_pair("alice").unwrap();

        assert_eq!(store.rotate(&first.refresh_token), Err(TokenError::TokenNotFound));
        assert_eq!(
            store.authorize(&first.access_token),
            Err(TokenError::NoActiveSession)
        );
        assert_eq!(store.authorize(&second.access_token).unwrap(), "alice");
        assert_eq!(store.stats().sessions, 1);
    }

    #[test]
    fn test_rotation_scenario() {
        let store = TokenStore::default();
        let first = store.issue_pair("alice").unwrap();
        assert_eq!(store.authorize(&first.access_token).unwrap(), "alice");

        let second = store.rotate(&first.refresh_token).unwrap();
        assert_ne!(second.refresh_token, first.refresh_token);

        assert_eq!(
            store.authorize(&first.access_token),
            Err(TokenError::NoActiveSession)
        );
        assert_eq!(store.authorize(&second.access_token).unwrap(), "alice");
    }

    #[test]
    fn test_rotation_is_single_use() {
        let store = TokenStore::default();
        let pair = store.issue_pair("alice").unwrap();

        assert!(store.rotate(&pair.refresh_token).is_ok());
        assert_eq!(store.rotate(&pair.refresh_token), Err(TokenError::TokenNotFound));
        assert_eq!(store.rotate(&pair.refresh_token), Err(TokenError::TokenNotFound));
    }

    #[test]
    fn test_rotate_expired_session_deletes_it() {
        let (store, clock) = store_with_clock();
        let pair = store.issue_pair("alice").unwrap();

        clock.advance(Duration::days(7));
        assert_eq!(store.rotate(&pair.refresh_token), Err(TokenError::SessionExpired));
        assert_eq!(store.stats().sessions, 0);
        assert_eq!(store.rotate(&pair.refresh_token), Err(TokenError::TokenNotFound));
    }

    #[test]
    fn test_sessions_are_per_owner() {
        let store = TokenStore::default();
        let alice = store.issue_pair("alice").unwrap();
        let bob = store.issue_pair("bob").unwrap();

        store.rotate(&alice.refresh_token).unwrap();
        assert_eq!(store.authorize(&bob.access_token).unwrap(), "bob");
        assert_eq!(store.stats().sessions, 2);
    }

    #[test]
    fn test_revoke_drops_session_and_grants() {
        let store = TokenStore::default();
        let pair = store.issue_pair("alice").unwrap();
        assert_eq!(store.owner_of(&pair.access_token).as_deref(), Some("alice"));

        assert!(store.revoke("alice"));
        assert!(!store.revoke("alice"));
        assert_eq!(
            store.authorize(&pair.access_token),
            Err(TokenError::TokenNotFound)
        );
        assert_eq!(store.rotate(&pair.refresh_token), Err(TokenError::TokenNotFound));
        assert_eq!(store.stats(), StoreStats::default());
    }

    #[test]
    fn test_purge_expired_removes_stale_records() {
        let (store, clock) = store_with_clock();
        store.issue_pair("alice").unwrap();
        store.issue_pair("bob").unwrap();

        clock.advance(Duration::minutes(16));
        // Both grants are past expiry, sessions are still live
        assert_eq!(store.purge_expired(), 2);
        assert_eq!(store.stats(), StoreStats { sessions: 2, grants: 0 });

        clock.advance(Duration::days(7));
        assert_eq!(store.purge_expired(), 2);
        assert_eq!(store.stats(), StoreStats::default());
    }

    #[test]
    fn test_issue_sweeps_expired_records() {
        let (store, clock) = store_with_clock();
        store.issue_pair("alice").unwrap();

        clock.advance(Duration::days(8));
        store.issue_pair("bob").unwrap();
        assert_eq!(store.stats(), StoreStats { sessions: 1, grants: 1 });
    }

    #[test]
    fn test_rotation_keeps_grants_bounded() {
        let (store, clock) = store_with_clock();
        let mut pair = store.issue_pair("alice").unwrap();

        // Refresh-only client: each access token lapses before the next rotation
        for _ in 0..500 {
            clock.advance(Duration::minutes(20));
            pair = store.rotate(&pair.refresh_token).unwrap();
        }

        assert_eq!(store.stats(), StoreStats { sessions: 1, grants: 1 });
        assert_eq!(store.authorize(&pair.access_token).unwrap(), "alice");
    }

    #[test]
    fn test_rotation_keeps_unexpired_superseded_grants() {
        let (store, clock) = store_with_clock();
        let first = store.issue_pair("alice").unwrap();

        clock.advance(Duration::minutes(5));
        store.rotate(&first.refresh_token).unwrap();
        assert_eq!(store.stats().grants, 2);
        assert_eq!(
            store.authorize(&first.access_token),
            Err(TokenError::NoActiveSession)
        );
    }

    #[test]
    fn test_reap_leaves_replacement_session_alone() {
        let now = Utc::now();
        let mut tables = TokenTables::default();
        let stale = tables.install(
            "alice",
            "access-1".to_string(),
            "refresh-1".to_string(),
            now + Duration::hours(1),
            now - Duration::minutes(1),
        );
        let fresh = tables.install(
            "alice",
            "access-2".to_string(),
            "refresh-2".to_string(),
            now + Duration::hours(1),
            now + Duration::days(7),
        );

        assert_eq!(
            tables.reap_expired_session("alice", &stale.refresh_token, now),
            TokenError::NoActiveSession
        );
        assert_eq!(
            tables.sessions["alice"].refresh_token,
            fresh.refresh_token
        );
        assert_eq!(
            tables.refresh_index.get(&fresh.refresh_token).map(String::as_str),
            Some("alice")
        );
    }

    #[test]
    fn test_reap_removes_same_expired_session() {
        let now = Utc::now();
        let mut tables = TokenTables::default();
        let stale = tables.install(
            "alice",
            "access-1".to_string(),
            "refresh-1".to_string(),
            now + Duration::hours(1),
            now,
        );

        assert_eq!(
            tables.reap_expired_session("alice", &stale.refresh_token, now),
            TokenError::SessionExpired
        );
        assert!(tables.sessions.is_empty());
        assert!(tables.refresh_index.is_empty());

        // Already reaped by someone else
        assert_eq!(
            tables.reap_expired_session("alice", &stale.refresh_token, now),
            TokenError::NoActiveSession
        );
    }

    #[test]
    fn test_concurrent_rotation_has_one_winner() {
        let store = TokenStore::default();
        let pair = store.issue_pair("alice").unwrap();

        let results: Vec<Result<TokenPair, TokenError>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|_| scope.spawn(|| store.rotate(&pair.refresh_token)))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let winners: Vec<&TokenPair> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| *e == TokenError::TokenNotFound));

        let winner = winners[0];
        assert_eq!(store.stats().sessions, 1);
        assert_eq!(store.authorize(&winner.access_token).unwrap(), "alice");
        assert!(store.rotate(&winner.refresh_token).is_ok());
    }
}

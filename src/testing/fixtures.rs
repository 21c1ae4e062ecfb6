//! Test fixtures providing pre-built test objects
//!
//! Password hashing is deliberately slow in production; fixtures hash with the
//! smallest argon2 parameters and build the shared user directory once.

use crate::auth::{hash_password_with, UserDirectory};
use crate::router::{Dispatcher, InitState, InitValues};
use crate::routes::build_dispatcher;
use crate::session::{ManualClock, TokenConfig, TokenStore};
use crate::settings::{PayrollSettings, PayslipSettings, UserSettings};
use argon2::{Algorithm, Argon2, Params, Version};
use chrono::{DateTime, Utc};
use std::sync::{Arc, OnceLock};

use super::constants::{
    ALICE, ALICE_ID, ALICE_PASSWORD, BOB, BOB_ID, BOB_PASSWORD, TEST_EPOCH, TEST_PAYROLL_END,
    TEST_PAYROLL_START,
};

static USERS: OnceLock<Vec<UserSettings>> = OnceLock::new();

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// Hash a password with minimal argon2id cost
    ///
    /// # Panics
    ///
    /// Panics if hashing fails
    #[must_use]
    pub fn password_hash(plain: &str) -> String {
        let params = Params::new(Params::MIN_M_COST, 1, 1, None).expect("valid argon2 params");
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        hash_password_with(&argon2, plain).expect("hash test password")
    }

    /// Configured users: alice (id 1) and bob (id 2)
    #[must_use]
    pub fn users() -> Vec<UserSettings> {
        USERS
            .get_or_init(|| {
                vec![
                    UserSettings {
                        username: ALICE.to_string(),
                        user_id: ALICE_ID,
                        password_hash: Self::password_hash(ALICE_PASSWORD),
                    },
                    UserSettings {
                        username: BOB.to_string(),
                        user_id: BOB_ID,
                        password_hash: Self::password_hash(BOB_PASSWORD),
                    },
                ]
            })
            .clone()
    }

    /// Directory built from [`Self::users`]
    ///
    /// # Panics
    ///
    /// Panics if the fixture users are invalid
    #[must_use]
    pub fn user_directory() -> UserDirectory {
        UserDirectory::from_settings(&Self::users()).expect("fixture users are valid")
    }

    /// Default settings with fixture users and an open payroll period
    #[must_use]
    pub fn settings() -> PayslipSettings {
        PayslipSettings {
            users: Self::users(),
            payroll: PayrollSettings {
                start: Some(TEST_PAYROLL_START.to_string()),
                end: Some(TEST_PAYROLL_END.to_string()),
            },
            ..PayslipSettings::default()
        }
    }

    /// Fixed starting instant for manual clocks
    ///
    /// # Panics
    ///
    /// Panics if the epoch constant is not RFC 3339
    #[must_use]
    pub fn epoch() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(TEST_EPOCH)
            .expect("valid test epoch")
            .with_timezone(&Utc)
    }

    #[must_use]
    pub fn manual_clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Self::epoch()))
    }

    /// Default-config store driven by a manual clock
    #[must_use]
    pub fn store_with_manual_clock() -> (Arc<TokenStore>, Arc<ManualClock>) {
        Self::store_with_config(TokenConfig::default())
    }

    #[must_use]
    pub fn store_with_config(config: TokenConfig) -> (Arc<TokenStore>, Arc<ManualClock>) {
        let clock = Self::manual_clock();
        let store = Arc::new(TokenStore::with_clock(config, clock.clone()));
        (store, clock)
    }

    /// Init state carrying the fixture payroll period
    ///
    /// # Panics
    ///
    /// Panics if the fixture period does not parse
    #[must_use]
    pub fn init_state() -> Arc<InitState> {
        let payroll_period = Self::settings()
            .payroll_period()
            .expect("valid fixture payroll period");
        Arc::new(InitState::new(InitValues { payroll_period }))
    }

    /// Full gateway route table over the given store
    ///
    /// # Panics
    ///
    /// Panics if route registration fails
    #[must_use]
    pub fn dispatcher(store: Arc<TokenStore>) -> Dispatcher {
        build_dispatcher(
            &Self::settings(),
            store,
            Arc::new(Self::user_directory()),
            Self::init_state(),
        )
        .expect("route table registers cleanly")
    }
}

//! Testing utilities for the payslip gateway
//!
//! ## Organization
//!
//! - [`fixtures`] - Pre-built users, settings, stores and dispatchers
//! - [`requests`] - HTTP request builders for exercising handlers and the dispatcher
//!
//! ## Usage
//!
//! ```rust
//! use payslip::testing::{constants::ALICE, TestFixtures};
//!
//! let (store, clock) = TestFixtures::store_with_manual_clock();
//! let pair = store.issue_pair(ALICE).unwrap();
//!
//! clock.advance(chrono::Duration::minutes(16));
//! assert!(store.authorize(&pair.access_token).is_err());
//! ```

pub mod fixtures;
pub mod requests;

pub use fixtures::TestFixtures;
pub use requests::RequestBuilder;

/// Common test constants
pub mod constants {
    pub const ALICE: &str = "alice";
    pub const ALICE_PASSWORD: &str = "alice-pass";
    pub const ALICE_ID: i64 = 1;

    pub const BOB: &str = "bob";
    pub const BOB_PASSWORD: &str = "bob-pass";
    pub const BOB_ID: i64 = 2;

    /// Fixed instant manual clocks start at
    pub const TEST_EPOCH: &str = "2026-10-01T08:00:00Z";

    /// Payroll period configured in fixture settings
    pub const TEST_PAYROLL_START: &str = "2026-10-01T00:00:00Z";
    pub const TEST_PAYROLL_END: &str = "2026-10-31T23:59:59Z";
}

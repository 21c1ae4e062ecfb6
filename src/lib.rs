#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the payslip application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod auth;
pub mod handlers;
pub mod models;
pub mod router;
pub mod routes;
pub mod session;
pub mod settings;
pub mod utils;

// Test utilities, available to unit tests and to integration tests via the `testing` feature
#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use auth::UserDirectory;
pub use router::{dispatch_request, Dispatcher, InitState};
pub use routes::build_dispatcher;
pub use session::{TokenError, TokenStore};
pub use settings::PayslipSettings;

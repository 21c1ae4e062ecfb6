// HTTP endpoints served through the dispatcher
pub mod auth;
pub mod system;

pub use auth::{LoginHandler, LogoutHandler, RefreshHandler};
pub use system::{whoami, HealthHandler};

//! Typed request context handed to every route handler
//!
//! The dispatcher builds one `RequestContext` per request. Protected routes always
//! carry a resolved [`Caller`]; public routes carry `None`. Every context gets a
//! fresh correlation id and a snapshot of the process-wide init values.

use crate::models::UserId;
use crate::session::TokenError;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use uuid::Uuid;

/// Bounds of the currently open payroll period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PayrollPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Process-wide values populated at startup and copied into each request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitValues {
    pub payroll_period: Option<PayrollPeriod>,
}

/// Shared, read-mostly holder of [`InitValues`]
#[derive(Debug, Default)]
pub struct InitState {
    values: RwLock<InitValues>,
}

impl InitState {
    #[must_use]
    pub fn new(values: InitValues) -> Self {
        Self {
            values: RwLock::new(values),
        }
    }

    /// Copy of the current values, taken under the read lock
    #[must_use]
    pub fn snapshot(&self) -> InitValues {
        self.values.read().clone()
    }

    /// Replace the open payroll period
    pub fn set_payroll_period(&self, period: Option<PayrollPeriod>) {
        self.values.write().payroll_period = period;
    }
}

/// Authenticated identity of the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Owner recorded by the token store (the username)
    pub owner: String,
    pub user_id: UserId,
}

/// Per-request values threaded through the handler call chain
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Correlation id, unique per dispatched request
    pub request_id: Uuid,
    pub caller: Option<Caller>,
    pub init: InitValues,
}

impl RequestContext {
    /// Context for a request that skipped authorization
    #[must_use]
    pub fn public(init: InitValues) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            caller: None,
            init,
        }
    }

    /// Context for a request whose bearer token was authorized
    #[must_use]
    pub fn authenticated(caller: Caller, init: InitValues) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            caller: Some(caller),
            init,
        }
    }

    /// The authenticated caller
    ///
    /// # Errors
    ///
    /// Returns `NoActiveSession` when the handler runs on a public route
    pub fn caller(&self) -> Result<&Caller, TokenError> {
        self.caller.as_ref().ok_or(TokenError::NoActiveSession)
    }
}

//! Error types for the connection manager.
//!
//! This module defines all error types using `thiserror`. The only errors
//! that cross the crate boundary are missing configuration and exhausted
//! retry budgets; primary-status check failures are absorbed into control
//! decisions and never surface as errors.

use mongodb::error::ErrorKind;
use thiserror::Error;

/// A failure reported by the underlying driver, classified as transient
/// (worth retrying) or fatal (surfaced immediately).
#[derive(Debug, Error)]
#[error("{message}")]
pub struct DriverError {
    message: String,
    transient: bool,
    #[source]
    source: Option<mongodb::error::Error>,
}

impl DriverError {
    /// Create a transient error (retried up to the configured budget).
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            transient: true,
            source: None,
        }
    }

    /// Create a fatal error (never retried).
    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            transient: false,
            source: None,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.transient
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Classify mongodb driver errors.
///
/// Server selection, I/O and cleared-pool errors are the conditions a
/// reconnect can plausibly fix; everything else (bad URI, authentication,
/// command rejection) is surfaced immediately.
impl From<mongodb::error::Error> for DriverError {
    fn from(err: mongodb::error::Error) -> Self {
        let transient = matches!(
            *err.kind,
            ErrorKind::ServerSelection { .. }
                | ErrorKind::Io(_)
                | ErrorKind::ConnectionPoolCleared { .. }
        );
        Self {
            message: err.to_string(),
            transient,
            source: Some(err),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConnError {
    /// A required setting is absent or empty. Fatal, raised at construction.
    #[error("missing required setting: {name}")]
    MissingSetting { name: String },

    /// Transient connection failures exhausted the retry budget.
    #[error("persistent connection failures after {attempts} attempts")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: DriverError,
    },

    /// The server never reported itself as the writable primary within the
    /// retry budget.
    #[error("no writable primary found after {attempts} attempts")]
    NoPrimary { attempts: u32 },

    /// A non-retryable driver failure.
    #[error("driver error")]
    Driver(#[from] DriverError),
}

impl ConnError {
    pub fn missing_setting(name: impl Into<String>) -> Self {
        Self::MissingSetting { name: name.into() }
    }

    /// Check if this error is retryable by the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RetriesExhausted { .. } | Self::NoPrimary { .. }
        )
    }
}

/// Result type alias for connection operations.
pub type ConnResult<T> = Result<T, ConnError>;

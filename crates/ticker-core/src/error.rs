//! Error types for ticker cache operations.
//!
//! This module defines [`TickerCacheError`] which covers every failure the
//! cache can signal: configuration problems, invalid arguments, missing rows,
//! and failures talking to or interpreting the remote table.

use chrono::NaiveDate;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while reading from the indicator table.
///
/// Matching on the whole enum handles every failure. Callers that want to
/// treat "no data" differently match [`TickerCacheError::NotFound`] first.
#[derive(Error, Debug)]
pub enum TickerCacheError {
    /// No row matched a lookup that expects one.
    #[error("Ticker {symbol} not found{}", for_date(.date))]
    NotFound {
        /// The symbol that was requested.
        symbol: String,
        /// The date that was requested, if the lookup was pinned to one.
        date: Option<NaiveDate>,
    },

    /// The endpoint or credential is missing or malformed.
    #[error("Not configured: {0}")]
    NotConfigured(String),

    /// An invalid argument was passed to an operation.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Network-related errors (connection failures, timeouts, non-success statuses).
    #[error("Network error: {0}")]
    Network(String),

    /// The remote service rejected the credential.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The remote service is throttling requests.
    #[error("Rate limited: retry after {retry_after:?}")]
    RateLimited {
        /// Suggested time to wait before retrying.
        retry_after: Option<Duration>,
    },

    /// A response body or row could not be mapped into the record model.
    #[error("Parse error: {0}")]
    Parse(String),
}

fn for_date(date: &Option<NaiveDate>) -> String {
    date.map(|d| format!(" for date {d}")).unwrap_or_default()
}

impl TickerCacheError {
    /// Returns true if this error means no matching row exists.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if this error was raised before any request was issued.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::NotConfigured(_) | Self::InvalidParameter(_))
    }
}

impl From<serde_json::Error> for TickerCacheError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

/// Result type alias using [`TickerCacheError`].
pub type Result<T> = std::result::Result<T, TickerCacheError>;

//! Error types for Corral.
//!
//! All errors in Corral are strongly typed using thiserror.
//! Every error is synchronous and surfaces at the call site that caused it;
//! there is no I/O, so nothing is ever retried internally.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

use crate::boundary::Namespace;
use crate::callbacks::SubscriptionId;
use crate::region::RegionId;

/// Validation errors that occur while parsing or constructing identifiers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A boundary name that is none of the accepted spellings.
    #[error("Unknown boundary '{input}' (expected lower/min, upper/max or both/conjunction)")]
    UnknownBoundary {
        /// The rejected text.
        input: String,
    },

    /// A direction other than `enter` or `exit`.
    #[error("Unknown direction '{input}' (expected enter or exit)")]
    UnknownDirection {
        /// The rejected text.
        input: String,
    },

    /// An event name not shaped like `enter-min.menu`.
    #[error("Malformed event identifier '{input}' (expected <direction>-<boundary>[.<namespace>])")]
    MalformedEvent {
        /// The rejected event name.
        input: String,
    },

    /// Empty namespace tag.
    #[error("Namespace cannot be empty")]
    EmptyNamespace,

    /// Empty region id.
    #[error("Region id cannot be empty")]
    EmptyRegionId,

    /// Empty axis name.
    #[error("Axis cannot be empty")]
    EmptyAxis,
}

/// Lookup errors for operations against something that is not registered.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotFoundError {
    /// No region registered under the id.
    #[error("Region not found: {id}")]
    Region {
        /// The requested id.
        id: RegionId,
    },

    /// A namespace detach matched no subscription.
    #[error("Namespace '{namespace}' has no subscriptions on region {region}")]
    Namespace {
        /// Region the detach targeted.
        region: RegionId,
        /// The namespace that matched nothing.
        namespace: Namespace,
    },

    /// A subscription detach matched nothing.
    #[error("Subscription {id} not found on region {region}")]
    Subscription {
        /// Region the detach targeted.
        region: RegionId,
        /// The unknown subscription.
        id: SubscriptionId,
    },
}

/// Errors receiving from an event stream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// Nothing arrived within the timeout.
    #[error("Receive timed out after {duration_ms}ms")]
    Timeout {
        /// The timeout that elapsed, in milliseconds.
        duration_ms: u64,
    },

    /// The forwarding subscription is gone and the buffer is empty.
    #[error("Stream disconnected: its region or subscription was removed")]
    Disconnected,
}

/// Failure raised by a user callback during dispatch.
///
/// Aborts the remaining callbacks of the dispatch it occurred in and
/// propagates to whoever started the dispatch.
#[derive(Debug)]
pub struct CallbackError {
    message: String,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl CallbackError {
    /// Creates a callback error from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps an underlying error raised inside a callback.
    #[must_use]
    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// The message the callback failed with.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CallbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for CallbackError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

/// Top-level error type for Corral.
#[derive(Debug, Error)]
pub enum CorralError {
    /// Invalid input.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Unknown region, namespace or subscription.
    #[error("Not found: {0}")]
    NotFound(#[from] NotFoundError),

    /// A user callback failed.
    #[error("Callback failed: {0}")]
    Callback(#[from] CallbackError),
}

impl CorralError {
    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a lookup error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns true if a user callback failed.
    #[must_use]
    pub const fn is_callback(&self) -> bool {
        matches!(self, Self::Callback(_))
    }
}

/// Result type alias for Corral operations.
pub type CorralResult<T> = Result<T, CorralError>;

//! Error types for element discovery and interaction.

use signup_driver::DriverError;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while locating or manipulating page elements.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// No candidate matched a visible element within the allotted time
    #[error("no {role} found after {elapsed:?}; tried {attempted}")]
    NotFound {
        /// Role that was searched for
        role: String,
        /// Candidate strategies that were tried
        attempted: String,
        /// Time spent searching
        elapsed: Duration,
    },

    /// Native and scripted interactions were both blocked
    #[error("could not {action}: {reason}")]
    Obstructed {
        /// Interaction that failed
        action: String,
        /// Last error seen
        reason: String,
    },

    /// Unrecoverable driver failure
    #[error("driver error: {0}")]
    Driver(#[from] DriverError),
}

impl DiscoveryError {
    /// Whether the caller may fall through to its next discovery tier.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;

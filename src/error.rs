//! Error types for material-ingest
//!
//! Validation errors (`InvalidUrl`, `EmptyBatch`, `MissingCategory`) are local
//! and recoverable: staged state is left untouched and the caller can correct
//! the input and retry. Transfer-level failures never surface here — they are
//! contained per item and reported through [`crate::types::Event::ItemFailed`]
//! and the final batch summary.

use crate::types::ItemId;
use thiserror::Error;

/// Result type alias for material-ingest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for material-ingest
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed URL passed to `add_url`; staging is unchanged
    #[error("invalid URL '{input}': {source}")]
    InvalidUrl {
        /// The raw input that failed to parse
        input: String,
        /// The underlying parse error
        #[source]
        source: url::ParseError,
    },

    /// Submission attempted with no staged items
    #[error("cannot submit an empty batch: stage at least one file or URL first")]
    EmptyBatch,

    /// Submission attempted without a category
    #[error("category is required before submitting a batch")]
    MissingCategory,

    /// Staging is frozen because a batch is currently transferring
    #[error("a batch is already in flight: staging is frozen until it completes")]
    BatchInFlight,

    /// Item not found in the staging area or active batch
    #[error("item {0} not found")]
    NotFound(ItemId),

    /// Cannot perform operation on an item in its current state
    #[error("cannot {operation} item {id} in state {current_state}")]
    InvalidState {
        /// The item ID that is in an invalid state for the operation
        id: ItemId,
        /// The operation that was attempted (e.g., "cancel")
        operation: String,
        /// The current state that prevents the operation
        current_state: String,
    },
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_url_message_includes_offending_input() {
        let err = Error::InvalidUrl {
            input: "not-a-url".to_string(),
            source: url::ParseError::RelativeUrlWithoutBase,
        };
        let msg = err.to_string();
        assert!(
            msg.contains("not-a-url"),
            "message should name the rejected input, got: {msg}"
        );
    }

    #[test]
    fn invalid_state_message_names_operation_and_state() {
        let err = Error::InvalidState {
            id: ItemId::new(3),
            operation: "cancel".to_string(),
            current_state: "Completed".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("cancel"), "got: {msg}");
        assert!(msg.contains("Completed"), "got: {msg}");
        assert!(msg.contains('3'), "got: {msg}");
    }
}

//! Submission guard — gate ingestion start on batch-level preconditions.

use crate::error::{Error, Result};
use crate::types::Event;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use super::IngestPipeline;

impl IngestPipeline {
    /// Submit the staged batch for ingestion
    ///
    /// Validates batch-level preconditions, freezes the staging area, and
    /// starts one transfer task per item. Returns immediately — completion is
    /// delivered asynchronously as a single
    /// [`Event::BatchCompleted`](crate::types::Event::BatchCompleted), after
    /// which staged state is cleared and the pipeline accepts a new batch.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyBatch`] if no items are staged
    /// - [`Error::MissingCategory`] if no category is set
    /// - [`Error::BatchInFlight`] if a previous batch is still transferring
    ///
    /// Validation failures are reported before any transfer begins and never
    /// partially start an item: the batch stays staged and editable, and a
    /// [`Event::BatchRejected`](crate::types::Event::BatchRejected) event is
    /// emitted alongside the returned error.
    pub async fn submit(&self) -> Result<()> {
        self.ensure_not_in_flight()?;

        let staging = self.staging.lock().await;

        if staging.items.is_empty() {
            drop(staging);
            return Err(self.reject(Error::EmptyBatch));
        }

        let category = match staging.category.clone() {
            Some(category) if !category.trim().is_empty() => category,
            _ => {
                drop(staging);
                return Err(self.reject(Error::MissingCategory));
            }
        };

        // Freeze the batch. compare_exchange arbitrates between concurrent
        // submits that both passed the in-flight check above.
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::BatchInFlight);
        }

        let items: Vec<_> = staging.items.clone();
        drop(staging);

        tracing::info!(
            items = items.len(),
            category = %category,
            "Batch submitted, starting transfers"
        );

        self.start_batch(Arc::new(items)).await;

        Ok(())
    }

    /// Emit a rejection event and pass the error back to the caller
    fn reject(&self, error: Error) -> Error {
        tracing::warn!(reason = %error, "Batch submission rejected");
        self.emit_event(Event::BatchRejected {
            reason: error.to_string(),
        });
        error
    }
}

//! In-flight lifecycle control — cooperative cancellation.

use crate::error::{Error, Result};
use crate::types::ItemId;

use super::IngestPipeline;

impl IngestPipeline {
    /// Cancel one in-flight item
    ///
    /// Marks the item for cooperative cancellation: it stops advancing and
    /// transitions to the terminal `Cancelled` state without blocking sibling
    /// items. The batch-completion signal still fires exactly once, counting
    /// the item under `cancelled` in the summary.
    ///
    /// Items that have not been submitted yet cannot be cancelled — remove
    /// them from the staging area with
    /// [`remove_item`](IngestPipeline::remove_item) instead.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if no item with this id exists
    /// - [`Error::InvalidState`] if the item is staged-only or already terminal
    pub async fn cancel_item(&self, id: ItemId) -> Result<()> {
        {
            let active = self.active_items.lock().await;
            if let Some(token) = active.get(&id) {
                tracing::info!(item_id = id.0, "Cancellation requested");
                token.cancel();
                return Ok(());
            }
        }

        // Not actively transferring: distinguish "unknown id" from "known but
        // not cancellable" for a useful error.
        match self.item(id).await {
            Some(info) => Err(Error::InvalidState {
                id,
                operation: "cancel".to_string(),
                current_state: format!("{:?}", info.state),
            }),
            None => Err(Error::NotFound(id)),
        }
    }

    /// Cancel every in-flight item of the current batch
    ///
    /// Returns the number of items that were signalled. The batch still
    /// finishes normally: once every item reaches a terminal state, one
    /// `BatchCompleted` summary fires with the cancelled counts.
    pub async fn cancel_batch(&self) -> usize {
        let active = self.active_items.lock().await;
        for token in active.values() {
            token.cancel();
        }
        let cancelled = active.len();
        if cancelled > 0 {
            tracing::info!(items = cancelled, "Batch cancellation requested");
        }
        cancelled
    }
}

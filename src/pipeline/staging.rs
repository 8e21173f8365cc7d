//! Staging area — accumulate candidate items before submission.
//!
//! Staging mutations are purely in-memory and fire no lifecycle events; no
//! I/O happens until submission. All operations reject with `BatchInFlight`
//! while a submitted batch is transferring.

use crate::error::{Error, Result};
use crate::types::{ItemId, ItemInfo, ItemKind, NewFile, StagingStats};
use std::sync::Arc;

use super::{IngestPipeline, ItemCell};

impl IngestPipeline {
    /// Stage files for the next batch
    ///
    /// Items are appended in the order given. No size or type restriction is
    /// enforced here — validation happens at submission. Returns the assigned
    /// item IDs, in the same order as the input.
    pub async fn add_files(&self, files: Vec<NewFile>) -> Result<Vec<ItemId>> {
        let mut staging = self.staging.lock().await;
        self.ensure_not_in_flight()?;
        let mut ids = Vec::with_capacity(files.len());
        for file in files {
            let id = self.allocate_item_id();
            tracing::debug!(item_id = id.0, name = %file.name, size_bytes = file.size_bytes, "File staged");
            staging.items.push(Arc::new(ItemCell::file(id, file)));
            ids.push(id);
        }
        Ok(ids)
    }

    /// Stage a URL reference for the next batch
    ///
    /// The raw string must parse as a well-formed URL. On failure the staging
    /// area is unchanged and [`Error::InvalidUrl`] is returned — a local,
    /// recoverable rejection, not a pipeline fault.
    pub async fn add_url(&self, raw: &str) -> Result<ItemId> {
        let url = url::Url::parse(raw).map_err(|source| Error::InvalidUrl {
            input: raw.to_string(),
            source,
        })?;

        let mut staging = self.staging.lock().await;
        self.ensure_not_in_flight()?;
        let id = self.allocate_item_id();
        tracing::debug!(item_id = id.0, url = %url, "URL staged");
        staging.items.push(Arc::new(ItemCell::url(id, url)));
        Ok(id)
    }

    /// Remove a staged item
    ///
    /// Returns true if the item was present. Removing a non-existent id is a
    /// no-op, not an error — removal is idempotent.
    pub async fn remove_item(&self, id: ItemId) -> Result<bool> {
        let mut staging = self.staging.lock().await;
        self.ensure_not_in_flight()?;
        let before = staging.items.len();
        staging.items.retain(|item| item.id != id);
        let removed = staging.items.len() < before;
        if removed {
            tracing::debug!(item_id = id.0, "Staged item removed");
        }
        Ok(removed)
    }

    /// Set the batch category
    ///
    /// The category is treated as an opaque tag; the submission guard only
    /// checks that it is non-empty. Whitespace-only input counts as unset.
    pub async fn set_category(&self, category: impl Into<String>) -> Result<()> {
        let category = category.into();
        let mut staging = self.staging.lock().await;
        self.ensure_not_in_flight()?;
        staging.category = if category.trim().is_empty() {
            None
        } else {
            Some(category)
        };
        Ok(())
    }

    /// Set the optional batch description
    pub async fn set_description(&self, description: impl Into<String>) -> Result<()> {
        let description = description.into();
        let mut staging = self.staging.lock().await;
        self.ensure_not_in_flight()?;
        staging.description = if description.is_empty() {
            None
        } else {
            Some(description)
        };
        Ok(())
    }

    /// Current batch category, if set
    pub async fn category(&self) -> Option<String> {
        self.staging.lock().await.category.clone()
    }

    /// Current batch description, if set
    pub async fn description(&self) -> Option<String> {
        self.staging.lock().await.description.clone()
    }

    /// Snapshot all staged (or in-flight) items in insertion order
    ///
    /// During a transfer this reflects live per-item progress and state, so a
    /// UI can render progress bars by polling or by combining it with the
    /// event stream.
    pub async fn items(&self) -> Vec<ItemInfo> {
        let staging = self.staging.lock().await;
        staging.items.iter().map(|item| item.snapshot()).collect()
    }

    /// Snapshot one item by id
    pub async fn item(&self, id: ItemId) -> Option<ItemInfo> {
        let staging = self.staging.lock().await;
        staging
            .items
            .iter()
            .find(|item| item.id == id)
            .map(|item| item.snapshot())
    }

    /// Counts describing the staged batch
    pub async fn stats(&self) -> StagingStats {
        let staging = self.staging.lock().await;
        let mut stats = StagingStats {
            total: staging.items.len(),
            ..StagingStats::default()
        };
        for item in &staging.items {
            match item.kind {
                ItemKind::File => {
                    stats.files += 1;
                    stats.total_size_bytes += item.size_bytes;
                }
                ItemKind::Url => stats.urls += 1,
            }
        }
        stats
    }

    /// Reject staging mutations while a batch is transferring.
    ///
    /// Callers that mutate staged state invoke this while holding the staging
    /// lock: `submit()` raises the flag under that same lock, so a mutation
    /// can never slip in between validation and freeze.
    pub(crate) fn ensure_not_in_flight(&self) -> Result<()> {
        if self.is_in_flight() {
            Err(Error::BatchInFlight)
        } else {
            Ok(())
        }
    }
}

//! Core ingestion pipeline split into focused submodules.
//!
//! The `IngestPipeline` struct and its methods are organized by domain:
//! - [`staging`] - Staging area (add/remove items before submission)
//! - [`submit`] - Submission guard and batch freeze
//! - [`transfer`] - Transfer engine and batch completion tracking
//! - [`control`] - In-flight item cancellation

mod control;
mod staging;
mod submit;
mod transfer;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::config::PipelineConfig;
use crate::progress::{ProgressSource, RandomSteps};
use crate::types::{Event, ItemId, ItemInfo, ItemKind, ItemState, NewFile};

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU8, AtomicU64, Ordering};

/// Shared mutable state for one item.
///
/// All transitions go through the owning transfer task (single writer), so the
/// compare-and-swap transitions below exist to make completion idempotent, not
/// to arbitrate between racing writers. Readers may snapshot from any thread.
pub(crate) struct ItemCell {
    pub(crate) id: ItemId,
    pub(crate) kind: ItemKind,
    pub(crate) name: String,
    pub(crate) size_bytes: u64,
    /// Opaque content handle, carried through for catalog consumers
    pub(crate) path: Option<PathBuf>,
    pub(crate) staged_at: DateTime<Utc>,
    progress: AtomicU8,
    state: AtomicI32,
    error: std::sync::Mutex<Option<String>>,
}

impl ItemCell {
    pub(crate) fn file(id: ItemId, file: NewFile) -> Self {
        Self {
            id,
            kind: ItemKind::File,
            name: file.name,
            size_bytes: file.size_bytes,
            path: file.path,
            staged_at: Utc::now(),
            progress: AtomicU8::new(0),
            state: AtomicI32::new(ItemState::Pending.to_i32()),
            error: std::sync::Mutex::new(None),
        }
    }

    pub(crate) fn url(id: ItemId, url: url::Url) -> Self {
        Self {
            id,
            kind: ItemKind::Url,
            name: url.to_string(),
            size_bytes: 0,
            path: None,
            staged_at: Utc::now(),
            progress: AtomicU8::new(0),
            state: AtomicI32::new(ItemState::Pending.to_i32()),
            error: std::sync::Mutex::new(None),
        }
    }

    pub(crate) fn progress(&self) -> u8 {
        self.progress.load(Ordering::Acquire)
    }

    pub(crate) fn state(&self) -> ItemState {
        ItemState::from_i32(self.state.load(Ordering::Acquire))
    }

    /// Advance progress by `step`, clamped at 100. Returns the new value.
    ///
    /// Monotonic by construction: the closure only ever grows the value.
    pub(crate) fn advance(&self, step: u8) -> u8 {
        let updated = self
            .progress
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(current.saturating_add(step).min(100))
            });
        match updated {
            Ok(previous) => previous.saturating_add(step).min(100),
            // fetch_update only errs when the closure returns None
            Err(previous) => previous,
        }
    }

    /// Pending → InProgress. Returns false if the item already left Pending.
    pub(crate) fn try_start(&self) -> bool {
        self.transition(ItemState::Pending, ItemState::InProgress)
    }

    /// InProgress (or Pending, for instant items) → Completed.
    ///
    /// At most one caller observes `true`; progress is pinned to 100 on success.
    pub(crate) fn try_complete(&self) -> bool {
        let completed = self.transition(ItemState::InProgress, ItemState::Completed)
            || self.transition(ItemState::Pending, ItemState::Completed);
        if completed {
            self.progress.store(100, Ordering::Release);
        }
        completed
    }

    /// InProgress → Failed, recording the reason.
    pub(crate) fn try_fail(&self, reason: &str) -> bool {
        let failed = self.transition(ItemState::InProgress, ItemState::Failed);
        if failed {
            match self.error.lock() {
                Ok(mut guard) => *guard = Some(reason.to_string()),
                Err(poisoned) => *poisoned.into_inner() = Some(reason.to_string()),
            }
        }
        failed
    }

    /// Pending or InProgress → Cancelled.
    pub(crate) fn try_cancel(&self) -> bool {
        self.transition(ItemState::InProgress, ItemState::Cancelled)
            || self.transition(ItemState::Pending, ItemState::Cancelled)
    }

    fn transition(&self, from: ItemState, to: ItemState) -> bool {
        self.state
            .compare_exchange(
                from.to_i32(),
                to.to_i32(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub(crate) fn snapshot(&self) -> ItemInfo {
        let error = match self.error.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        ItemInfo {
            id: self.id,
            kind: self.kind,
            name: self.name.clone(),
            size_bytes: self.size_bytes,
            path: self.path.clone(),
            progress: self.progress(),
            state: self.state(),
            error,
            staged_at: self.staged_at,
        }
    }
}

/// Items staged for the next batch, plus shared batch metadata
#[derive(Default)]
pub(crate) struct StagedBatch {
    /// Insertion order is preserved for display
    pub(crate) items: Vec<Arc<ItemCell>>,
    pub(crate) category: Option<String>,
    pub(crate) description: Option<String>,
}

/// Main ingestion pipeline (cloneable - all fields are Arc-wrapped)
///
/// Callers stage items, submit them as a batch, and observe progress through
/// the event channel. `submit()` returns immediately; completion is delivered
/// asynchronously as a single [`Event::BatchCompleted`].
#[derive(Clone)]
pub struct IngestPipeline {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<PipelineConfig>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Staged items and batch metadata
    pub(crate) staging: Arc<tokio::sync::Mutex<StagedBatch>>,
    /// True while a submitted batch is transferring (staging is frozen)
    pub(crate) in_flight: Arc<AtomicBool>,
    /// Map of in-flight items to their cancellation tokens
    pub(crate) active_items: Arc<
        tokio::sync::Mutex<std::collections::HashMap<ItemId, tokio_util::sync::CancellationToken>>,
    >,
    /// Progress increments for metered transfers (trait object for pluggable schedules)
    pub(crate) progress_source: Arc<dyn ProgressSource>,
    /// Next item ID counter
    pub(crate) next_item_id: Arc<AtomicU64>,
}

impl IngestPipeline {
    /// Create a pipeline with the default random progress source
    pub fn new(config: PipelineConfig) -> Self {
        let source = RandomSteps::new(config.max_step);
        Self::with_progress_source(config, Arc::new(source))
    }

    /// Create a pipeline with a custom progress source
    ///
    /// Tests use this to inject deterministic schedules
    /// ([`FixedSteps`](crate::progress::FixedSteps),
    /// [`ScriptedSteps`](crate::progress::ScriptedSteps)) in place of randomness.
    pub fn with_progress_source(config: PipelineConfig, source: Arc<dyn ProgressSource>) -> Self {
        let (event_tx, _rx) = tokio::sync::broadcast::channel(config.event_buffer.max(1));

        Self {
            config: Arc::new(config),
            event_tx,
            staging: Arc::new(tokio::sync::Mutex::new(StagedBatch::default())),
            in_flight: Arc::new(AtomicBool::new(false)),
            active_items: Arc::new(tokio::sync::Mutex::new(HashMap::new())),
            progress_source: source,
            next_item_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Subscribe to pipeline events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all events
    /// independently. Events are buffered, but a subscriber that falls behind
    /// by more than the configured buffer receives a `RecvError::Lagged` error.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Subscribe to pipeline events as a `Stream`
    ///
    /// Convenience wrapper around [`subscribe`](Self::subscribe) for consumers
    /// that prefer stream combinators over `recv()` loops.
    pub fn event_stream(&self) -> tokio_stream::wrappers::BroadcastStream<Event> {
        tokio_stream::wrappers::BroadcastStream::new(self.subscribe())
    }

    /// Whether a submitted batch is currently transferring
    ///
    /// While true, the staging area is frozen: add/remove/submit return
    /// [`Error::BatchInFlight`](crate::error::Error::BatchInFlight).
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers, the event is silently dropped.
    /// Transfers proceed whether or not anyone is listening.
    pub(crate) fn emit_event(&self, event: Event) {
        // send() returns Err if there are no receivers, which is fine - we just drop the event
        self.event_tx.send(event).ok();
    }

    pub(crate) fn allocate_item_id(&self) -> ItemId {
        ItemId::new(self.next_item_id.fetch_add(1, Ordering::Relaxed))
    }
}

//! Transfer engine — drive every item in a frozen batch to a terminal state.
//!
//! One task per item, interleaved on the runtime. Item state lives in atomics
//! ([`ItemCell`]) so snapshots stay safe under true parallelism, but each
//! item's transitions are performed only by its own task. Batch aggregation
//! is a terminal-item counter: the task whose item brings the count to the
//! batch size performs finalization, which makes the `BatchCompleted` signal
//! exactly-once by construction — no polling, no duplicate-signal race, and
//! no dependence on the batch's mix of metered and instant items.

use crate::progress::StepOutcome;
use crate::types::{BatchSummary, Event, ItemKind, ItemState};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

use super::{IngestPipeline, ItemCell};

/// Counts terminal items for one frozen batch.
pub(crate) struct BatchTracker {
    total: usize,
    terminal: AtomicUsize,
}

impl BatchTracker {
    pub(crate) fn new(total: usize) -> Self {
        Self {
            total,
            terminal: AtomicUsize::new(0),
        }
    }

    /// Record one terminal item. Returns true for exactly one caller: the one
    /// whose item was the last to finish.
    pub(crate) fn mark_terminal(&self) -> bool {
        self.terminal.fetch_add(1, Ordering::AcqRel) + 1 == self.total
    }
}

impl IngestPipeline {
    /// Spawn one transfer task per item of the frozen batch.
    pub(crate) async fn start_batch(&self, items: Arc<Vec<Arc<ItemCell>>>) {
        let tracker = Arc::new(BatchTracker::new(items.len()));

        let mut active = self.active_items.lock().await;
        for item in items.iter() {
            let token = CancellationToken::new();
            active.insert(item.id, token.clone());

            let pipeline = self.clone();
            let item = Arc::clone(item);
            let batch = Arc::clone(&items);
            let tracker = Arc::clone(&tracker);
            tokio::spawn(async move {
                transfer_item(pipeline, item, batch, tracker, token).await;
            });
        }
    }
}

/// Drive one item to a terminal state, then contribute to batch aggregation.
async fn transfer_item(
    pipeline: IngestPipeline,
    item: Arc<ItemCell>,
    batch: Arc<Vec<Arc<ItemCell>>>,
    tracker: Arc<BatchTracker>,
    cancel_token: CancellationToken,
) {
    match item.kind {
        ItemKind::File => metered_transfer(&pipeline, &item, &cancel_token).await,
        ItemKind::Url => instant_transfer(&pipeline, &item, &cancel_token).await,
    }

    pipeline.active_items.lock().await.remove(&item.id);

    if tracker.mark_terminal() {
        finalize_batch(pipeline, batch).await;
    }
}

/// File-like transfer: Pending → InProgress, then timed progress steps until
/// the progress clamps at exactly 100 and the item completes.
async fn metered_transfer(
    pipeline: &IngestPipeline,
    item: &ItemCell,
    cancel_token: &CancellationToken,
) {
    if item.try_start() {
        pipeline.emit_event(Event::ItemStarted { id: item.id });
    }

    let mut interval = tokio::time::interval(pipeline.config.tick_interval());
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match pipeline.progress_source.next_step(item.id, item.progress()) {
                    StepOutcome::Advance(step) => {
                        let percent = item.advance(step);
                        pipeline.emit_event(Event::ItemProgress {
                            id: item.id,
                            percent,
                        });
                        if percent == 100 {
                            if item.try_complete() {
                                tracing::debug!(item_id = item.id.0, name = %item.name, "Item completed");
                                pipeline.emit_event(Event::ItemCompleted { id: item.id });
                            }
                            break;
                        }
                    }
                    StepOutcome::Fail(reason) => {
                        if item.try_fail(&reason) {
                            tracing::warn!(item_id = item.id.0, name = %item.name, error = %reason, "Item failed");
                            pipeline.emit_event(Event::ItemFailed {
                                id: item.id,
                                error: reason,
                            });
                        }
                        break;
                    }
                }
            }
            _ = cancel_token.cancelled() => {
                if item.try_cancel() {
                    tracing::info!(item_id = item.id.0, name = %item.name, "Item cancelled");
                    pipeline.emit_event(Event::ItemCancelled { id: item.id });
                }
                break;
            }
        }
    }
}

/// Reference-like transfer: a single Pending → Completed transition after a
/// settle delay, with no intermediate progress updates.
async fn instant_transfer(
    pipeline: &IngestPipeline,
    item: &ItemCell,
    cancel_token: &CancellationToken,
) {
    tokio::select! {
        _ = tokio::time::sleep(pipeline.config.instant_settle()) => {
            if item.try_complete() {
                tracing::debug!(item_id = item.id.0, name = %item.name, "URL reference completed");
                pipeline.emit_event(Event::ItemCompleted { id: item.id });
            }
        }
        _ = cancel_token.cancelled() => {
            if item.try_cancel() {
                tracing::info!(item_id = item.id.0, name = %item.name, "URL reference cancelled");
                pipeline.emit_event(Event::ItemCancelled { id: item.id });
            }
        }
    }
}

/// One-shot batch teardown: clear staged state, unfreeze the pipeline, and
/// deliver the summary. Runs in exactly one task per batch.
async fn finalize_batch(pipeline: IngestPipeline, batch: Arc<Vec<Arc<ItemCell>>>) {
    tokio::time::sleep(pipeline.config.completion_settle()).await;

    let mut summary = BatchSummary {
        category: String::new(),
        files: 0,
        urls: 0,
        completed: 0,
        failed: 0,
        cancelled: 0,
    };
    for item in batch.iter() {
        match item.kind {
            ItemKind::File => summary.files += 1,
            ItemKind::Url => summary.urls += 1,
        }
        match item.state() {
            ItemState::Completed => summary.completed += 1,
            ItemState::Failed => summary.failed += 1,
            ItemState::Cancelled => summary.cancelled += 1,
            other => {
                // Unreachable: every task reaches a terminal state before
                // contributing to the tracker.
                tracing::error!(item_id = item.id.0, state = ?other, "Non-terminal item at batch finalization");
            }
        }
    }

    {
        let mut staging = pipeline.staging.lock().await;
        summary.category = staging.category.take().unwrap_or_default();
        staging.items.clear();
        staging.description = None;
    }
    pipeline.active_items.lock().await.clear();
    pipeline.in_flight.store(false, Ordering::Release);

    tracing::info!(
        files = summary.files,
        urls = summary.urls,
        completed = summary.completed,
        failed = summary.failed,
        cancelled = summary.cancelled,
        category = %summary.category,
        "Batch completed"
    );
    pipeline.emit_event(Event::BatchCompleted { summary });
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod batch_tracker_tests {
    use super::*;

    #[test]
    fn only_the_last_terminal_item_wins() {
        let tracker = BatchTracker::new(3);
        assert!(!tracker.mark_terminal());
        assert!(!tracker.mark_terminal());
        assert!(
            tracker.mark_terminal(),
            "third of three terminal items must trigger finalization"
        );
    }

    #[test]
    fn single_item_batch_triggers_on_first_terminal() {
        let tracker = BatchTracker::new(1);
        assert!(tracker.mark_terminal());
    }

    #[test]
    fn concurrent_marks_produce_exactly_one_winner() {
        let tracker = Arc::new(BatchTracker::new(16));
        let winners = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                let winners = Arc::clone(&winners);
                std::thread::spawn(move || {
                    if tracker.mark_terminal() {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(
            winners.load(Ordering::SeqCst),
            1,
            "exactly one thread may observe the batch as complete"
        );
    }
}

//! Pipeline tests, organized by domain like the source modules.

mod submit;

use crate::config::PipelineConfig;
use crate::pipeline::IngestPipeline;
use crate::progress::{FixedSteps, ProgressSource};
use crate::types::{BatchSummary, Event, ItemId};
use std::sync::Arc;
use std::time::Duration;

/// Config with short timings so paused-clock tests advance quickly.
pub(crate) fn fast_config() -> PipelineConfig {
    PipelineConfig {
        tick_interval_ms: 10,
        max_step: 10,
        instant_settle_ms: 25,
        completion_settle_ms: 15,
        event_buffer: 256,
    }
}

/// Pipeline with a deterministic fixed-step progress source.
pub(crate) fn fixed_pipeline(step: u8) -> IngestPipeline {
    IngestPipeline::with_progress_source(fast_config(), Arc::new(FixedSteps::new(step)))
}

/// Pipeline with an arbitrary progress source and the fast test config.
pub(crate) fn scripted_pipeline(source: Arc<dyn ProgressSource>) -> IngestPipeline {
    IngestPipeline::with_progress_source(fast_config(), source)
}

/// Receive events until `BatchCompleted`, returning everything seen
/// (the completion event is last in the returned vec).
pub(crate) async fn collect_until_batch_completed(
    rx: &mut tokio::sync::broadcast::Receiver<Event>,
) -> Vec<Event> {
    let mut events = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(600), rx.recv())
            .await
            .expect("timed out waiting for BatchCompleted")
            .expect("event channel closed before BatchCompleted");
        let done = matches!(event, Event::BatchCompleted { .. });
        events.push(event);
        if done {
            return events;
        }
    }
}

/// Receive events until `BatchCompleted` and return just the summary.
pub(crate) async fn wait_for_batch_completed(
    rx: &mut tokio::sync::broadcast::Receiver<Event>,
) -> BatchSummary {
    let events = collect_until_batch_completed(rx).await;
    match events.into_iter().last() {
        Some(Event::BatchCompleted { summary }) => summary,
        other => panic!("expected BatchCompleted, got: {other:?}"),
    }
}

/// Progress percents observed for one item, in arrival order.
pub(crate) fn progress_for(events: &[Event], id: ItemId) -> Vec<u8> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::ItemProgress {
                id: event_id,
                percent,
            } if *event_id == id => Some(*percent),
            _ => None,
        })
        .collect()
}

use super::{fixed_pipeline, wait_for_batch_completed};
use crate::error::Error;
use crate::types::{Event, NewFile};

// --- validation gating ---

#[tokio::test]
async fn submit_with_no_items_yields_empty_batch_error() {
    let pipeline = fixed_pipeline(50);
    let mut events = pipeline.subscribe();
    pipeline.set_category("science").await.unwrap();

    let result = pipeline.submit().await;

    assert!(matches!(result, Err(Error::EmptyBatch)));
    assert!(
        !pipeline.is_in_flight(),
        "a rejected submission must not start any transfer"
    );
    match events.try_recv() {
        Ok(Event::BatchRejected { reason }) => {
            assert!(
                reason.contains("empty batch"),
                "rejection reason should explain the failure, got: {reason}"
            );
        }
        other => panic!("expected a BatchRejected event, got: {other:?}"),
    }
}

#[tokio::test]
async fn submit_without_category_yields_missing_category_error() {
    let pipeline = fixed_pipeline(50);
    let mut events = pipeline.subscribe();
    pipeline
        .add_files(vec![NewFile::new("a.pdf", 100)])
        .await
        .unwrap();

    let result = pipeline.submit().await;

    assert!(matches!(result, Err(Error::MissingCategory)));
    assert!(!pipeline.is_in_flight());
    assert!(matches!(
        events.try_recv(),
        Ok(Event::BatchRejected { .. })
    ));
}

#[tokio::test]
async fn empty_batch_takes_precedence_over_missing_category() {
    // Neither items nor category staged: the item check fires first
    let pipeline = fixed_pipeline(50);
    assert!(matches!(pipeline.submit().await, Err(Error::EmptyBatch)));
}

#[tokio::test]
async fn rejected_submission_leaves_batch_staged_and_editable() {
    let pipeline = fixed_pipeline(50);
    pipeline
        .add_files(vec![NewFile::new("a.pdf", 100)])
        .await
        .unwrap();

    // First attempt fails on the category guard
    assert!(matches!(
        pipeline.submit().await,
        Err(Error::MissingCategory)
    ));
    assert_eq!(
        pipeline.items().await.len(),
        1,
        "staged items survive a rejected submission"
    );

    // Caller corrects the input and retries
    pipeline.set_category("science").await.unwrap();
    pipeline.submit().await.unwrap();
    assert!(pipeline.is_in_flight());
}

// --- freeze arbitration ---

#[tokio::test(start_paused = true)]
async fn submit_while_in_flight_returns_batch_in_flight() {
    let pipeline = fixed_pipeline(25);
    let mut events = pipeline.subscribe();
    pipeline
        .add_files(vec![NewFile::new("a.pdf", 100)])
        .await
        .unwrap();
    pipeline.set_category("science").await.unwrap();

    pipeline.submit().await.unwrap();
    assert!(matches!(
        pipeline.submit().await,
        Err(Error::BatchInFlight)
    ));

    // Exactly one batch runs to completion
    let summary = wait_for_batch_completed(&mut events).await;
    assert_eq!(summary.files, 1);
}

//! # material-ingest
//!
//! Event-driven ingestion and progress-tracking core for learning-material
//! batches.
//!
//! ## Design Philosophy
//!
//! material-ingest is designed to be:
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Event-driven** - Consumers subscribe to events, no polling required
//! - **Transport-agnostic** - Progress comes from a pluggable source, so a
//!   real transfer backend can be substituted without changing observable
//!   behavior
//!
//! ## Quick Start
//!
//! ```no_run
//! use material_ingest::{IngestPipeline, NewFile, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = IngestPipeline::new(PipelineConfig::default());
//!
//!     // Subscribe to events
//!     let mut events = pipeline.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     // Stage a batch and submit it
//!     pipeline
//!         .add_files(vec![NewFile::new("notes.pdf", 1_048_576)])
//!         .await?;
//!     pipeline.add_url("https://example.com/lecture").await?;
//!     pipeline.set_category("science").await?;
//!     pipeline.submit().await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Core ingestion pipeline (decomposed into focused submodules)
pub mod pipeline;
/// Pluggable progress sources
pub mod progress;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use pipeline::IngestPipeline;
pub use progress::{FixedSteps, ProgressSource, RandomSteps, ScriptedSteps, StepOutcome};
pub use types::{
    BatchSummary, Event, ItemId, ItemInfo, ItemKind, ItemState, NewFile, StagingStats,
};

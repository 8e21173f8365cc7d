//! Configuration types for material-ingest

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Pipeline behavior configuration
///
/// Defaults mirror the timings of the interactive reference workload:
/// progress ticks every 300ms with steps of up to 10 percentage points,
/// URL references settle in 1.5s, and the completion summary is delayed 1s
/// after the last item finishes so consumers see the final per-item state
/// before the batch is discarded.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Interval between progress updates for metered items, in milliseconds (default: 300)
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Upper bound for a single random progress step, in percentage points (default: 10)
    ///
    /// Only consulted by the default random progress source; a custom
    /// [`ProgressSource`](crate::progress::ProgressSource) ignores it.
    #[serde(default = "default_max_step")]
    pub max_step: u8,

    /// Delay before an instant (URL) item completes, in milliseconds (default: 1500)
    #[serde(default = "default_instant_settle_ms")]
    pub instant_settle_ms: u64,

    /// Delay between the last terminal item and the batch summary, in milliseconds (default: 1000)
    #[serde(default = "default_completion_settle_ms")]
    pub completion_settle_ms: u64,

    /// Event broadcast channel capacity (default: 1000)
    ///
    /// Subscribers that fall further behind than this receive a `Lagged` error.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl PipelineConfig {
    /// Interval between progress updates for metered items
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Delay before an instant (URL) item completes
    pub fn instant_settle(&self) -> Duration {
        Duration::from_millis(self.instant_settle_ms)
    }

    /// Delay between the last terminal item and the batch summary
    pub fn completion_settle(&self) -> Duration {
        Duration::from_millis(self.completion_settle_ms)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            max_step: default_max_step(),
            instant_settle_ms: default_instant_settle_ms(),
            completion_settle_ms: default_completion_settle_ms(),
            event_buffer: default_event_buffer(),
        }
    }
}

fn default_tick_interval_ms() -> u64 {
    300
}

fn default_max_step() -> u8 {
    10
}

fn default_instant_settle_ms() -> u64 {
    1500
}

fn default_completion_settle_ms() -> u64 {
    1000
}

fn default_event_buffer() -> usize {
    1000
}

//! Pluggable progress sources for metered transfers
//!
//! The transfer engine does not decide how fast an item advances — it asks a
//! [`ProgressSource`] for the next increment on every tick. The default
//! [`RandomSteps`] source emulates variable throughput; tests inject
//! [`FixedSteps`] or [`ScriptedSteps`] for deterministic schedules. A real
//! transport would implement this trait by reporting actual bytes moved.

use crate::types::ItemId;
use rand::Rng;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Outcome of a single progress step for a metered item
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Advance progress by this many percentage points (clamped at 100)
    Advance(u8),
    /// The transfer failed with this reason; the item becomes Failed
    Fail(String),
}

/// Source of progress increments for metered transfers
///
/// Implementations must be cheap and non-blocking — `next_step` is called
/// from inside the per-item timer loop. Returning `Advance(0)` is permitted
/// (progress stays monotonic) but a source that returns it forever will never
/// finish the item; the built-in sources always advance by at least 1.
pub trait ProgressSource: Send + Sync {
    /// Next progress increment for the item currently at `progress` percent
    fn next_step(&self, id: ItemId, progress: u8) -> StepOutcome;
}

/// Random step sizes emulating variable transfer throughput
///
/// Steps are uniformly distributed in `1..=max_step`, so every tick makes
/// forward progress and every metered item terminates.
#[derive(Debug)]
pub struct RandomSteps {
    max_step: u8,
}

impl RandomSteps {
    /// Create a source with the given step upper bound (minimum 1)
    pub fn new(max_step: u8) -> Self {
        Self {
            max_step: max_step.max(1),
        }
    }
}

impl ProgressSource for RandomSteps {
    fn next_step(&self, _id: ItemId, _progress: u8) -> StepOutcome {
        let mut rng = rand::thread_rng();
        StepOutcome::Advance(rng.gen_range(1..=self.max_step))
    }
}

/// Constant step size, for deterministic tests
#[derive(Debug)]
pub struct FixedSteps {
    step: u8,
}

impl FixedSteps {
    /// Create a source that always advances by `step` (minimum 1)
    pub fn new(step: u8) -> Self {
        Self { step: step.max(1) }
    }
}

impl ProgressSource for FixedSteps {
    fn next_step(&self, _id: ItemId, _progress: u8) -> StepOutcome {
        StepOutcome::Advance(self.step)
    }
}

/// Pre-scripted sequence of step outcomes, for deterministic tests
///
/// Outcomes are handed out in order across all items asking; once the script
/// is exhausted, every further step advances by 100 so remaining items
/// complete immediately.
#[derive(Debug)]
pub struct ScriptedSteps {
    script: Mutex<VecDeque<StepOutcome>>,
}

impl ScriptedSteps {
    /// Create a source that replays `outcomes` in order
    pub fn new(outcomes: impl IntoIterator<Item = StepOutcome>) -> Self {
        Self {
            script: Mutex::new(outcomes.into_iter().collect()),
        }
    }
}

impl ProgressSource for ScriptedSteps {
    fn next_step(&self, _id: ItemId, _progress: u8) -> StepOutcome {
        let mut script = match self.script.lock() {
            Ok(guard) => guard,
            // A panicked holder cannot leave the queue mid-mutation; keep going
            Err(poisoned) => poisoned.into_inner(),
        };
        script.pop_front().unwrap_or(StepOutcome::Advance(100))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_steps_stay_within_bounds_and_always_advance() {
        let source = RandomSteps::new(10);
        for _ in 0..200 {
            match source.next_step(ItemId::new(1), 0) {
                StepOutcome::Advance(step) => {
                    assert!(
                        (1..=10).contains(&step),
                        "step {step} out of expected range 1..=10"
                    );
                }
                StepOutcome::Fail(reason) => panic!("random source must never fail: {reason}"),
            }
        }
    }

    #[test]
    fn random_steps_clamps_zero_max_to_one() {
        let source = RandomSteps::new(0);
        for _ in 0..20 {
            assert_eq!(
                source.next_step(ItemId::new(1), 0),
                StepOutcome::Advance(1),
                "max_step 0 would stall items forever — must clamp to 1"
            );
        }
    }

    #[test]
    fn fixed_steps_returns_the_same_step_every_time() {
        let source = FixedSteps::new(25);
        for progress in [0, 25, 50, 75] {
            assert_eq!(
                source.next_step(ItemId::new(1), progress),
                StepOutcome::Advance(25)
            );
        }
    }

    #[test]
    fn scripted_steps_replays_in_order_then_completes() {
        let source = ScriptedSteps::new([
            StepOutcome::Advance(30),
            StepOutcome::Fail("disk full".to_string()),
            StepOutcome::Advance(5),
        ]);
        let id = ItemId::new(1);

        assert_eq!(source.next_step(id, 0), StepOutcome::Advance(30));
        assert_eq!(
            source.next_step(id, 30),
            StepOutcome::Fail("disk full".to_string())
        );
        assert_eq!(source.next_step(id, 0), StepOutcome::Advance(5));
        assert_eq!(
            source.next_step(id, 5),
            StepOutcome::Advance(100),
            "exhausted script must finish remaining items, not stall them"
        );
    }
}

//! Cooperative, time-sliced execution of long bit loops.
//!
//! Embedding or extracting a container touches millions of carrier
//! positions. Running such a loop to completion in one go would monopolize
//! the executor thread, so the loop is expressed as a [`Stepper`] and driven
//! by [`Task`]: each tick runs steps back to back until the stepper yields
//! or a configured share of the time frame is spent, then the task sleeps
//! for the rest of the frame and reports progress once.
//!
//! There is no parallelism here. The scheduler exists purely to interleave
//! CPU-bound work with the rest of the application.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::Instant;

use crate::config::{TASK_MIN_DELAY_MS, TASK_TIME_FRAME_MS, TASK_TIME_RATE};
use crate::error::CarrierError;

/// Outcome of one [`Stepper::step`] call.
pub enum Step<T> {
    /// More work remains; call `step` again within the same tick if the
    /// slice allows.
    Continue,

    /// Break out of the current tick early and reschedule.
    Yield,

    /// The loop finished with a result.
    Done(T),
}

/// A resumable unit of work driven by [`Task`].
pub trait Stepper {
    type Output;

    /// Advances the work by one bounded increment.
    ///
    /// # Errors
    ///
    /// A returned error terminates the task immediately; no further steps
    /// run and no progress update is emitted for the failed tick.
    fn step(&mut self) -> Result<Step<Self::Output>, CarrierError>;

    /// Completion percentage in `0.0..=100.0`, sampled once per tick.
    fn progress(&self) -> f64;
}

/// Cooperative cancellation flag shared between a task and its owner.
///
/// Cancelling only prevents the *next* tick: a step that is already running
/// always completes. State from a cancelled operation is discarded by the
/// caller, never reused.
#[derive(Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Re-arms the token at the start of a new operation.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::Relaxed);
    }
}

/// Time-sliced driver for a [`Stepper`].
pub struct Task {
    time_frame: Duration,
    slice: Duration,
    min_delay: Duration,
}

impl Task {
    pub fn new() -> Self {
        Self::with_frame(Duration::from_millis(TASK_TIME_FRAME_MS), TASK_TIME_RATE)
    }

    /// Creates a driver with a custom frame length and work share.
    pub fn with_frame(time_frame: Duration, time_rate: f64) -> Self {
        Self {
            time_frame,
            slice: time_frame.mul_f64(time_rate.clamp(0.0, 1.0)),
            min_delay: Duration::from_millis(TASK_MIN_DELAY_MS),
        }
    }

    /// Drives `stepper` to completion, cancellation, or error.
    ///
    /// `on_update` receives the stepper's progress percentage once per tick,
    /// and a final `100.0` when the stepper completes.
    ///
    /// # Errors
    ///
    /// Propagates the stepper's error, or [`CarrierError::Cancelled`] when
    /// `cancel` fires between ticks.
    pub async fn drive<S, F>(&self, mut stepper: S, cancel: &CancelToken, mut on_update: F) -> Result<S::Output, CarrierError>
    where
        S: Stepper,
        F: FnMut(f64),
    {
        loop {
            if cancel.is_cancelled() {
                return Err(CarrierError::Cancelled);
            }

            let tick_start = Instant::now();

            loop {
                match stepper.step()? {
                    Step::Done(output) => {
                        on_update(100.0);
                        return Ok(output);
                    }
                    Step::Yield => break,
                    Step::Continue => {}
                }

                if tick_start.elapsed() >= self.slice {
                    break;
                }
            }

            on_update(stepper.progress());

            // Yield the rest of the frame, but never reschedule instantly.
            let delay = self.time_frame.saturating_sub(tick_start.elapsed()).max(self.min_delay);
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for Task {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counts to a target, yielding every `chunk` steps.
    struct Counter {
        current: usize,
        target: usize,
        chunk: usize,
    }

    impl Stepper for Counter {
        type Output = usize;

        fn step(&mut self) -> Result<Step<usize>, CarrierError> {
            self.current += 1;
            if self.current >= self.target {
                return Ok(Step::Done(self.current));
            }
            if self.current % self.chunk == 0 {
                return Ok(Step::Yield);
            }
            Ok(Step::Continue)
        }

        fn progress(&self) -> f64 {
            self.current as f64 * 100.0 / self.target as f64
        }
    }

    #[tokio::test]
    async fn test_drive_runs_to_completion() {
        let task = Task::with_frame(Duration::from_millis(10), 0.8);
        let cancel = CancelToken::new();
        let mut updates = Vec::new();

        let result = task
            .drive(Counter { current: 0, target: 100, chunk: 7 }, &cancel, |pct| updates.push(pct))
            .await
            .unwrap();

        assert_eq!(result, 100);
        assert_eq!(updates.last().copied(), Some(100.0));
    }

    #[tokio::test]
    async fn test_drive_reports_monotonic_progress() {
        let task = Task::with_frame(Duration::from_millis(10), 0.8);
        let cancel = CancelToken::new();
        let mut updates = Vec::new();

        task.drive(Counter { current: 0, target: 50, chunk: 5 }, &cancel, |pct| updates.push(pct)).await.unwrap();

        assert!(updates.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn test_cancel_stops_before_next_tick() {
        let task = Task::with_frame(Duration::from_millis(10), 0.8);
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = task
            .drive(Counter { current: 0, target: 1_000_000, chunk: 1 }, &cancel, |_| {})
            .await;

        assert_eq!(result.unwrap_err(), CarrierError::Cancelled);
    }

    #[tokio::test]
    async fn test_stepper_error_terminates() {
        struct Failing;

        impl Stepper for Failing {
            type Output = ();

            fn step(&mut self) -> Result<Step<()>, CarrierError> {
                Err(CarrierError::NoMoreData)
            }

            fn progress(&self) -> f64 {
                0.0
            }
        }

        let task = Task::new();
        let cancel = CancelToken::new();
        let result = task.drive(Failing, &cancel, |_| {}).await;
        assert_eq!(result.unwrap_err(), CarrierError::NoMoreData);
    }
}

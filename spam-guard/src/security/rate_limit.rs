//! Call admission for the external AI classifier
//!
//! A fixed-window counter bounds how many AI calls may start per window:
//! - Each admitted call increments the counter
//! - Once the ceiling is reached every further call is denied
//! - A background timer zeroes the counter at every window boundary,
//!   independent of traffic
//!
//! Denied calls are dropped, never queued. Callers fall back to the
//! verdict they already have.
//!
//! # Example
//! ```no_run
//! use spam_guard::security::rate_limit::RateGate;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() {
//! let gate = Arc::new(RateGate::new(30, Duration::from_secs(60)));
//! let _reset = gate.spawn_reset_task();
//!
//! if gate.try_admit().await {
//!     println!("AI call allowed");
//! } else {
//!     println!("Budget exhausted for this window");
//! }
//! # }
//! ```

use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// Default ceiling of AI calls per window
pub const DEFAULT_MAX_CALLS: u32 = 30;
/// Default window length
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(60_000);

/// Mutable budget, only ever touched through the gate
#[derive(Debug)]
struct CallBudget {
    calls_this_window: u32,
    window_started: Instant,
}

/// Fixed-window admission gate
#[derive(Debug)]
pub struct RateGate {
    budget: Mutex<CallBudget>,
    max_calls: u32,
    window: Duration,
}

impl RateGate {
    /// Create a gate with an empty budget
    pub fn new(max_calls: u32, window: Duration) -> Self {
        Self {
            budget: Mutex::new(CallBudget {
                calls_this_window: 0,
                window_started: Instant::now(),
            }),
            max_calls,
            window,
        }
    }

    /// Ask for permission to start one AI call
    ///
    /// # Returns
    /// - `true` if the call is admitted (and counted)
    /// - `false` if the window's budget is exhausted
    pub async fn try_admit(&self) -> bool {
        let mut budget = self.budget.lock().await;

        if budget.calls_this_window >= self.max_calls {
            let elapsed = budget.window_started.elapsed();
            warn!(
                "AI call budget exhausted: {}/{} calls, window resets in {:?}",
                budget.calls_this_window,
                self.max_calls,
                self.window.saturating_sub(elapsed)
            );
            return false;
        }

        budget.calls_this_window += 1;
        debug!(
            "AI call admitted ({}/{})",
            budget.calls_this_window, self.max_calls
        );
        true
    }

    /// Zero the counter and start a new window
    pub async fn reset(&self) {
        let mut budget = self.budget.lock().await;
        if budget.calls_this_window > 0 {
            debug!(
                "Resetting AI call budget after {} calls",
                budget.calls_this_window
            );
        }
        budget.calls_this_window = 0;
        budget.window_started = Instant::now();
    }

    /// Calls admitted in the current window
    pub async fn calls_this_window(&self) -> u32 {
        self.budget.lock().await.calls_this_window
    }

    pub fn max_calls(&self) -> u32 {
        self.max_calls
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Start the recurring reset timer.
    ///
    /// The task holds only a weak reference, so it stops on its own once the
    /// gate is dropped. Dropping the returned handle stops it immediately.
    pub fn spawn_reset_task(self: &Arc<Self>) -> ResetTask {
        let gate: Weak<RateGate> = Arc::downgrade(self);
        let window = self.window;

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + window, window);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                match gate.upgrade() {
                    Some(gate) => gate.reset().await,
                    None => break,
                }
            }
        });

        ResetTask { handle }
    }
}

impl Default for RateGate {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CALLS, DEFAULT_WINDOW)
    }
}

/// Handle to the background reset timer; aborts it on drop
#[derive(Debug)]
pub struct ResetTask {
    handle: JoinHandle<()>,
}

impl ResetTask {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ResetTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

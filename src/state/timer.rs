//! Countdown core shared between the ticking task and the REST snapshot path.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Remaining-seconds value at which the low-time warning fires.
pub const LOW_TIME_THRESHOLD: u32 = 10;

/// Outcome of a single one-second tick delivered to the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The countdown decremented by one second.
    Ticked {
        /// Seconds left after the decrement.
        remaining: u32,
        /// True exactly once, when the decrement lands on [`LOW_TIME_THRESHOLD`].
        low_time_warning: bool,
    },
    /// The tick was swallowed because the countdown is paused or already expired.
    Skipped,
    /// The countdown just reached zero; fired exactly once.
    Expired,
}

/// Pure countdown state: seconds remaining, pause flag and a one-shot expiry latch.
///
/// The async ticking shell lives in the timer service; keeping the decrement
/// logic synchronous makes the pause/expiry edge cases testable without a
/// runtime clock.
#[derive(Debug, Clone)]
pub struct Countdown {
    remaining: u32,
    paused: bool,
    expired: bool,
}

impl Countdown {
    /// Create a countdown with the given number of seconds on the clock.
    pub fn new(initial_seconds: u32) -> Self {
        Self {
            remaining: initial_seconds,
            paused: false,
            expired: false,
        }
    }

    /// Seconds left on the clock.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Whether tick delivery is currently suspended.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether the countdown has already fired its expiry.
    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Freeze or unfreeze the countdown without touching the remaining value.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Deliver one wall-clock second to the countdown.
    ///
    /// Paused ticks are skipped entirely, so a countdown sitting at zero while
    /// paused only expires on the first active tick after resuming. Once
    /// [`TickOutcome::Expired`] has been returned every further tick is
    /// [`TickOutcome::Skipped`].
    pub fn tick(&mut self) -> TickOutcome {
        if self.paused || self.expired {
            return TickOutcome::Skipped;
        }

        self.remaining = self.remaining.saturating_sub(1);

        if self.remaining == 0 {
            self.expired = true;
            return TickOutcome::Expired;
        }

        TickOutcome::Ticked {
            remaining: self.remaining,
            low_time_warning: self.remaining == LOW_TIME_THRESHOLD,
        }
    }
}

/// Handle to a spawned countdown task.
///
/// The shared [`Countdown`] is read by snapshot builders and toggled by the
/// pause action; the stop flag is checked by the ticking task before every
/// delivery so no callback can mutate a superseded session after
/// [`stop`](Self::stop) returns.
pub struct TimerHandle {
    countdown: Arc<Mutex<Countdown>>,
    stopped: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Bundle a spawned ticking task with its shared countdown state.
    pub fn new(
        countdown: Arc<Mutex<Countdown>>,
        stopped: Arc<AtomicBool>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            countdown,
            stopped,
            task,
        }
    }

    /// Seconds left on the clock.
    pub async fn remaining(&self) -> u32 {
        self.countdown.lock().await.remaining()
    }

    /// Freeze or unfreeze tick delivery.
    pub async fn set_paused(&self, paused: bool) {
        self.countdown.lock().await.set_paused(paused);
    }

    /// Whether tick delivery is currently suspended.
    pub async fn is_paused(&self) -> bool {
        self.countdown.lock().await.is_paused()
    }

    /// Cancel all future ticks. Safe to call more than once.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.task.abort();
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_decrement_until_expiry() {
        let mut countdown = Countdown::new(3);

        assert_eq!(
            countdown.tick(),
            TickOutcome::Ticked {
                remaining: 2,
                low_time_warning: false
            }
        );
        assert_eq!(
            countdown.tick(),
            TickOutcome::Ticked {
                remaining: 1,
                low_time_warning: false
            }
        );
        assert_eq!(countdown.tick(), TickOutcome::Expired);
    }

    #[test]
    fn expiry_fires_exactly_once() {
        let mut countdown = Countdown::new(1);
        assert_eq!(countdown.tick(), TickOutcome::Expired);
        assert_eq!(countdown.tick(), TickOutcome::Skipped);
        assert_eq!(countdown.tick(), TickOutcome::Skipped);
        assert!(countdown.is_expired());
    }

    #[test]
    fn paused_ticks_do_not_decrement() {
        let mut countdown = Countdown::new(30);
        countdown.tick();
        assert_eq!(countdown.remaining(), 29);

        countdown.set_paused(true);
        assert_eq!(countdown.tick(), TickOutcome::Skipped);
        assert_eq!(countdown.tick(), TickOutcome::Skipped);
        assert_eq!(countdown.remaining(), 29);

        countdown.set_paused(false);
        assert_eq!(
            countdown.tick(),
            TickOutcome::Ticked {
                remaining: 28,
                low_time_warning: false
            }
        );
    }

    #[test]
    fn pause_toggle_twice_leaves_remaining_unchanged() {
        let mut countdown = Countdown::new(30);
        countdown.tick();
        let frozen = countdown.remaining();

        countdown.set_paused(true);
        countdown.set_paused(false);
        assert_eq!(countdown.remaining(), frozen);

        // Ticking resumes with a single decrement, no catch-up.
        countdown.tick();
        assert_eq!(countdown.remaining(), frozen - 1);
    }

    #[test]
    fn low_time_warning_fires_once_at_threshold() {
        let mut countdown = Countdown::new(12);
        let mut warnings = 0;

        while !countdown.is_expired() {
            if let TickOutcome::Ticked {
                remaining,
                low_time_warning: true,
            } = countdown.tick()
            {
                warnings += 1;
                assert_eq!(remaining, LOW_TIME_THRESHOLD);
            }
        }

        assert_eq!(warnings, 1);
    }

    #[test]
    fn low_time_warning_does_not_fire_while_paused() {
        let mut countdown = Countdown::new(11);
        countdown.set_paused(true);
        assert_eq!(countdown.tick(), TickOutcome::Skipped);

        countdown.set_paused(false);
        assert_eq!(
            countdown.tick(),
            TickOutcome::Ticked {
                remaining: 10,
                low_time_warning: true
            }
        );
    }

    #[test]
    fn countdown_at_zero_while_paused_expires_only_after_resume() {
        let mut countdown = Countdown::new(1);
        countdown.set_paused(true);

        // No expiry on pause, nor on paused ticks.
        assert_eq!(countdown.tick(), TickOutcome::Skipped);
        assert_eq!(countdown.tick(), TickOutcome::Skipped);
        assert!(!countdown.is_expired());

        countdown.set_paused(false);
        assert_eq!(countdown.tick(), TickOutcome::Expired);
    }

    #[test]
    fn zero_second_countdown_expires_on_first_tick() {
        let mut countdown = Countdown::new(0);
        assert_eq!(countdown.tick(), TickOutcome::Expired);
    }
}

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};

use crate::{
    services::{session_service, sse_events},
    state::{
        SharedState,
        timer::{Countdown, TickOutcome, TimerHandle},
    },
};

/// Spawn a countdown of `seconds` and install it as the session's timer,
/// replacing and stopping any previous one.
pub async fn start_countdown(state: &SharedState, seconds: u32) {
    let countdown = Arc::new(Mutex::new(Countdown::new(seconds)));
    let stopped = Arc::new(AtomicBool::new(false));
    let task = tokio::spawn(run_ticker(
        state.clone(),
        countdown.clone(),
        stopped.clone(),
    ));

    state
        .install_timer(TimerHandle::new(countdown, stopped, task))
        .await;
    debug!(seconds, "countdown started");
}

/// Drive the countdown with one tick per wall-clock second, broadcasting
/// progress and triggering the expiry transition.
///
/// The stop flag is checked before every delivery so a superseded timer can
/// never mutate the session, even when a tick was already scheduled when
/// [`TimerHandle::stop`] ran. The loop ends itself after expiry; the stopped
/// handle stays installed so snapshots keep reading zero until it is replaced
/// or cleared.
async fn run_ticker(state: SharedState, countdown: Arc<Mutex<Countdown>>, stopped: Arc<AtomicBool>) {
    let mut interval = time::interval(Duration::from_secs(1));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first interval tick completes immediately; consume it so the first
    // decrement lands a full second after the countdown started.
    interval.tick().await;

    loop {
        interval.tick().await;

        if stopped.load(Ordering::SeqCst) {
            break;
        }

        let outcome = countdown.lock().await.tick();
        match outcome {
            TickOutcome::Ticked {
                remaining,
                low_time_warning,
            } => {
                sse_events::broadcast_timer_tick(&state, remaining);
                if low_time_warning {
                    sse_events::broadcast_timer_warning(&state, remaining);
                }
            }
            TickOutcome::Skipped => {}
            TickOutcome::Expired => {
                sse_events::broadcast_timer_tick(&state, 0);
                if let Err(err) = session_service::finish_on_expiry(&state).await {
                    warn!(error = %err, "failed to end session on countdown expiry");
                }
                break;
            }
        }
    }
}

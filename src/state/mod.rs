//! Shared application state: the session slot, the phase state machine,
//! the countdown handle and the SSE hub.

pub mod session;
mod sse;
pub mod state_machine;
pub mod timer;
pub mod transitions;

use std::{sync::Arc, time::Duration};

use tokio::sync::{Mutex, RwLock};
use tokio::time::timeout;
use tracing::warn;

use crate::{
    config::AppConfig,
    error::ServiceError,
    provider::QuestionProvider,
    state::{session::QuizSession, state_machine::SessionPhase, timer::TimerHandle},
};

pub use self::sse::SseHub;
pub use self::state_machine::{AbortError, ApplyError, Plan, PlanError, PlanId, Snapshot};
use self::state_machine::{SessionEvent, SessionMachine};

/// Cheaply clonable handle to the central application state.
pub type SharedState = Arc<AppState>;

/// Upper bound on the async work backing a single state transition.
pub const DEFAULT_TRANSITION_TIMEOUT: Duration = Duration::from_secs(5);

/// Central application state owning the quiz session, the lifecycle state
/// machine, the countdown timer handle and the SSE broadcast hub.
pub struct AppState {
    config: Arc<AppConfig>,
    provider: Arc<dyn QuestionProvider>,
    sse: SseHub,
    machine: RwLock<SessionMachine>,
    session: RwLock<Option<QuizSession>>,
    timer: Mutex<Option<TimerHandle>>,
    transition_gate: Mutex<()>,
    transition_timeout: Option<Duration>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig, provider: Arc<dyn QuestionProvider>) -> SharedState {
        Arc::new(Self {
            config: Arc::new(config),
            provider,
            sse: SseHub::new(16),
            machine: RwLock::new(SessionMachine::new()),
            session: RwLock::new(None),
            timer: Mutex::new(None),
            transition_gate: Mutex::new(()),
            transition_timeout: Some(DEFAULT_TRANSITION_TIMEOUT),
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> Arc<AppConfig> {
        self.config.clone()
    }

    /// Handle to the question provider boundary.
    pub fn provider(&self) -> Arc<dyn QuestionProvider> {
        self.provider.clone()
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        &self.sse
    }

    /// Snapshot the current phase of the session state machine.
    pub async fn state_machine_phase(&self) -> SessionPhase {
        self.machine.read().await.phase()
    }

    /// Snapshot of the state machine including version and pending transition.
    pub async fn snapshot(&self) -> Snapshot {
        let sm = self.machine.read().await;
        sm.snapshot()
    }

    /// Read the session slot, which may be empty.
    pub async fn read_session<F, T>(&self, f: F) -> T
    where
        F: FnOnce(Option<&QuizSession>) -> T,
    {
        let guard = self.session.read().await;
        f(guard.as_ref())
    }

    /// Run a fallible closure against the active session, failing when none exists.
    pub async fn with_session<F, T>(&self, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&QuizSession) -> Result<T, ServiceError>,
    {
        let guard = self.session.read().await;
        let session = guard
            .as_ref()
            .ok_or_else(|| ServiceError::NotFound("no active session".into()))?;
        f(session)
    }

    /// Run a fallible closure against the active session mutably, failing when none exists.
    pub async fn with_session_mut<F, T>(&self, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut QuizSession) -> Result<T, ServiceError>,
    {
        let mut guard = self.session.write().await;
        let session = guard
            .as_mut()
            .ok_or_else(|| ServiceError::NotFound("no active session".into()))?;
        f(session)
    }

    /// Mutate the session slot itself (install or clear a session).
    pub async fn with_session_slot_mut<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&mut Option<QuizSession>) -> T,
    {
        let mut guard = self.session.write().await;
        f(&mut guard)
    }

    /// Install a freshly spawned countdown, stopping any prior handle first.
    ///
    /// This is what makes "at most one active timer per session" structural:
    /// there is no code path that starts a countdown without going through
    /// this replacement.
    pub async fn install_timer(&self, handle: TimerHandle) {
        let mut guard = self.timer.lock().await;
        if let Some(previous) = guard.replace(handle) {
            previous.stop();
        }
    }

    /// Stop and drop the current countdown handle, if any. Idempotent.
    pub async fn clear_timer(&self) {
        let mut guard = self.timer.lock().await;
        if let Some(handle) = guard.take() {
            handle.stop();
        }
    }

    /// Freeze or unfreeze the current countdown. Returns false when no timer exists.
    pub async fn set_timer_paused(&self, paused: bool) -> bool {
        let guard = self.timer.lock().await;
        match guard.as_ref() {
            Some(handle) => {
                handle.set_paused(paused).await;
                true
            }
            None => false,
        }
    }

    /// Seconds left on the current countdown, or None when no timer is installed.
    pub async fn timer_remaining(&self) -> Option<u32> {
        let guard = self.timer.lock().await;
        match guard.as_ref() {
            Some(handle) => Some(handle.remaining().await),
            None => None,
        }
    }

    /// Plan a transition on the shared session state machine, returning the plan.
    async fn plan_transition(&self, event: SessionEvent) -> Result<Plan, PlanError> {
        let mut sm = self.machine.write().await;
        sm.plan(event)
    }

    /// Apply the planned transition, returning the next phase.
    async fn apply_planned_transition(&self, plan_id: PlanId) -> Result<SessionPhase, ApplyError> {
        let mut sm = self.machine.write().await;
        sm.apply(plan_id)
    }

    /// Abort a planned transition of the shared session state machine.
    async fn abort_transition(&self, plan_id: PlanId) -> Result<(), AbortError> {
        let mut sm = self.machine.write().await;
        sm.abort(plan_id)
    }

    /// Run `work` inside a planned transition: plan the event, execute the
    /// async work under a timeout, then apply on success or abort on failure.
    ///
    /// The gate serializes transitions, so a second start issued while a
    /// question fetch is in flight waits here and is then rejected by the
    /// state machine instead of initializing a second session.
    pub async fn run_transition<F, Fut, T>(
        &self,
        event: SessionEvent,
        work: F,
    ) -> Result<(T, SessionPhase), ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, ServiceError>>,
    {
        let gate = self.transition_gate.lock().await;
        let Plan { id: plan_id, .. } = self.plan_transition(event).await?;

        let work_future = work();
        let outcome = if let Some(limit) = self.transition_timeout {
            match timeout(limit, work_future).await {
                Ok(result) => result,
                Err(_) => {
                    if let Err(abort_err) = self.abort_transition(plan_id).await {
                        warn!(
                            event = ?event,
                            plan_id = %plan_id,
                            error = ?abort_err,
                            "failed to abort transition after timeout"
                        );
                    }
                    drop(gate);
                    return Err(ServiceError::Timeout);
                }
            }
        } else {
            work_future.await
        };

        match outcome {
            Ok(value) => {
                let next = self.apply_planned_transition(plan_id).await?;
                drop(gate);
                Ok((value, next))
            }
            Err(err) => {
                if let Err(abort_err) = self.abort_transition(plan_id).await {
                    warn!(
                        event = ?event,
                        plan_id = %plan_id,
                        error = ?abort_err,
                        "failed to abort transition after work error"
                    );
                }
                drop(gate);
                Err(err)
            }
        }
    }
}

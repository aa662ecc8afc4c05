//! The periodic driver of the session lifecycle.
//!
//! [`SessionTimer`] moves a [`SessionLifecycleManager`] onto its own Tokio
//! task and checks it once per tick until the session expires or the
//! returned [`SessionTimerHandle`] is stopped or dropped. A renewal prompt
//! and the renewal it triggers run next to the ticks, so reminders and the
//! countdown keep going while the user decides.

use logigo_gateway::AuthGateway;
use logigo_session::{
    Clock, NotificationSink, Pending, PendingOutcome, SessionLifecycleManager, SessionPhase,
    SessionStore,
};
use logigo_tick::{TickConfig, TickPolicy, TickScheduler};
use serde::Serialize;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::LogigoError;

/// What a passive display needs to render the session countdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimerStatus {
    pub phase: SessionPhase,
    pub remaining_ms: i64,
    /// `remaining_ms` formatted as `HH:MM:SS`.
    pub countdown: String,
}

impl TimerStatus {
    fn of<G, S, C, N>(manager: &SessionLifecycleManager<G, S, C, N>) -> Self
    where
        G: AuthGateway,
        S: SessionStore,
        C: Clock,
        N: NotificationSink,
    {
        Self {
            phase: manager.phase(),
            remaining_ms: manager.remaining_ms(),
            countdown: manager.countdown(),
        }
    }
}

/// Builder for the session checker task.
///
/// # Example
///
/// ```rust,ignore
/// let manager = SessionLifecycleManager::new(gateway, store, SystemClock, notifier, config);
/// let handle = SessionTimer::new(manager).spawn();
/// // ... later, on logout or unmount:
/// handle.stop();
/// ```
pub struct SessionTimer<G, S, C, N> {
    manager: SessionLifecycleManager<G, S, C, N>,
    policy: TickPolicy,
}

impl<G, S, C, N> SessionTimer<G, S, C, N>
where
    G: AuthGateway,
    S: SessionStore,
    C: Clock,
    N: NotificationSink,
{
    /// Wraps a manager. Ticks at the manager's configured `tick_interval`.
    pub fn new(manager: SessionLifecycleManager<G, S, C, N>) -> Self {
        Self {
            manager,
            policy: TickPolicy::default(),
        }
    }

    /// Sets what happens after a late tick (default: [`TickPolicy::Skip`]).
    pub fn tick_policy(mut self, policy: TickPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Starts the checker on the current Tokio runtime.
    pub fn spawn(self) -> SessionTimerHandle {
        let ticks = TickScheduler::new(TickConfig {
            interval: self.manager.config().tick_interval,
            policy: self.policy,
        });
        let (status_tx, status_rx) = watch::channel(TimerStatus::of(&self.manager));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (paused_tx, paused_rx) = watch::channel(false);

        let task = tokio::spawn(run(
            self.manager,
            ticks,
            Controls {
                shutdown: shutdown_rx,
                paused: paused_rx,
            },
            status_tx,
        ));

        SessionTimerHandle {
            shutdown: Some(shutdown_tx),
            paused: paused_tx,
            task: Some(task),
            status: status_rx,
        }
    }
}

/// Signals from the handle to the task.
struct Controls {
    shutdown: oneshot::Receiver<()>,
    paused: watch::Receiver<bool>,
}

/// Resolves with the pending prompt or renewal, or never if there is none.
async fn resolve(pending: &mut Option<Pending>) -> PendingOutcome {
    match pending {
        Some(work) => work.await,
        None => std::future::pending().await,
    }
}

/// The checker loop. Returns the last phase it saw.
async fn run<G, S, C, N>(
    mut manager: SessionLifecycleManager<G, S, C, N>,
    mut ticks: TickScheduler,
    mut controls: Controls,
    status: watch::Sender<TimerStatus>,
) -> SessionPhase
where
    G: AuthGateway,
    S: SessionStore,
    C: Clock,
    N: NotificationSink,
{
    info!(
        interval_ms = ticks.interval().as_millis() as u64,
        "session timer started"
    );
    let mut pending: Option<Pending> = None;

    loop {
        tokio::select! {
            biased;

            // Fires on `stop()` and when the handle is dropped. Dropping
            // `pending` cancels any prompt or renewal in flight.
            _ = &mut controls.shutdown => {
                debug!("session timer stopped");
                break;
            }

            changed = controls.paused.changed() => {
                if changed.is_err() {
                    break;
                }
                if *controls.paused.borrow_and_update() {
                    ticks.pause();
                } else {
                    ticks.resume();
                }
            }

            // Ticks come before a ready answer, so expiry wins over a late
            // "yes".
            tick = ticks.wait_for_tick() => {
                if tick.ticks_skipped > 0 {
                    warn!(tick = tick.tick, skipped = tick.ticks_skipped, "session checks skipped");
                }
                let phase = manager.check();
                status.send_replace(TimerStatus::of(&manager));
                if phase.is_terminal() {
                    info!("session over, timer stopping");
                    break;
                }
                if pending.is_none() {
                    pending = manager.take_pending();
                }
            }

            outcome = resolve(&mut pending), if pending.is_some() => {
                pending = None;
                let phase = manager.complete(outcome);
                status.send_replace(TimerStatus::of(&manager));
                if phase.is_terminal() {
                    break;
                }
                pending = manager.take_pending();
            }
        }
    }

    manager.phase()
}

/// Controls a running [`SessionTimer`].
///
/// Dropping the handle cancels the task, the same as [`stop`](Self::stop).
#[derive(Debug)]
pub struct SessionTimerHandle {
    shutdown: Option<oneshot::Sender<()>>,
    paused: watch::Sender<bool>,
    task: Option<JoinHandle<SessionPhase>>,
    status: watch::Receiver<TimerStatus>,
}

impl SessionTimerHandle {
    /// Asks the checker to stop. Idempotent.
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }

    /// Suspends the checks. A prompt already on screen stays there and its
    /// answer is still applied. Idempotent.
    pub fn pause(&self) {
        self.paused.send_if_modified(|paused| !std::mem::replace(paused, true));
    }

    /// Resumes the checks; the next one runs one interval from now.
    /// Idempotent.
    pub fn resume(&self) {
        self.paused.send_if_modified(|paused| std::mem::replace(paused, false));
    }

    /// Returns `true` while the checks are suspended.
    pub fn is_paused(&self) -> bool {
        *self.paused.borrow()
    }

    /// Returns `true` once the task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// The latest published status.
    pub fn status(&self) -> TimerStatus {
        self.status.borrow().clone()
    }

    /// A receiver that is notified on every tick.
    pub fn subscribe(&self) -> watch::Receiver<TimerStatus> {
        self.status.clone()
    }

    /// Waits for the task to exit and returns the last phase it saw.
    ///
    /// Does not stop the task; call [`stop`](Self::stop) first to end it
    /// early.
    ///
    /// # Errors
    /// [`LogigoError::Timer`] if the task panicked or was aborted.
    pub async fn join(mut self) -> Result<SessionPhase, LogigoError> {
        match self.task.take() {
            Some(task) => Ok(task.await?),
            None => Ok(self.status.borrow().phase),
        }
    }
}

impl Drop for SessionTimerHandle {
    fn drop(&mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

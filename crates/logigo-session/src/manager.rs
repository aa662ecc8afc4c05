//! The session lifecycle manager: keeps an access token alive or tears
//! the session down.
//!
//! This is the central piece of the session layer. It's responsible for:
//! - Reading the remaining time from the shared store on every tick
//! - Asking the user, once per low-time window, whether to renew
//! - Reminding the user on every tick inside the critical window
//! - Renewing the token against the backend
//! - Clearing the store and redirecting once the token has expired
//!
//! # Concurrency note
//!
//! `SessionLifecycleManager` is NOT shared: it is owned by a single task
//! (the session timer) and driven through `&mut self`. The store it writes
//! to IS shared with the rest of the application, so every result that
//! comes back from an await is checked against a fresh read of the store
//! before anything is written.
//!
//! A tick never waits on the user or the backend. [`check`] queues the
//! prompt, [`take_pending`] hands it out as an owned [`Pending`] future,
//! and [`complete`] applies whatever it resolved to. The timer polls that
//! future next to its tick, so reminders and the countdown keep running
//! while the user decides.
//!
//! [`check`]: SessionLifecycleManager::check
//! [`take_pending`]: SessionLifecycleManager::take_pending
//! [`complete`]: SessionLifecycleManager::complete

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use logigo_gateway::AuthGateway;
use logigo_protocol::TokenGrant;
use tracing::{debug, info, warn};

use crate::session::duration_ms;
use crate::{
    Clock, Level, NotificationSink, Renewal, Session, SessionError,
    SessionPhase, SessionStore, SessionTimerConfig, format_remaining,
};

pub(crate) const DECLINED_MESSAGE: &str = "Your session will close soon.";
pub(crate) const EXPIRED_MESSAGE: &str =
    "Your session has expired. Please log in again.";
pub(crate) const RENEWED_MESSAGE: &str = "Session renewed successfully.";
pub(crate) const RENEW_FAILED_MESSAGE: &str = "Could not renew the session.";

// ---------------------------------------------------------------------------
// Pending work
// ---------------------------------------------------------------------------

/// Work the manager handed out: a renewal prompt, or the renewal call
/// that follows a "yes".
///
/// Owns everything it needs, so it can be polled while the manager keeps
/// ticking. Feed its output back through
/// [`complete`](SessionLifecycleManager::complete). Dropping it abandons
/// the work; nothing is written.
pub type Pending = Pin<Box<dyn Future<Output = PendingOutcome> + Send + 'static>>;

/// What a [`Pending`] future resolved to. Opaque: only the manager that
/// issued it can apply it.
pub struct PendingOutcome(Outcome);

impl fmt::Debug for PendingOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Outcome::Answered(accepted) => {
                f.debug_tuple("Answered").field(accepted).finish()
            }
            Outcome::Renewed(reply) => f
                .debug_struct("Renewed")
                .field("ok", &reply.result.is_ok())
                .finish(),
        }
    }
}

enum Outcome {
    Answered(bool),
    Renewed(RenewalReply),
}

enum Queued {
    Prompt(String),
    Renewal(RenewalRequest),
}

/// A renewal about to be sent. `previous_expiry` is the expiry the bearer
/// token had when the request left.
struct RenewalRequest {
    bearer: String,
    previous_expiry: i64,
    budget: Duration,
}

struct RenewalReply {
    request: RenewalRequest,
    result: Result<TokenGrant, SessionError>,
}

async fn send_renewal<G: AuthGateway>(
    gateway: Arc<G>,
    request: RenewalRequest,
) -> RenewalReply {
    let result = match tokio::time::timeout(
        request.budget,
        gateway.renew_token(&request.bearer),
    )
    .await
    {
        Ok(Ok(grant)) => Ok(grant),
        Ok(Err(err)) => Err(SessionError::Gateway(err)),
        Err(_) => Err(SessionError::Timeout),
    };
    RenewalReply { request, result }
}

// ---------------------------------------------------------------------------
// SessionLifecycleManager
// ---------------------------------------------------------------------------

/// Owns the expiry clock of one session.
///
/// ## Lifecycle
///
/// ```text
///             check()                   check()
/// Active ─────────────→ WarningIssued ─────────────→ CriticalWarning
///   ↑   (≤ 10 min: ask once)  │      (≤ 4 min: remind)       │
///   │                         │                              │
///   └────── renewal ok ───────┴──────────────────────────────┘
///
///   any ──(remaining ≤ 0)──→ Expired: toast, clear store, redirect
/// ```
///
/// Generic over every collaborator so tests can drive it with a
/// [`ManualClock`](crate::ManualClock), an in-memory store, a scripted
/// gateway, and a recording notifier.
pub struct SessionLifecycleManager<G, S, C, N> {
    gateway: Arc<G>,
    store: S,
    clock: C,
    notifier: Arc<N>,
    config: SessionTimerConfig,
    phase: SessionPhase,
    has_prompted_renewal: bool,
    /// Last computed remaining time, for the countdown display.
    remaining_ms: i64,
    queued: Option<Queued>,
}

impl<G, S, C, N> SessionLifecycleManager<G, S, C, N>
where
    G: AuthGateway,
    S: SessionStore,
    C: Clock,
    N: NotificationSink,
{
    /// Creates a manager for the session currently held by `store`.
    pub fn new(
        gateway: G,
        store: S,
        clock: C,
        notifier: N,
        config: SessionTimerConfig,
    ) -> Self {
        let mut manager = Self {
            gateway: Arc::new(gateway),
            store,
            clock,
            notifier: Arc::new(notifier),
            config: config.validated(),
            phase: SessionPhase::Active,
            has_prompted_renewal: false,
            remaining_ms: 0,
            queued: None,
        };
        manager.refresh_remaining();
        manager
    }

    /// Runs one tick of the lifecycle without waiting on anything.
    ///
    /// Everything is derived from "now" and the stored expiry; the tick
    /// count plays no part. When the renewal prompt is due it is queued
    /// for [`take_pending`](Self::take_pending), not shown here.
    ///
    /// Once this returns [`SessionPhase::Expired`] every later call
    /// returns it again without side effects.
    pub fn check(&mut self) -> SessionPhase {
        if self.phase.is_terminal() {
            return SessionPhase::Expired;
        }

        let Some(remaining) = self.refresh_remaining() else {
            return self.stop_without_session();
        };
        if remaining <= 0 {
            self.expire();
            return SessionPhase::Expired;
        }

        if remaining <= duration_ms(self.config.warning_threshold)
            && !self.has_prompted_renewal
        {
            info!(remaining_ms = remaining, "session close to expiry, asking to renew");
            self.has_prompted_renewal = true;
            self.queued = Some(Queued::Prompt(self.prompt_message()));
        }

        self.phase = self.classify(remaining);
        if self.phase == SessionPhase::CriticalWarning {
            self.notifier.notify(Level::Info, &self.critical_message());
        }
        debug!(phase = %self.phase, remaining_ms = remaining, "session evaluated");
        self.phase
    }

    /// Hands out the queued prompt or renewal, if any.
    pub fn take_pending(&mut self) -> Option<Pending> {
        match self.queued.take()? {
            Queued::Prompt(question) => {
                let notifier = Arc::clone(&self.notifier);
                let prompt: Pending = Box::pin(async move {
                    PendingOutcome(Outcome::Answered(notifier.confirm(&question).await))
                });
                Some(prompt)
            }
            Queued::Renewal(request) => {
                let gateway = Arc::clone(&self.gateway);
                let renewal: Pending = Box::pin(async move {
                    PendingOutcome(Outcome::Renewed(send_renewal(gateway, request).await))
                });
                Some(renewal)
            }
        }
    }

    /// Applies what a [`Pending`] future resolved to and returns the
    /// resulting phase.
    ///
    /// A "yes" queues the renewal call (take it with
    /// [`take_pending`](Self::take_pending)), a "no" shows the decline
    /// warning, and a renewal reply is written like
    /// [`renew`](Self::renew) would. Anything arriving after the session
    /// ended is dropped without a trace.
    pub fn complete(&mut self, outcome: PendingOutcome) -> SessionPhase {
        if self.phase.is_terminal() {
            debug!(?outcome, "session already over, dropping late result");
            return SessionPhase::Expired;
        }
        match outcome.0 {
            Outcome::Answered(true) => match self.begin_renewal() {
                Ok(request) => self.queued = Some(Queued::Renewal(request)),
                Err(err) => self.renewal_failed(&err),
            },
            Outcome::Answered(false) => {
                info!("user declined session renewal");
                self.notifier.notify(Level::Warning, DECLINED_MESSAGE);
            }
            Outcome::Renewed(reply) => {
                // Failures are already reported to the user.
                let _ = self.finish_renewal(reply);
            }
        }
        self.phase
    }

    /// Runs one tick and waits for the prompt (and the renewal it may
    /// trigger) before returning.
    ///
    /// For callers without a timer of their own. The wait never outlasts
    /// the session: an unanswered prompt is abandoned when the remaining
    /// time runs out.
    pub async fn evaluate(&mut self) -> SessionPhase {
        let mut phase = self.check();
        while let Some(pending) = self.take_pending() {
            // Time moved while the user was deciding; start over from
            // the store.
            let remaining = match self.refresh_remaining() {
                Some(r) if r > 0 => r,
                _ => return self.check(),
            };
            match tokio::time::timeout(Duration::from_millis(remaining as u64), pending).await {
                Ok(outcome) => phase = self.complete(outcome),
                Err(_) => {
                    debug!("renewal prompt left unanswered until expiry");
                    break;
                }
            }
        }
        phase
    }

    /// Exchanges the current token for a fresh one.
    ///
    /// On success the store holds the new token with
    /// `expires_at = now + expires_in`, the prompt guard is reset, and a
    /// success toast is shown. On failure nothing is written and an error
    /// toast is shown; the next tick carries on from the unchanged expiry.
    /// After teardown nothing is shown at all.
    ///
    /// # Errors
    /// - [`SessionError::SessionExpired`]: already torn down or past expiry
    /// - [`SessionError::NotAuthenticated`]: no token in the store
    /// - [`SessionError::Gateway`] or [`SessionError::Timeout`]: the call failed
    /// - [`SessionError::Superseded`]: the session was cleared or replaced
    ///   while the request was in flight, so the response was dropped
    pub async fn renew(&mut self) -> Result<Renewal, SessionError> {
        if self.phase.is_terminal() {
            debug!("renewal requested after teardown, ignoring");
            return Err(SessionError::SessionExpired);
        }
        let request = match self.begin_renewal() {
            Ok(request) => request,
            Err(err) => {
                self.renewal_failed(&err);
                return Err(err);
            }
        };
        let reply = send_renewal(Arc::clone(&self.gateway), request).await;
        self.finish_renewal(reply)
    }

    /// Checks that there is something to renew and sizes the time budget.
    fn begin_renewal(&mut self) -> Result<RenewalRequest, SessionError> {
        let bearer = self
            .store
            .access_token()
            .ok_or(SessionError::NotAuthenticated)?;
        let remaining = self.refresh_remaining().unwrap_or(0);
        if remaining <= 0 {
            return Err(SessionError::SessionExpired);
        }

        // A response landing after expiry would be discarded anyway, so
        // don't wait past it.
        let budget = self
            .config
            .renew_timeout
            .min(Duration::from_millis(remaining as u64));
        Ok(RenewalRequest {
            bearer,
            previous_expiry: self.store.expires_at().unwrap_or_default(),
            budget,
        })
    }

    fn finish_renewal(&mut self, reply: RenewalReply) -> Result<Renewal, SessionError> {
        let result = self.apply_renewal(reply);
        match &result {
            Ok(renewal) => {
                info!(
                    expires_at = renewal.expires_at_epoch_ms,
                    "session renewed"
                );
                self.notifier.notify(Level::Success, RENEWED_MESSAGE);
            }
            Err(SessionError::Superseded) => {
                debug!("renewal response discarded: session changed while in flight");
            }
            Err(err) => self.renewal_failed(err),
        }
        result
    }

    fn apply_renewal(&mut self, reply: RenewalReply) -> Result<Renewal, SessionError> {
        let RenewalReply { request, result } = reply;
        let grant = result?;

        // The store may have been cleared (logout) or rewritten (another
        // login) while the request was in flight.
        if self.phase.is_terminal()
            || self.store.access_token().as_deref() != Some(request.bearer.as_str())
            || self.store.expires_at().is_none()
        {
            return Err(SessionError::Superseded);
        }
        let now = self.clock.now_ms();
        if now >= request.previous_expiry {
            return Err(SessionError::SessionExpired);
        }

        let ttl = i64::try_from(grant.expires_in).unwrap_or(i64::MAX);
        let expires_at = now.saturating_add(ttl);
        if expires_at <= request.previous_expiry {
            warn!(
                previous_expiry = request.previous_expiry,
                expires_at, "renewed token expires no later than the old one"
            );
        }

        self.store.write_session(&grant.access_token, expires_at);
        self.has_prompted_renewal = false;
        self.remaining_ms = expires_at - now;
        self.phase = self.classify(self.remaining_ms);

        Ok(Renewal {
            access_token: grant.access_token,
            expires_at_epoch_ms: expires_at,
        })
    }

    fn renewal_failed(&self, err: &SessionError) {
        warn!(error = %err, "session renewal failed");
        self.notifier.notify(Level::Error, RENEW_FAILED_MESSAGE);
    }

    /// Tears the session down: toast, clear the whole store, redirect.
    fn expire(&mut self) {
        warn!("session expired, clearing session store");
        self.phase = SessionPhase::Expired;
        self.remaining_ms = 0;
        self.has_prompted_renewal = false;
        self.queued = None;
        self.notifier.notify(Level::Error, EXPIRED_MESSAGE);
        self.store.clear();
        self.notifier.redirect(&self.config.landing_route);
    }

    /// The store no longer holds a session: someone logged out through
    /// another path. Stop quietly; there is nothing left to tear down.
    fn stop_without_session(&mut self) -> SessionPhase {
        debug!("session store is empty, stopping the checker");
        self.phase = SessionPhase::Expired;
        self.remaining_ms = 0;
        self.has_prompted_renewal = false;
        self.queued = None;
        SessionPhase::Expired
    }

    /// Re-reads the store and updates the countdown.
    ///
    /// Returns `None` when there is no token or no expiry to read.
    fn refresh_remaining(&mut self) -> Option<i64> {
        self.store.access_token()?;
        let expires_at = self.store.expires_at()?;
        let remaining = expires_at.saturating_sub(self.clock.now_ms());
        self.remaining_ms = remaining.max(0);
        Some(remaining)
    }

    fn classify(&self, remaining: i64) -> SessionPhase {
        let warning = duration_ms(self.config.warning_threshold);
        let critical = duration_ms(self.config.critical_threshold);
        let floor = duration_ms(self.config.critical_floor);

        if remaining <= 0 {
            SessionPhase::Expired
        } else if remaining > warning {
            SessionPhase::Active
        } else if remaining > floor && remaining <= critical {
            SessionPhase::CriticalWarning
        } else {
            SessionPhase::WarningIssued
        }
    }

    fn prompt_message(&self) -> String {
        format!(
            "Your session will expire in less than {} minutes. Do you want to keep it active?",
            self.config.warning_threshold.as_secs() / 60
        )
    }

    fn critical_message(&self) -> String {
        format!(
            "Your session will expire in less than {} minutes. Save your work or renew the session.",
            self.config.critical_threshold.as_secs() / 60
        )
    }

    // -- Accessors --------------------------------------------------------

    /// The phase computed by the last `check` (or renewal).
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Remaining time as of the last store read, never negative.
    pub fn remaining_ms(&self) -> i64 {
        self.remaining_ms
    }

    /// The remaining time formatted as `HH:MM:SS`.
    pub fn countdown(&self) -> String {
        format_remaining(self.remaining_ms)
    }

    /// Whether the renewal prompt was already shown in this window.
    pub fn has_prompted_renewal(&self) -> bool {
        self.has_prompted_renewal
    }

    /// A snapshot of the stored session, if there is one.
    pub fn session(&self) -> Option<Session> {
        Some(Session {
            access_token: self.store.access_token()?,
            expires_at_epoch_ms: self.store.expires_at()?,
            has_prompted_renewal: self.has_prompted_renewal,
        })
    }

    /// The effective (validated) configuration.
    pub fn config(&self) -> &SessionTimerConfig {
        &self.config
    }
}

// =========================================================================
// Tests
// =========================================================================

//! In-memory doubles for exercising the session lifecycle without a
//! backend or a UI.
//!
//! Available in this crate's tests and, for downstream crates, behind the
//! `test-util` feature.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use logigo_gateway::{AuthGateway, GatewayError};
use logigo_protocol::{
    AuthResponse, Credentials, GoogleCredential, ProfileUpdate, Registration,
    TokenGrant, User,
};

use crate::{Level, NotificationSink};

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

/// One thing the lifecycle showed to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Toast(Level, String),
    Confirm(String),
    Redirect(String),
}

#[derive(Debug, Default)]
struct Recording {
    notices: Vec<Notice>,
    answers: VecDeque<bool>,
    default_answer: bool,
    hang_confirms: bool,
}

/// A [`NotificationSink`] that records everything and answers prompts
/// from a script. Clones share the same recording.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    inner: Arc<Mutex<Recording>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    fn recording(&self) -> MutexGuard<'_, Recording> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues the answer to the next unanswered prompt.
    pub fn answer_next(&self, answer: bool) {
        self.recording().answers.push_back(answer);
    }

    /// Answer used once the queue is empty (starts as `false`).
    pub fn set_default_answer(&self, answer: bool) {
        self.recording().default_answer = answer;
    }

    /// When set, prompts never resolve, as if the user walked away.
    pub fn hang_confirms(&self, hang: bool) {
        self.recording().hang_confirms = hang;
    }

    /// Everything recorded so far, in order.
    pub fn notices(&self) -> Vec<Notice> {
        self.recording().notices.clone()
    }

    /// Messages of the toasts shown at `level`.
    pub fn toasts(&self, level: Level) -> Vec<String> {
        self.recording()
            .notices
            .iter()
            .filter_map(|n| match n {
                Notice::Toast(l, msg) if *l == level => Some(msg.clone()),
                _ => None,
            })
            .collect()
    }

    /// How many prompts were shown.
    pub fn confirm_count(&self) -> usize {
        self.recording()
            .notices
            .iter()
            .filter(|n| matches!(n, Notice::Confirm(_)))
            .count()
    }

    /// Routes the user was sent to.
    pub fn redirects(&self) -> Vec<String> {
        self.recording()
            .notices
            .iter()
            .filter_map(|n| match n {
                Notice::Redirect(route) => Some(route.clone()),
                _ => None,
            })
            .collect()
    }

    /// Forgets recorded notices; scripted answers are kept.
    pub fn clear(&self) {
        self.recording().notices.clear();
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify(&self, level: Level, message: &str) {
        self.recording()
            .notices
            .push(Notice::Toast(level, message.to_string()));
    }

    async fn confirm(&self, message: &str) -> bool {
        let (answer, hang) = {
            let mut rec = self.recording();
            rec.notices.push(Notice::Confirm(message.to_string()));
            let answer = rec.answers.pop_front().unwrap_or(rec.default_answer);
            (answer, rec.hang_confirms)
        };
        if hang {
            std::future::pending::<()>().await;
        }
        answer
    }

    fn redirect(&self, route: &str) {
        self.recording()
            .notices
            .push(Notice::Redirect(route.to_string()));
    }
}

// ---------------------------------------------------------------------------
// ScriptedGateway
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Script {
    renewals: VecDeque<Result<TokenGrant, GatewayError>>,
    auth: VecDeque<Result<AuthResponse, GatewayError>>,
    profiles: VecDeque<Result<User, GatewayError>>,
    acks: VecDeque<Result<(), GatewayError>>,
    renew_delay: Option<Duration>,
    renew_bearers: Vec<String>,
    calls: Vec<&'static str>,
}

/// An [`AuthGateway`] that replays queued responses.
///
/// An empty queue answers with a `Network` error, so a test that forgets
/// to script a call sees a failure rather than a hang. Clones share the
/// same script.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGateway {
    inner: Arc<Mutex<Script>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues a successful renewal.
    pub fn grant(&self, access_token: &str, expires_in_ms: u64) {
        self.script().renewals.push_back(Ok(TokenGrant {
            access_token: access_token.to_string(),
            expires_in: expires_in_ms,
        }));
    }

    /// Queues a failed renewal.
    pub fn fail_renewal(&self, err: GatewayError) {
        self.script().renewals.push_back(Err(err));
    }

    /// Queues the reply of the next login / register / OAuth call.
    pub fn auth_reply(&self, reply: Result<AuthResponse, GatewayError>) {
        self.script().auth.push_back(reply);
    }

    /// Queues the reply of the next profile read or update.
    pub fn profile_reply(&self, reply: Result<User, GatewayError>) {
        self.script().profiles.push_back(reply);
    }

    /// Queues the reply of the next password-reset call (default: `Ok`).
    pub fn ack_reply(&self, reply: Result<(), GatewayError>) {
        self.script().acks.push_back(reply);
    }

    /// Makes every renewal take `delay` (Tokio time) before answering.
    pub fn delay_renewals(&self, delay: Duration) {
        self.script().renew_delay = Some(delay);
    }

    /// Bearer tokens presented to the renewal endpoint, in order.
    pub fn renew_bearers(&self) -> Vec<String> {
        self.script().renew_bearers.clone()
    }

    /// Names of the endpoints called, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.script().calls.clone()
    }

    fn next_auth(&self, call: &'static str) -> Result<AuthResponse, GatewayError> {
        let mut script = self.script();
        script.calls.push(call);
        script.auth.pop_front().unwrap_or_else(unscripted)
    }

    fn next_profile(&self, call: &'static str) -> Result<User, GatewayError> {
        let mut script = self.script();
        script.calls.push(call);
        script.profiles.pop_front().unwrap_or_else(unscripted)
    }

    fn next_ack(&self, call: &'static str) -> Result<(), GatewayError> {
        let mut script = self.script();
        script.calls.push(call);
        script.acks.pop_front().unwrap_or(Ok(()))
    }
}

fn unscripted<T>() -> Result<T, GatewayError> {
    Err(GatewayError::Network("no scripted response".into()))
}

impl AuthGateway for ScriptedGateway {
    async fn renew_token(&self, token: &str) -> Result<TokenGrant, GatewayError> {
        let (delay, reply) = {
            let mut script = self.script();
            script.calls.push("renew-token");
            script.renew_bearers.push(token.to_string());
            let reply = script.renewals.pop_front().unwrap_or_else(unscripted);
            (script.renew_delay, reply)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        reply
    }

    async fn login(&self, _: &Credentials) -> Result<AuthResponse, GatewayError> {
        self.next_auth("login")
    }

    async fn register(&self, _: &Registration) -> Result<AuthResponse, GatewayError> {
        self.next_auth("register")
    }

    async fn verify_google_token(
        &self,
        _: &GoogleCredential,
    ) -> Result<AuthResponse, GatewayError> {
        self.next_auth("verificar-token")
    }

    async fn profile(&self, _: &str) -> Result<User, GatewayError> {
        self.next_profile("profile")
    }

    async fn update_profile(
        &self,
        _: &str,
        _: &ProfileUpdate,
    ) -> Result<User, GatewayError> {
        self.next_profile("update-profile")
    }

    async fn forgot_password(&self, _: &str) -> Result<(), GatewayError> {
        self.next_ack("forgot-password")
    }

    async fn reset_password(&self, _: &str, _: &str) -> Result<(), GatewayError> {
        self.next_ack("reset-password")
    }
}

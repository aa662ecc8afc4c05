//! The producers of a session: login, OAuth, registration, and the
//! profile endpoints that ride on the stored token.
//!
//! The lifecycle manager only ever *maintains* a session. Something has to
//! create it first, and that is [`AuthClient`]: it calls the backend,
//! turns the TTL it gets back into an absolute expiry, and writes both
//! into the shared store. From then on the manager takes over.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use logigo_gateway::AuthGateway;
use logigo_protocol::{
    AuthResponse, Credentials, GoogleCredential, ProfileUpdate, Registration,
    User,
};
use tracing::{debug, info, warn};

use crate::session::duration_ms;
use crate::{Clock, SessionError, SessionStore};

/// Client-side authentication state for one user session.
///
/// Holds the shared store (where the token lives) and remembers the
/// last user profile the backend sent. Methods take `&self`, so one
/// client can sit behind an `Arc` next to the session timer.
pub struct AuthClient<G, S, C> {
    gateway: G,
    store: S,
    clock: C,
    default_ttl: Duration,
    user: RwLock<Option<User>>,
}

impl<G, S, C> AuthClient<G, S, C>
where
    G: AuthGateway,
    S: SessionStore,
    C: Clock,
{
    /// Creates a client. `default_ttl` applies when a login response
    /// carries a token without an `expires_in`.
    pub fn new(gateway: G, store: S, clock: C, default_ttl: Duration) -> Self {
        let default_ttl = if default_ttl.is_zero() {
            Duration::from_secs(60 * 60)
        } else {
            default_ttl
        };
        Self {
            gateway,
            store,
            clock,
            default_ttl,
            user: RwLock::new(None),
        }
    }

    /// Signs in with email and password and starts a session.
    ///
    /// # Errors
    /// - [`SessionError::Unauthorized`] for rejected credentials
    /// - [`SessionError::MissingToken`] if the backend answered without a token
    /// - [`SessionError::Gateway`] for any other backend failure
    pub async fn login(&self, credentials: &Credentials) -> Result<User, SessionError> {
        let response = self
            .gateway
            .login(credentials)
            .await
            .map_err(SessionError::from_gateway)?;
        self.start_session(response, "login")
    }

    /// Signs in with a Google credential, verified by the backend.
    pub async fn login_with_google(
        &self,
        credential: &GoogleCredential,
    ) -> Result<User, SessionError> {
        let response = self
            .gateway
            .verify_google_token(credential)
            .await
            .map_err(SessionError::from_gateway)?;
        self.start_session(response, "google")
    }

    /// Creates an account.
    ///
    /// The backend may answer with just a confirmation message; a session
    /// is started only if the reply carries a token.
    pub async fn register(
        &self,
        registration: &Registration,
    ) -> Result<AuthResponse, SessionError> {
        let response = self
            .gateway
            .register(registration)
            .await
            .map_err(SessionError::from_gateway)?;

        if response.token().is_some() {
            self.start_session(response.clone(), "register")?;
        } else {
            info!("account registered, no session started");
        }
        Ok(response)
    }

    /// Confirms the stored token against the backend and refreshes the
    /// remembered user.
    ///
    /// Does not touch the store: a rejected token is reported as
    /// [`SessionError::Unauthorized`] and left for the lifecycle manager
    /// (or an explicit logout) to tear down.
    pub async fn check_auth(&self) -> Result<User, SessionError> {
        let token = self
            .store
            .access_token()
            .ok_or(SessionError::NotAuthenticated)?;
        let user = self
            .gateway
            .profile(&token)
            .await
            .map_err(SessionError::from_gateway)?;
        self.remember(Some(user.clone()));
        Ok(user)
    }

    /// Updates the signed-in user's profile.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, SessionError> {
        let token = self
            .store
            .access_token()
            .ok_or(SessionError::NotAuthenticated)?;
        let user = self
            .gateway
            .update_profile(&token, update)
            .await
            .map_err(SessionError::from_gateway)?;
        info!("profile updated");
        self.remember(Some(user.clone()));
        Ok(user)
    }

    /// Asks the backend to email a password-reset link.
    pub async fn forgot_password(&self, email: &str) -> Result<(), SessionError> {
        self.gateway
            .forgot_password(email)
            .await
            .map_err(SessionError::from_gateway)
    }

    /// Sets a new password using the token from a reset link.
    pub async fn reset_password(
        &self,
        reset_token: &str,
        new_password: &str,
    ) -> Result<(), SessionError> {
        self.gateway
            .reset_password(reset_token, new_password)
            .await
            .map_err(SessionError::from_gateway)
    }

    /// Ends the session: clears the whole store and forgets the user.
    ///
    /// Calling it without a session is a no-op.
    pub fn logout(&self) {
        if self.store.access_token().is_none() && self.current_user().is_none() {
            debug!("logout without a session");
            return;
        }
        self.store.clear();
        self.remember(None);
        info!("logged out");
    }

    /// The user the backend last described, if signed in.
    pub fn current_user(&self) -> Option<User> {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether the store currently holds a token.
    pub fn is_authenticated(&self) -> bool {
        self.store.access_token().is_some()
    }

    /// Writes the session carried by `response` into the store.
    fn start_session(&self, response: AuthResponse, via: &'static str) -> Result<User, SessionError> {
        let Some(token) = response.token() else {
            let reason = response
                .message
                .unwrap_or_else(|| format!("{via} response has no access_token"));
            warn!(via, "backend answered without a token");
            return Err(SessionError::MissingToken(reason));
        };

        let ttl = match response.expires_in {
            Some(ms) if ms > 0 => i64::try_from(ms).unwrap_or(i64::MAX),
            _ => {
                debug!(via, "no expires_in in response, using default TTL");
                duration_ms(self.default_ttl)
            }
        };
        let expires_at = self.clock.now_ms().saturating_add(ttl);
        self.store.write_session(token, expires_at);

        let user = response.user.unwrap_or_default();
        info!(via, expires_at, "session started");
        self.remember(Some(user.clone()));
        Ok(user)
    }

    fn remember(&self, user: Option<User>) {
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = user;
    }
}

#[cfg(test)]
mod tests {
    use logigo_gateway::GatewayError;

    use super::*;
    use crate::testing::ScriptedGateway;
    use crate::{ManualClock, MemoryStore};

    const NOW: i64 = 1_700_000_000_000;

    fn client() -> (AuthClient<ScriptedGateway, MemoryStore, ManualClock>, ScriptedGateway, MemoryStore) {
        let gateway = ScriptedGateway::new();
        let store = MemoryStore::new();
        let client = AuthClient::new(
            gateway.clone(),
            store.clone(),
            ManualClock::new(NOW),
            Duration::from_secs(60 * 60),
        );
        (client, gateway, store)
    }

    fn ana() -> User {
        User {
            id: Some(7),
            email: "ana@logigo.test".into(),
            first_name: Some("Ana".into()),
            last_name: Some("Ruiz".into()),
            ..User::default()
        }
    }

    fn credentials() -> Credentials {
        Credentials {
            email: "ana@logigo.test".into(),
            password: "hunter22".into(),
        }
    }

    fn signed_in(token: &str, expires_in: Option<u64>) -> AuthResponse {
        AuthResponse {
            access_token: Some(token.into()),
            expires_in,
            user: Some(ana()),
            message: None,
        }
    }

    #[tokio::test]
    async fn test_login_writes_absolute_expiry() {
        let (client, gateway, store) = client();
        gateway.auth_reply(Ok(signed_in("tok", Some(700_000))));

        let user = client.login(&credentials()).await.expect("login");

        assert_eq!(user, ana());
        assert_eq!(store.access_token().as_deref(), Some("tok"));
        assert_eq!(store.expires_at(), Some(NOW + 700_000));
        assert_eq!(client.current_user(), Some(ana()));
        assert!(client.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_without_expires_in_uses_default_ttl() {
        let (client, gateway, store) = client();
        gateway.auth_reply(Ok(signed_in("tok", None)));

        client.login(&credentials()).await.expect("login");

        assert_eq!(store.expires_at(), Some(NOW + 60 * 60 * 1000));
    }

    #[tokio::test]
    async fn test_login_rejected_maps_to_unauthorized() {
        let (client, gateway, store) = client();
        gateway.auth_reply(Err(GatewayError::Status {
            status: 401,
            message: "Credenciales inválidas".into(),
        }));

        let result = client.login(&credentials()).await;

        assert!(matches!(result, Err(SessionError::Unauthorized)));
        assert!(store.is_empty());
        assert_eq!(client.current_user(), None);
    }

    #[tokio::test]
    async fn test_login_without_token_is_missing_token() {
        let (client, gateway, store) = client();
        gateway.auth_reply(Ok(AuthResponse {
            access_token: Some(String::new()),
            ..AuthResponse::default()
        }));

        let result = client.login(&credentials()).await;

        assert!(matches!(result, Err(SessionError::MissingToken(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_login_with_google_starts_session() {
        let (client, gateway, store) = client();
        gateway.auth_reply(Ok(signed_in("g-tok", Some(3_600_000))));

        client
            .login_with_google(&GoogleCredential {
                token: "google-id-token".into(),
            })
            .await
            .expect("google login");

        assert_eq!(gateway.calls(), vec!["verificar-token"]);
        assert_eq!(store.access_token().as_deref(), Some("g-tok"));
    }

    #[tokio::test]
    async fn test_register_message_only_starts_no_session() {
        let (client, gateway, store) = client();
        gateway.auth_reply(Ok(AuthResponse {
            message: Some("Usuario registrado".into()),
            ..AuthResponse::default()
        }));

        let reply = client
            .register(&Registration {
                email: "ana@logigo.test".into(),
                password: "hunter22".into(),
                first_name: "Ana".into(),
                last_name: "Ruiz".into(),
            })
            .await
            .expect("register");

        assert_eq!(reply.message.as_deref(), Some("Usuario registrado"));
        assert!(store.is_empty());
        assert!(!client.is_authenticated());
    }

    #[tokio::test]
    async fn test_check_auth_without_token_is_not_authenticated() {
        let (client, gateway, _) = client();

        let result = client.check_auth().await;

        assert!(matches!(result, Err(SessionError::NotAuthenticated)));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_check_auth_expired_token_is_unauthorized_and_keeps_store() {
        let (client, gateway, store) = client();
        store.write_session("stale", NOW + 1);
        gateway.profile_reply(Err(GatewayError::Status {
            status: 401,
            message: "Token expirado".into(),
        }));

        let result = client.check_auth().await;

        assert!(matches!(result, Err(SessionError::Unauthorized)));
        assert_eq!(store.access_token().as_deref(), Some("stale"));
    }

    #[tokio::test]
    async fn test_update_profile_refreshes_current_user() {
        let (client, gateway, store) = client();
        store.write_session("tok", NOW + 60_000);
        let renamed = User {
            first_name: Some("Anita".into()),
            ..ana()
        };
        gateway.profile_reply(Ok(renamed.clone()));

        let user = client
            .update_profile(&ProfileUpdate {
                first_name: Some("Anita".into()),
                ..ProfileUpdate::default()
            })
            .await
            .expect("update");

        assert_eq!(user, renamed);
        assert_eq!(client.current_user(), Some(renamed));
    }

    #[tokio::test]
    async fn test_password_reset_calls_pass_through() {
        let (client, gateway, _) = client();
        gateway.ack_reply(Ok(()));
        gateway.ack_reply(Err(GatewayError::Status {
            status: 400,
            message: "Token inválido".into(),
        }));

        client.forgot_password("ana@logigo.test").await.expect("forgot");
        let reset = client.reset_password("bad", "newpass1").await;

        assert!(matches!(reset, Err(SessionError::Gateway(_))));
        assert_eq!(gateway.calls(), vec!["forgot-password", "reset-password"]);
    }

    #[tokio::test]
    async fn test_logout_clears_store_and_user() {
        let (client, gateway, store) = client();
        gateway.auth_reply(Ok(signed_in("tok", Some(60_000))));
        client.login(&credentials()).await.expect("login");
        store.set("theme", "dark".into());

        client.logout();

        assert!(store.is_empty());
        assert_eq!(client.current_user(), None);
        assert!(!client.is_authenticated());
    }

    #[test]
    fn test_logout_without_session_leaves_store_alone() {
        let (client, _, store) = client();
        store.set("theme", "dark".into());

        client.logout();

        assert_eq!(store.get("theme").as_deref(), Some("dark"));
    }
}

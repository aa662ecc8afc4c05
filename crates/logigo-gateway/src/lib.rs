//! Backend gateway for the LogiGo session client.
//!
//! Provides the [`AuthGateway`] trait that abstracts over how the client
//! reaches the authentication endpoints, and [`HttpGateway`], the
//! `reqwest`-based implementation used in production.
//!
//! # Feature Flags
//!
//! - `http` (default): HTTP gateway via `reqwest`

#![allow(async_fn_in_trait)]

mod config;
mod error;
#[cfg(feature = "http")]
mod http;

pub use config::GatewayConfig;
pub use error::GatewayError;
#[cfg(feature = "http")]
pub use http::HttpGateway;

use std::future::Future;
use std::sync::Arc;

use logigo_protocol::{
    AuthResponse, Credentials, GoogleCredential, ProfileUpdate, Registration,
    TokenGrant, User,
};

/// The authentication endpoints of the LogiGo backend.
///
/// Tests plug in an in-memory fake, production uses [`HttpGateway`].
/// Every method returns a `Send` future so a gateway can be driven from a
/// spawned Tokio task.
pub trait AuthGateway: Send + Sync + 'static {
    /// `POST /api/renew-token` with `Authorization: Bearer <token>`.
    fn renew_token(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<TokenGrant, GatewayError>> + Send;

    /// `POST /api/login`.
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<AuthResponse, GatewayError>> + Send;

    /// `POST /api/register`.
    fn register(
        &self,
        registration: &Registration,
    ) -> impl Future<Output = Result<AuthResponse, GatewayError>> + Send;

    /// `POST /api/verificar-token` with a Google sign-in credential.
    fn verify_google_token(
        &self,
        credential: &GoogleCredential,
    ) -> impl Future<Output = Result<AuthResponse, GatewayError>> + Send;

    /// `GET /api/profile` with `Authorization: Bearer <token>`.
    fn profile(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<User, GatewayError>> + Send;

    /// `PUT /api/profile` with `Authorization: Bearer <token>`.
    fn update_profile(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> impl Future<Output = Result<User, GatewayError>> + Send;

    /// `POST /api/forgot-password`.
    fn forgot_password(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// `POST /api/reset-password/{reset_token}`.
    fn reset_password(
        &self,
        reset_token: &str,
        new_password: &str,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;
}

/// Lets the lifecycle manager and the auth client share one gateway.
impl<G: AuthGateway> AuthGateway for Arc<G> {
    fn renew_token(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<TokenGrant, GatewayError>> + Send {
        (**self).renew_token(token)
    }

    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<AuthResponse, GatewayError>> + Send {
        (**self).login(credentials)
    }

    fn register(
        &self,
        registration: &Registration,
    ) -> impl Future<Output = Result<AuthResponse, GatewayError>> + Send {
        (**self).register(registration)
    }

    fn verify_google_token(
        &self,
        credential: &GoogleCredential,
    ) -> impl Future<Output = Result<AuthResponse, GatewayError>> + Send {
        (**self).verify_google_token(credential)
    }

    fn profile(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<User, GatewayError>> + Send {
        (**self).profile(token)
    }

    fn update_profile(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> impl Future<Output = Result<User, GatewayError>> + Send {
        (**self).update_profile(token, update)
    }

    fn forgot_password(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send {
        (**self).forgot_password(email)
    }

    fn reset_password(
        &self,
        reset_token: &str,
        new_password: &str,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send {
        (**self).reset_password(reset_token, new_password)
    }
}

//! Payload types for the LogiGo authentication endpoints.
//!
//! Every type here travels "on the wire" as JSON. Field names follow what
//! the backend expects, which is why some request bodies are camelCase
//! (`firstName`) while the user object it returns is snake_case
//! (`first_name`).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Session store keys
// ---------------------------------------------------------------------------

/// Store key holding the bearer token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Store key holding the absolute expiry, as epoch milliseconds.
///
/// This is the only key the client uses for the expiry. Every producer
/// (login, OAuth verification, renewal) writes it and the lifecycle
/// manager reads it.
pub const EXPIRES_AT_KEY: &str = "expiresAtEpochMs";

// ---------------------------------------------------------------------------
// Token payloads
// ---------------------------------------------------------------------------

/// Response of `POST /api/renew-token`.
///
/// `expires_in` is a time-to-live in **milliseconds**, relative to the
/// moment the response is received. The client turns it into an absolute
/// expiry with `now + expires_in`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub expires_in: u64,
}

impl TokenGrant {
    /// Rejects grants that would produce an unusable session.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidMessage`] for an empty token or a
    /// zero TTL.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.access_token.is_empty() {
            return Err(ProtocolError::InvalidMessage(
                "token grant has an empty access_token".into(),
            ));
        }
        if self.expires_in == 0 {
            return Err(ProtocolError::InvalidMessage(
                "token grant has a zero expires_in".into(),
            ));
        }
        Ok(())
    }
}

/// Response of the endpoints that can start a session: login,
/// registration, and OAuth token verification.
///
/// All fields are optional because registration may answer with just a
/// confirmation message, and login does not always send `expires_in`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// TTL in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AuthResponse {
    /// The token, if the response actually carries a non-empty one.
    pub fn token(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Body of an error reply: `{ "error": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// Optional profile details attached to a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub avatar: Option<String>,
}

/// An authenticated LogiGo user as returned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: Option<u64>,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub profile: Option<Profile>,
}

impl User {
    /// Two-letter initials, used when there is no avatar.
    pub fn initials(&self) -> String {
        let first = self.first_name.as_deref().and_then(|s| s.chars().next());
        let last = self.last_name.as_deref().and_then(|s| s.chars().next());
        first.into_iter().chain(last).collect()
    }
}

/// Displays `First Last`, falling back to the email when no name is set.
impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => write!(f, "{first} {last}"),
            (Some(name), None) | (None, Some(name)) => write!(f, "{name}"),
            (None, None) => write!(f, "{}", self.email),
        }
    }
}

/// Response of `GET /api/profile` and `PUT /api/profile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user: User,
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Body of `POST /api/login`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Manual `Debug` so passwords never end up in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of `POST /api/register`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish()
    }
}

/// Body of `POST /api/verificar-token`: the credential handed over by the
/// Google sign-in widget, passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleCredential {
    pub token: String,
}

/// Body of `PUT /api/profile`. Only the set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Body of `POST /api/forgot-password`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Body of `POST /api/reset-password/{token}`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

impl fmt::Debug for ResetPasswordRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResetPasswordRequest")
            .field("new_password", &"<redacted>")
            .finish()
    }
}

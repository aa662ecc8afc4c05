//! Wire protocol for the LogiGo session client.
//!
//! This crate defines what the client and the LogiGo backend exchange:
//!
//! - **Types** ([`TokenGrant`], [`AuthResponse`], [`User`], request bodies):
//!   the JSON payloads of the authentication endpoints.
//! - **Store keys** ([`ACCESS_TOKEN_KEY`], [`EXPIRES_AT_KEY`]): the names
//!   under which a session lives in the tab-scoped key-value store.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how payloads are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! ```text
//! Gateway (HTTP) → Protocol (payloads) → Session (token lifecycle)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ACCESS_TOKEN_KEY, AuthResponse, Credentials, EXPIRES_AT_KEY, ErrorBody,
    ForgotPasswordRequest, GoogleCredential, Profile, ProfileResponse,
    ProfileUpdate, Registration, ResetPasswordRequest, TokenGrant, User,
};

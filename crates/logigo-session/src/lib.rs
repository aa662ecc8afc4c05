//! Session and access-token lifecycle management for the LogiGo client.
//!
//! This crate keeps an authenticated session alive, or ends it cleanly:
//!
//! 1. **Creation**: [`AuthClient`] logs in and writes the token and its
//!    absolute expiry into the shared [`SessionStore`]
//! 2. **Maintenance**: [`SessionLifecycleManager`] watches the remaining
//!    time, asks the user to renew once it runs low, and renews the token
//!    against the backend
//! 3. **Teardown**: at expiry the manager clears the store and sends the
//!    user back to the landing route
//!
//! # How it fits in the stack
//!
//! ```text
//! Facade (above)  ← drives the manager from a periodic timer task
//!     ↕
//! Session Layer (this crate)  ← owns the expiry clock and the store contract
//!     ↕
//! Gateway Layer (below)  ← reaches the backend's auth endpoints
//! ```

#![allow(async_fn_in_trait)]

mod auth;
mod clock;
mod error;
mod manager;
mod notify;
mod session;
mod store;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use auth::AuthClient;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::SessionError;
pub use manager::{Pending, PendingOutcome, SessionLifecycleManager};
pub use notify::{Level, LogNotifier, NotificationSink};
pub use session::{
    Renewal, Session, SessionPhase, SessionTimerConfig, format_remaining,
};
pub use store::{MemoryStore, SessionStore};

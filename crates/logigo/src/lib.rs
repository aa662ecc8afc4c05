//! # LogiGo
//!
//! Session lifecycle client for the LogiGo web backend.
//!
//! A LogiGo session is a bearer token with an absolute expiry kept in a
//! shared store. This crate logs the user in, keeps the token alive by
//! asking once before it runs out and renewing on request, and tears the
//! session down when it expires.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use logigo::prelude::*;
//!
//! # async fn demo() -> Result<(), LogigoError> {
//! logigo::telemetry::init_tracing();
//!
//! let gateway = std::sync::Arc::new(HttpGateway::new(&GatewayConfig::from_env())?);
//! let store = MemoryStore::new();
//! let auth = AuthClient::new(gateway.clone(), store.clone(), SystemClock, SessionTimerConfig::default().default_ttl);
//! auth.login(&Credentials { email: "ana@logigo.test".into(), password: "hunter22".into() }).await?;
//!
//! let manager = SessionLifecycleManager::new(
//!     gateway,
//!     store,
//!     SystemClock,
//!     LogNotifier::declining(),
//!     SessionTimerConfig::default(),
//! );
//! let timer = SessionTimer::new(manager).spawn();
//! let final_phase = timer.join().await?;
//! # let _ = final_phase;
//! # Ok(())
//! # }
//! ```

mod error;
pub mod telemetry;
mod timer;

pub use error::LogigoError;
pub use timer::{SessionTimer, SessionTimerHandle, TimerStatus};

pub use logigo_gateway as gateway;
pub use logigo_protocol as protocol;
pub use logigo_session as session;
pub use logigo_tick as tick;

/// Everything needed to wire up a session in one import.
pub mod prelude {
    pub use crate::{LogigoError, SessionTimer, SessionTimerHandle, TimerStatus};
    pub use logigo_gateway::{AuthGateway, GatewayConfig, GatewayError, HttpGateway};
    pub use logigo_protocol::{Credentials, GoogleCredential, ProfileUpdate, Registration, User};
    pub use logigo_session::{
        AuthClient, Clock, Level, LogNotifier, MemoryStore, NotificationSink, SessionError,
        SessionLifecycleManager, SessionPhase, SessionStore, SessionTimerConfig, SystemClock,
        format_remaining,
    };
    pub use logigo_tick::TickPolicy;
}

//! Logs in against a LogiGo backend and watches the session from the
//! terminal until it expires or Ctrl-C is pressed.
//!
//! ```text
//! LOGIGO_BASE_URL=http://localhost:5000 \
//! LOGIGO_EMAIL=ana@logigo.test LOGIGO_PASSWORD=... \
//! cargo run -p session-watch
//! ```

use std::sync::Arc;

use logigo::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;

// ---------------------------------------------------------------------------
// Console notifier
// ---------------------------------------------------------------------------

/// Prints toasts to the terminal and reads y/n answers from stdin.
struct ConsoleNotifier {
    stdin: Mutex<tokio::io::Lines<BufReader<tokio::io::Stdin>>>,
}

impl ConsoleNotifier {
    fn new() -> Self {
        Self {
            stdin: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }
}

impl NotificationSink for ConsoleNotifier {
    fn notify(&self, level: Level, message: &str) {
        println!("[{level}] {message}");
    }

    async fn confirm(&self, message: &str) -> bool {
        println!("{message} [y/N]");
        let mut stdin = self.stdin.lock().await;
        match stdin.next_line().await {
            Ok(Some(line)) => matches!(line.trim(), "y" | "Y" | "yes" | "s" | "si"),
            _ => false,
        }
    }

    fn redirect(&self, route: &str) {
        println!("-> {route}");
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn required_env(name: &str) -> Result<String, Box<dyn std::error::Error>> {
    std::env::var(name).map_err(|_| format!("{name} is not set").into())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logigo::telemetry::init_tracing();

    let gateway_config = GatewayConfig::from_env();
    let gateway = Arc::new(HttpGateway::new(&gateway_config)?);
    let store = MemoryStore::new();
    let session_config = SessionTimerConfig::default();

    let auth = AuthClient::new(
        Arc::clone(&gateway),
        store.clone(),
        SystemClock,
        session_config.default_ttl,
    );
    let credentials = Credentials {
        email: required_env("LOGIGO_EMAIL")?,
        password: required_env("LOGIGO_PASSWORD")?,
    };
    let user = auth.login(&credentials).await.map_err(LogigoError::from)?;
    println!("Signed in as {user}");
    match user.profile.as_ref().and_then(|p| p.avatar.as_deref()) {
        Some(avatar) => println!("  avatar: {avatar}"),
        None => println!("  [{}]", user.initials()),
    }

    let manager = SessionLifecycleManager::new(
        gateway,
        store,
        SystemClock,
        ConsoleNotifier::new(),
        session_config,
    );
    let mut timer = SessionTimer::new(manager).spawn();
    let mut status = timer.subscribe();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                timer.stop();
                auth.logout();
                println!("Signed out");
                break;
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = status.borrow_and_update().clone();
                tracing::debug!(phase = %snapshot.phase, countdown = %snapshot.countdown, "session status");
                if snapshot.phase == SessionPhase::Expired {
                    break;
                }
            }
        }
    }

    let phase = timer.join().await?;
    tracing::info!(%phase, "session watch finished");
    Ok(())
}

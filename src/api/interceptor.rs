//! Authorization-failure handling for the authenticated API client.
//!
//! A 401 on any authenticated call ends the session: the stored credential is
//! cleared, in-memory auth state is wiped and the caller is sent to the login
//! entry point.
//!
//! Every request records the session epoch it was signed under. Only a 401
//! for the live epoch tears anything down, and only the first one does; a
//! late 401 from an earlier session never touches the one that replaced it.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::auth::credentials::CredentialStore;
use crate::auth::state::AuthState;

/// Login entry point
pub const LOGIN_PATH: &str = "/login";

/// Where the embedding application sends the user when the session ends
pub trait Navigator: Send + Sync {
    fn navigate_to_login(&self);
}

/// Navigator for headless use: just records the redirect in the log
#[derive(Debug, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate_to_login(&self) {
        warn!("Session ended, redirecting to {}", LOGIN_PATH);
    }
}

/// Identifies one session lifetime
pub type Epoch = u64;

#[derive(Debug)]
struct SessionEpoch {
    current: Epoch,
    /// False once the current epoch was torn down or logged out
    live: bool,
}

pub struct SessionTerminator {
    store: Arc<dyn CredentialStore>,
    state: Arc<AuthState>,
    navigator: Arc<dyn Navigator>,
    epoch: Mutex<SessionEpoch>,
}

impl SessionTerminator {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        state: Arc<AuthState>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            store,
            state,
            navigator,
            // A credential left over from a previous run counts as live.
            epoch: Mutex::new(SessionEpoch { current: 0, live: true }),
        }
    }

    /// Epoch to record on a request before it is signed
    pub fn epoch(&self) -> Epoch {
        self.epoch.lock().current
    }

    /// Start a new session epoch. Requests signed earlier can no longer
    /// tear anything down.
    pub fn begin_session(&self) -> Epoch {
        let mut epoch = self.epoch.lock();
        epoch.current += 1;
        epoch.live = true;
        epoch.current
    }

    /// Start a new epoch unless the current one is still live
    pub fn ensure_session(&self) {
        let mut epoch = self.epoch.lock();
        if !epoch.live {
            epoch.current += 1;
            epoch.live = true;
        }
    }

    /// Close the current epoch without navigating (explicit logout)
    pub fn end_session(&self) {
        self.epoch.lock().live = false;
    }

    /// Tear the session signed under `signed_under` down. Returns `false`
    /// when that session is already over or has been replaced.
    pub fn terminate(&self, signed_under: Epoch) -> bool {
        let mut epoch = self.epoch.lock();
        if !epoch.live || epoch.current != signed_under {
            debug!(
                "Ignoring 401 for session epoch {} (current {}, live {})",
                signed_under, epoch.current, epoch.live
            );
            return false;
        }
        epoch.live = false;

        warn!("Backend rejected the credential; ending session");
        if let Err(e) = self.store.clear() {
            warn!("Failed to clear stored credential: {}", e);
        }
        self.state.clear();
        self.navigator.navigate_to_login();
        true
    }
}

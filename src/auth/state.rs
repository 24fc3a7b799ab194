//! Observable auth state shared by the session manager and the API client.

use tokio::sync::watch;

use crate::auth::models::{Profile, ProviderSession, ProviderUser};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthSnapshot {
    pub user: Option<ProviderUser>,
    pub session: Option<ProviderSession>,
    pub profile: Option<Profile>,
    /// True until the startup bootstrap has finished
    pub loading: bool,
}

impl AuthSnapshot {
    /// Only a fetched profile counts; a provider session alone does not.
    pub fn is_authenticated(&self) -> bool {
        self.profile.is_some()
    }
}

#[derive(Debug)]
pub struct AuthState {
    tx: watch::Sender<AuthSnapshot>,
}

impl AuthState {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(AuthSnapshot {
            loading: true,
            ..AuthSnapshot::default()
        });
        Self { tx }
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.tx.subscribe()
    }

    pub fn update(&self, modify: impl FnOnce(&mut AuthSnapshot)) {
        self.tx.send_modify(modify);
    }

    /// Forget user, session and profile
    pub fn clear(&self) {
        self.tx.send_modify(|snapshot| {
            snapshot.user = None;
            snapshot.session = None;
            snapshot.profile = None;
        });
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::new()
    }
}

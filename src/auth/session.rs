//! Session Manager
//!
//! Owns the client's auth state: startup bootstrap, provider event handling,
//! login, registration and logout. Constructed once by the application and
//! handed to whatever needs it; there is no global instance.
//!
//! A user counts as signed in only while a [`Profile`] fetched with a working
//! credential is present. A provider session on its own is never enough.

use std::sync::{Arc, Weak};

use serde_json::Value;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::client::ApiClient;
use crate::api::error::ApiError;
use crate::api::interceptor::{LOGIN_PATH, Navigator, SessionTerminator};
use crate::auth::credentials::{CredentialStore, FileCredentialStore};
use crate::auth::models::{AuthStateEvent, LoginRequest, LoginResponse, Profile, RegisterRequest, Role};
use crate::auth::provider::{select_provider, IdentityProvider};
use crate::auth::resolver::SessionResolver;
use crate::auth::state::{AuthSnapshot, AuthState};
use crate::config::Config;
use crate::timeout::with_timeout;

pub const NETWORK_ERROR_MESSAGE: &str = "Cannot reach the server. Please check your internet connection.";
const LOGIN_FAILED: &str = "Login failed";
const REGISTRATION_FAILED: &str = "Registration failed";

/// Why a login or registration did not go through. `Display` is the
/// message meant for the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    /// The backend refused, with its own explanation
    #[error("{0}")]
    Rejected(String),

    #[error("{}", NETWORK_ERROR_MESSAGE)]
    Unreachable,

    #[error("{0}")]
    Failed(String),
}

impl AuthFailure {
    /// Server detail, then the network message, then the error's own text
    fn from_login_error(err: &ApiError) -> Self {
        Self::classify(err).unwrap_or_else(|| {
            let message = err.to_string();
            AuthFailure::Failed(if message.is_empty() { LOGIN_FAILED.to_string() } else { message })
        })
    }

    fn from_registration_error(err: &ApiError) -> Self {
        Self::classify(err).unwrap_or_else(|| {
            warn!("{}: {}", REGISTRATION_FAILED, err);
            AuthFailure::Failed(REGISTRATION_FAILED.to_string())
        })
    }

    fn classify(err: &ApiError) -> Option<Self> {
        if let Some(detail) = err.detail() {
            return Some(AuthFailure::Rejected(detail.to_string()));
        }
        err.is_network().then_some(AuthFailure::Unreachable)
    }
}

/// Outcome of a route guard check
#[derive(Debug, Clone, PartialEq)]
pub enum Access {
    /// Bootstrap still running; show a spinner, decide later
    Loading,
    Granted(Profile),
    Redirect(&'static str),
}

pub struct SessionManager {
    state: Arc<AuthState>,
    resolver: Arc<SessionResolver>,
    terminator: Arc<SessionTerminator>,
    api: ApiClient,
    bootstrap_api: ApiClient,
}

impl SessionManager {
    pub fn new(
        config: &Config,
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let state = Arc::new(AuthState::new());
        let resolver = Arc::new(SessionResolver::new(
            provider,
            store.clone(),
            config.session.lookup_timeout,
        ));
        let terminator = Arc::new(SessionTerminator::new(store, state.clone(), navigator));

        Ok(Self {
            api: ApiClient::authenticated(&config.api, resolver.clone(), terminator.clone())?,
            bootstrap_api: ApiClient::bootstrap(&config.api)?,
            state,
            resolver,
            terminator,
        })
    }

    /// Provider chosen from configuration, credentials persisted to disk
    pub fn from_config(config: &Config, navigator: Arc<dyn Navigator>) -> Result<Self, ApiError> {
        let provider = select_provider(&config.provider, config.api.request_timeout);
        let store = Arc::new(FileCredentialStore::new(&config.credential_path));
        Self::new(config, provider, store, navigator)
    }

    pub fn get(&self) -> AuthSnapshot {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.state.subscribe()
    }

    /// Client for authenticated backend calls
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn resolver(&self) -> &SessionResolver {
        &self.resolver
    }

    /// Restore a session at startup from whichever source is available
    pub async fn bootstrap(&self) {
        if let Some(resolved) = self.resolver.resolve().await {
            self.terminator.ensure_session();
            let session = resolved.session.clone();
            self.state.update(|s| {
                s.user = session.as_ref().and_then(|session| session.user.clone());
                s.session = session;
            });

            let profile = self.fetch_profile(&resolved.token).await;
            self.apply_profile(profile);
        }

        self.state.update(|s| s.loading = false);
        match self.get().profile {
            Some(profile) => info!("Session restored for {} ({})", profile.email, profile.role),
            None => info!("No session to restore"),
        }
    }

    /// Apply a provider session change.
    ///
    /// A "no session" event while a credential is stored is ignored: a
    /// degraded provider reports exactly that, and the stored credential
    /// still works against the backend.
    pub async fn handle_auth_event(&self, event: AuthStateEvent) {
        if event.session.is_none() && self.resolver.store().load().is_some() {
            warn!("Ignoring provider sign-out while a stored credential is present");
            return;
        }

        let session = event.session;
        let token = session
            .as_ref()
            .map(|session| session.access_token.clone())
            .filter(|token| !token.is_empty());
        self.state.update(|s| {
            s.user = session.as_ref().and_then(|session| session.user.clone());
            s.session = session;
        });

        match token {
            Some(token) => {
                let profile = self.fetch_profile(&token).await;
                self.apply_profile(profile);
            }
            None => self.state.update(|s| s.profile = None),
        }
    }

    /// Forward provider events into [`handle_auth_event`](Self::handle_auth_event)
    /// until the manager or the provider goes away.
    pub fn spawn_event_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.resolver.provider().subscribe();
        let manager: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            loop {
                let event = match events.recv().await {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Dropped {} provider auth events", skipped);
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                let Some(manager) = manager.upgrade() else { break };
                manager.handle_auth_event(event).await;
            }
            debug!("Provider event listener stopped");
        })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(), AuthFailure> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self
            .bootstrap_api
            .post("/api/auth/login", &request)
            .await
            .map_err(|e| AuthFailure::from_login_error(&e))?;

        let Some(token) = response.access_token.clone().filter(|t| !t.is_empty()) else {
            return Err(AuthFailure::Failed(LOGIN_FAILED.to_string()));
        };

        self.terminator.begin_session();
        self.resolver.store().save(&token).map_err(|e| {
            warn!("Could not persist credential: {}", e);
            AuthFailure::Failed(LOGIN_FAILED.to_string())
        })?;

        let provider = self.resolver.provider();
        match with_timeout(provider.set_session(&token, &token), self.resolver.lookup_timeout()).await {
            Ok(Ok(())) => debug!("Identity provider session updated"),
            Ok(Err(e)) => debug!("Identity provider did not take the session: {}", e),
            Err(e) => debug!("Identity provider session update abandoned: {}", e),
        }

        let profile = match response.profile() {
            Some(profile) => Some(profile),
            None => self.fetch_profile(&token).await,
        };
        let Some(profile) = profile else {
            warn!("Login for {} returned no usable profile", email);
            self.terminator.end_session();
            if let Err(e) = self.resolver.store().clear() {
                warn!("Failed to clear stored credential: {}", e);
            }
            self.provider_sign_out().await;
            return Err(AuthFailure::Failed(LOGIN_FAILED.to_string()));
        };

        info!("Logged in as {} ({})", profile.email, profile.role);
        self.state.update(|s| {
            s.profile = Some(profile);
            s.loading = false;
        });
        Ok(())
    }

    /// Create the account, then log straight into it
    pub async fn register(&self, request: &RegisterRequest) -> Result<(), AuthFailure> {
        self.bootstrap_api
            .post::<_, Value>("/api/auth/register", request)
            .await
            .map_err(|e| AuthFailure::from_registration_error(&e))?;

        info!("Registered {} as {}", request.email, request.role);
        self.login(&request.email, &request.password).await
    }

    /// Always succeeds once the local credential is gone
    pub async fn logout(&self) {
        self.terminator.end_session();
        if let Err(e) = self.resolver.store().clear() {
            warn!("Failed to clear stored credential: {}", e);
        }
        self.provider_sign_out().await;
        self.state.clear();
        info!("Logged out");
    }

    /// Decide whether the current user may see a page for `required` (any
    /// signed-in user when `None`)
    pub fn guard(&self, required: Option<Role>) -> Access {
        let snapshot = self.get();
        if snapshot.loading {
            return Access::Loading;
        }
        match (snapshot.profile, required) {
            (None, _) => Access::Redirect(LOGIN_PATH),
            (Some(profile), Some(role)) if profile.role != role => {
                Access::Redirect(profile.role.home_path())
            }
            (Some(profile), _) => Access::Granted(profile),
        }
    }

    async fn fetch_profile(&self, token: &str) -> Option<Profile> {
        match self.api.get_with_token::<Profile>("/api/auth/me", token).await {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!("Profile fetch failed: {}", e);
                None
            }
        }
    }

    /// Without a profile the provider session is stale too, so both go.
    fn apply_profile(&self, profile: Option<Profile>) {
        if profile.is_some() {
            self.terminator.ensure_session();
        }
        self.state.update(|s| match profile {
            Some(profile) => s.profile = Some(profile),
            None => {
                s.profile = None;
                s.session = None;
                s.user = None;
            }
        });
    }

    async fn provider_sign_out(&self) {
        match with_timeout(self.resolver.provider().sign_out(), self.resolver.lookup_timeout()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!("Identity provider sign-out failed: {}", e),
            Err(e) => debug!("Identity provider sign-out abandoned: {}", e),
        }
    }
}

//! Identity Provider Client
//!
//! Wraps the third-party session service. The service can hang or vanish on
//! filtered networks, so callers always guard these calls with
//! [`with_timeout`](crate::timeout::with_timeout) and treat any failure as
//! "no provider session".
//!
//! Two variants are selected once at startup: [`LiveProvider`] when the
//! provider is configured, [`DisabledProvider`] otherwise.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Client, StatusCode};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::auth::jwt::peek_claims;
use crate::auth::models::{AuthStateEvent, ProviderSession, ProviderUser};
use crate::config::ProviderConfig;

const EVENT_CAPACITY: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("identity provider unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    #[error("identity provider rejected the session ({0})")]
    Rejected(StatusCode),

    #[error("identity provider returned HTTP {0}")]
    Status(StatusCode),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Current provider session, if it still holds one
    async fn get_session(&self) -> Result<Option<ProviderSession>, ProviderError>;

    /// Adopt a session minted elsewhere (our backend's login)
    async fn set_session(&self, access_token: &str, refresh_token: &str) -> Result<(), ProviderError>;

    async fn sign_out(&self) -> Result<(), ProviderError>;

    /// Session change notifications
    fn subscribe(&self) -> broadcast::Receiver<AuthStateEvent>;

    fn is_enabled(&self) -> bool {
        true
    }
}

/// Pick the provider variant for this configuration
pub fn select_provider(config: &ProviderConfig, request_timeout: Duration) -> Arc<dyn IdentityProvider> {
    match (config.url.as_deref(), config.public_key.as_deref()) {
        (Some(url), Some(key)) if url.starts_with("http") && !key.is_empty() => {
            info!("Identity provider enabled at {}", url);
            Arc::new(LiveProvider::new(url, key, request_timeout))
        }
        _ => {
            info!("Identity provider not configured; using disabled provider");
            Arc::new(DisabledProvider::new())
        }
    }
}

/// GoTrue-style REST provider
pub struct LiveProvider {
    client: Client,
    base_url: String,
    public_key: String,
    session: RwLock<Option<ProviderSession>>,
    events: broadcast::Sender<AuthStateEvent>,
}

impl LiveProvider {
    pub fn new(base_url: &str, public_key: &str, request_timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            public_key: public_key.to_string(),
            session: RwLock::new(None),
            events,
        }
    }

    /// Ask the provider who owns `access_token`
    async fn fetch_user(&self, access_token: &str) -> Result<ProviderUser, ProviderError> {
        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.public_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(response.json::<ProviderUser>().await?),
            status @ (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
                Err(ProviderError::Rejected(status))
            }
            status => Err(ProviderError::Status(status)),
        }
    }

    fn drop_session(&self) {
        let had_session = self.session.write().take().is_some();
        if had_session {
            // No receivers is fine.
            let _ = self.events.send(AuthStateEvent::signed_out());
        }
    }
}

#[async_trait]
impl IdentityProvider for LiveProvider {
    async fn get_session(&self) -> Result<Option<ProviderSession>, ProviderError> {
        let Some(mut session) = self.session.read().clone() else {
            return Ok(None);
        };

        match self.fetch_user(&session.access_token).await {
            Ok(user) => {
                session.user = Some(user);
                *self.session.write() = Some(session.clone());
                Ok(Some(session))
            }
            Err(ProviderError::Rejected(status)) => {
                debug!("Provider no longer recognises the session ({})", status);
                self.drop_session();
                Ok(None)
            }
            Err(e @ ProviderError::Unreachable(_)) => {
                warn!("Provider session check failed: {}", e);
                self.drop_session();
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    async fn set_session(&self, access_token: &str, refresh_token: &str) -> Result<(), ProviderError> {
        let claims = peek_claims(access_token).ok();
        let user = match self.fetch_user(access_token).await {
            Ok(user) => user,
            // Unverified until the next lookup; that one drops it if it is bad.
            Err(ProviderError::Unreachable(e)) => match &claims {
                Some(claims) => {
                    warn!("Provider unreachable, taking session user from token claims: {}", e);
                    claims.user()
                }
                None => return Err(ProviderError::Unreachable(e)),
            },
            Err(e) => return Err(e),
        };
        let expires_at = claims.as_ref().and_then(|claims| claims.expires_at());

        let session = ProviderSession {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
            expires_at,
            user: Some(user),
        };
        *self.session.write() = Some(session.clone());
        let _ = self.events.send(AuthStateEvent::signed_in(session));
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        let Some(session) = self.session.read().clone() else {
            return Ok(());
        };
        self.drop_session();

        let response = self
            .client
            .post(format!("{}/auth/v1/logout", self.base_url))
            .header("apikey", &self.public_key)
            .bearer_auth(&session.access_token)
            .send()
            .await?;

        if response.status().is_success() || response.status() == StatusCode::UNAUTHORIZED {
            Ok(())
        } else {
            Err(ProviderError::Status(response.status()))
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthStateEvent> {
        self.events.subscribe()
    }
}

/// Stand-in used when no provider is configured: never holds a session and
/// never emits events.
pub struct DisabledProvider {
    // Kept alive so subscribers wait forever instead of seeing a closed channel.
    events: broadcast::Sender<AuthStateEvent>,
}

impl DisabledProvider {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(1);
        Self { events }
    }
}

impl Default for DisabledProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for DisabledProvider {
    async fn get_session(&self) -> Result<Option<ProviderSession>, ProviderError> {
        Ok(None)
    }

    async fn set_session(&self, _access_token: &str, _refresh_token: &str) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthStateEvent> {
        self.events.subscribe()
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

//! Session Resolver
//!
//! Produces the best available bearer token: the identity provider's session
//! if it answers in time, else the stored credential, else nothing.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::auth::credentials::CredentialStore;
use crate::auth::models::ProviderSession;
use crate::auth::provider::IdentityProvider;
use crate::timeout::with_timeout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Provider,
    StoredCredential,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedToken {
    pub token: String,
    pub source: TokenSource,
    /// Present when the provider answered with a session
    pub session: Option<ProviderSession>,
}

pub struct SessionResolver {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn CredentialStore>,
    lookup_timeout: Duration,
}

impl SessionResolver {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn CredentialStore>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            store,
            lookup_timeout,
        }
    }

    pub fn provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.provider
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn lookup_timeout(&self) -> Duration {
        self.lookup_timeout
    }

    /// Resolve the token for the next backend call. `None` means the call
    /// goes out unauthenticated.
    pub async fn resolve(&self) -> Option<ResolvedToken> {
        match with_timeout(self.provider.get_session(), self.lookup_timeout).await {
            Ok(Ok(Some(session))) if !session.access_token.is_empty() => {
                debug!("Bearer token resolved from identity provider");
                return Some(ResolvedToken {
                    token: session.access_token.clone(),
                    source: TokenSource::Provider,
                    session: Some(session),
                });
            }
            Ok(Ok(_)) => debug!("Identity provider holds no session"),
            Ok(Err(e)) => debug!("Identity provider lookup failed: {}", e),
            Err(e) => debug!("Identity provider lookup abandoned: {}", e),
        }

        self.store.load().map(|token| {
            debug!("Bearer token resolved from stored credential");
            ResolvedToken {
                token,
                source: TokenSource::StoredCredential,
                session: None,
            }
        })
    }

    /// Just the token
    pub async fn bearer_token(&self) -> Option<String> {
        self.resolve().await.map(|resolved| resolved.token)
    }
}

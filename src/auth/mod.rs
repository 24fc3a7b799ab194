//! # Authentication Module
//!
//! Credential persistence, identity provider access, bearer token
//! resolution and the session manager built on top of them.

pub mod credentials;
pub mod jwt;
pub mod models;
pub mod provider;
pub mod resolver;
pub mod session;
pub mod state;

pub use credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore, StoreError};
pub use models::{AuthStateEvent, Gender, Profile, ProviderSession, ProviderUser, RegisterRequest, Role};
pub use provider::{DisabledProvider, IdentityProvider, LiveProvider, ProviderError, select_provider};
pub use resolver::{ResolvedToken, SessionResolver, TokenSource};
pub use session::{Access, AuthFailure, NETWORK_ERROR_MESSAGE, SessionManager};
pub use state::{AuthSnapshot, AuthState};

//! Configuration module for environment variables and client settings

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_CREDENTIAL_PATH: &str = ".exam_connect/credentials.json";

#[derive(Debug, Clone)]
pub struct Config {
    /// Backend API configuration
    pub api: ApiConfig,

    /// Identity provider configuration; absent values disable the provider
    pub provider: ProviderConfig,

    /// Session resolution configuration
    pub session: SessionConfig,

    /// Where the bearer token is persisted
    pub credential_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: Url,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    pub url: Option<String>,
    pub public_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a provider session lookup may take before falling back
    pub lookup_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            lookup_timeout: Duration::from_millis(3000),
        }
    }
}

impl ApiConfig {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            request_timeout: Duration::from_secs(15),
        })
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env`, if present)
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let api_url = env::var("EXAM_CONNECT_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        Ok(Self {
            api: ApiConfig {
                base_url: parse_base_url(&api_url)?,
                request_timeout: Duration::from_secs(
                    env::var("REQUEST_TIMEOUT_SECS")
                        .unwrap_or_else(|_| "15".to_string())
                        .parse()
                        .unwrap_or(15),
                ),
            },

            provider: ProviderConfig {
                url: non_empty_var("IDENTITY_PROVIDER_URL"),
                public_key: non_empty_var("IDENTITY_PROVIDER_KEY"),
            },

            session: SessionConfig {
                lookup_timeout: Duration::from_millis(
                    env::var("SESSION_LOOKUP_TIMEOUT_MS")
                        .unwrap_or_else(|_| "3000".to_string())
                        .parse()
                        .unwrap_or(3000),
                ),
            },

            credential_path: env::var("CREDENTIAL_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CREDENTIAL_PATH)),
        })
    }

    /// Configuration for a backend at `base_url` with every other knob at
    /// its default and the identity provider disabled
    pub fn for_backend(base_url: &str) -> Result<Self> {
        Ok(Self {
            api: ApiConfig::new(base_url)?,
            provider: ProviderConfig::default(),
            session: SessionConfig::default(),
            credential_path: PathBuf::from(DEFAULT_CREDENTIAL_PATH),
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("Invalid backend URL: {}", raw))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        anyhow::bail!("Invalid backend URL scheme, expected http or https");
    }
    Ok(url)
}

//! # ExamConnect CLI
//!
//! Command-line front end for the ExamConnect client library.
//!
//! ## Commands
//! - `login <email> [password]`: sign in and persist the credential
//!   (password falls back to `EXAM_CONNECT_PASSWORD`)
//! - `logout`: forget the stored credential
//! - `whoami`: print the restored profile
//! - `dashboard`: print the dashboard for the signed-in role
//!
//! ## Environment Setup
//! Configuration is read from the environment or a `.env` file:
//! ```bash
//! EXAM_CONNECT_API_URL=http://localhost:8000
//! IDENTITY_PROVIDER_URL=https://your-project.example.co
//! IDENTITY_PROVIDER_KEY=public-anon-key
//! ```

use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use exam_connect::api::TracingNavigator;
use exam_connect::auth::{Role, SessionManager};
use exam_connect::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact(),
        )
        .init();

    tracing::debug!("{} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let config = Config::from_env().context("Failed to load configuration")?;
    let manager = Arc::new(SessionManager::from_config(&config, Arc::new(TracingNavigator))?);
    let _listener = manager.spawn_event_listener();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("login") => {
            let email = args.get(1).ok_or_else(|| anyhow!("usage: login <email> [password]"))?;
            let password = match args.get(2) {
                Some(password) => password.clone(),
                None => std::env::var("EXAM_CONNECT_PASSWORD")
                    .context("Pass the password as an argument or set EXAM_CONNECT_PASSWORD")?,
            };
            manager.login(email, &password).await?;
            print_json(&manager.get().profile)?;
        }
        Some("logout") => manager.logout().await,
        Some("whoami") => {
            manager.bootstrap().await;
            match manager.get().profile {
                Some(profile) => print_json(&profile)?,
                None => bail!("Not logged in"),
            }
        }
        Some("dashboard") => {
            manager.bootstrap().await;
            let Some(profile) = manager.get().profile else {
                bail!("Not logged in");
            };
            let api = manager.api();
            match profile.role {
                Role::Admin => print_json(&api.admin().dashboard().await?)?,
                Role::Teacher => print_json(&api.teacher().dashboard().await?)?,
                Role::Student => print_json(&api.student().dashboard().await?)?,
            }
        }
        _ => bail!("usage: exam-connect <login|logout|whoami|dashboard>"),
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

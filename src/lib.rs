//! # ExamConnect Client
//!
//! Client library for the ExamConnect exam-management backend.
//!
//! ## Features
//! - Session bootstrap that survives an unreachable identity provider
//! - Durable bearer credential with the backend's 401 as the only expiry signal
//! - Request signing and one-shot session teardown on authorization failure
//! - Typed access to the admin, teacher and student endpoints
//!
//! ## Architecture
//! - `config`: Environment variable configuration
//! - `timeout`: The timeout combinator every provider call goes through
//! - `auth`: Credential store, identity provider, token resolver, session manager
//! - `api`: Backend client and the role-scoped endpoint wrappers
//!
//! ## Usage
//! ```no_run
//! use std::sync::Arc;
//! use exam_connect::{api::TracingNavigator, auth::SessionManager, config::Config};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let manager = Arc::new(SessionManager::from_config(&config, Arc::new(TracingNavigator))?);
//! manager.spawn_event_listener();
//! manager.bootstrap().await;
//!
//! if manager.get().is_authenticated() {
//!     let exams = manager.api().student().list_exams().await?;
//!     println!("{} exams", exams.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod timeout;

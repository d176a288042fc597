//! Local identity and session layer for a single-device application.
//!
//! Registers users, verifies credentials, issues and validates time-bounded
//! sessions, and records login activity for abuse detection. Collaborating
//! subsystems (recognition, visit tracking, presentation, sharing) talk only
//! to [`AuthService`] and receive a [`UserContext`] after validation.
//!
//! ```no_run
//! use monument_auth::{AuthConfig, AuthService};
//!
//! # fn main() -> anyhow::Result<()> {
//! let auth = AuthService::open("monument_users.db", AuthConfig::from_env())?;
//!
//! auth.register("alice", "alice@example.com", "Str0ng!Pass")?;
//! let session = auth.login("alice", "Str0ng!Pass")?;
//! let context = auth.validate_session(&session.token)?;
//! println!("hello, {}", context.username);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod db;
pub mod error;

pub use auth::password::PasswordHasher;
pub use auth::service::{AuthService, Session, UserAccount, UserContext};
pub use config::AuthConfig;
pub use error::AuthError;

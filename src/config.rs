use crate::auth::password;
use chrono::Duration;
use std::str::FromStr;

/// Policy knobs of the auth layer. The lockout numbers are deliberately
/// configuration, not constants: the defaults (5 failures / 15 minutes) are
/// a reasonable starting point, not a contract.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub max_failed_attempts: i64,
    pub lockout_window_minutes: i64,
    pub session_ttl_days: i64,
    /// Hard cap on total session lifetime from `issued_at`, regardless of
    /// sliding extensions.
    pub session_max_lifetime_days: i64,
    pub sliding_expiration: bool,
    pub password_iterations: u32,
    pub reset_token_ttl_minutes: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            max_failed_attempts: 5,
            lockout_window_minutes: 15,
            session_ttl_days: 30,
            session_max_lifetime_days: 90,
            sliding_expiration: true,
            password_iterations: password::DEFAULT_ITERATIONS,
            reset_token_ttl_minutes: 60,
        }
    }
}

impl AuthConfig {
    /// Loads the configuration from environment variables, falling back to
    /// the defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            max_failed_attempts: env_or("AUTH_MAX_FAILED_ATTEMPTS", defaults.max_failed_attempts),
            lockout_window_minutes: env_or(
                "AUTH_LOCKOUT_WINDOW_MINUTES",
                defaults.lockout_window_minutes,
            ),
            session_ttl_days: env_or("AUTH_SESSION_TTL_DAYS", defaults.session_ttl_days),
            session_max_lifetime_days: env_or(
                "AUTH_SESSION_MAX_LIFETIME_DAYS",
                defaults.session_max_lifetime_days,
            ),
            sliding_expiration: env_or("AUTH_SLIDING_EXPIRATION", defaults.sliding_expiration),
            password_iterations: env_or("AUTH_PASSWORD_ITERATIONS", defaults.password_iterations),
            reset_token_ttl_minutes: env_or(
                "AUTH_RESET_TOKEN_TTL_MINUTES",
                defaults.reset_token_ttl_minutes,
            ),
        };

        tracing::debug!(
            max_failed_attempts = config.max_failed_attempts,
            lockout_window_minutes = config.lockout_window_minutes,
            session_ttl_days = config.session_ttl_days,
            sliding = config.sliding_expiration,
            "auth configuration loaded"
        );

        config
    }

    pub fn lockout_window(&self) -> Duration {
        Duration::minutes(self.lockout_window_minutes)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::days(self.session_ttl_days)
    }

    pub fn session_max_lifetime(&self) -> Duration {
        Duration::days(self.session_max_lifetime_days)
    }

    pub fn reset_token_ttl(&self) -> Duration {
        Duration::minutes(self.reset_token_ttl_minutes)
    }
}

fn env_or<T: FromStr>(key: &str, fallback: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(fallback)
}

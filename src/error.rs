use crate::db::error::RepositoryError;

/// Public error taxonomy of the auth layer.
///
/// Credential failures are deliberately generic: callers get a structured
/// code, never a hint whether the identifier exists or which part of the
/// credential was wrong. Storage detail is logged internally and mapped to
/// `Unavailable` before it crosses this boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid {field}")]
    Validation {
        field: &'static str,
        code: &'static str,
    },
    #[error("Password does not meet the strength requirements")]
    WeakPassword { failed_rules: Vec<&'static str> },
    #[error("Username already taken")]
    UsernameTaken,
    #[error("Email already registered")]
    EmailTaken,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Too many failed attempts, try again later")]
    AccountLocked,
    #[error("Session expired")]
    ExpiredSession,
    #[error("Session revoked")]
    RevokedSession,
    #[error("Invalid session")]
    InvalidSession,
    #[error("Invalid or expired reset token")]
    InvalidResetToken,
    #[error("User not found")]
    UserNotFound,
    #[error("Storage temporarily unavailable")]
    Unavailable,
}

impl AuthError {
    /// Stable machine-readable code for the caller's own UI phrasing.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Validation { .. } => "VALIDATION_ERROR",
            AuthError::WeakPassword { .. } => "WEAK_PASSWORD",
            AuthError::UsernameTaken => "USERNAME_TAKEN",
            AuthError::EmailTaken => "EMAIL_TAKEN",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::AccountLocked => "ACCOUNT_LOCKED",
            AuthError::ExpiredSession => "SESSION_EXPIRED",
            AuthError::RevokedSession => "SESSION_REVOKED",
            AuthError::InvalidSession => "SESSION_INVALID",
            AuthError::InvalidResetToken => "RESET_TOKEN_INVALID",
            AuthError::UserNotFound => "USER_NOT_FOUND",
            AuthError::Unavailable => "UNAVAILABLE",
        }
    }

    /// Only storage failures are worth retrying; policy and validation
    /// failures are terminal for the call.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::Unavailable)
    }
}

impl From<RepositoryError> for AuthError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::UniqueViolation(msg) => {
                // SQLite names the column: "UNIQUE constraint failed: users.username"
                if msg.contains("username") {
                    AuthError::UsernameTaken
                } else if msg.contains("email") {
                    AuthError::EmailTaken
                } else {
                    tracing::error!(detail = %msg, "unexpected unique violation");
                    AuthError::Unavailable
                }
            }
            RepositoryError::NotFound(_) => AuthError::UserNotFound,
            RepositoryError::PoolError(msg)
            | RepositoryError::ForeignKeyViolation(msg)
            | RepositoryError::DatabaseError(msg) => {
                tracing::error!(detail = %msg, "storage error");
                AuthError::Unavailable
            }
        }
    }
}

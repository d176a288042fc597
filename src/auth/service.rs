use crate::auth::password::PasswordHasher;
use crate::auth::{token, validation};
use crate::config::AuthConfig;
use crate::db::DbPool;
use crate::db::models::login_attempt::AttemptOutcome;
use crate::db::models::password_reset::NewPasswordReset;
use crate::db::models::session::{NewSession, Session as SessionRecord};
use crate::db::models::user::{NewUser, User};
use crate::db::repositories::login_attempt_repository::LoginAttemptRepository;
use crate::db::repositories::password_reset_repository::PasswordResetRepository;
use crate::db::repositories::session_repository::SessionRepository;
use crate::db::repositories::user_repository::UserRepository;
use crate::error::AuthError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Salt for the hash computed when an identifier does not resolve, so the
/// unknown-identifier path costs the same as a wrong password. Never stored.
const UNKNOWN_IDENTIFIER_SALT: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Public view of a user record. Carries no digest material.
#[derive(Debug, Clone, Serialize)]
pub struct UserAccount {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub disabled: bool,
    pub profile: serde_json::Value,
}

/// Proof of a successful login, bounded in time.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Minimal authenticated identity handed to collaborating subsystems after
/// session validation.
#[derive(Debug, Clone, Serialize)]
pub struct UserContext {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
}

/// Orchestrates registration, login, session validation and logout, and owns
/// the lockout policy. The only component exposed to collaborators; cloning
/// is cheap (repositories share one pool).
#[derive(Clone)]
pub struct AuthService {
    users: UserRepository,
    sessions: SessionRepository,
    attempts: LoginAttemptRepository,
    resets: PasswordResetRepository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(pool: DbPool, config: AuthConfig) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            sessions: SessionRepository::new(pool.clone()),
            attempts: LoginAttemptRepository::new(pool.clone()),
            resets: PasswordResetRepository::new(pool),
            config,
        }
    }

    /// Opens (or creates) the database at `database_path` and builds the
    /// service on top of it.
    pub fn open(database_path: &str, config: AuthConfig) -> anyhow::Result<Self> {
        let pool = crate::db::connection::init_pool(database_path)?;
        Ok(Self::new(pool, config))
    }

    /// Registers a new user. Uniqueness races resolve at the storage
    /// constraint: of two concurrent registrations for the same name,
    /// exactly one succeeds.
    pub fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserAccount, AuthError> {
        if let Some(code) = validation::username_issue(username) {
            return Err(AuthError::Validation {
                field: "username",
                code,
            });
        }
        if let Some(code) = validation::email_issue(email) {
            return Err(AuthError::Validation {
                field: "email",
                code,
            });
        }
        let failed_rules = validation::failed_password_rules(password);
        if !failed_rules.is_empty() {
            return Err(AuthError::WeakPassword { failed_rules });
        }

        let salt = PasswordHasher::generate_salt();
        let iterations = self.config.password_iterations;
        let password_hash = PasswordHasher::hash(password, &salt, iterations);

        let user = self.users.create(&NewUser {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            salt,
            iterations: stored_iterations(iterations),
            created_at: Utc::now().naive_utc(),
            profile: "{}".to_string(),
        })?;

        tracing::info!(username, "user registered");
        account_from(user)
    }

    /// Authenticates an identifier (username or email) and issues a session.
    ///
    /// Gates run in order: lockout check, identifier resolution, credential
    /// verification. A locked identifier is rejected before the stored hash
    /// is ever touched, and unknown identifiers are indistinguishable from
    /// wrong passwords in both response and timing.
    pub fn login(&self, identifier: &str, password: &str) -> Result<Session, AuthError> {
        let failures = self
            .attempts
            .count_recent_failures(identifier, self.config.lockout_window())?;
        if failures >= self.config.max_failed_attempts {
            self.record_attempt(identifier, AttemptOutcome::Locked, None);
            tracing::warn!(identifier, failures, "login rejected: identifier locked out");
            return Err(AuthError::AccountLocked);
        }

        let resolved = self.users.find_by_identifier(identifier)?;
        let user = match resolved {
            Some(user) if !user.disabled => user,
            _ => {
                let _ = PasswordHasher::hash(
                    password,
                    UNKNOWN_IDENTIFIER_SALT,
                    self.config.password_iterations,
                );
                self.record_attempt(identifier, AttemptOutcome::UnknownIdentifier, None);
                return Err(AuthError::InvalidCredentials);
            }
        };
        let user_id = parse_user_id(&user.id)?;

        if !PasswordHasher::verify(
            password,
            &user.salt,
            user.iterations.unsigned_abs(),
            &user.password_hash,
        ) {
            self.record_attempt(identifier, AttemptOutcome::BadCredentials, Some(user_id));
            return Err(AuthError::InvalidCredentials);
        }

        let session = self.issue_session(user_id)?;
        self.record_attempt(identifier, AttemptOutcome::Success, Some(user_id));
        tracing::info!(%user_id, "login succeeded");
        Ok(session)
    }

    /// Resolves a session token to the authenticated identity. With sliding
    /// expiration enabled, validated use pushes the expiry forward, capped
    /// at the hard maximum lifetime from `issued_at`.
    pub fn validate_session(&self, session_token: &str) -> Result<UserContext, AuthError> {
        let record = self
            .sessions
            .find(session_token)?
            .ok_or(AuthError::InvalidSession)?;
        if record.revoked {
            return Err(AuthError::RevokedSession);
        }
        let now = Utc::now().naive_utc();
        if now >= record.expires_at {
            return Err(AuthError::ExpiredSession);
        }

        let user_id = parse_user_id(&record.user_id)?;
        let user = self
            .users
            .find_by_id(user_id)?
            .ok_or(AuthError::InvalidSession)?;
        if user.disabled {
            return Err(AuthError::RevokedSession);
        }

        if self.config.sliding_expiration {
            let cap = record.issued_at + self.config.session_max_lifetime();
            let refreshed = (now + self.config.session_ttl()).min(cap);
            if refreshed > record.expires_at {
                // Validity is already proven; losing the refresh only means
                // the session expires on its old schedule.
                if let Err(err) = self.sessions.extend(session_token, refreshed) {
                    tracing::warn!(error = %err, "failed to extend session");
                }
            }
        }

        Ok(UserContext {
            user_id,
            username: user.username,
            email: user.email,
        })
    }

    /// Revokes a single session.
    pub fn logout(&self, session_token: &str) -> Result<(), AuthError> {
        if !self.sessions.revoke(session_token)? {
            return Err(AuthError::InvalidSession);
        }
        Ok(())
    }

    /// "Sign out everywhere": revokes every session of the user. Returns the
    /// number of sessions revoked.
    pub fn logout_all(&self, user_id: Uuid) -> Result<usize, AuthError> {
        let revoked = self.sessions.revoke_all_for_user(user_id)?;
        tracing::info!(%user_id, revoked, "all sessions revoked");
        Ok(revoked)
    }

    /// Re-verifies the old password, then rotates salt and digest and
    /// revokes every session of the user.
    pub fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let failed_rules = validation::failed_password_rules(new_password);
        if !failed_rules.is_empty() {
            return Err(AuthError::WeakPassword { failed_rules });
        }

        let user = self
            .users
            .find_by_id(user_id)?
            .ok_or(AuthError::UserNotFound)?;
        if !PasswordHasher::verify(
            old_password,
            &user.salt,
            user.iterations.unsigned_abs(),
            &user.password_hash,
        ) {
            return Err(AuthError::InvalidCredentials);
        }

        self.rotate_password(user_id, new_password)?;
        tracing::info!(%user_id, "password changed");
        Ok(())
    }

    /// Merges the given fields into the user's profile object.
    pub fn update_profile(
        &self,
        user_id: Uuid,
        fields: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), AuthError> {
        let user = self
            .users
            .find_by_id(user_id)?
            .ok_or(AuthError::UserNotFound)?;

        let mut profile = profile_from(&user);
        for (key, value) in fields {
            profile.insert(key.clone(), value.clone());
        }

        let profile_json = serde_json::Value::Object(profile).to_string();
        self.users.update_profile(user_id, &profile_json)?;
        Ok(())
    }

    /// Soft-disables the account: existing history stays, all future logins
    /// fail and live sessions are revoked.
    pub fn disable_user(&self, user_id: Uuid) -> Result<(), AuthError> {
        self.users.disable(user_id)?;
        let revoked = self.sessions.revoke_all_for_user(user_id)?;
        tracing::info!(%user_id, revoked, "user disabled");
        Ok(())
    }

    /// Creates a single-use, time-bounded reset request. Returns `None` for
    /// unknown or disabled identifiers so callers can answer uniformly
    /// without leaking which accounts exist. Delivering the token is the
    /// caller's concern.
    pub fn request_password_reset(&self, identifier: &str) -> Result<Option<String>, AuthError> {
        let Some(user) = self.users.find_by_identifier(identifier)? else {
            return Ok(None);
        };
        if user.disabled {
            return Ok(None);
        }
        let user_id = parse_user_id(&user.id)?;

        let now = Utc::now().naive_utc();
        let reset = self.resets.create(&NewPasswordReset {
            token: token::generate_token(),
            user_id: user_id.to_string(),
            created_at: now,
            expires_at: now + self.config.reset_token_ttl(),
        })?;

        tracing::info!(%user_id, "password reset requested");
        Ok(Some(reset.token))
    }

    /// Consumes a reset token and rotates the password. The token is marked
    /// used before the rotation, so it cannot be replayed even if the
    /// rotation fails.
    pub fn reset_password(&self, reset_token: &str, new_password: &str) -> Result<(), AuthError> {
        let failed_rules = validation::failed_password_rules(new_password);
        if !failed_rules.is_empty() {
            return Err(AuthError::WeakPassword { failed_rules });
        }

        let now = Utc::now().naive_utc();
        let reset = self
            .resets
            .find_active(reset_token, now)?
            .ok_or(AuthError::InvalidResetToken)?;
        let user_id = parse_user_id(&reset.user_id)?;

        self.resets.mark_used(reset_token)?;
        self.rotate_password(user_id, new_password)?;
        tracing::info!(%user_id, "password reset completed");
        Ok(())
    }

    /// Removes sessions past their expiry. Idempotent; safe to run from a
    /// periodic maintenance task concurrently with normal traffic.
    pub fn sweep_expired_sessions(&self) -> Result<usize, AuthError> {
        let removed = self.sessions.sweep_expired(Utc::now().naive_utc())?;
        if removed > 0 {
            tracing::info!(removed, "expired sessions swept");
        }
        Ok(removed)
    }

    /// All user accounts, newest first.
    pub fn list_users(&self) -> Result<Vec<UserAccount>, AuthError> {
        self.users.list()?.into_iter().map(account_from).collect()
    }

    fn issue_session(&self, user_id: Uuid) -> Result<Session, AuthError> {
        let now = Utc::now().naive_utc();
        let record = self.sessions.create(&NewSession {
            token: token::generate_token(),
            user_id: user_id.to_string(),
            issued_at: now,
            expires_at: now + self.config.session_ttl(),
        })?;
        session_from(record)
    }

    fn rotate_password(&self, user_id: Uuid, new_password: &str) -> Result<(), AuthError> {
        let salt = PasswordHasher::generate_salt();
        let iterations = self.config.password_iterations;
        let digest = PasswordHasher::hash(new_password, &salt, iterations);

        self.users
            .update_password(user_id, &digest, &salt, stored_iterations(iterations))?;

        let revoked = self.sessions.revoke_all_for_user(user_id)?;
        tracing::debug!(%user_id, revoked, "sessions revoked after password rotation");
        Ok(())
    }

    /// Attempt recording is best-effort: a failed audit write is logged and
    /// must never fail or roll back the surrounding login flow.
    fn record_attempt(&self, identifier: &str, outcome: AttemptOutcome, user_id: Option<Uuid>) {
        if let Err(err) = self.attempts.record(identifier, outcome, user_id) {
            tracing::warn!(
                error = %err,
                outcome = outcome.as_str(),
                "failed to record login attempt"
            );
        }
    }
}

fn stored_iterations(iterations: u32) -> i32 {
    i32::try_from(iterations).unwrap_or(i32::MAX)
}

fn parse_user_id(raw: &str) -> Result<Uuid, AuthError> {
    Uuid::parse_str(raw).map_err(|err| {
        tracing::error!(error = %err, "corrupt user id in store");
        AuthError::Unavailable
    })
}

fn profile_from(user: &User) -> serde_json::Map<String, serde_json::Value> {
    match serde_json::from_str(&user.profile) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    }
}

fn account_from(user: User) -> Result<UserAccount, AuthError> {
    let user_id = parse_user_id(&user.id)?;
    let profile = serde_json::Value::Object(profile_from(&user));
    Ok(UserAccount {
        user_id,
        username: user.username,
        email: user.email,
        created_at: user.created_at.and_utc(),
        disabled: user.disabled,
        profile,
    })
}

fn session_from(record: SessionRecord) -> Result<Session, AuthError> {
    let user_id = parse_user_id(&record.user_id)?;
    Ok(Session {
        token: record.token,
        user_id,
        issued_at: record.issued_at.and_utc(),
        expires_at: record.expires_at.and_utc(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::test_support::test_pool;
    use chrono::Duration;

    fn service() -> (AuthService, tempfile::TempDir) {
        let (pool, dir) = test_pool();
        // Low iteration count keeps the suite fast; the policy tests do not
        // depend on hash cost.
        let config = AuthConfig {
            password_iterations: 1_000,
            ..AuthConfig::default()
        };
        (AuthService::new(pool, config), dir)
    }

    fn register_alice(auth: &AuthService) -> UserAccount {
        auth.register("alice", "alice@example.com", "Str0ng!Pass")
            .expect("registration should succeed")
    }

    #[test]
    fn register_then_login_round_trip() {
        let (auth, _dir) = service();
        let account = register_alice(&auth);

        let session = auth.login("alice", "Str0ng!Pass").expect("login");
        assert_eq!(session.user_id, account.user_id);

        // Default TTL is 30 days; allow a minute of slack.
        let expected = Utc::now() + Duration::days(30);
        let skew = (session.expires_at - expected).num_seconds().abs();
        assert!(skew < 60, "expiry should be ~30 days out, skew was {skew}s");
    }

    #[test]
    fn login_works_with_email_and_ignores_case() {
        let (auth, _dir) = service();
        register_alice(&auth);

        assert!(auth.login("alice@example.com", "Str0ng!Pass").is_ok());
        assert!(auth.login("ALICE", "Str0ng!Pass").is_ok());
    }

    #[test]
    fn register_rejects_malformed_username_and_email() {
        let (auth, _dir) = service();

        let err = auth
            .register("a!", "alice@example.com", "Str0ng!Pass")
            .expect_err("bad username");
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let err = auth
            .register("alice", "not-an-email", "Str0ng!Pass")
            .expect_err("bad email");
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn register_rejects_weak_password_with_rule_codes() {
        let (auth, _dir) = service();

        match auth.register("alice", "alice@example.com", "password") {
            Err(AuthError::WeakPassword { failed_rules }) => {
                assert!(failed_rules.contains(&"uppercase"));
                assert!(failed_rules.contains(&"digit"));
            }
            other => panic!("expected WeakPassword, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_registration_reports_which_field_conflicts() {
        let (auth, _dir) = service();
        register_alice(&auth);

        let err = auth
            .register("alice", "other@example.com", "Str0ng!Pass")
            .expect_err("duplicate username");
        assert_eq!(err, AuthError::UsernameTaken);

        let err = auth
            .register("bob", "alice@example.com", "Str0ng!Pass")
            .expect_err("duplicate email");
        assert_eq!(err, AuthError::EmailTaken);
    }

    #[test]
    fn concurrent_duplicate_registrations_yield_one_success() {
        let (auth, _dir) = service();

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let auth = auth.clone();
                std::thread::spawn(move || {
                    auth.register("alice", "alice@example.com", "Str0ng!Pass")
                })
            })
            .collect();

        let results: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("thread should not panic"))
            .collect();

        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1, "exactly one registration must win: {results:?}");
        let conflict = results
            .iter()
            .find_map(|r| r.as_ref().err())
            .expect("one conflict");
        assert!(matches!(
            conflict,
            AuthError::UsernameTaken | AuthError::EmailTaken
        ));
    }

    #[test]
    fn wrong_password_is_a_generic_credential_failure() {
        let (auth, _dir) = service();
        register_alice(&auth);

        let err = auth.login("alice", "wrong").expect_err("wrong password");
        assert_eq!(err, AuthError::InvalidCredentials);
    }

    #[test]
    fn unknown_identifier_is_indistinguishable_from_wrong_password() {
        let (auth, _dir) = service();
        register_alice(&auth);

        let unknown = auth.login("mallory", "whatever").expect_err("unknown user");
        let wrong = auth.login("alice", "wrong").expect_err("wrong password");
        assert_eq!(unknown, wrong);
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[test]
    fn sixth_attempt_is_locked_even_with_the_correct_password() {
        let (auth, _dir) = service();
        register_alice(&auth);

        for i in 0..5 {
            let err = auth.login("alice", "wrong").expect_err("bad password");
            assert_eq!(err, AuthError::InvalidCredentials, "attempt {i}");
        }

        let err = auth
            .login("alice", "Str0ng!Pass")
            .expect_err("locked despite correct password");
        assert_eq!(err, AuthError::AccountLocked);
    }

    #[test]
    fn lockout_counts_identifier_case_insensitively() {
        let (auth, _dir) = service();
        register_alice(&auth);

        for _ in 0..5 {
            let _ = auth.login("Alice", "wrong");
        }

        let err = auth.login("alice", "Str0ng!Pass").expect_err("locked");
        assert_eq!(err, AuthError::AccountLocked);
    }

    #[test]
    fn failed_attempts_against_unknown_identifiers_also_lock() {
        let (auth, _dir) = service();

        for _ in 0..5 {
            let _ = auth.login("mallory", "guess");
        }

        let err = auth.login("mallory", "guess").expect_err("locked");
        assert_eq!(err, AuthError::AccountLocked);
    }

    #[test]
    fn validate_session_returns_the_user_context() {
        let (auth, _dir) = service();
        let account = register_alice(&auth);
        let session = auth.login("alice", "Str0ng!Pass").expect("login");

        let context = auth.validate_session(&session.token).expect("validate");
        assert_eq!(context.user_id, account.user_id);
        assert_eq!(context.username, "alice");
        assert_eq!(context.email, "alice@example.com");
    }

    #[test]
    fn validate_session_rejects_unknown_tokens() {
        let (auth, _dir) = service();

        let err = auth.validate_session("no_such_token").expect_err("unknown");
        assert_eq!(err, AuthError::InvalidSession);
    }

    #[test]
    fn expired_session_fails_validation() {
        let (auth, _dir) = service();
        let account = register_alice(&auth);

        // Plant a session that expired a second ago.
        let now = Utc::now().naive_utc();
        let expired = auth
            .sessions
            .create(&NewSession {
                token: token::generate_token(),
                user_id: account.user_id.to_string(),
                issued_at: now - Duration::days(30),
                expires_at: now - Duration::seconds(1),
            })
            .expect("plant session");

        let err = auth.validate_session(&expired.token).expect_err("expired");
        assert_eq!(err, AuthError::ExpiredSession);
    }

    #[test]
    fn session_expiring_in_the_future_still_validates() {
        let (auth, _dir) = service();
        let account = register_alice(&auth);

        let now = Utc::now().naive_utc();
        let nearly_expired = auth
            .sessions
            .create(&NewSession {
                token: token::generate_token(),
                user_id: account.user_id.to_string(),
                issued_at: now,
                expires_at: now + Duration::seconds(30),
            })
            .expect("plant session");

        assert!(auth.validate_session(&nearly_expired.token).is_ok());
    }

    #[test]
    fn sliding_validation_extends_the_expiry() {
        let (auth, _dir) = service();
        let account = register_alice(&auth);

        let now = Utc::now().naive_utc();
        let short = auth
            .sessions
            .create(&NewSession {
                token: token::generate_token(),
                user_id: account.user_id.to_string(),
                issued_at: now,
                expires_at: now + Duration::days(1),
            })
            .expect("plant session");

        auth.validate_session(&short.token).expect("validate");

        let reloaded = auth.sessions.find(&short.token).expect("query").expect("found");
        assert!(
            reloaded.expires_at > short.expires_at + Duration::days(28),
            "expiry should slide to ~30 days out"
        );
    }

    #[test]
    fn sliding_extension_is_capped_at_the_maximum_lifetime() {
        let (auth, _dir) = service();
        let account = register_alice(&auth);

        // Session issued 89 days ago: sliding may only add one more day.
        let now = Utc::now().naive_utc();
        let issued_at = now - Duration::days(89);
        let old = auth
            .sessions
            .create(&NewSession {
                token: token::generate_token(),
                user_id: account.user_id.to_string(),
                issued_at,
                expires_at: now + Duration::hours(1),
            })
            .expect("plant session");

        auth.validate_session(&old.token).expect("validate");

        let reloaded = auth.sessions.find(&old.token).expect("query").expect("found");
        assert_eq!(reloaded.expires_at, reloaded.issued_at + Duration::days(90));
    }

    #[test]
    fn logout_revokes_the_session() {
        let (auth, _dir) = service();
        register_alice(&auth);
        let session = auth.login("alice", "Str0ng!Pass").expect("login");

        auth.logout(&session.token).expect("logout");

        let err = auth.validate_session(&session.token).expect_err("revoked");
        assert_eq!(err, AuthError::RevokedSession);
    }

    #[test]
    fn logout_all_revokes_every_device() {
        let (auth, _dir) = service();
        let account = register_alice(&auth);
        let phone = auth.login("alice", "Str0ng!Pass").expect("login");
        let laptop = auth.login("alice", "Str0ng!Pass").expect("login");

        let revoked = auth.logout_all(account.user_id).expect("logout all");
        assert_eq!(revoked, 2);

        assert_eq!(
            auth.validate_session(&phone.token).expect_err("revoked"),
            AuthError::RevokedSession
        );
        assert_eq!(
            auth.validate_session(&laptop.token).expect_err("revoked"),
            AuthError::RevokedSession
        );
    }

    #[test]
    fn change_password_rotates_credentials_and_revokes_sessions() {
        let (auth, _dir) = service();
        let account = register_alice(&auth);
        let session = auth.login("alice", "Str0ng!Pass").expect("login");

        auth.change_password(account.user_id, "Str0ng!Pass", "N3w!Passw0rd")
            .expect("change password");

        // Previously issued session is gone immediately.
        let err = auth.validate_session(&session.token).expect_err("revoked");
        assert_eq!(err, AuthError::RevokedSession);

        // Old credential no longer works, new one does.
        assert_eq!(
            auth.login("alice", "Str0ng!Pass").expect_err("old password"),
            AuthError::InvalidCredentials
        );
        assert!(auth.login("alice", "N3w!Passw0rd").is_ok());
    }

    #[test]
    fn change_password_requires_the_correct_old_password() {
        let (auth, _dir) = service();
        let account = register_alice(&auth);

        let err = auth
            .change_password(account.user_id, "wrong", "N3w!Passw0rd")
            .expect_err("wrong old password");
        assert_eq!(err, AuthError::InvalidCredentials);
    }

    #[test]
    fn change_password_rejects_weak_replacements() {
        let (auth, _dir) = service();
        let account = register_alice(&auth);

        let err = auth
            .change_password(account.user_id, "Str0ng!Pass", "weak")
            .expect_err("weak replacement");
        assert!(matches!(err, AuthError::WeakPassword { .. }));
    }

    #[test]
    fn disabled_user_cannot_login_and_loses_sessions() {
        let (auth, _dir) = service();
        let account = register_alice(&auth);
        let session = auth.login("alice", "Str0ng!Pass").expect("login");

        auth.disable_user(account.user_id).expect("disable");

        assert_eq!(
            auth.login("alice", "Str0ng!Pass").expect_err("disabled"),
            AuthError::InvalidCredentials
        );
        assert_eq!(
            auth.validate_session(&session.token).expect_err("revoked"),
            AuthError::RevokedSession
        );
    }

    #[test]
    fn update_profile_merges_fields() {
        let (auth, _dir) = service();
        let account = register_alice(&auth);

        let mut first = serde_json::Map::new();
        first.insert("full_name".to_string(), serde_json::json!("Alice Smith"));
        auth.update_profile(account.user_id, &first).expect("update");

        let mut second = serde_json::Map::new();
        second.insert("favorite_monument".to_string(), serde_json::json!("Colosseum"));
        auth.update_profile(account.user_id, &second).expect("update");

        let users = auth.list_users().expect("list");
        let alice = users.iter().find(|u| u.username == "alice").expect("alice");
        assert_eq!(alice.profile["full_name"], "Alice Smith");
        assert_eq!(alice.profile["favorite_monument"], "Colosseum");
    }

    #[test]
    fn password_reset_round_trip() {
        let (auth, _dir) = service();
        register_alice(&auth);

        let reset_token = auth
            .request_password_reset("alice")
            .expect("request")
            .expect("known identifier");

        auth.reset_password(&reset_token, "N3w!Passw0rd").expect("reset");
        assert!(auth.login("alice", "N3w!Passw0rd").is_ok());

        // Single-use: the same token cannot be replayed.
        let err = auth
            .reset_password(&reset_token, "An0ther!Pass")
            .expect_err("replay");
        assert_eq!(err, AuthError::InvalidResetToken);
    }

    #[test]
    fn reset_request_for_unknown_identifier_yields_none() {
        let (auth, _dir) = service();

        let token = auth.request_password_reset("mallory").expect("request");
        assert!(token.is_none());
    }

    #[test]
    fn sweep_removes_only_expired_sessions() {
        let (auth, _dir) = service();
        let account = register_alice(&auth);
        let live = auth.login("alice", "Str0ng!Pass").expect("login");

        let now = Utc::now().naive_utc();
        auth.sessions
            .create(&NewSession {
                token: token::generate_token(),
                user_id: account.user_id.to_string(),
                issued_at: now - Duration::days(60),
                expires_at: now - Duration::days(30),
            })
            .expect("plant expired session");

        assert_eq!(auth.sweep_expired_sessions().expect("sweep"), 1);
        assert!(auth.validate_session(&live.token).is_ok());
    }

    #[test]
    fn full_scenario_from_registration_to_lockout() {
        let (auth, _dir) = service();

        auth.register("alice", "alice@example.com", "Str0ng!Pass")
            .expect("register");
        let session = auth.login("alice", "Str0ng!Pass").expect("login");
        let expected = Utc::now() + Duration::days(30);
        assert!((session.expires_at - expected).num_seconds().abs() < 60);

        for _ in 0..5 {
            assert_eq!(
                auth.login("alice", "wrong").expect_err("wrong password"),
                AuthError::InvalidCredentials
            );
        }

        assert_eq!(
            auth.login("alice", "Str0ng!Pass").expect_err("locked"),
            AuthError::AccountLocked
        );
    }
}

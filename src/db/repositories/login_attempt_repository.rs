use crate::db::error::RepositoryError;
use crate::db::models::login_attempt::{AttemptOutcome, LoginAttempt, NewLoginAttempt};
use crate::db::schema::login_attempts;
use crate::db::{DbConnection, DbPool};
use chrono::{Duration, Utc};
use diesel::prelude::*;
use uuid::Uuid;

/// Append-only audit log of authentication attempts. Sole writer of the
/// `login_attempts` table; rows are never updated or deleted here.
#[derive(Clone)]
pub struct LoginAttemptRepository {
    pool: DbPool,
}

impl LoginAttemptRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<DbConnection, RepositoryError> {
        self.pool.get().map_err(Into::into)
    }

    pub fn record(
        &self,
        identifier: &str,
        outcome: AttemptOutcome,
        user_id: Option<Uuid>,
    ) -> Result<LoginAttempt, RepositoryError> {
        let mut conn = self.conn()?;

        let new_attempt = NewLoginAttempt {
            identifier: identifier.to_string(),
            user_id: user_id.map(|id| id.to_string()),
            outcome: outcome.as_str().to_string(),
            attempted_at: Utc::now().naive_utc(),
        };

        diesel::insert_into(login_attempts::table)
            .values(new_attempt)
            .get_result::<LoginAttempt>(&mut conn)
            .map_err(Into::into)
    }

    /// Counts non-success outcomes for an identifier inside the sliding
    /// window. Identifier matching is case-insensitive (NOCASE column), so
    /// changing the case of a username does not reset the lockout counter.
    pub fn count_recent_failures(
        &self,
        identifier: &str,
        window: Duration,
    ) -> Result<i64, RepositoryError> {
        let mut conn = self.conn()?;
        let since = Utc::now().naive_utc() - window;

        login_attempts::table
            .filter(login_attempts::identifier.eq(identifier))
            .filter(login_attempts::outcome.ne(AttemptOutcome::Success.as_str()))
            .filter(login_attempts::attempted_at.gt(since))
            .count()
            .get_result::<i64>(&mut conn)
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::test_support::test_pool;

    #[test]
    fn record_preserves_outcome_and_identifier() {
        let (pool, _dir) = test_pool();
        let repo = LoginAttemptRepository::new(pool);

        let attempt = repo
            .record("alice", AttemptOutcome::BadCredentials, None)
            .expect("record");

        assert_eq!(attempt.identifier, "alice");
        assert_eq!(attempt.outcome, "bad_credentials");
        assert!(attempt.user_id.is_none());
    }

    #[test]
    fn successes_do_not_count_as_failures() {
        let (pool, _dir) = test_pool();
        let repo = LoginAttemptRepository::new(pool);

        repo.record("alice", AttemptOutcome::Success, None).expect("record");
        repo.record("alice", AttemptOutcome::BadCredentials, None).expect("record");
        repo.record("alice", AttemptOutcome::UnknownIdentifier, None).expect("record");
        repo.record("alice", AttemptOutcome::Locked, None).expect("record");

        let failures = repo
            .count_recent_failures("alice", Duration::minutes(15))
            .expect("count");
        assert_eq!(failures, 3);
    }

    #[test]
    fn count_is_scoped_to_the_identifier() {
        let (pool, _dir) = test_pool();
        let repo = LoginAttemptRepository::new(pool);

        repo.record("alice", AttemptOutcome::BadCredentials, None).expect("record");
        repo.record("bob", AttemptOutcome::BadCredentials, None).expect("record");

        assert_eq!(
            repo.count_recent_failures("alice", Duration::minutes(15)).expect("count"),
            1
        );
    }

    #[test]
    fn count_matches_identifier_case_insensitively() {
        let (pool, _dir) = test_pool();
        let repo = LoginAttemptRepository::new(pool);

        repo.record("Alice", AttemptOutcome::BadCredentials, None).expect("record");
        repo.record("ALICE", AttemptOutcome::BadCredentials, None).expect("record");

        assert_eq!(
            repo.count_recent_failures("alice", Duration::minutes(15)).expect("count"),
            2
        );
    }

    #[test]
    fn attempts_outside_the_window_are_ignored() {
        let (pool, _dir) = test_pool();
        let repo = LoginAttemptRepository::new(pool.clone());

        repo.record("alice", AttemptOutcome::BadCredentials, None).expect("record");

        // Age the attempt past the window directly in the store.
        let mut conn = pool.get().expect("connection");
        let old = (Utc::now() - Duration::minutes(30)).naive_utc();
        diesel::update(login_attempts::table)
            .set(login_attempts::attempted_at.eq(old))
            .execute(&mut conn)
            .expect("age attempt");

        assert_eq!(
            repo.count_recent_failures("alice", Duration::minutes(15)).expect("count"),
            0
        );
    }
}

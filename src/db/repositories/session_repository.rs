use crate::db::error::RepositoryError;
use crate::db::models::session::{NewSession, Session};
use crate::db::schema::sessions;
use crate::db::{DbConnection, DbPool};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use uuid::Uuid;

/// Durable store of issued session tokens. Sole writer of the `sessions`
/// table.
#[derive(Clone)]
pub struct SessionRepository {
    pool: DbPool,
}

impl SessionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<DbConnection, RepositoryError> {
        self.pool.get().map_err(Into::into)
    }

    pub fn create(&self, new_session: &NewSession) -> Result<Session, RepositoryError> {
        let mut conn = self.conn()?;

        diesel::insert_into(sessions::table)
            .values(new_session)
            .get_result::<Session>(&mut conn)
            .map_err(Into::into)
    }

    pub fn find(&self, token: &str) -> Result<Option<Session>, RepositoryError> {
        let mut conn = self.conn()?;

        sessions::table
            .filter(sessions::token.eq(token))
            .first::<Session>(&mut conn)
            .optional()
            .map_err(Into::into)
    }

    /// Moves the expiry forward. `issued_at` is immutable, so the caller can
    /// always cap the new expiry at the hard maximum lifetime.
    pub fn extend(&self, token: &str, new_expires_at: NaiveDateTime) -> Result<(), RepositoryError> {
        let mut conn = self.conn()?;

        let affected = diesel::update(sessions::table.filter(sessions::token.eq(token)))
            .set(sessions::expires_at.eq(new_expires_at))
            .execute(&mut conn)?;

        if affected == 0 {
            return Err(RepositoryError::NotFound("Session".to_string()));
        }
        Ok(())
    }

    /// Returns `true` if a session was revoked, `false` if the token was
    /// unknown.
    pub fn revoke(&self, token: &str) -> Result<bool, RepositoryError> {
        let mut conn = self.conn()?;

        let affected = diesel::update(sessions::table.filter(sessions::token.eq(token)))
            .set(sessions::revoked.eq(true))
            .execute(&mut conn)?;

        Ok(affected > 0)
    }

    /// Revokes every session of a user. Invoked on password change and on
    /// explicit "sign out everywhere".
    pub fn revoke_all_for_user(&self, user_id: Uuid) -> Result<usize, RepositoryError> {
        let mut conn = self.conn()?;

        diesel::update(
            sessions::table
                .filter(sessions::user_id.eq(user_id.to_string()))
                .filter(sessions::revoked.eq(false)),
        )
        .set(sessions::revoked.eq(true))
        .execute(&mut conn)
        .map_err(Into::into)
    }

    /// Deletes rows past their expiry. A plain filtered DELETE, so it runs
    /// concurrently with reads and writes to live sessions.
    pub fn sweep_expired(&self, now: NaiveDateTime) -> Result<usize, RepositoryError> {
        let mut conn = self.conn()?;

        diesel::delete(sessions::table.filter(sessions::expires_at.lt(now)))
            .execute(&mut conn)
            .map_err(Into::into)
    }
}

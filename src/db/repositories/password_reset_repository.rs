use crate::db::error::RepositoryError;
use crate::db::models::password_reset::{NewPasswordReset, PasswordReset};
use crate::db::schema::password_resets;
use crate::db::{DbConnection, DbPool};
use chrono::NaiveDateTime;
use diesel::prelude::*;

/// Storage for single-use, time-bounded password reset tokens.
#[derive(Clone)]
pub struct PasswordResetRepository {
    pool: DbPool,
}

impl PasswordResetRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<DbConnection, RepositoryError> {
        self.pool.get().map_err(Into::into)
    }

    pub fn create(&self, new_reset: &NewPasswordReset) -> Result<PasswordReset, RepositoryError> {
        let mut conn = self.conn()?;

        diesel::insert_into(password_resets::table)
            .values(new_reset)
            .get_result::<PasswordReset>(&mut conn)
            .map_err(Into::into)
    }

    /// Returns the request only while it is unused and unexpired.
    pub fn find_active(
        &self,
        token: &str,
        now: NaiveDateTime,
    ) -> Result<Option<PasswordReset>, RepositoryError> {
        let mut conn = self.conn()?;

        password_resets::table
            .filter(password_resets::token.eq(token))
            .filter(password_resets::used.eq(false))
            .filter(password_resets::expires_at.gt(now))
            .first::<PasswordReset>(&mut conn)
            .optional()
            .map_err(Into::into)
    }

    pub fn mark_used(&self, token: &str) -> Result<(), RepositoryError> {
        let mut conn = self.conn()?;

        let affected = diesel::update(password_resets::table.filter(password_resets::token.eq(token)))
            .set(password_resets::used.eq(true))
            .execute(&mut conn)?;

        if affected == 0 {
            return Err(RepositoryError::NotFound("Password reset".to_string()));
        }
        Ok(())
    }
}

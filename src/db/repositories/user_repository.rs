use crate::db::error::RepositoryError;
use crate::db::models::user::{NewUser, User};
use crate::db::schema::users;
use crate::db::{DbConnection, DbPool};
use diesel::prelude::*;
use uuid::Uuid;

/// Durable store of user records. Sole writer of the `users` table.
#[derive(Clone)]
pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<DbConnection, RepositoryError> {
        self.pool.get().map_err(Into::into)
    }

    /// Inserts a new user. Uniqueness of username/email is enforced by the
    /// database constraints, so concurrent duplicate registrations surface
    /// here as `UniqueViolation` rather than racing a pre-check.
    pub fn create(&self, new_user: &NewUser) -> Result<User, RepositoryError> {
        let mut conn = self.conn()?;

        diesel::insert_into(users::table)
            .values(new_user)
            .get_result::<User>(&mut conn)
            .map_err(Into::into)
    }

    /// Looks up a user by username or email. Matching is case-insensitive
    /// through the `NOCASE` collation on both columns.
    pub fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>, RepositoryError> {
        let mut conn = self.conn()?;

        users::table
            .filter(users::username.eq(identifier).or(users::email.eq(identifier)))
            .first::<User>(&mut conn)
            .optional()
            .map_err(Into::into)
    }

    pub fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        let mut conn = self.conn()?;

        users::table
            .filter(users::id.eq(id.to_string()))
            .first::<User>(&mut conn)
            .optional()
            .map_err(Into::into)
    }

    /// Replaces the full digest material in one write. The caller is
    /// responsible for revoking the user's sessions afterwards.
    pub fn update_password(
        &self,
        id: Uuid,
        new_hash: &str,
        new_salt: &str,
        new_iterations: i32,
    ) -> Result<(), RepositoryError> {
        let mut conn = self.conn()?;

        let affected = diesel::update(users::table.filter(users::id.eq(id.to_string())))
            .set((
                users::password_hash.eq(new_hash),
                users::salt.eq(new_salt),
                users::iterations.eq(new_iterations),
            ))
            .execute(&mut conn)?;

        if affected == 0 {
            return Err(RepositoryError::NotFound(format!("User {id}")));
        }
        Ok(())
    }

    pub fn update_profile(&self, id: Uuid, profile_json: &str) -> Result<(), RepositoryError> {
        let mut conn = self.conn()?;

        let affected = diesel::update(users::table.filter(users::id.eq(id.to_string())))
            .set(users::profile.eq(profile_json))
            .execute(&mut conn)?;

        if affected == 0 {
            return Err(RepositoryError::NotFound(format!("User {id}")));
        }
        Ok(())
    }

    /// Soft-disable: the row stays for referential integrity with visit and
    /// social history, but all subsequent logins fail.
    pub fn disable(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut conn = self.conn()?;

        let affected = diesel::update(users::table.filter(users::id.eq(id.to_string())))
            .set(users::disabled.eq(true))
            .execute(&mut conn)?;

        if affected == 0 {
            return Err(RepositoryError::NotFound(format!("User {id}")));
        }
        Ok(())
    }

    pub fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let mut conn = self.conn()?;

        users::table
            .order_by(users::created_at.desc())
            .load::<User>(&mut conn)
            .map_err(Into::into)
    }
}

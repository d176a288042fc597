use crate::db::schema::users;
use chrono::NaiveDateTime;
use diesel::{Insertable, Queryable, Selectable};

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub salt: String,
    pub iterations: i32,
    pub created_at: NaiveDateTime,
    pub profile: String,
}

/// Full user row, including digest material. Never leaves the crate: the
/// service maps it to `UserAccount`/`UserContext` before returning.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub salt: String,
    pub iterations: i32,
    pub created_at: NaiveDateTime,
    pub disabled: bool,
    pub profile: String,
}

use crate::db::schema::password_resets;
use chrono::NaiveDateTime;
use diesel::{Insertable, Queryable, Selectable};

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = password_resets)]
pub struct NewPasswordReset {
    pub token: String,
    pub user_id: String,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = password_resets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PasswordReset {
    pub token: String,
    pub user_id: String,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
    pub used: bool,
}

use crate::db::schema::login_attempts;
use chrono::NaiveDateTime;
use diesel::{Insertable, Queryable, Selectable};

/// Outcome of a single authentication attempt, stored as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    BadCredentials,
    UnknownIdentifier,
    Locked,
}

impl AttemptOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            AttemptOutcome::Success => "success",
            AttemptOutcome::BadCredentials => "bad_credentials",
            AttemptOutcome::UnknownIdentifier => "unknown_identifier",
            AttemptOutcome::Locked => "locked",
        }
    }

    pub fn is_failure(self) -> bool {
        !matches!(self, AttemptOutcome::Success)
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = login_attempts)]
pub struct NewLoginAttempt {
    pub identifier: String,
    pub user_id: Option<String>,
    pub outcome: String,
    pub attempted_at: NaiveDateTime,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = login_attempts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LoginAttempt {
    pub id: i64,
    pub identifier: String,
    pub user_id: Option<String>,
    pub outcome: String,
    pub attempted_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::AttemptOutcome;

    #[test]
    fn only_success_counts_as_non_failure() {
        assert!(!AttemptOutcome::Success.is_failure());
        assert!(AttemptOutcome::BadCredentials.is_failure());
        assert!(AttemptOutcome::UnknownIdentifier.is_failure());
        assert!(AttemptOutcome::Locked.is_failure());
    }
}

pub mod login_attempt;
pub mod password_reset;
pub mod session;
pub mod user;

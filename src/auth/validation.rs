//! Declarative input validation: each rule is a named predicate with a
//! stable error code, so policy changes are data edits rather than new
//! control flow.

use regex::Regex;
use std::sync::LazyLock;

// Username: 3-20 characters, letters, digits and underscore only.
static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{3,20}$").expect("valid username pattern"));

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email pattern")
});

pub struct PasswordRule {
    pub code: &'static str,
    pub description: &'static str,
    check: fn(&str) -> bool,
}

pub const PASSWORD_RULES: &[PasswordRule] = &[
    PasswordRule {
        code: "min_length",
        description: "at least 8 characters",
        check: has_min_length,
    },
    PasswordRule {
        code: "uppercase",
        description: "at least one uppercase letter",
        check: has_uppercase,
    },
    PasswordRule {
        code: "lowercase",
        description: "at least one lowercase letter",
        check: has_lowercase,
    },
    PasswordRule {
        code: "digit",
        description: "at least one digit",
        check: has_digit,
    },
    PasswordRule {
        code: "symbol",
        description: "at least one symbol",
        check: has_symbol,
    },
];

/// Codes of every rule the password fails; empty means acceptable.
pub fn failed_password_rules(password: &str) -> Vec<&'static str> {
    PASSWORD_RULES
        .iter()
        .filter(|rule| !(rule.check)(password))
        .map(|rule| rule.code)
        .collect()
}

/// `None` when the username is well-formed, otherwise the error code.
pub fn username_issue(username: &str) -> Option<&'static str> {
    if USERNAME_RE.is_match(username) {
        None
    } else {
        Some("username_format")
    }
}

/// `None` when the email is well-formed, otherwise the error code.
pub fn email_issue(email: &str) -> Option<&'static str> {
    if EMAIL_RE.is_match(email) {
        None
    } else {
        Some("email_format")
    }
}

fn has_min_length(password: &str) -> bool {
    password.chars().count() >= 8
}

fn has_uppercase(password: &str) -> bool {
    password.chars().any(char::is_uppercase)
}

fn has_lowercase(password: &str) -> bool {
    password.chars().any(char::is_lowercase)
}

fn has_digit(password: &str) -> bool {
    password.chars().any(|c| c.is_ascii_digit())
}

fn has_symbol(password: &str) -> bool {
    password.chars().any(|c| !c.is_alphanumeric())
}

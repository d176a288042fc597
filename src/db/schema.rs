diesel::table! {
    users (id) {
        id -> Text,
        username -> Text,
        email -> Text,
        password_hash -> Text,
        salt -> Text,
        iterations -> Integer,
        created_at -> Timestamp,
        disabled -> Bool,
        profile -> Text,
    }
}

diesel::table! {
    sessions (token) {
        token -> Text,
        user_id -> Text,
        issued_at -> Timestamp,
        expires_at -> Timestamp,
        revoked -> Bool,
    }
}

diesel::table! {
    login_attempts (id) {
        id -> BigInt,
        identifier -> Text,
        user_id -> Nullable<Text>,
        outcome -> Text,
        attempted_at -> Timestamp,
    }
}

diesel::table! {
    password_resets (token) {
        token -> Text,
        user_id -> Text,
        created_at -> Timestamp,
        expires_at -> Timestamp,
        used -> Bool,
    }
}

diesel::joinable!(sessions -> users (user_id));
diesel::joinable!(login_attempts -> users (user_id));
diesel::joinable!(password_resets -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(users, sessions, login_attempts, password_resets,);

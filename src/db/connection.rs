use super::DbPool;
use anyhow::{Context, Result};
use diesel::SqliteConnection;
use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection};

/// Schema applied on pool creation. `CREATE TABLE IF NOT EXISTS` keeps the
/// call idempotent across process restarts.
///
/// Uniqueness of `username`/`email` is case-insensitive (`COLLATE NOCASE`)
/// and enforced by the database, so two concurrent registrations for the
/// same name resolve to exactly one success.
const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id            TEXT PRIMARY KEY NOT NULL,
        username      TEXT NOT NULL COLLATE NOCASE UNIQUE,
        email         TEXT NOT NULL COLLATE NOCASE UNIQUE,
        password_hash TEXT NOT NULL,
        salt          TEXT NOT NULL,
        iterations    INTEGER NOT NULL,
        created_at    TIMESTAMP NOT NULL,
        disabled      BOOLEAN NOT NULL DEFAULT 0,
        profile       TEXT NOT NULL DEFAULT '{}'
    );

    CREATE TABLE IF NOT EXISTS sessions (
        token      TEXT PRIMARY KEY NOT NULL,
        user_id    TEXT NOT NULL REFERENCES users(id),
        issued_at  TIMESTAMP NOT NULL,
        expires_at TIMESTAMP NOT NULL,
        revoked    BOOLEAN NOT NULL DEFAULT 0
    );
    CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);
    CREATE INDEX IF NOT EXISTS idx_sessions_expiry ON sessions(expires_at);

    CREATE TABLE IF NOT EXISTS login_attempts (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        identifier   TEXT NOT NULL COLLATE NOCASE,
        user_id      TEXT REFERENCES users(id),
        outcome      TEXT NOT NULL,
        attempted_at TIMESTAMP NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_attempts_identifier
        ON login_attempts(identifier, attempted_at);

    CREATE TABLE IF NOT EXISTS password_resets (
        token      TEXT PRIMARY KEY NOT NULL,
        user_id    TEXT NOT NULL REFERENCES users(id),
        created_at TIMESTAMP NOT NULL,
        expires_at TIMESTAMP NOT NULL,
        used       BOOLEAN NOT NULL DEFAULT 0
    );
";

/// Per-connection PRAGMAs. WAL lets the expiry sweep delete rows while
/// readers proceed; `busy_timeout` turns writer contention into short waits
/// instead of immediate `SQLITE_BUSY` errors.
#[derive(Debug)]
struct ConnectionOptions;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(
            "PRAGMA busy_timeout = 5000;
             PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;",
        )
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Creates a connection pool for the given SQLite database path and applies
/// the schema. The returned pool is cheap to clone and shared by all
/// repositories.
pub fn init_pool(database_path: &str) -> Result<DbPool> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_path);

    let pool = diesel::r2d2::Pool::builder()
        .max_size(5)
        .connection_customizer(Box::new(ConnectionOptions))
        .build(manager)
        .with_context(|| format!("Failed to create database pool for {database_path}"))?;

    let mut conn = pool.get().context("Failed to get connection for schema setup")?;
    conn.batch_execute(SCHEMA).context("Failed to apply database schema")?;

    tracing::debug!(path = database_path, "database pool initialized");
    Ok(pool)
}

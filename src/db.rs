//! Database pool management and schema bootstrap.

use once_cell::sync::OnceCell;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr, Statement};
use std::time::Duration;

static DB_POOL: OnceCell<DatabaseConnection> = OnceCell::new();

/// Open a connection pool.
///
/// In-memory SQLite databases exist per connection, so those pools are
/// pinned to a single connection.
pub async fn connect(url: &str, max_connections: u32) -> Result<DatabaseConnection, DbErr> {
    let max_connections = if url.starts_with("sqlite") && url.contains(":memory:") {
        1
    } else {
        max_connections.max(1)
    };

    let mut opt = ConnectOptions::new(url.to_owned());
    opt.max_connections(max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8));

    Database::connect(opt).await
}

/// Initialize the global pool. Panics if the database is unreachable.
pub async fn init_db(url: String) {
    let max_connections = crate::app_config::database().max_connections;
    let pool = connect(&url, max_connections)
        .await
        .expect("Failed to connect to database.");
    if DB_POOL.set(pool).is_err() {
        log::warn!("Database pool was already initialized.");
    }
}

/// Get the global pool. Panics if `init_db` has not run.
pub fn get_db_pool() -> &'static DatabaseConnection {
    DB_POOL.get().expect("Database pool accessed before init_db.")
}

/// Column types that differ between backends: (serial primary key, timestamp).
fn dialect(backend: DbBackend) -> (&'static str, &'static str) {
    match backend {
        DbBackend::Postgres => ("SERIAL PRIMARY KEY", "TIMESTAMP"),
        DbBackend::MySql => ("INTEGER PRIMARY KEY AUTO_INCREMENT", "DATETIME(6)"),
        DbBackend::Sqlite => ("INTEGER PRIMARY KEY AUTOINCREMENT", "TEXT"),
    }
}

/// Create every table the core needs if it does not exist.
///
/// The UNIQUE and CHECK constraints here are what make the edge operations
/// race-free: concurrent identical requests cannot produce duplicate rows.
pub async fn init_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let (pk, ts) = dialect(backend);

    let tables = [
        format!(
            "CREATE TABLE IF NOT EXISTS users (
                id {pk},
                username VARCHAR(40) NOT NULL UNIQUE,
                email VARCHAR(120) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                role VARCHAR(16) NOT NULL DEFAULT 'USER',
                active BOOLEAN NOT NULL DEFAULT TRUE,
                created_at {ts} NOT NULL
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS posts (
                id {pk},
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                content TEXT NOT NULL,
                image_url VARCHAR(255),
                created_at {ts} NOT NULL,
                updated_at {ts} NOT NULL
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS post_votes (
                id {pk},
                post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                kind VARCHAR(16) NOT NULL,
                created_at {ts} NOT NULL,
                CONSTRAINT unique_post_vote UNIQUE (post_id, user_id)
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS post_comments (
                id {pk},
                post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                comment_text TEXT NOT NULL,
                created_at {ts} NOT NULL,
                updated_at {ts} NOT NULL
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS user_follows (
                id {pk},
                follower_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                followed_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at {ts} NOT NULL,
                CONSTRAINT unique_follow UNIQUE (follower_id, followed_id),
                CONSTRAINT no_self_follow CHECK (follower_id <> followed_id)
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS post_flags (
                id {pk},
                post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                flagged_by_user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                reason TEXT NOT NULL,
                status VARCHAR(16) NOT NULL DEFAULT 'PENDING',
                created_at {ts} NOT NULL,
                reviewed_at {ts},
                reviewed_by_user_id INTEGER REFERENCES users(id) ON DELETE SET NULL
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS user_warnings (
                id {pk},
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                admin_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                message TEXT NOT NULL,
                created_at {ts} NOT NULL
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS notifications (
                id {pk},
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                type VARCHAR(32) NOT NULL,
                actor_id INTEGER,
                actor_username VARCHAR(40),
                post_id INTEGER,
                comment_text TEXT,
                message TEXT,
                is_read BOOLEAN NOT NULL DEFAULT FALSE,
                created_at {ts} NOT NULL
            )"
        ),
    ];

    for sql in tables {
        db.execute(Statement::from_string(backend, sql)).await?;
    }

    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_post_flags_status ON post_flags (status)",
        "CREATE INDEX IF NOT EXISTS idx_post_flags_post ON post_flags (post_id)",
        "CREATE INDEX IF NOT EXISTS idx_user_warnings_user ON user_warnings (user_id)",
        "CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications (user_id, is_read)",
        "CREATE INDEX IF NOT EXISTS idx_post_comments_post ON post_comments (post_id)",
    ];

    // MySQL has no IF NOT EXISTS for indexes; its tables are provisioned by migrations.
    if backend != DbBackend::MySql {
        for sql in indexes {
            db.execute(Statement::from_string(backend, sql.to_owned()))
                .await?;
        }
    }

    log::debug!("Schema ready ({:?})", backend);
    Ok(())
}

//! Idempotent SQLite schema creation
//!
//! All DDL uses CREATE TABLE IF NOT EXISTS so startup can run it
//! unconditionally. Timestamps are stored as RFC 3339 text.

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::debug;

const TABLES: &[(&str, &str)] = &[
    (
        "audio_metadata",
        r#"
        CREATE TABLE IF NOT EXISTS audio_metadata (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            src_id TEXT UNIQUE NOT NULL,
            description TEXT,
            audio_src TEXT,
            location TEXT,
            creator TEXT,
            created_at TEXT
        )
        "#,
    ),
    (
        "tags",
        r#"
        CREATE TABLE IF NOT EXISTS tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT UNIQUE NOT NULL
        )
        "#,
    ),
    (
        "audio_tags",
        r#"
        CREATE TABLE IF NOT EXISTS audio_tags (
            src_id TEXT NOT NULL,
            tag_id INTEGER NOT NULL,
            PRIMARY KEY (src_id, tag_id),
            FOREIGN KEY (tag_id) REFERENCES tags (id)
        )
        "#,
    ),
    (
        "images",
        r#"
        CREATE TABLE IF NOT EXISTS images (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            src_id TEXT NOT NULL,
            image_url TEXT
        )
        "#,
    ),
    (
        "user_interactions",
        r#"
        CREATE TABLE IF NOT EXISTS user_interactions (
            user_id TEXT NOT NULL,
            src_id TEXT NOT NULL,
            is_fav INTEGER NOT NULL DEFAULT 0,
            viewed INTEGER NOT NULL DEFAULT 0,
            finished INTEGER NOT NULL DEFAULT 0,
            listened_second INTEGER NOT NULL DEFAULT 0,
            listened_percentage REAL NOT NULL DEFAULT 0.0,
            recommended INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (user_id, src_id)
        )
        "#,
    ),
    (
        "bookmarks",
        r#"
        CREATE TABLE IF NOT EXISTS bookmarks (
            user_id TEXT NOT NULL,
            src_id TEXT NOT NULL,
            bookmark TEXT NOT NULL,
            PRIMARY KEY (user_id, src_id, bookmark)
        )
        "#,
    ),
    (
        "comments",
        r#"
        CREATE TABLE IF NOT EXISTS comments (
            user_id TEXT NOT NULL,
            src_id TEXT NOT NULL,
            comment TEXT NOT NULL,
            PRIMARY KEY (user_id, src_id, comment)
        )
        "#,
    ),
    (
        "users",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            openid TEXT UNIQUE NOT NULL,
            session_key TEXT,
            created_at TEXT,
            last_login TEXT
        )
        "#,
    ),
];

/// Create any missing tables
pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    for (name, ddl) in TABLES {
        sqlx::query(ddl).execute(pool).await?;
        debug!(table = name, "schema ensured");
    }
    Ok(())
}

// A pooled :memory: database is per-connection, so tests pin the pool
// to a single connection to see one schema.
#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    create_tables(&pool).await.expect("schema");
    pool
}

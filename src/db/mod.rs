//! Database connection and operations

pub mod audio;
pub mod interactions;
pub mod recommend;
pub mod schema;
pub mod users;

use std::str::FromStr;

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

pub use audio::{AudioMeta, UpsertAudioMeta};
pub use interactions::{InteractionWithLists, UpsertInteraction};
pub use recommend::ExcludeBy;
pub use users::UserRecord;

/// Database wrapper providing connection pool access
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database wrapper from an existing pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the maximum connection pool size from environment or default
    fn get_max_connections() -> u32 {
        std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5)
    }

    /// Open (creating if needed) the SQLite database at `path`
    pub async fn connect(path: &str) -> Result<Self> {
        // Accept both bare paths and sqlite:// URLs
        let url = if path.starts_with("sqlite:") {
            path.to_string()
        } else {
            format!("sqlite://{}", path)
        };

        if let Some(parent) = std::path::Path::new(url.trim_start_matches("sqlite://")).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::from_str(&url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(Self::get_max_connections())
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get the audio metadata repository
    pub fn audio(&self) -> audio::AudioRepository {
        audio::AudioRepository::new(self.pool.clone())
    }

    /// Get the user interactions repository
    pub fn interactions(&self) -> interactions::InteractionRepository {
        interactions::InteractionRepository::new(self.pool.clone())
    }

    /// Get the recommendation query repository
    pub fn recommend(&self) -> recommend::RecommendRepository {
        recommend::RecommendRepository::new(self.pool.clone())
    }

    /// Get the users repository
    pub fn users(&self) -> users::UsersRepository {
        users::UsersRepository::new(self.pool.clone())
    }

    /// Create any missing tables
    pub async fn init_schema(&self) -> Result<()> {
        schema::create_tables(&self.pool).await
    }
}

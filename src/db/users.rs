//! WeChat user repository
//!
//! Users are keyed by the openid returned from code2session; the row id
//! is a UUID minted at registration and carried in issued tokens.

use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

/// User row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: String,
    pub openid: String,
    pub session_key: Option<String>,
    pub created_at: Option<String>,
    pub last_login: Option<String>,
}

pub struct UsersRepository {
    pool: SqlitePool,
}

impl UsersRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Look up a user by openid
    pub async fn get_by_openid(&self, openid: &str) -> Result<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, openid, session_key, created_at, last_login FROM users WHERE openid = ?",
        )
        .bind(openid)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Look up a user by row id
    pub async fn get_by_id(&self, id: &str) -> Result<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, openid, session_key, created_at, last_login FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Register a new user for an openid
    pub async fn create(&self, openid: &str, session_key: &str) -> Result<UserRecord> {
        let now = Utc::now().to_rfc3339();
        let record = UserRecord {
            id: Uuid::new_v4().to_string(),
            openid: openid.to_string(),
            session_key: Some(session_key.to_string()),
            created_at: Some(now.clone()),
            last_login: Some(now),
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, openid, session_key, created_at, last_login)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.openid)
        .bind(&record.session_key)
        .bind(&record.created_at)
        .bind(&record.last_login)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    /// Refresh the session key and stamp last_login
    pub async fn touch_login(&self, id: &str, session_key: &str) -> Result<()> {
        sqlx::query("UPDATE users SET session_key = ?, last_login = ? WHERE id = ?")
            .bind(session_key)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::memory_pool;

    #[tokio::test]
    async fn create_and_lookup_by_openid() {
        let repo = UsersRepository::new(memory_pool().await);
        let created = repo.create("wx-openid-1", "sk-1").await.unwrap();

        let found = repo.get_by_openid("wx-openid-1").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.session_key.as_deref(), Some("sk-1"));

        assert!(repo.get_by_openid("wx-openid-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn touch_login_refreshes_session_key() {
        let repo = UsersRepository::new(memory_pool().await);
        let user = repo.create("wx-openid-1", "sk-1").await.unwrap();

        repo.touch_login(&user.id, "sk-2").await.unwrap();
        let found = repo.get_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(found.session_key.as_deref(), Some("sk-2"));
    }
}

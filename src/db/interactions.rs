//! Per-user interaction state repository
//!
//! One row per (user, audio item) with favorite/viewed/finished flags and
//! listening progress, plus bookmark and comment side tables keyed by the
//! same pair.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db::audio::split_concat;

/// Interaction row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct InteractionRecord {
    pub user_id: String,
    pub src_id: String,
    pub is_fav: bool,
    pub viewed: bool,
    pub finished: bool,
    pub listened_second: i64,
    pub listened_percentage: f64,
    pub recommended: bool,
}

/// Interaction row with its aggregated bookmarks and comments
#[derive(Debug, Clone, Serialize)]
pub struct InteractionWithLists {
    #[serde(flatten)]
    pub interaction: InteractionRecord,
    pub bookmarks: Vec<String>,
    pub comments: Vec<String>,
}

/// Input for a full-state interaction upsert
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertInteraction {
    pub user_id: String,
    pub src_id: String,
    pub is_fav: bool,
    pub viewed: bool,
    pub finished: bool,
    pub listened_second: i64,
    pub listened_percentage: f64,
    #[serde(default)]
    pub recommended: bool,
    #[serde(default)]
    pub bookmarks: Vec<String>,
    #[serde(default)]
    pub comments: Vec<String>,
}

pub struct InteractionRepository {
    pool: SqlitePool,
}

impl InteractionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Replace the interaction row and its bookmark/comment sets.
    ///
    /// Replaying the same input leaves identical state: the row is
    /// REPLACEd and both side tables are rewritten, not appended to.
    pub async fn upsert(&self, input: &UpsertInteraction) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO user_interactions
                (user_id, src_id, is_fav, viewed, finished,
                 listened_second, listened_percentage, recommended)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.user_id)
        .bind(&input.src_id)
        .bind(input.is_fav)
        .bind(input.viewed)
        .bind(input.finished)
        .bind(input.listened_second)
        .bind(input.listened_percentage)
        .bind(input.recommended)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM bookmarks WHERE user_id = ? AND src_id = ?")
            .bind(&input.user_id)
            .bind(&input.src_id)
            .execute(&mut *tx)
            .await?;

        for bookmark in &input.bookmarks {
            sqlx::query("INSERT OR IGNORE INTO bookmarks (user_id, src_id, bookmark) VALUES (?, ?, ?)")
                .bind(&input.user_id)
                .bind(&input.src_id)
                .bind(bookmark)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("DELETE FROM comments WHERE user_id = ? AND src_id = ?")
            .bind(&input.user_id)
            .bind(&input.src_id)
            .execute(&mut *tx)
            .await?;

        for comment in &input.comments {
            sqlx::query("INSERT OR IGNORE INTO comments (user_id, src_id, comment) VALUES (?, ?, ?)")
                .bind(&input.user_id)
                .bind(&input.src_id)
                .bind(comment)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Fetch one interaction with its bookmark/comment lists.
    ///
    /// Returns None when the user has no row for the item or the item is
    /// not in the catalog (mirrors the 404 contract of the endpoint).
    pub async fn get_with_lists(
        &self,
        user_id: &str,
        src_id: &str,
    ) -> Result<Option<InteractionWithLists>> {
        #[derive(sqlx::FromRow)]
        struct Row {
            user_id: String,
            src_id: String,
            is_fav: bool,
            viewed: bool,
            finished: bool,
            listened_second: i64,
            listened_percentage: f64,
            recommended: bool,
            bookmarks: Option<String>,
            comments: Option<String>,
        }

        let row = sqlx::query_as::<_, Row>(
            r#"
            SELECT ui.user_id, ui.src_id, ui.is_fav, ui.viewed, ui.finished,
                   ui.listened_second, ui.listened_percentage, ui.recommended,
                   GROUP_CONCAT(DISTINCT b.bookmark) AS bookmarks,
                   GROUP_CONCAT(DISTINCT c.comment) AS comments
            FROM user_interactions ui
            JOIN audio_metadata am ON ui.src_id = am.src_id
            LEFT JOIN bookmarks b ON ui.user_id = b.user_id AND ui.src_id = b.src_id
            LEFT JOIN comments c ON ui.user_id = c.user_id AND ui.src_id = c.src_id
            WHERE ui.src_id = ? AND ui.user_id = ?
            GROUP BY ui.user_id, ui.src_id
            "#,
        )
        .bind(src_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| InteractionWithLists {
            interaction: InteractionRecord {
                user_id: r.user_id,
                src_id: r.src_id,
                is_fav: r.is_fav,
                viewed: r.viewed,
                finished: r.finished,
                listened_second: r.listened_second,
                listened_percentage: r.listened_percentage,
                recommended: r.recommended,
            },
            bookmarks: split_concat(r.bookmarks),
            comments: split_concat(r.comments),
        }))
    }

    /// Raise the recommended flag for each id, creating default rows for
    /// items the user has never touched. Existing rows keep their other
    /// fields untouched.
    pub async fn mark_recommended(&self, user_id: &str, src_ids: &[String]) -> Result<()> {
        if src_ids.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for src_id in src_ids {
            sqlx::query(
                r#"
                INSERT INTO user_interactions
                    (user_id, src_id, is_fav, viewed, finished,
                     listened_second, listened_percentage, recommended)
                VALUES (?, ?, 0, 0, 0, 0, 0.0, 1)
                ON CONFLICT (user_id, src_id) DO UPDATE SET recommended = 1
                "#,
            )
            .bind(user_id)
            .bind(src_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Delete interaction rows only (bookmarks/comments kept)
    pub async fn clear_interactions(&self) -> Result<()> {
        sqlx::query("DELETE FROM user_interactions")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Delete all interaction state: rows, bookmarks, comments
    pub async fn clear_all(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for table in ["user_interactions", "bookmarks", "comments"] {
            sqlx::query(&format!("DELETE FROM {}", table))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::audio::{AudioRepository, UpsertAudioMeta};
    use crate::db::schema::memory_pool;
    use pretty_assertions::assert_eq;

    async fn seed_item(pool: &SqlitePool, src_id: &str) {
        AudioRepository::new(pool.clone())
            .upsert(&UpsertAudioMeta {
                src_id: src_id.to_string(),
                description: None,
                audio_src: None,
                location: None,
                creator: None,
                images: vec![],
                tags: vec![],
            })
            .await
            .unwrap();
    }

    fn progress(user: &str, src: &str) -> UpsertInteraction {
        UpsertInteraction {
            user_id: user.to_string(),
            src_id: src.to_string(),
            is_fav: true,
            viewed: true,
            finished: false,
            listened_second: 42,
            listened_percentage: 0.35,
            recommended: false,
            bookmarks: vec!["0:42".to_string()],
            comments: vec!["nice".to_string()],
        }
    }

    #[tokio::test]
    async fn upsert_is_idempotent() {
        let pool = memory_pool().await;
        seed_item(&pool, "src-1").await;
        let repo = InteractionRepository::new(pool);

        let input = progress("u1", "src-1");
        repo.upsert(&input).await.unwrap();
        repo.upsert(&input).await.unwrap();

        let got = repo.get_with_lists("u1", "src-1").await.unwrap().unwrap();
        assert_eq!(got.interaction.listened_second, 42);
        assert_eq!(got.bookmarks, vec!["0:42"]);
        assert_eq!(got.comments, vec!["nice"]);
    }

    #[tokio::test]
    async fn upsert_replaces_bookmark_and_comment_sets() {
        let pool = memory_pool().await;
        seed_item(&pool, "src-1").await;
        let repo = InteractionRepository::new(pool);

        repo.upsert(&progress("u1", "src-1")).await.unwrap();

        let mut next = progress("u1", "src-1");
        next.bookmarks = vec!["1:30".to_string()];
        next.comments = vec![];
        repo.upsert(&next).await.unwrap();

        let got = repo.get_with_lists("u1", "src-1").await.unwrap().unwrap();
        assert_eq!(got.bookmarks, vec!["1:30"]);
        assert!(got.comments.is_empty());
    }

    #[tokio::test]
    async fn mark_recommended_preserves_existing_fields() {
        let pool = memory_pool().await;
        seed_item(&pool, "src-1").await;
        let repo = InteractionRepository::new(pool);

        repo.upsert(&progress("u1", "src-1")).await.unwrap();
        repo.mark_recommended("u1", &["src-1".to_string(), "src-2".to_string()])
            .await
            .unwrap();

        let got = repo.get_with_lists("u1", "src-1").await.unwrap().unwrap();
        assert!(got.interaction.recommended);
        assert!(got.interaction.viewed);
        assert_eq!(got.interaction.listened_second, 42);
    }

    #[tokio::test]
    async fn missing_row_or_unknown_item_is_none() {
        let pool = memory_pool().await;
        seed_item(&pool, "src-1").await;
        let repo = InteractionRepository::new(pool);

        // no interaction yet
        assert!(repo.get_with_lists("u1", "src-1").await.unwrap().is_none());

        // interaction exists but the item is not in the catalog
        repo.mark_recommended("u1", &["ghost".to_string()]).await.unwrap();
        assert!(repo.get_with_lists("u1", "ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clears() {
        let pool = memory_pool().await;
        seed_item(&pool, "src-1").await;
        let repo = InteractionRepository::new(pool);

        repo.upsert(&progress("u1", "src-1")).await.unwrap();
        repo.clear_interactions().await.unwrap();
        assert!(repo.get_with_lists("u1", "src-1").await.unwrap().is_none());

        repo.upsert(&progress("u1", "src-1")).await.unwrap();
        repo.clear_all().await.unwrap();
        assert!(repo.get_with_lists("u1", "src-1").await.unwrap().is_none());
    }
}

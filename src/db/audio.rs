//! Audio catalog repository
//!
//! Audio items are keyed by `src_id` (the catalog source id). Images and
//! tags live in side tables and are aggregated back into the full
//! metadata view with GROUP_CONCAT.

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// Full metadata view: the row plus its aggregated images and tags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioMeta {
    pub src_id: String,
    pub description: Option<String>,
    pub audio_src: Option<String>,
    pub location: Option<String>,
    pub creator: Option<String>,
    pub created_at: Option<String>,
    pub images: Vec<String>,
    pub tags: Vec<String>,
}

/// Input for upserting a catalog item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertAudioMeta {
    pub src_id: String,
    pub description: Option<String>,
    pub audio_src: Option<String>,
    pub location: Option<String>,
    pub creator: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

pub struct AudioRepository {
    pool: SqlitePool,
}

impl AudioRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Upsert a catalog item: metadata row, image set, tag links.
    ///
    /// The image set is replaced wholesale so re-importing the same item
    /// does not accumulate duplicate rows. Tags are created on demand and
    /// linked idempotently.
    pub async fn upsert(&self, input: &UpsertAudioMeta) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO audio_metadata (src_id, description, audio_src, location, creator, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (src_id) DO UPDATE SET
                description = excluded.description,
                audio_src = excluded.audio_src,
                location = excluded.location,
                creator = excluded.creator,
                created_at = excluded.created_at
            "#,
        )
        .bind(&input.src_id)
        .bind(&input.description)
        .bind(&input.audio_src)
        .bind(&input.location)
        .bind(&input.creator)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM images WHERE src_id = ?")
            .bind(&input.src_id)
            .execute(&mut *tx)
            .await?;

        for image_url in &input.images {
            sqlx::query("INSERT INTO images (src_id, image_url) VALUES (?, ?)")
                .bind(&input.src_id)
                .bind(image_url)
                .execute(&mut *tx)
                .await?;
        }

        for tag in &input.tags {
            sqlx::query("INSERT OR IGNORE INTO tags (name) VALUES (?)")
                .bind(tag)
                .execute(&mut *tx)
                .await?;

            let (tag_id,): (i64,) = sqlx::query_as("SELECT id FROM tags WHERE name = ?")
                .bind(tag)
                .fetch_one(&mut *tx)
                .await?;

            sqlx::query("INSERT OR IGNORE INTO audio_tags (src_id, tag_id) VALUES (?, ?)")
                .bind(&input.src_id)
                .bind(tag_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Fetch the full metadata view for one item
    pub async fn get_full(&self, src_id: &str) -> Result<Option<AudioMeta>> {
        #[derive(sqlx::FromRow)]
        struct FullRow {
            src_id: String,
            description: Option<String>,
            audio_src: Option<String>,
            location: Option<String>,
            creator: Option<String>,
            created_at: Option<String>,
            images: Option<String>,
            tags: Option<String>,
        }

        let row = sqlx::query_as::<_, FullRow>(
            r#"
            SELECT am.src_id, am.description, am.audio_src, am.location,
                   am.creator, am.created_at,
                   GROUP_CONCAT(DISTINCT i.image_url) AS images,
                   GROUP_CONCAT(DISTINCT t.name) AS tags
            FROM audio_metadata am
            LEFT JOIN images i ON am.src_id = i.src_id
            LEFT JOIN audio_tags at ON am.src_id = at.src_id
            LEFT JOIN tags t ON at.tag_id = t.id
            WHERE am.src_id = ?
            GROUP BY am.id
            "#,
        )
        .bind(src_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| AudioMeta {
            src_id: r.src_id,
            description: r.description,
            audio_src: r.audio_src,
            location: r.location,
            creator: r.creator,
            created_at: r.created_at,
            images: split_concat(r.images),
            tags: split_concat(r.tags),
        }))
    }

    /// Count catalog items
    pub async fn count(&self) -> Result<i64> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM audio_metadata")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    /// Delete every catalog row (metadata, images, tags, tag links)
    pub async fn clear(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for table in ["audio_metadata", "images", "tags", "audio_tags"] {
            sqlx::query(&format!("DELETE FROM {}", table))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

/// Split a GROUP_CONCAT cell into its parts (NULL and empty mean none)
pub(crate) fn split_concat(cell: Option<String>) -> Vec<String> {
    match cell {
        Some(s) if !s.is_empty() => s.split(',').map(|p| p.to_string()).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::memory_pool;
    use pretty_assertions::assert_eq;

    fn sample(src_id: &str) -> UpsertAudioMeta {
        UpsertAudioMeta {
            src_id: src_id.to_string(),
            description: Some("Morning birdsong".to_string()),
            audio_src: Some("https://cdn.example.com/a/birdsong.mp3".to_string()),
            location: Some("Chengdu".to_string()),
            creator: Some("c-100".to_string()),
            images: vec![
                "https://cdn.example.com/i/1.jpg".to_string(),
                "https://cdn.example.com/i/2.jpg".to_string(),
            ],
            tags: vec!["nature".to_string(), "morning".to_string()],
        }
    }

    #[tokio::test]
    async fn upsert_then_fetch_full() {
        let repo = AudioRepository::new(memory_pool().await);
        repo.upsert(&sample("src-1")).await.unwrap();

        let meta = repo.get_full("src-1").await.unwrap().unwrap();
        assert_eq!(meta.src_id, "src-1");
        assert_eq!(meta.images.len(), 2);
        let mut tags = meta.tags.clone();
        tags.sort();
        assert_eq!(tags, vec!["morning", "nature"]);
    }

    #[tokio::test]
    async fn reupsert_replaces_images_without_duplicates() {
        let repo = AudioRepository::new(memory_pool().await);
        repo.upsert(&sample("src-1")).await.unwrap();

        let mut again = sample("src-1");
        again.images = vec!["https://cdn.example.com/i/3.jpg".to_string()];
        repo.upsert(&again).await.unwrap();

        let meta = repo.get_full("src-1").await.unwrap().unwrap();
        assert_eq!(meta.images, vec!["https://cdn.example.com/i/3.jpg"]);
        // tags stay linked, not duplicated
        assert_eq!(meta.tags.len(), 2);
    }

    #[tokio::test]
    async fn unknown_src_id_is_none() {
        let repo = AudioRepository::new(memory_pool().await);
        assert!(repo.get_full("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_empties_catalog() {
        let repo = AudioRepository::new(memory_pool().await);
        repo.upsert(&sample("src-1")).await.unwrap();
        repo.upsert(&sample("src-2")).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 2);

        repo.clear().await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 0);
        assert!(repo.get_full("src-1").await.unwrap().is_none());
    }
}

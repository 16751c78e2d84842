//! Recommendation selection queries
//!
//! Two pickers over the catalog: a uniform-random pool of items the user
//! has not yet consumed, and a tag-overlap ranking that pads from the
//! random pool when it comes up short of the requested limit.

use anyhow::Result;
use sqlx::SqlitePool;

/// Which interaction flag disqualifies an item from selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExcludeBy {
    /// Skip items the user has already viewed (default)
    #[default]
    Viewed,
    /// Skip items already surfaced to the user
    Recommended,
}

impl ExcludeBy {
    /// Interaction column backing the filter (static, safe to splice)
    fn column(self) -> &'static str {
        match self {
            ExcludeBy::Viewed => "viewed",
            ExcludeBy::Recommended => "recommended",
        }
    }

    pub fn from_param(s: &str) -> Option<Self> {
        match s {
            "viewed" => Some(ExcludeBy::Viewed),
            "recommended" => Some(ExcludeBy::Recommended),
            _ => None,
        }
    }
}

pub struct RecommendRepository {
    pool: SqlitePool,
}

impl RecommendRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Uniform-random pick of un-consumed items
    pub async fn pick_random(
        &self,
        user_id: &str,
        limit: i64,
        exclude: ExcludeBy,
    ) -> Result<Vec<String>> {
        self.pick_random_excluding(user_id, limit, exclude, &[]).await
    }

    /// Random pick with an explicit skip list (used for padding)
    async fn pick_random_excluding(
        &self,
        user_id: &str,
        limit: i64,
        exclude: ExcludeBy,
        skip: &[String],
    ) -> Result<Vec<String>> {
        if limit <= 0 {
            return Ok(Vec::new());
        }

        let skip_clause = if skip.is_empty() {
            String::new()
        } else {
            format!(
                "AND am.src_id NOT IN ({})",
                vec!["?"; skip.len()].join(",")
            )
        };

        let sql = format!(
            r#"
            SELECT am.src_id FROM audio_metadata am
            WHERE am.src_id NOT IN (
                SELECT ui.src_id FROM user_interactions ui
                WHERE ui.user_id = ? AND ui.{flag} = 1
            )
            {skip_clause}
            ORDER BY RANDOM()
            LIMIT ?
            "#,
            flag = exclude.column(),
            skip_clause = skip_clause,
        );

        let mut query = sqlx::query_as::<_, (String,)>(&sql).bind(user_id);
        for src_id in skip {
            query = query.bind(src_id);
        }
        let rows = query.bind(limit).fetch_all(&self.pool).await?;

        Ok(rows.into_iter().map(|(src_id,)| src_id).collect())
    }

    /// Tag-overlap pick: items carrying at least one requested tag, ranked
    /// by count of distinct matching tags (random tiebreak), padded from
    /// the random pool when fewer than `limit` qualify.
    pub async fn pick_by_tags(
        &self,
        user_id: &str,
        tags: &[String],
        limit: i64,
        exclude: ExcludeBy,
    ) -> Result<Vec<String>> {
        if limit <= 0 {
            return Ok(Vec::new());
        }
        if tags.is_empty() {
            return self.pick_random(user_id, limit, exclude).await;
        }

        let placeholders = vec!["?"; tags.len()].join(",");
        let sql = format!(
            r#"
            SELECT am.src_id, COUNT(DISTINCT t.id) AS tag_count
            FROM audio_metadata am
            JOIN audio_tags at ON am.src_id = at.src_id
            JOIN tags t ON at.tag_id = t.id
            WHERE t.name IN ({placeholders})
              AND am.src_id NOT IN (
                  SELECT ui.src_id FROM user_interactions ui
                  WHERE ui.user_id = ? AND ui.{flag} = 1
              )
            GROUP BY am.src_id
            ORDER BY tag_count DESC, RANDOM()
            LIMIT ?
            "#,
            placeholders = placeholders,
            flag = exclude.column(),
        );

        let mut query = sqlx::query_as::<_, (String, i64)>(&sql);
        for tag in tags {
            query = query.bind(tag);
        }
        let rows = query
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        let mut picked: Vec<String> = rows.into_iter().map(|(src_id, _)| src_id).collect();

        if (picked.len() as i64) < limit {
            let pad = self
                .pick_random_excluding(user_id, limit - picked.len() as i64, exclude, &picked)
                .await?;
            picked.extend(pad);
        }

        picked.truncate(limit as usize);
        Ok(picked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::audio::{AudioRepository, UpsertAudioMeta};
    use crate::db::interactions::{InteractionRepository, UpsertInteraction};
    use crate::db::schema::memory_pool;
    use pretty_assertions::assert_eq;

    async fn seed(pool: &SqlitePool, src_id: &str, tags: &[&str]) {
        AudioRepository::new(pool.clone())
            .upsert(&UpsertAudioMeta {
                src_id: src_id.to_string(),
                description: None,
                audio_src: None,
                location: None,
                creator: None,
                images: vec![],
                tags: tags.iter().map(|t| t.to_string()).collect(),
            })
            .await
            .unwrap();
    }

    async fn mark_viewed(pool: &SqlitePool, user: &str, src: &str) {
        InteractionRepository::new(pool.clone())
            .upsert(&UpsertInteraction {
                user_id: user.to_string(),
                src_id: src.to_string(),
                is_fav: false,
                viewed: true,
                finished: false,
                listened_second: 0,
                listened_percentage: 0.0,
                recommended: false,
                bookmarks: vec![],
                comments: vec![],
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn random_pick_skips_viewed_items() {
        let pool = memory_pool().await;
        for id in ["a", "b", "c"] {
            seed(&pool, id, &[]).await;
        }
        mark_viewed(&pool, "u1", "b").await;

        let repo = RecommendRepository::new(pool);
        let mut picked = repo.pick_random("u1", 10, ExcludeBy::Viewed).await.unwrap();
        picked.sort();
        assert_eq!(picked, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn exclude_recommended_uses_the_other_flag() {
        let pool = memory_pool().await;
        for id in ["a", "b", "c"] {
            seed(&pool, id, &[]).await;
        }
        let interactions = InteractionRepository::new(pool.clone());
        interactions
            .mark_recommended("u1", &["a".to_string()])
            .await
            .unwrap();
        mark_viewed(&pool, "u1", "b").await;

        let repo = RecommendRepository::new(pool);
        let mut picked = repo
            .pick_random("u1", 10, ExcludeBy::Recommended)
            .await
            .unwrap();
        picked.sort();
        // "b" is viewed but not recommended, so it stays eligible
        assert_eq!(picked, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn tag_overlap_ranks_best_match_first() {
        let pool = memory_pool().await;
        seed(&pool, "both", &["rain", "night"]).await;
        seed(&pool, "one", &["rain"]).await;
        seed(&pool, "none", &["city"]).await;

        let repo = RecommendRepository::new(pool);
        let picked = repo
            .pick_by_tags(
                "u1",
                &["rain".to_string(), "night".to_string()],
                2,
                ExcludeBy::Viewed,
            )
            .await
            .unwrap();
        assert_eq!(picked[0], "both");
        assert_eq!(picked.len(), 2);
        assert!(picked.contains(&"one".to_string()));
    }

    #[tokio::test]
    async fn tag_pick_pads_from_random_pool_without_duplicates() {
        let pool = memory_pool().await;
        seed(&pool, "tagged", &["rain"]).await;
        seed(&pool, "plain-1", &[]).await;
        seed(&pool, "plain-2", &[]).await;

        let repo = RecommendRepository::new(pool);
        let picked = repo
            .pick_by_tags("u1", &["rain".to_string()], 3, ExcludeBy::Viewed)
            .await
            .unwrap();

        assert_eq!(picked.len(), 3);
        assert_eq!(picked[0], "tagged");
        let mut unique = picked.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 3);
    }

    #[tokio::test]
    async fn padding_respects_exclusion_filter() {
        let pool = memory_pool().await;
        seed(&pool, "tagged", &["rain"]).await;
        seed(&pool, "plain", &[]).await;
        mark_viewed(&pool, "u1", "plain").await;

        let repo = RecommendRepository::new(pool);
        let picked = repo
            .pick_by_tags("u1", &["rain".to_string()], 3, ExcludeBy::Viewed)
            .await
            .unwrap();
        assert_eq!(picked, vec!["tagged"]);
    }

    #[tokio::test]
    async fn non_positive_limit_is_empty() {
        let pool = memory_pool().await;
        seed(&pool, "a", &["rain"]).await;

        let repo = RecommendRepository::new(pool);
        assert!(repo
            .pick_random("u1", 0, ExcludeBy::Viewed)
            .await
            .unwrap()
            .is_empty());
        assert!(repo
            .pick_by_tags("u1", &["rain".to_string()], -1, ExcludeBy::Viewed)
            .await
            .unwrap()
            .is_empty());
    }
}

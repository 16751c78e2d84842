//! Recommendation service
//!
//! Combines the selection queries with the post-selection state write:
//! every id handed back to the client is flagged `recommended` in the
//! user's interaction state so repeat calls can exclude it.

use anyhow::Result;

use crate::db::{AudioMeta, Database, ExcludeBy};

/// Query parameters for one recommendation request
#[derive(Debug, Clone, Default)]
pub struct RecommendParams {
    pub tags: Vec<String>,
    pub limit: i64,
    pub exclude: ExcludeBy,
}

#[derive(Clone)]
pub struct RecommendationService {
    db: Database,
}

impl RecommendationService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Pick the next item ids for a user and flag them recommended.
    ///
    /// An empty pick performs no writes.
    pub async fn recommend_ids(&self, user_id: &str, params: &RecommendParams) -> Result<Vec<String>> {
        let repo = self.db.recommend();
        let picked = if params.tags.is_empty() {
            repo.pick_random(user_id, params.limit, params.exclude).await?
        } else {
            repo.pick_by_tags(user_id, &params.tags, params.limit, params.exclude)
                .await?
        };

        self.db.interactions().mark_recommended(user_id, &picked).await?;
        Ok(picked)
    }

    /// Same pick, hydrated to full metadata objects.
    ///
    /// Ids whose metadata row has vanished are skipped in the response but
    /// still flagged recommended.
    pub async fn recommend_full(
        &self,
        user_id: &str,
        params: &RecommendParams,
    ) -> Result<Vec<AudioMeta>> {
        let picked = self.recommend_ids(user_id, params).await?;

        let audio = self.db.audio();
        let mut full = Vec::with_capacity(picked.len());
        for src_id in &picked {
            if let Some(meta) = audio.get_full(src_id).await? {
                full.push(meta);
            }
        }
        Ok(full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::memory_pool;
    use crate::db::UpsertAudioMeta;

    async fn service_with_items(items: &[(&str, &[&str])]) -> RecommendationService {
        let db = Database::new(memory_pool().await);
        let audio = db.audio();
        for (src_id, tags) in items {
            audio
                .upsert(&UpsertAudioMeta {
                    src_id: src_id.to_string(),
                    description: Some(format!("item {}", src_id)),
                    audio_src: None,
                    location: None,
                    creator: None,
                    images: vec![],
                    tags: tags.iter().map(|t| t.to_string()).collect(),
                })
                .await
                .unwrap();
        }
        RecommendationService::new(db)
    }

    #[tokio::test]
    async fn recommend_flags_returned_ids() {
        let service = service_with_items(&[("a", &[]), ("b", &[])]).await;
        let params = RecommendParams {
            limit: 10,
            ..Default::default()
        };

        let ids = service.recommend_ids("u1", &params).await.unwrap();
        assert_eq!(ids.len(), 2);

        let got = service
            .db
            .interactions()
            .get_with_lists("u1", &ids[0])
            .await
            .unwrap()
            .unwrap();
        assert!(got.interaction.recommended);
        assert!(!got.interaction.viewed);
    }

    #[tokio::test]
    async fn exclude_recommended_makes_repeat_calls_disjoint() {
        let service = service_with_items(&[("a", &[]), ("b", &[]), ("c", &[])]).await;
        let params = RecommendParams {
            limit: 2,
            exclude: ExcludeBy::Recommended,
            ..Default::default()
        };

        let first = service.recommend_ids("u1", &params).await.unwrap();
        let second = service.recommend_ids("u1", &params).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 1);
        assert!(!second.iter().any(|id| first.contains(id)));

        // pool exhausted: nothing left, and nothing written
        let third = service.recommend_ids("u1", &params).await.unwrap();
        assert!(third.is_empty());
    }

    #[tokio::test]
    async fn full_variant_returns_metadata() {
        let service = service_with_items(&[("a", &["rain"])]).await;
        let params = RecommendParams {
            tags: vec!["rain".to_string()],
            limit: 5,
            ..Default::default()
        };

        let full = service.recommend_full("u1", &params).await.unwrap();
        assert_eq!(full.len(), 1);
        assert_eq!(full[0].src_id, "a");
        assert_eq!(full[0].tags, vec!["rain"]);
    }
}

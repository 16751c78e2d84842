//! Recommendation endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use axum_extra::extract::Query;
use serde::{Deserialize, Serialize};

use crate::api::StatusResponse;
use crate::app::AppState;
use crate::db::{AudioMeta, ExcludeBy};
use crate::services::RecommendParams;

const DEFAULT_LIMIT: i64 = 5;

#[derive(Debug, Deserialize)]
pub struct RecommendQuery {
    /// Repeatable: ?tags=rain&tags=night
    #[serde(default)]
    pub tags: Vec<String>,
    pub limit: Option<i64>,
    /// "viewed" (default) or "recommended"
    pub exclude: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecommendedResponse {
    pub recommended: Vec<String>,
}

fn to_params(query: RecommendQuery) -> Result<RecommendParams, (StatusCode, Json<StatusResponse>)> {
    let exclude = match query.exclude.as_deref() {
        None => ExcludeBy::default(),
        Some(value) => ExcludeBy::from_param(value).ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(StatusResponse::error(format!(
                    "exclude must be 'viewed' or 'recommended', got '{}'",
                    value
                ))),
            )
        })?,
    };

    Ok(RecommendParams {
        tags: query.tags,
        limit: query.limit.unwrap_or(DEFAULT_LIMIT),
        exclude,
    })
}

/// Next item ids for a user
async fn get_recommend(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<RecommendQuery>,
) -> Result<Json<RecommendedResponse>, (StatusCode, Json<StatusResponse>)> {
    let params = to_params(query)?;

    match state.recommender.recommend_ids(&user_id, &params).await {
        Ok(recommended) => Ok(Json(RecommendedResponse { recommended })),
        Err(e) => {
            tracing::error!(error = %e, user_id = %user_id, "recommendation query failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StatusResponse::error(e.to_string())),
            ))
        }
    }
}

/// Next items for a user, hydrated to full metadata
async fn get_recommend_full(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<RecommendQuery>,
) -> Result<Json<Vec<AudioMeta>>, (StatusCode, Json<StatusResponse>)> {
    let params = to_params(query)?;

    match state.recommender.recommend_full(&user_id, &params).await {
        Ok(full) => Ok(Json(full)),
        Err(e) => {
            tracing::error!(error = %e, user_id = %user_id, "recommendation query failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StatusResponse::error(e.to_string())),
            ))
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recommend/{user_id}", get(get_recommend))
        .route("/recommend-full/{user_id}", get(get_recommend_full))
}

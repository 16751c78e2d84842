//! Catalog endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::api::StatusResponse;
use crate::app::AppState;
use crate::db::{AudioMeta, UpsertAudioMeta};

/// Full metadata for one item
async fn get_audio_meta(
    State(state): State<AppState>,
    Path(src_id): Path<String>,
) -> Result<Json<AudioMeta>, StatusCode> {
    match state.db.audio().get_full(&src_id).await {
        Ok(Some(meta)) => Ok(Json(meta)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!(error = %e, src_id = %src_id, "audio metadata fetch failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Upsert one catalog item with its images and tags
async fn add_audio_meta(
    State(state): State<AppState>,
    Json(body): Json<UpsertAudioMeta>,
) -> (StatusCode, Json<StatusResponse>) {
    match state.db.audio().upsert(&body).await {
        Ok(()) => (StatusCode::OK, Json(StatusResponse::success())),
        Err(e) => {
            tracing::error!(error = %e, src_id = %body.src_id, "catalog upsert failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StatusResponse::error(e.to_string())),
            )
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/audio-meta/{src_id}", get(get_audio_meta))
        .route("/add-audio-meta", post(add_audio_meta))
}

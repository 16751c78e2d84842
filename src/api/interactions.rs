//! Interaction state endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::api::StatusResponse;
use crate::app::AppState;
use crate::db::{InteractionWithLists, UpsertInteraction};

/// Full-replace upsert of one user's state for one item
async fn update_user_interaction(
    State(state): State<AppState>,
    Json(body): Json<UpsertInteraction>,
) -> (StatusCode, Json<StatusResponse>) {
    match state.db.interactions().upsert(&body).await {
        Ok(()) => (StatusCode::OK, Json(StatusResponse::success())),
        Err(e) => {
            tracing::error!(
                error = %e,
                user_id = %body.user_id,
                src_id = %body.src_id,
                "interaction upsert failed"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StatusResponse::error(e.to_string())),
            )
        }
    }
}

/// One user's state for one item, with bookmarks and comments
async fn get_user_interaction(
    State(state): State<AppState>,
    Path((src_id, user_id)): Path<(String, String)>,
) -> Result<Json<InteractionWithLists>, StatusCode> {
    match state.db.interactions().get_with_lists(&user_id, &src_id).await {
        Ok(Some(interaction)) => Ok(Json(interaction)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!(error = %e, user_id = %user_id, src_id = %src_id, "interaction fetch failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user-interaction", post(update_user_interaction))
        .route("/user-interaction/{src_id}/{user_id}", get(get_user_interaction))
}

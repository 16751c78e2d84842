//! Catalog/state reset endpoints
//!
//! Used by the batch loaders between seed runs.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Serialize;

use crate::app::AppState;

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

const CLEANED: &str = "database cleaned successfully";

/// Clear every catalog and interaction table
async fn reset_database(State(state): State<AppState>) -> (StatusCode, Json<ResetResponse>) {
    let result = async {
        state.db.audio().clear().await?;
        state.db.interactions().clear_all().await
    }
    .await;

    match result {
        Ok(()) => (
            StatusCode::OK,
            Json(ResetResponse {
                status: CLEANED,
                error: None,
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "database reset failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ResetResponse {
                    status: "error",
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

/// Clear interaction rows only
async fn reset_user_interactions(State(state): State<AppState>) -> (StatusCode, Json<ResetResponse>) {
    match state.db.interactions().clear_interactions().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ResetResponse {
                status: CLEANED,
                error: None,
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "interaction reset failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ResetResponse {
                    status: "error",
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reset-database", post(reset_database))
        .route("/reset-user-interactions", post(reset_user_interactions))
}

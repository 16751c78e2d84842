//! API route definitions
//!
//! Endpoint paths mirror the mini-program client's expectations:
//! recommendation and catalog routes at the root, auth under /api.

pub mod admin;
pub mod audio;
pub mod auth;
pub mod health;
pub mod interactions;
pub mod me;
pub mod recommend;

use axum::Router;
use serde::Serialize;

use crate::app::AppState;

/// Plain status envelope used by the mutation endpoints
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusResponse {
    pub fn success() -> Self {
        Self {
            status: "success",
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            error: Some(message.into()),
        }
    }
}

/// Build the full route tree (no layers applied)
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(recommend::router())
        .merge(audio::router())
        .merge(interactions::router())
        .merge(admin::router())
        .merge(auth::router())
        .merge(me::router())
}

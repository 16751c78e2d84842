//! Authenticated user endpoint
//!
//! Proves out Bearer token validation for the mini-program client.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use serde::Serialize;

use crate::app::AppState;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: String,
    pub openid: String,
}

/// Identity claims from a valid Bearer token; 401 otherwise
///
/// The header is extracted as an Option so a missing or malformed
/// Authorization header is a 401 rather than the extractor's 400.
async fn me(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<Json<MeResponse>, StatusCode> {
    let TypedHeader(bearer) = bearer.ok_or(StatusCode::UNAUTHORIZED)?;
    let claims = state
        .auth
        .validate_token(bearer.token())
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    Ok(Json(MeResponse {
        user_id: claims.sub,
        openid: claims.openid,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/me", get(me))
}

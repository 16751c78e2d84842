//! WeChat login endpoint

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::api::StatusResponse;
use crate::app::AppState;
use crate::services::AuthError;

#[derive(Debug, Deserialize)]
pub struct WeChatLoginRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct WeChatLoginResponse {
    pub token: String,
}

/// Exchange a mini-program login code for a signed token
async fn wechat_login(
    State(state): State<AppState>,
    Json(body): Json<WeChatLoginRequest>,
) -> Result<Json<WeChatLoginResponse>, (StatusCode, Json<StatusResponse>)> {
    match state.auth.login_with_code(&body.code).await {
        Ok((_user, token)) => Ok(Json(WeChatLoginResponse { token })),
        Err(e @ AuthError::InvalidCode(_)) => Err((
            StatusCode::BAD_REQUEST,
            Json(StatusResponse::error(e.to_string())),
        )),
        Err(e @ AuthError::NotConfigured) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(StatusResponse::error(e.to_string())),
        )),
        Err(e) => {
            tracing::error!(error = %e, "wechat login failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StatusResponse::error(e.to_string())),
            ))
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/wechat/login", post(wechat_login))
}

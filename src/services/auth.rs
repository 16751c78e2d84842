//! Authentication service: WeChat login and JWT handling
//!
//! Exchanges a mini-program login code for an openid/session_key pair via
//! the WeChat code2session API, registers the user on first login, and
//! issues HS256 tokens carrying the user id.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::db::{Database, UserRecord};

/// Claims carried in issued tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User ID (subject)
    pub sub: String,
    /// WeChat openid
    pub openid: String,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("WeChat login is not configured (WECHAT_APPID / WECHAT_SECRET)")]
    NotConfigured,
    #[error("Invalid WeChat code: {0}")]
    InvalidCode(String),
    #[error("WeChat API request failed: {0}")]
    Upstream(#[from] reqwest::Error),
    #[error("Invalid token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

/// Auth service configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub expiration_days: i64,
    pub wechat_appid: Option<String>,
    pub wechat_secret: Option<String>,
    pub wechat_api_url: String,
}

impl AuthConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            jwt_secret: config.jwt_secret.clone(),
            expiration_days: config.jwt_expiration_days,
            wechat_appid: config.wechat_appid.clone(),
            wechat_secret: config.wechat_secret.clone(),
            wechat_api_url: config.wechat_api_url.clone(),
        }
    }
}

/// code2session response body
#[derive(Debug, Deserialize)]
struct WeChatSessionResponse {
    openid: Option<String>,
    session_key: Option<String>,
    errmsg: Option<String>,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: Database,
    config: AuthConfig,
    http: reqwest::Client,
}

impl AuthService {
    pub fn new(db: Database, config: AuthConfig) -> Self {
        Self {
            db,
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Exchange a mini-program login code for a signed token.
    ///
    /// Registers the user on first login; on repeat logins the stored
    /// session_key is refreshed and last_login stamped.
    pub async fn login_with_code(&self, code: &str) -> Result<(UserRecord, String), AuthError> {
        let appid = self
            .config
            .wechat_appid
            .as_deref()
            .ok_or(AuthError::NotConfigured)?;
        let secret = self
            .config
            .wechat_secret
            .as_deref()
            .ok_or(AuthError::NotConfigured)?;

        let response: WeChatSessionResponse = self
            .http
            .get(&self.config.wechat_api_url)
            .query(&[
                ("appid", appid),
                ("secret", secret),
                ("js_code", code),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?
            .json()
            .await?;

        let (openid, session_key) = match (response.openid, response.session_key) {
            (Some(o), Some(k)) => (o, k),
            _ => {
                return Err(AuthError::InvalidCode(
                    response.errmsg.unwrap_or_else(|| "missing openid".to_string()),
                ))
            }
        };

        let users = self.db.users();
        let user = match users.get_by_openid(&openid).await? {
            Some(user) => {
                users.touch_login(&user.id, &session_key).await?;
                user
            }
            None => {
                tracing::info!(openid = %openid, "registering new user");
                users.create(&openid, &session_key).await?
            }
        };

        let token = self.issue_token(&user)?;
        Ok((user, token))
    }

    /// Issue a signed token for a user
    pub fn issue_token(&self, user: &UserRecord) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: user.id.clone(),
            openid: user.openid.clone(),
            exp: (now + Duration::days(self.config.expiration_days)).timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )?;

        Ok(token)
    }

    /// Decode and validate a token, returning its claims
    pub fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let token_data = decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )?;

        Ok(token_data.claims)
    }
}

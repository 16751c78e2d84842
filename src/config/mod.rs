//! Application configuration management

use std::env;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind port
    pub port: u16,

    /// SQLite database path
    pub database_path: String,

    /// JWT secret for token signing and verification
    pub jwt_secret: String,

    /// Issued-token lifetime in days
    pub jwt_expiration_days: i64,

    /// WeChat mini-program app id
    pub wechat_appid: Option<String>,

    /// WeChat mini-program app secret
    pub wechat_secret: Option<String>,

    /// WeChat code2session endpoint (overridable for tests)
    pub wechat_api_url: String,
}

const DEFAULT_WECHAT_API_URL: &str = "https://api.weixin.qq.com/sns/jscode2session";

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Prefer DATABASE_PATH, fall back to DATABASE_URL for compatibility
        let database_path = env::var("DATABASE_PATH")
            .or_else(|_| env::var("DATABASE_URL"))
            .unwrap_or_else(|_| "./data/shortaudio.db".to_string());

        // JWT_SECRET is always required - generate a random one if not provided in dev
        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            // In production, this should be set explicitly
            use std::collections::hash_map::DefaultHasher;
            use std::hash::{Hash, Hasher};
            let mut hasher = DefaultHasher::new();
            std::time::SystemTime::now().hash(&mut hasher);
            format!("dev-secret-{}", hasher.finish())
        });

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .context("Invalid PORT")?,

            database_path,

            jwt_secret,

            jwt_expiration_days: env::var("JWT_EXPIRATION_DAYS")
                .unwrap_or_else(|_| "7".to_string())
                .parse()
                .context("Invalid JWT_EXPIRATION_DAYS")?,

            wechat_appid: env::var("WECHAT_APPID").ok(),

            wechat_secret: env::var("WECHAT_SECRET").ok(),

            wechat_api_url: env::var("WECHAT_API_URL")
                .unwrap_or_else(|_| DEFAULT_WECHAT_API_URL.to_string()),
        })
    }
}

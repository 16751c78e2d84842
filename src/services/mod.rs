//! Application services

pub mod auth;
pub mod recommender;

pub use auth::{AuthConfig, AuthError, AuthService, TokenClaims};
pub use recommender::{RecommendParams, RecommendationService};

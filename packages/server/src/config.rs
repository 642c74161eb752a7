use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Deployment environment, gates dev-only behavior such as the
/// fallback reviewer identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "test" => Environment::Test,
            _ => Environment::Development,
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Canonical base URL used to mint dereferenceable resource URIs.
    pub base_url: String,
    pub environment: Environment,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_expiry_hours: i64,
    /// Explicit opt-in for the "admin" reviewer identity when no JWT
    /// subject is present. Never enabled by default.
    pub auth_dev_fallback: bool,
    /// Allowed CORS origins. Empty in development means "allow all".
    pub allowed_origins: Vec<String>,
    pub node_version: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let environment = Environment::parse(&env::var("ENVIRONMENT").unwrap_or_default());

        let allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();
        if environment == Environment::Production && allowed_origins.is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; browser clients will be rejected");
        }

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("SERVER_PORT must be a valid number")?,
            base_url: env::var("SERVER_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            environment,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "sel.events".to_string()),
            jwt_expiry_hours: env::var("JWT_EXPIRY_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .context("JWT_EXPIRY_HOURS must be a valid number")?,
            auth_dev_fallback: env::var("AUTH_DEV_FALLBACK")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false)
                && environment != Environment::Production,
            allowed_origins,
            node_version: env::var("NODE_VERSION").unwrap_or_else(|_| "0.1.0".to_string()),
        })
    }
}

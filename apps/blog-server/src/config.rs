//! Application configuration loaded from environment variables.

use std::env;

use blog_infra::{DatabaseConfig, JwtConfig, RateLimitConfig};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs against the in-memory store.
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
    pub comment_rate_limit: RateLimitConfig,
    /// Key comment throttling on `X-Forwarded-For` instead of the peer IP.
    pub trust_forwarded_for: bool,
    /// Where unauthenticated users are sent.
    pub login_url: String,
    /// Account created at startup if it does not exist yet.
    pub admin: Option<(String, String)>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = env::var("DATABASE_URL").ok().map(|url| DatabaseConfig {
            url,
            max_connections: parse_var("DB_MAX_CONNECTIONS").unwrap_or(20),
            min_connections: parse_var("DB_MIN_CONNECTIONS").unwrap_or(2),
        });

        let admin = match (env::var("BLOG_ADMIN_USERNAME"), env::var("BLOG_ADMIN_PASSWORD")) {
            (Ok(user), Ok(password)) => Some((user, password)),
            _ => None,
        };

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT").unwrap_or(8080),
            database,
            jwt: JwtConfig::from_env(),
            comment_rate_limit: RateLimitConfig::from_env(),
            trust_forwarded_for: parse_var("RATE_LIMIT_TRUST_PROXY").unwrap_or(false),
            login_url: env::var("LOGIN_URL").unwrap_or_else(|_| "/login/".to_string()),
            admin,
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}

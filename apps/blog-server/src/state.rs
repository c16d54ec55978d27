//! Application state - shared across all handlers.

use std::sync::Arc;

use blog_core::ports::{
    CommentRepository, PasswordService, PostRepository, RateLimiter, TokenService, UserRepository,
};
use blog_infra::{
    Argon2PasswordService, InMemoryCommentRepository, InMemoryPostRepository,
    InMemoryRateLimiter, InMemoryUserRepository, JwtTokenService, MemoryStore,
};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub comment_limiter: Arc<dyn RateLimiter>,
    pub trust_forwarded_for: bool,
    pub login_url: String,
}

struct Repositories {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    users: Arc<dyn UserRepository>,
}

impl Repositories {
    fn in_memory() -> Self {
        let store = MemoryStore::new();
        Self {
            posts: Arc::new(InMemoryPostRepository::new(store.clone())),
            comments: Arc::new(InMemoryCommentRepository::new(store.clone())),
            users: Arc::new(InMemoryUserRepository::new(store)),
        }
    }

    #[cfg(feature = "postgres")]
    async fn connect(config: &AppConfig) -> Self {
        use blog_infra::database::{
            PostgresCommentRepository, PostgresPostRepository, PostgresUserRepository, connect,
        };

        let Some(db_config) = config.database.as_ref() else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return Self::in_memory();
        };

        match connect(db_config).await {
            Ok(conn) => Self {
                posts: Arc::new(PostgresPostRepository::new(conn.clone())),
                comments: Arc::new(PostgresCommentRepository::new(conn.clone())),
                users: Arc::new(PostgresUserRepository::new(conn)),
            },
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory fallback.",
                    e
                );
                Self::in_memory()
            }
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn connect(_config: &AppConfig) -> Self {
        tracing::info!("Running without postgres feature - using in-memory repositories");
        Self::in_memory()
    }
}

impl AppState {
    /// Build the application state, connecting to the database if configured.
    pub async fn new(config: &AppConfig) -> Self {
        let repos = Repositories::connect(config).await;
        let state = Self::assemble(repos, config);
        tracing::info!("Application state initialized");
        state
    }

    /// State backed by a fresh in-memory store.
    #[cfg(test)]
    pub fn in_memory(config: &AppConfig) -> Self {
        Self::assemble(Repositories::in_memory(), config)
    }

    fn assemble(repos: Repositories, config: &AppConfig) -> Self {
        Self {
            posts: repos.posts,
            comments: repos.comments,
            users: repos.users,
            tokens: Arc::new(JwtTokenService::new(config.jwt.clone())),
            passwords: Arc::new(Argon2PasswordService::new()),
            comment_limiter: Arc::new(InMemoryRateLimiter::new(
                config.comment_rate_limit.clone(),
            )),
            trust_forwarded_for: config.trust_forwarded_for,
            login_url: config.login_url.clone(),
        }
    }
}

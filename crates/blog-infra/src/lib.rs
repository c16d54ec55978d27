//! # Blog Infrastructure
//!
//! Concrete implementations of the ports defined in `blog-core`:
//! repositories (SeaORM/PostgreSQL and an in-memory fallback), JWT sessions,
//! Argon2 password hashing and the comment rate limiter.
//!
//! ## Feature Flags
//!
//! - `postgres` (default) - PostgreSQL repositories via SeaORM

pub mod auth;
pub mod database;
pub mod rate_limit;

pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
pub use database::{
    DatabaseConfig, InMemoryCommentRepository, InMemoryPostRepository, InMemoryUserRepository,
    MemoryStore,
};
pub use rate_limit::{InMemoryRateLimiter, RateLimitConfig};

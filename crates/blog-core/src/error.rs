//! Domain-level error types.

use thiserror::Error;
use uuid::Uuid;

/// Domain errors - business logic failures.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Post {0} not found")]
    PostNotFound(Uuid),

    #[error("Comment {0} not found")]
    CommentNotFound(Uuid),

    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    /// Delete or update of a row that does not exist.
    #[error("Entity not found")]
    NotFound,

    /// Unique or foreign-key violation.
    #[error("Constraint violation: {0}")]
    Constraint(String),
}

//! # Blog Core
//!
//! The domain layer of the blog.
//! Posts, comments and the users who author posts, plus the ports the
//! infrastructure layer implements. No storage or HTTP dependencies here.

pub mod domain;
pub mod error;
pub mod ports;

pub use error::DomainError;

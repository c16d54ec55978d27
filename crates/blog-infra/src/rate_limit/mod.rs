//! Rate limiting for anonymous submissions.

mod memory;

pub use memory::{InMemoryRateLimiter, RateLimitConfig};

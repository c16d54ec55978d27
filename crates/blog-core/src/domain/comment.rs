use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Post;

/// Comment entity - a visitor's comment on a post, hidden until approved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    /// Free-text name given by the visitor.
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub approved: bool,
}

impl Comment {
    /// Create a new, unapproved comment on `post_id`.
    pub fn new(post_id: Uuid, author: String, text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id,
            author,
            text,
            created_at: Utc::now(),
            approved: false,
        }
    }

    pub fn approve(&mut self) {
        self.approved = true;
    }

    /// Canonical URL of a comment: the public post list.
    pub fn absolute_url(&self) -> String {
        "/".to_string()
    }

    /// Detail page of the post this comment belongs to.
    pub fn post_url(&self) -> String {
        Post::url_for(self.post_id)
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Post entity - a blog post, either a draft or published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    /// `None` while the post is a draft.
    pub published_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Create a new draft post.
    pub fn new(author_id: Uuid, title: String, text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id,
            title,
            text,
            created_at: Utc::now(),
            published_at: None,
        }
    }

    /// A post is published once its publish timestamp has been reached.
    /// Future-dated posts stay hidden until then.
    pub fn is_published(&self, now: DateTime<Utc>) -> bool {
        self.published_at.is_some_and(|at| at <= now)
    }

    pub fn is_draft(&self) -> bool {
        self.published_at.is_none()
    }

    /// Mark the post published as of now.
    pub fn publish(&mut self) {
        self.publish_at(Utc::now());
    }

    pub fn publish_at(&mut self, at: DateTime<Utc>) {
        self.published_at = Some(at);
    }

    /// Overwrite the user-editable fields.
    pub fn edit(&mut self, title: String, text: String) {
        self.title = title;
        self.text = text;
    }

    /// Canonical display URL of the post.
    pub fn absolute_url(&self) -> String {
        Self::url_for(self.id)
    }

    pub fn url_for(id: Uuid) -> String {
        format!("/post/{id}/")
    }
}

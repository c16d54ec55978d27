//! Page payloads returned by the blog server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A post as shown in lists and on its detail page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    pub id: Uuid,
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub approved: bool,
}

/// Public post list or the draft list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostListPage {
    pub posts: Vec<PostView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetailPage {
    pub post: PostView,
    /// Approved comments for visitors; every comment for logged-in users.
    pub comments: Vec<CommentView>,
}

/// Confirmation shown before a post is deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmDeletePage {
    pub post: PostView,
    pub action: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AboutPage {
    pub title: String,
    pub body: String,
}

/// Issued session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Login prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginPage {
    pub form: crate::forms::FormView,
    pub next: Option<String>,
}

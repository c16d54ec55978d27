//! Mapping from domain objects to page payloads, and redirects.

use actix_web::{HttpResponse, http::header};
use blog_core::domain::{Comment, Post};
use blog_shared::FormView;
use blog_shared::pages::{CommentView, PostView};

pub fn post_view(post: Post) -> PostView {
    PostView {
        url: post.absolute_url(),
        id: post.id,
        author_id: post.author_id,
        title: post.title,
        text: post.text,
        created_at: post.created_at,
        published_at: post.published_at,
    }
}

pub fn comment_view(comment: Comment) -> CommentView {
    CommentView {
        id: comment.id,
        author: comment.author,
        text: comment.text,
        created_at: comment.created_at,
        approved: comment.approved,
    }
}

/// 303 after a successful write.
pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// A form with validation errors, shown again.
pub fn invalid_form(view: FormView) -> HttpResponse {
    HttpResponse::UnprocessableEntity().json(view)
}

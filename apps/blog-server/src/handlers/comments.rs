//! Comment handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use blog_core::DomainError;
use blog_core::domain::{Comment, Post};
use blog_shared::{CommentForm, Form};

use super::render::{invalid_form, redirect};
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

async fn find_comment(state: &AppState, id: Uuid) -> Result<Comment, DomainError> {
    state
        .comments
        .find_by_id(id)
        .await?
        .ok_or(DomainError::CommentNotFound(id))
}

async fn ensure_post(state: &AppState, id: Uuid) -> Result<Post, DomainError> {
    state
        .posts
        .find_by_id(id)
        .await?
        .ok_or(DomainError::PostNotFound(id))
}

/// GET /post/{pk}/comment/ - empty comment form.
pub async fn add_form(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    ensure_post(&state, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(CommentForm::default().render()))
}

/// POST /post/{pk}/comment/ - store an unapproved comment.
pub async fn add(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    form: web::Form<CommentForm>,
) -> AppResult<HttpResponse> {
    let post = ensure_post(&state, path.into_inner()).await?;

    let form = match form.into_inner().check() {
        Ok(form) => form,
        Err(view) => return Ok(invalid_form(view)),
    };

    let comment = state
        .comments
        .save(Comment::new(post.id, form.author, form.text))
        .await?;
    tracing::info!(comment_id = %comment.id, post_id = %post.id, "Comment awaiting approval");

    Ok(redirect(&post.absolute_url()))
}

/// /comment/{pk}/approve/
pub async fn approve(
    _identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let mut comment = find_comment(&state, path.into_inner()).await?;

    comment.approve();
    let comment = state.comments.save(comment).await?;
    tracing::info!(comment_id = %comment.id, "Comment approved");

    Ok(redirect(&comment.post_url()))
}

/// /comment/{pk}/remove/
pub async fn remove(
    _identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let comment = find_comment(&state, path.into_inner()).await?;
    let post_url = comment.post_url();

    state.comments.delete(comment.id).await?;
    tracing::info!(comment_id = %comment.id, "Comment removed");

    Ok(redirect(&post_url))
}

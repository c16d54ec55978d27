//! Post handlers.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use uuid::Uuid;

use blog_core::DomainError;
use blog_core::domain::Post;
use blog_shared::pages::{ConfirmDeletePage, PostDetailPage, PostListPage};
use blog_shared::{Form, PostForm};

use super::render::{comment_view, invalid_form, post_view, redirect};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

async fn find_post(state: &AppState, id: Uuid) -> Result<Post, DomainError> {
    state
        .posts
        .find_by_id(id)
        .await?
        .ok_or(DomainError::PostNotFound(id))
}

/// GET / - published posts, newest first.
pub async fn list_published(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let posts = state.posts.list_published(Utc::now()).await?;

    Ok(HttpResponse::Ok().json(PostListPage {
        posts: posts.into_iter().map(post_view).collect(),
    }))
}

/// GET /drafts/ - unpublished posts, oldest first.
pub async fn list_drafts(_identity: Identity, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let posts = state.posts.list_drafts().await?;

    Ok(HttpResponse::Ok().json(PostListPage {
        posts: posts.into_iter().map(post_view).collect(),
    }))
}

/// GET /post/{pk}/
///
/// Visitors see approved comments only; logged-in users see every comment so
/// pending ones can be moderated.
pub async fn detail(
    identity: OptionalIdentity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = find_post(&state, path.into_inner()).await?;

    let comments = match identity.0 {
        Some(_) => state.comments.find_by_post(post.id).await?,
        None => state.comments.find_approved_by_post(post.id).await?,
    };

    Ok(HttpResponse::Ok().json(PostDetailPage {
        post: post_view(post),
        comments: comments.into_iter().map(comment_view).collect(),
    }))
}

/// GET /post/new/
pub async fn create_form(_identity: Identity) -> HttpResponse {
    HttpResponse::Ok().json(PostForm::default().render())
}

/// POST /post/new/ - new draft owned by the logged-in user.
pub async fn create(
    identity: Identity,
    state: web::Data<AppState>,
    form: web::Form<PostForm>,
) -> AppResult<HttpResponse> {
    let form = match form.into_inner().check() {
        Ok(form) => form,
        Err(view) => return Ok(invalid_form(view)),
    };

    let post = state
        .posts
        .save(Post::new(identity.user_id, form.title, form.text))
        .await?;
    tracing::info!(post_id = %post.id, author = %identity.username, "Post created");

    Ok(redirect(&post.absolute_url()))
}

/// GET /post/{pk}/edit/
pub async fn update_form(
    _identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = find_post(&state, path.into_inner()).await?;

    let form = PostForm {
        title: post.title,
        text: post.text,
    };
    Ok(HttpResponse::Ok().json(form.render()))
}

/// POST /post/{pk}/edit/ - overwrite title and text.
pub async fn update(
    _identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    form: web::Form<PostForm>,
) -> AppResult<HttpResponse> {
    let mut post = find_post(&state, path.into_inner()).await?;

    let form = match form.into_inner().check() {
        Ok(form) => form,
        Err(view) => return Ok(invalid_form(view)),
    };

    post.edit(form.title, form.text);
    let post = state.posts.save(post).await?;
    tracing::info!(post_id = %post.id, "Post updated");

    Ok(redirect(&post.absolute_url()))
}

/// GET /post/{pk}/remove/ - confirmation page.
pub async fn delete_confirm(
    _identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = find_post(&state, path.into_inner()).await?;
    let action = format!("{}remove/", post.absolute_url());

    Ok(HttpResponse::Ok().json(ConfirmDeletePage {
        post: post_view(post),
        action,
    }))
}

/// POST /post/{pk}/remove/ - delete the post and its comments.
pub async fn delete(
    _identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = find_post(&state, path.into_inner()).await?;

    state.posts.delete(post.id).await?;
    tracing::info!(post_id = %post.id, "Post deleted");

    Ok(redirect("/"))
}

/// /post/{pk}/publish/ - stamp the publish time.
pub async fn publish(
    _identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let mut post = find_post(&state, path.into_inner()).await?;

    post.publish();
    let post = state.posts.save(post).await?;
    tracing::info!(post_id = %post.id, "Post published");

    Ok(redirect(&post.absolute_url()))
}

//! HTTP handlers and route configuration.

mod auth;
mod comments;
mod pages;
mod posts;
mod render;

#[cfg(test)]
pub(crate) mod tests;

use actix_web::web;

use crate::middleware::rate_limit::RateLimitMiddleware;

/// Configure all application routes.
///
/// `/post/new/` is registered ahead of `/post/{pk}/` so it is not taken for a key.
/// State-changing moderation actions only answer POST.
pub fn configure_routes(cfg: &mut web::ServiceConfig, comment_throttle: RateLimitMiddleware) {
    cfg.route("/", web::get().to(posts::list_published))
        .route("/about/", web::get().to(pages::about))
        .route("/health", web::get().to(pages::health_check))
        .route("/drafts/", web::get().to(posts::list_drafts))
        .service(
            web::resource("/post/new/")
                .route(web::get().to(posts::create_form))
                .route(web::post().to(posts::create)),
        )
        .route("/post/{pk}/", web::get().to(posts::detail))
        .service(
            web::resource("/post/{pk}/edit/")
                .route(web::get().to(posts::update_form))
                .route(web::post().to(posts::update)),
        )
        .service(
            web::resource("/post/{pk}/remove/")
                .route(web::get().to(posts::delete_confirm))
                .route(web::post().to(posts::delete)),
        )
        .route("/post/{pk}/publish/", web::post().to(posts::publish))
        .service(
            web::resource("/post/{pk}/comment/")
                .wrap(comment_throttle)
                .route(web::get().to(comments::add_form))
                .route(web::post().to(comments::add)),
        )
        .route("/comment/{pk}/approve/", web::post().to(comments::approve))
        .route("/comment/{pk}/remove/", web::post().to(comments::remove))
        .service(
            web::resource("/login/")
                .route(web::get().to(auth::login_form))
                .route(web::post().to(auth::login)),
        )
        .route("/logout/", web::route().to(auth::logout));
}

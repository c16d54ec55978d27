use std::time::Duration;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use chrono::{TimeDelta, Utc};
use uuid::Uuid;

use blog_core::domain::{Comment, Post, User};
use blog_infra::{JwtConfig, RateLimitConfig};
use blog_shared::FormView;
use blog_shared::pages::{PostDetailPage, PostListPage};

use super::configure_routes;
use crate::config::AppConfig;
use crate::middleware::auth::SESSION_COOKIE;
use crate::middleware::rate_limit::RateLimitMiddleware;
use crate::state::AppState;

pub fn test_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database: None,
        jwt: JwtConfig {
            secret: "test-secret".to_string(),
            expiration_hours: 1,
            issuer: "blog-test".to_string(),
        },
        comment_rate_limit: RateLimitConfig {
            max_requests: 1000,
            window: Duration::from_secs(60),
        },
        trust_forwarded_for: false,
        login_url: "/login/".to_string(),
        admin: None,
    }
}

macro_rules! app {
    ($state:expr) => {{
        let state: AppState = $state.clone();
        let throttle =
            RateLimitMiddleware::new(state.comment_limiter.clone(), state.trust_forwarded_for);
        test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(move |cfg| configure_routes(cfg, throttle)),
        )
        .await
    }};
}

/// State with one editor account and a bearer header for it.
async fn setup() -> (AppState, (header::HeaderName, String)) {
    setup_with(test_config()).await
}

async fn setup_with(config: AppConfig) -> (AppState, (header::HeaderName, String)) {
    let state = AppState::in_memory(&config);
    let user = state
        .users
        .save(User::new("editor".to_string(), "unused".to_string()))
        .await
        .unwrap();
    let token = state.tokens.generate_token(user.id, &user.username).unwrap();
    (state, (header::AUTHORIZATION, format!("Bearer {token}")))
}

async fn seed_post(state: &AppState, title: &str, published_at: Option<chrono::DateTime<Utc>>) -> Post {
    let mut post = Post::new(Uuid::new_v4(), title.to_string(), "body".to_string());
    post.published_at = published_at;
    state.posts.save(post).await.unwrap()
}

fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn titles(page: &PostListPage) -> Vec<&str> {
    page.posts.iter().map(|p| p.title.as_str()).collect()
}

#[actix_web::test]
async fn test_draft_then_publish_scenario() {
    let (state, auth) = setup().await;
    seed_post(&state, "Earlier", Some(Utc::now() - TimeDelta::days(1))).await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/post/new/")
        .insert_header(auth.clone())
        .set_form([("title", "Hello"), ("text", "World")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let detail_url = location(&resp);
    assert!(detail_url.starts_with("/post/"));

    let req = test::TestRequest::get()
        .uri("/drafts/")
        .insert_header(auth.clone())
        .to_request();
    let drafts: PostListPage = test::call_and_read_body_json(&app, req).await;
    assert_eq!(titles(&drafts), vec!["Hello"]);
    assert_eq!(drafts.posts[0].url, detail_url);

    let req = test::TestRequest::get().uri("/").to_request();
    let public: PostListPage = test::call_and_read_body_json(&app, req).await;
    assert_eq!(titles(&public), vec!["Earlier"]);

    let req = test::TestRequest::post()
        .uri(&format!("{detail_url}publish/"))
        .insert_header(auth.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), detail_url);

    let req = test::TestRequest::get().uri("/").to_request();
    let public: PostListPage = test::call_and_read_body_json(&app, req).await;
    assert_eq!(titles(&public), vec!["Hello", "Earlier"]);

    let req = test::TestRequest::get()
        .uri("/drafts/")
        .insert_header(auth)
        .to_request();
    let drafts: PostListPage = test::call_and_read_body_json(&app, req).await;
    assert!(drafts.posts.is_empty());
}

#[actix_web::test]
async fn test_created_post_belongs_to_current_user() {
    let (state, auth) = setup().await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/post/new/")
        .insert_header(auth)
        .set_form([
            ("title", "Mine"),
            ("text", "Body"),
            ("published_at", "2000-01-01T00:00:00Z"),
        ])
        .to_request();
    test::call_service(&app, req).await;

    let drafts = state.posts.list_drafts().await.unwrap();
    let editor = state.users.find_by_username("editor").await.unwrap().unwrap();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].author_id, editor.id);
    assert!(drafts[0].published_at.is_none());
}

#[actix_web::test]
async fn test_future_dated_post_hidden() {
    let (state, _) = setup().await;
    seed_post(&state, "Scheduled", Some(Utc::now() + TimeDelta::hours(3))).await;
    seed_post(&state, "Draft", None).await;
    seed_post(&state, "Live", Some(Utc::now() - TimeDelta::minutes(5))).await;
    let app = app!(state);

    let req = test::TestRequest::get().uri("/").to_request();
    let public: PostListPage = test::call_and_read_body_json(&app, req).await;
    assert_eq!(titles(&public), vec!["Live"]);
}

#[actix_web::test]
async fn test_invalid_post_rerenders_form() {
    let (state, auth) = setup().await;
    let app = app!(state);

    let long_title = "x".repeat(201);
    let req = test::TestRequest::post()
        .uri("/post/new/")
        .insert_header(auth)
        .set_form([("title", long_title.as_str()), ("text", "World")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let view: FormView = test::read_body_json(resp).await;
    assert!(!view.field("title").unwrap().errors.is_empty());
    assert_eq!(view.field("text").unwrap().value, "World");
    assert!(state.posts.list_drafts().await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_create_form_renders_widgets() {
    let (state, auth) = setup().await;
    let app = app!(state);

    let req = test::TestRequest::get()
        .uri("/post/new/")
        .insert_header(auth)
        .to_request();
    let view: FormView = test::call_and_read_body_json(&app, req).await;

    let names: Vec<&str> = view.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["title", "text"]);
}

#[actix_web::test]
async fn test_update_post() {
    let (state, auth) = setup().await;
    let post = seed_post(&state, "Old", None).await;
    let app = app!(state);

    let req = test::TestRequest::get()
        .uri(&format!("/post/{}/edit/", post.id))
        .insert_header(auth.clone())
        .to_request();
    let view: FormView = test::call_and_read_body_json(&app, req).await;
    assert_eq!(view.field("title").unwrap().value, "Old");

    let req = test::TestRequest::post()
        .uri(&format!("/post/{}/edit/", post.id))
        .insert_header(auth.clone())
        .set_form([("title", "New"), ("text", "Rewritten")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), post.absolute_url());

    let updated = state.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(updated.title, "New");
    assert_eq!(updated.text, "Rewritten");
    assert_eq!(updated.created_at, post.created_at);

    let req = test::TestRequest::post()
        .uri(&format!("/post/{}/edit/", Uuid::new_v4()))
        .insert_header(auth)
        .set_form([("title", "New"), ("text", "Rewritten")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_invalid_update_keeps_stored_post() {
    let (state, auth) = setup().await;
    let post = seed_post(&state, "Old", None).await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri(&format!("/post/{}/edit/", post.id))
        .insert_header(auth)
        .set_form([("title", "   "), ("text", "Rewritten")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let view: FormView = test::read_body_json(resp).await;
    assert!(!view.field("title").unwrap().errors.is_empty());

    let stored = state.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored, post);
}

#[actix_web::test]
async fn test_delete_post_cascades_to_comments() {
    let (state, auth) = setup().await;
    let post = seed_post(&state, "Doomed", Some(Utc::now())).await;
    let comment = state
        .comments
        .save(Comment::new(post.id, "Alice".to_string(), "Nice!".to_string()))
        .await
        .unwrap();
    let app = app!(state);

    let req = test::TestRequest::get()
        .uri(&format!("/post/{}/remove/", post.id))
        .insert_header(auth.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(state.posts.find_by_id(post.id).await.unwrap().is_some());

    let req = test::TestRequest::post()
        .uri(&format!("/post/{}/remove/", post.id))
        .insert_header(auth)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");

    assert!(state.posts.find_by_id(post.id).await.unwrap().is_none());
    assert!(state.comments.find_by_id(comment.id).await.unwrap().is_none());
}

#[actix_web::test]
async fn test_comment_moderation_scenario() {
    let (state, auth) = setup().await;
    let post = seed_post(&state, "Hello", Some(Utc::now())).await;
    let app = app!(state);
    let detail_url = post.absolute_url();

    let req = test::TestRequest::get()
        .uri(&format!("{detail_url}comment/"))
        .to_request();
    let view: FormView = test::call_and_read_body_json(&app, req).await;
    assert!(view.fields.iter().all(|f| f.value.is_empty()));

    let req = test::TestRequest::post()
        .uri(&format!("{detail_url}comment/"))
        .set_form([("author", "Alice"), ("text", "Nice!"), ("approved", "true")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), detail_url);

    let stored = state.comments.find_by_post(post.id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert!(!stored[0].approved);

    let req = test::TestRequest::get().uri(&detail_url).to_request();
    let page: PostDetailPage = test::call_and_read_body_json(&app, req).await;
    assert!(page.comments.is_empty());

    let req = test::TestRequest::get()
        .uri(&detail_url)
        .insert_header(auth.clone())
        .to_request();
    let page: PostDetailPage = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page.comments.len(), 1);
    assert!(!page.comments[0].approved);

    let req = test::TestRequest::post()
        .uri(&format!("/comment/{}/approve/", stored[0].id))
        .insert_header(auth)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), detail_url);

    let req = test::TestRequest::get().uri(&detail_url).to_request();
    let page: PostDetailPage = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page.comments.len(), 1);
    assert_eq!(page.comments[0].author, "Alice");
    assert!(page.comments[0].approved);
}

#[actix_web::test]
async fn test_blank_comment_rejected() {
    let (state, _) = setup().await;
    let post = seed_post(&state, "Hello", Some(Utc::now())).await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri(&format!("/post/{}/comment/", post.id))
        .set_form([("author", ""), ("text", "  ")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    assert!(state.comments.find_by_post(post.id).await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_comment_on_missing_post_is_404() {
    let (state, _) = setup().await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri(&format!("/post/{}/comment/", Uuid::new_v4()))
        .set_form([("author", "Alice"), ("text", "Hi")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_remove_comment_redirects_to_post() {
    let (state, auth) = setup().await;
    let post = seed_post(&state, "Hello", Some(Utc::now())).await;
    let comment = state
        .comments
        .save(Comment::new(post.id, "Spam".to_string(), "Buy now".to_string()))
        .await
        .unwrap();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri(&format!("/comment/{}/remove/", comment.id))
        .insert_header(auth.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), post.absolute_url());
    assert!(state.comments.find_by_id(comment.id).await.unwrap().is_none());

    let req = test::TestRequest::post()
        .uri(&format!("/comment/{}/remove/", comment.id))
        .insert_header(auth)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_protected_actions_redirect_to_login_without_mutation() {
    let (state, _) = setup().await;
    let post = seed_post(&state, "Draft", None).await;
    let comment = state
        .comments
        .save(Comment::new(post.id, "Alice".to_string(), "Hi".to_string()))
        .await
        .unwrap();
    let app = app!(state);

    let attempts = [
        test::TestRequest::post()
            .uri("/post/new/")
            .set_form([("title", "Sneaky"), ("text", "x")]),
        test::TestRequest::post()
            .uri(&format!("/post/{}/edit/", post.id))
            .set_form([("title", "Defaced"), ("text", "x")]),
        test::TestRequest::post().uri(&format!("/post/{}/remove/", post.id)),
        test::TestRequest::post().uri(&format!("/post/{}/publish/", post.id)),
        test::TestRequest::post().uri(&format!("/comment/{}/approve/", comment.id)),
        test::TestRequest::post().uri(&format!("/comment/{}/remove/", comment.id)),
        test::TestRequest::get().uri("/drafts/"),
    ];

    for attempt in attempts {
        let resp = test::call_service(&app, attempt.to_request()).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert!(location(&resp).starts_with("/login/?next=%2F"));
    }

    let stored = state.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored, post);
    let stored = state.comments.find_by_id(comment.id).await.unwrap().unwrap();
    assert!(!stored.approved);
    assert_eq!(state.posts.list_drafts().await.unwrap().len(), 1);
}

#[actix_web::test]
async fn test_moderation_actions_reject_get() {
    let (state, auth) = setup().await;
    let post = seed_post(&state, "Draft", None).await;
    let comment = state
        .comments
        .save(Comment::new(post.id, "Alice".to_string(), "Hi".to_string()))
        .await
        .unwrap();
    let app = app!(state);

    for uri in [
        format!("/post/{}/publish/", post.id),
        format!("/comment/{}/approve/", comment.id),
        format!("/comment/{}/remove/", comment.id),
    ] {
        let req = test::TestRequest::get()
            .uri(&uri)
            .insert_header(auth.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED, "{uri}");
    }

    let stored = state.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert!(stored.published_at.is_none());
    let stored = state.comments.find_by_id(comment.id).await.unwrap().unwrap();
    assert!(!stored.approved);
}

#[actix_web::test]
async fn test_login_redirect_keeps_next() {
    let (state, _) = setup().await;
    let app = app!(state);

    let req = test::TestRequest::get().uri("/drafts/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(location(&resp), "/login/?next=%2Fdrafts%2F");
}

#[actix_web::test]
async fn test_invalid_token_treated_as_anonymous() {
    let (state, _) = setup().await;
    let app = app!(state);

    let req = test::TestRequest::get()
        .uri("/drafts/")
        .insert_header((header::AUTHORIZATION, "Bearer forged"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
}

#[actix_web::test]
async fn test_unknown_or_malformed_post_is_404() {
    let (state, _) = setup().await;
    let app = app!(state);

    for uri in [format!("/post/{}/", Uuid::new_v4()), "/post/not-a-key/".to_string()] {
        let req = test::TestRequest::get().uri(&uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[actix_web::test]
async fn test_login_sets_session_cookie() {
    let state = AppState::in_memory(&test_config());
    crate::accounts::create_user(&state, "editor", "hunter22")
        .await
        .unwrap();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/login/")
        .set_form([("username", "editor"), ("password", "nope"), ("next", "/drafts/")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let req = test::TestRequest::post()
        .uri("/login/")
        .set_form([
            ("username", "editor"),
            ("password", "hunter22"),
            ("next", "/drafts/"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/drafts/");

    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .unwrap()
        .into_owned();

    let req = test::TestRequest::get()
        .uri("/drafts/")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_comment_submissions_are_rate_limited() {
    let mut config = test_config();
    config.comment_rate_limit = RateLimitConfig {
        max_requests: 1,
        window: Duration::from_secs(60),
    };
    let (state, _) = setup_with(config).await;
    let post = seed_post(&state, "Hello", Some(Utc::now())).await;
    let app = app!(state);
    let uri = format!("/post/{}/comment/", post.id);

    let req = test::TestRequest::post()
        .uri(&uri)
        .set_form([("author", "Alice"), ("text", "first")])
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::SEE_OTHER);

    let req = test::TestRequest::post()
        .uri(&uri)
        .set_form([("author", "Alice"), ("text", "second")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(resp.headers().contains_key(header::RETRY_AFTER));

    // Reading the form is not throttled.
    let req = test::TestRequest::get().uri(&uri).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_forwarded_for_does_not_reset_comment_limit() {
    let mut config = test_config();
    config.comment_rate_limit = RateLimitConfig {
        max_requests: 1,
        window: Duration::from_secs(60),
    };
    let (state, _) = setup_with(config).await;
    let post = seed_post(&state, "Hello", Some(Utc::now())).await;
    let app = app!(state);
    let uri = format!("/post/{}/comment/", post.id);

    let mut codes = Vec::new();
    for i in 0..5 {
        let req = test::TestRequest::post()
            .uri(&uri)
            .peer_addr(format!("198.51.100.4:{}", 50000 + i).parse().unwrap())
            .insert_header(("x-forwarded-for", format!("203.0.113.{i}")))
            .set_form([("author", "Spammer"), ("text", "buy now")])
            .to_request();
        codes.push(test::call_service(&app, req).await.status());
    }

    assert_eq!(codes[0], StatusCode::SEE_OTHER);
    assert!(codes[1..].iter().all(|c| *c == StatusCode::TOO_MANY_REQUESTS));
    assert_eq!(state.comments.find_by_post(post.id).await.unwrap().len(), 1);

    // Another peer keeps its own budget.
    let req = test::TestRequest::post()
        .uri(&uri)
        .peer_addr("198.51.100.5:50000".parse().unwrap())
        .set_form([("author", "Bob"), ("text", "hello")])
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::SEE_OTHER);
}

#[actix_web::test]
async fn test_forwarded_for_keys_clients_behind_trusted_proxy() {
    let mut config = test_config();
    config.comment_rate_limit = RateLimitConfig {
        max_requests: 1,
        window: Duration::from_secs(60),
    };
    config.trust_forwarded_for = true;
    let (state, _) = setup_with(config).await;
    let post = seed_post(&state, "Hello", Some(Utc::now())).await;
    let app = app!(state);
    let uri = format!("/post/{}/comment/", post.id);

    let send = |client: &'static str| {
        test::TestRequest::post()
            .uri(&uri)
            .peer_addr("10.0.0.2:8000".parse().unwrap())
            .insert_header(("x-forwarded-for", client))
            .set_form([("author", "Alice"), ("text", "hi")])
            .to_request()
    };

    assert_eq!(test::call_service(&app, send("203.0.113.1")).await.status(), StatusCode::SEE_OTHER);
    assert_eq!(test::call_service(&app, send("203.0.113.2")).await.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        test::call_service(&app, send("203.0.113.1")).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[actix_web::test]
async fn test_about_page() {
    let (state, _) = setup().await;
    let app = app!(state);

    let req = test::TestRequest::get().uri("/about/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

//! Login and logout.

use actix_web::cookie::{Cookie, SameSite, time::Duration};
use actix_web::{HttpResponse, http::header, web};
use serde::Deserialize;

use blog_shared::pages::{AuthResponse, LoginPage};
use blog_shared::{Form, LoginForm};

use super::render::redirect;
use crate::middleware::auth::SESSION_COOKIE;
use crate::middleware::error::AppResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Only same-site paths are followed after login.
fn safe_next(next: Option<&str>) -> Option<String> {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//"))
        .map(str::to_string)
}

/// GET /login/
pub async fn login_form(query: web::Query<NextQuery>) -> HttpResponse {
    HttpResponse::Ok().json(LoginPage {
        form: LoginForm::default().render(),
        next: safe_next(query.next.as_deref()),
    })
}

/// POST /login/ - check credentials, start a session and go to `next`.
pub async fn login(state: web::Data<AppState>, form: web::Form<LoginForm>) -> AppResult<HttpResponse> {
    let form = form.into_inner();
    let next = safe_next(form.next.as_deref());

    let form = match form.check() {
        Ok(form) => form,
        Err(view) => {
            return Ok(HttpResponse::UnprocessableEntity().json(LoginPage { form: view, next }));
        }
    };

    let user = state.users.find_by_username(&form.username).await?;
    let verified = match &user {
        Some(user) => state.passwords.verify(&form.password, &user.password_hash)?,
        None => false,
    };

    let user = match user {
        Some(user) if verified => user,
        _ => {
            tracing::warn!(username = %form.username, "Failed login attempt");
            let view = form
                .render()
                .with_error("Please enter a correct username and password.");
            return Ok(HttpResponse::UnprocessableEntity().json(LoginPage { form: view, next }));
        }
    };

    let token = state.tokens.generate_token(user.id, &user.username)?;
    let expires_in = state.tokens.expiration_seconds();

    let cookie = Cookie::build(SESSION_COOKIE, token.clone())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(expires_in))
        .finish();

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(HttpResponse::SeeOther()
        .cookie(cookie)
        .insert_header((header::LOCATION, next.as_deref().unwrap_or("/")))
        .json(AuthResponse {
            access_token: token,
            token_type: "Bearer".to_string(),
            expires_in: expires_in.max(0) as u64,
        }))
}

/// /logout/ - drop the session cookie.
pub async fn logout() -> HttpResponse {
    let mut cookie = Cookie::new(SESSION_COOKIE, "");
    cookie.set_path("/");
    cookie.make_removal();

    let mut response = redirect("/");
    if let Err(e) = response.add_cookie(&cookie) {
        tracing::error!("Failed to clear session cookie: {}", e);
    }
    response
}

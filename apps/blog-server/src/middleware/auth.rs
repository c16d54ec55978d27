//! Session extractors.
//!
//! A request is authenticated by a `Bearer` token or by the session cookie
//! set at login. Protected handlers take [`Identity`]; when it is missing the
//! client is redirected to the login page.

use actix_web::{
    FromRequest, HttpRequest, HttpResponse, ResponseError, dev::Payload,
    http::{StatusCode, header},
    web,
};
use std::fmt;
use std::future::{Ready, ready};

use blog_core::ports::{AuthError, TokenClaims};

use crate::state::AppState;

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "blog_session";

/// The logged-in user.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: uuid::Uuid,
    pub username: String,
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
        }
    }
}

/// Rejection for protected handlers: redirect to the login page.
#[derive(Debug)]
pub struct LoginRequired {
    pub location: String,
}

impl LoginRequired {
    fn for_request(req: &HttpRequest, login_url: &str) -> Self {
        let next = match req.uri().path_and_query() {
            Some(pq) => pq.as_str(),
            None => req.path(),
        };
        Self {
            location: format!("{}?next={}", login_url, urlencoding::encode(next)),
        }
    }
}

impl fmt::Display for LoginRequired {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "login required, redirecting to {}", self.location)
    }
}

impl ResponseError for LoginRequired {
    fn status_code(&self) -> StatusCode {
        StatusCode::FOUND
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::Found()
            .insert_header((header::LOCATION, self.location.as_str()))
            .finish()
    }
}

fn authenticate(req: &HttpRequest, state: &AppState) -> Result<Identity, AuthError> {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    let token = bearer
        .or_else(|| req.cookie(SESSION_COOKIE).map(|c| c.value().to_string()))
        .ok_or(AuthError::MissingAuth)?;

    state.tokens.validate_token(&token).map(Identity::from)
}

fn app_state(req: &HttpRequest) -> Option<&web::Data<AppState>> {
    let state = req.app_data::<web::Data<AppState>>();
    if state.is_none() {
        tracing::error!("AppState not found in app data");
    }
    state
}

impl FromRequest for Identity {
    type Error = LoginRequired;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(state) = app_state(req) else {
            return ready(Err(LoginRequired::for_request(req, "/login/")));
        };

        match authenticate(req, state) {
            Ok(identity) => ready(Ok(identity)),
            Err(e) => {
                tracing::debug!(path = req.path(), reason = %e, "Unauthenticated request");
                ready(Err(LoginRequired::for_request(req, &state.login_url)))
            }
        }
    }
}

/// Identity when present; never rejects.
pub struct OptionalIdentity(pub Option<Identity>);

impl FromRequest for OptionalIdentity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let identity = app_state(req).and_then(|state| authenticate(req, state).ok());
        ready(Ok(OptionalIdentity(identity)))
    }
}

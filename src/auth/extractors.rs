use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use super::{
    claims::Claims,
    session::{SessionKeys, SESSION_COOKIE},
};
use crate::{cookies, state::AppState};

/// Claims of a valid session cookie, if the request carries one.
pub struct CurrentSession(pub Option<Claims>);

impl CurrentSession {
    pub fn is_authenticated(&self) -> bool {
        self.0.is_some()
    }

    fn from_headers(headers: &HeaderMap, keys: &SessionKeys) -> Self {
        let claims = cookies::find(headers, SESSION_COOKIE).and_then(|t| keys.verify(&t).ok());
        CurrentSession(claims)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let keys = SessionKeys::from_ref(state);
        Ok(CurrentSession::from_headers(&parts.headers, &keys))
    }
}

/// Paths that need a logged-in admin.
pub fn is_protected(path: &str) -> bool {
    path == "/admin" || path.starts_with("/admin/") || path == "/logout"
}

/// Login URL that brings the user back to `target` afterwards.
pub fn login_redirect_url(target: &str) -> String {
    let next: String = url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
    format!("/login?next={next}")
}

/// Only same-site absolute paths are followed after login. Control
/// characters cannot appear in a `Location` header.
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| {
        n.starts_with('/')
            && !n.starts_with("//")
            && !n.contains('\\')
            && !n.chars().any(char::is_control)
    })
}

/// Gate for the admin area: without a valid session the request is
/// redirected to the login page, remembering where it was going.
pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if !is_protected(req.uri().path()) {
        return next.run(req).await;
    }

    let keys = SessionKeys::from_ref(&state);
    if CurrentSession::from_headers(req.headers(), &keys).is_authenticated() {
        return next.run(req).await;
    }

    let target = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/admin");
    debug!(%target, "unauthenticated admin request");
    Redirect::to(&login_redirect_url(target)).into_response()
}

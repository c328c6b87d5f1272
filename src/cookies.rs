use axum::http::{header::COOKIE, HeaderMap};
use cookie::{Cookie, SameSite};

/// Value of the first request cookie called `name`, percent-decoded.
pub fn find(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(Cookie::split_parse_encoded)
        .filter_map(Result::ok)
        .find(|c| c.name() == name)
        .map(|c| c.value().to_string())
}

/// `Set-Cookie` value for an HttpOnly, same-site cookie scoped to the site.
pub fn build(
    name: &'static str,
    value: String,
    max_age: time::Duration,
    secure: bool,
) -> String {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(max_age)
        .build()
        .encoded()
        .to_string()
}

/// `Set-Cookie` value that makes the browser drop `name`.
pub fn removal(name: &'static str) -> String {
    let mut c = Cookie::build((name, "")).path("/").build();
    c.make_removal();
    c.to_string()
}

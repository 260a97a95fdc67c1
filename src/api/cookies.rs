//! Token store: the session lives entirely in HTTP-only cookies.

use axum::http::{HeaderMap, header};

pub const ACCESS_COOKIE: &str = "spotify_access_token";
pub const REFRESH_COOKIE: &str = "spotify_refresh_token";
pub const VERIFIER_COOKIE: &str = "spotify_pkce_verifier";

/// Refresh tokens do not expire on their own; the cookie is capped at 30 days.
pub const REFRESH_MAX_AGE: u64 = 30 * 24 * 60 * 60;
pub const VERIFIER_MAX_AGE: u64 = 10 * 60;

/// Reads a cookie value from every `Cookie` header of the request.
///
/// Empty values count as absent, so a cleared cookie the browser still sends
/// does not look like a session.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value for a session cookie.
///
/// Production cookies need `SameSite=None` (which in turn requires `Secure`)
/// because the front end may be served from another origin.
pub fn set_cookie(name: &str, value: &str, max_age: u64, secure: bool) -> String {
    let mut cookie = format!("{}={}; Path=/; HttpOnly; Max-Age={}", name, value, max_age);
    if secure {
        cookie.push_str("; Secure; SameSite=None");
    } else {
        cookie.push_str("; SameSite=Lax");
    }
    cookie
}

pub fn clear_cookie(name: &str) -> String {
    format!("{}=; Path=/; HttpOnly; Max-Age=0", name)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn reads_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; spotify_access_token=abc=; other=1"),
        );
        assert_eq!(read_cookie(&headers, ACCESS_COOKIE).as_deref(), Some("abc="));
        assert_eq!(read_cookie(&headers, REFRESH_COOKIE), None);
    }

    #[test]
    fn reads_cookie_from_second_header() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1"));
        headers.append(header::COOKIE, HeaderValue::from_static("spotify_refresh_token=r"));
        assert_eq!(read_cookie(&headers, REFRESH_COOKIE).as_deref(), Some("r"));
    }

    #[test]
    fn empty_cookie_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("spotify_access_token="));
        assert_eq!(read_cookie(&headers, ACCESS_COOKIE), None);
    }

    #[test]
    fn cookie_attributes_follow_environment() {
        assert_eq!(
            set_cookie(ACCESS_COOKIE, "t", 3600, false),
            "spotify_access_token=t; Path=/; HttpOnly; Max-Age=3600; SameSite=Lax"
        );
        assert_eq!(
            set_cookie(ACCESS_COOKIE, "t", 3600, true),
            "spotify_access_token=t; Path=/; HttpOnly; Max-Age=3600; Secure; SameSite=None"
        );
        assert_eq!(
            clear_cookie(REFRESH_COOKIE),
            "spotify_refresh_token=; Path=/; HttpOnly; Max-Age=0"
        );
    }
}

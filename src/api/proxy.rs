use axum::{
    Json,
    body::Bytes,
    extract::{OriginalUri, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use crate::{
    api::cookies::{ACCESS_COOKIE, read_cookie},
    server::AppState,
    warning,
};

const PROXY_PREFIX: &str = "/api/spotify/";

/// Part of the request path after the proxy prefix, still percent-encoded.
pub fn forwarded_path(request_path: &str) -> &str {
    request_path.strip_prefix(PROXY_PREFIX).unwrap_or_default()
}

/// Joins the API base, the forwarded path and the untouched query string.
pub fn upstream_url(api_url: &str, path: &str, query: Option<&str>) -> String {
    let mut url = format!(
        "{}/{}",
        api_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(query);
    }
    url
}

/// `ANY /api/spotify/{*path}`: forwards the request to the Web API with the
/// access token from the session cookie.
pub async fn proxy(
    State(state): State<AppState>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(access_token) = read_cookie(&headers, ACCESS_COOKIE) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Not authenticated" })),
        )
            .into_response();
    };

    let path = forwarded_path(uri.path());
    let url = upstream_url(&state.settings.api_url, path, uri.query());
    let mut request = state
        .http
        .request(method.clone(), &url)
        .bearer_auth(access_token)
        .header(header::CONTENT_TYPE, "application/json");

    if method != Method::GET && method != Method::HEAD {
        request = if body.is_empty() {
            request.header(header::CONTENT_LENGTH, 0)
        } else {
            request.body(body)
        };
    }

    match request.send().await {
        Ok(response) => relay(response).await,
        Err(e) => {
            warning!("Spotify API error on {} {}: {}", method, path, e);
            failed()
        }
    }
}

fn failed() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Failed to fetch from Spotify" })),
    )
        .into_response()
}

/// Mirrors the upstream answer back to the browser.
async fn relay(response: reqwest::Response) -> Response {
    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        return StatusCode::NO_CONTENT.into_response();
    }
    if status == StatusCode::UNAUTHORIZED {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Token expired" })),
        )
            .into_response();
    }

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));
    let retry_after = response.headers().get(header::RETRY_AFTER).cloned();

    let bytes = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            warning!("Failed to read Spotify response: {}", e);
            return failed();
        }
    };

    let mut relayed = if bytes.is_empty() {
        (status, Json(json!({}))).into_response()
    } else {
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => (status, Json(value)).into_response(),
            Err(_) => (status, [(header::CONTENT_TYPE, content_type)], bytes).into_response(),
        }
    };

    // keep rate limit hints so the browser can back off
    if let Some(retry_after) = retry_after {
        relayed.headers_mut().insert(header::RETRY_AFTER, retry_after);
    }
    relayed
}

//! # Spotify Integration Module
//!
//! Client side of the Spotify accounts service and Web API as used by Spotdeck.
//! The web server only needs [`auth`] (the proxy forwards everything else
//! verbatim); the terminal client uses all of it.
//!
//! ```text
//! Server handlers / CLI commands
//!          ↓
//! Spotify Integration Layer
//!     ├── auth     (authorization code + PKCE, refresh)
//!     ├── player   (transport commands, devices, playback snapshot)
//!     └── library  (playlists, history, top items, browse)
//!          ↓
//! HTTP Layer (reqwest, JSON)
//! ```
//!
//! ## Rate limiting
//!
//! Every Web API call goes through [`send`], which retries `429 Too Many
//! Requests` after the `Retry-After` delay and `502 Bad Gateway` after a short
//! pause, giving up after [`MAX_ATTEMPTS`]. A `401` is reported as
//! [`ApiError::Unauthorized`] so callers can refresh and try again.

use std::{fmt, sync::OnceLock, time::Duration};

use reqwest::{Client, RequestBuilder, Response, StatusCode, header::HeaderMap};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::sleep;

use crate::{config, warning};

pub mod auth;
pub mod library;
pub mod player;

pub const MAX_ATTEMPTS: u32 = 3;
const BAD_GATEWAY_DELAY: Duration = Duration::from_secs(2);
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

#[derive(Debug)]
pub enum ApiError {
    Http(reqwest::Error),
    Unauthorized,
    Status(StatusCode, String),
    Decode(serde_json::Error),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Http(e) => write!(f, "request to Spotify failed: {}", e),
            ApiError::Unauthorized => write!(f, "access token expired or revoked"),
            ApiError::Status(status, message) => {
                write!(f, "Spotify answered {}: {}", status, message)
            }
            ApiError::Decode(e) => write!(f, "unexpected response from Spotify: {}", e),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Http(err)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err)
    }
}

/// Shared connection pool for outbound calls.
pub fn http_client() -> &'static Client {
    static CLIENT: OnceLock<Client> = OnceLock::new();
    CLIENT.get_or_init(Client::new)
}

/// Joins a Web API base URL and an endpoint path.
pub fn endpoint(base: &str, path: &str) -> String {
    format!(
        "{base}/{path}",
        base = base.trim_end_matches('/'),
        path = path.trim_start_matches('/')
    )
}

pub(crate) fn api_url(path: &str) -> String {
    endpoint(&config::spotify_apiurl(), path)
}

/// Sends a Web API request, retrying rate limited and bad gateway answers.
pub async fn send(request: RequestBuilder) -> Result<Response, ApiError> {
    let mut attempt = 1;

    loop {
        let Some(current) = request.try_clone() else {
            return check_status(request.send().await?).await;
        };

        let response = current.send().await?;
        let status = response.status();

        if attempt < MAX_ATTEMPTS {
            if status == StatusCode::TOO_MANY_REQUESTS {
                let wait = retry_after(response.headers());
                warning!("Rate limited by Spotify, retrying in {}s", wait.as_secs());
                sleep(wait).await;
                attempt += 1;
                continue;
            }
            if status == StatusCode::BAD_GATEWAY {
                sleep(BAD_GATEWAY_DELAY).await;
                attempt += 1;
                continue;
            }
        }

        return check_status(response).await;
    }
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status(status, error_message(&body)))
}

/// Delay requested by a `Retry-After` header, defaulting to one second.
pub fn retry_after(headers: &HeaderMap) -> Duration {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(1))
        .min(MAX_RETRY_AFTER)
}

/// Pulls the human readable message out of a Web API error body.
pub fn error_message(body: &str) -> String {
    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };

    json["error"]["message"]
        .as_str()
        .or_else(|| json["error_description"].as_str())
        .or_else(|| json["error"].as_str())
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}

pub(crate) async fn get_json<T: DeserializeOwned>(
    api: &str,
    token: &str,
    path: &str,
) -> Result<T, ApiError> {
    let request = http_client().get(endpoint(api, path)).bearer_auth(token);
    let response = send(request).await?;
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use reqwest::header::{HeaderValue, RETRY_AFTER};

    use super::*;

    #[test]
    fn retry_after_defaults_and_caps() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), Duration::from_secs(1));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        assert_eq!(retry_after(&headers), Duration::from_secs(7));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("3600"));
        assert_eq!(retry_after(&headers), MAX_RETRY_AFTER);
    }

    #[test]
    fn endpoint_joins_without_double_slashes() {
        assert_eq!(
            endpoint("http://localhost:9000/v1/", "/me/player"),
            "http://localhost:9000/v1/me/player"
        );
        assert_eq!(
            endpoint("https://api.spotify.com/v1", "me"),
            "https://api.spotify.com/v1/me"
        );
    }

    #[test]
    fn error_message_reads_web_api_and_accounts_shapes() {
        assert_eq!(
            error_message(r#"{"error":{"status":404,"message":"Player command failed: No active device found"}}"#),
            "Player command failed: No active device found"
        );
        assert_eq!(
            error_message(r#"{"error":"invalid_grant","error_description":"Invalid refresh token"}"#),
            "Invalid refresh token"
        );
        assert_eq!(error_message("Bad gateway"), "Bad gateway");
    }
}

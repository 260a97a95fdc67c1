use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Timelike;
use serde::Deserialize;
use serde_json::json;

use crate::{
    api::cookies::{ACCESS_COOKIE, read_cookie},
    management::library,
    server::AppState,
    spotify::ApiError,
    warning,
};

#[derive(Debug, Deserialize)]
pub struct HomeParams {
    /// Local hour of the browser; the server clock is used when absent.
    pub hour: Option<u32>,
}

fn api_error(err: ApiError) -> Response {
    match err {
        ApiError::Unauthorized => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Token expired" })),
        )
            .into_response(),
        other => {
            warning!("Library request failed: {}", other);
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": other.to_string() })),
            )
                .into_response()
        }
    }
}

fn not_authenticated() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "Not authenticated" })),
    )
        .into_response()
}

/// `GET /api/home`: greeting plus the personalised sections of the home page.
pub async fn home(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HomeParams>,
) -> Response {
    let Some(token) = read_cookie(&headers, ACCESS_COOKIE) else {
        return not_authenticated();
    };

    let hour = params
        .hour
        .filter(|h| *h < 24)
        .unwrap_or_else(|| chrono::Local::now().hour());

    match library::home_feed(&state.settings.api_url, &token, hour).await {
        Ok(feed) => Json(feed).into_response(),
        Err(e) => api_error(e),
    }
}

/// `GET /api/sidebar`: "Liked Songs" plus the user's playlists, recently played first.
pub async fn sidebar(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(token) = read_cookie(&headers, ACCESS_COOKIE) else {
        return not_authenticated();
    };

    match library::sidebar(&state.settings.api_url, &token).await {
        Ok(entries) => Json(entries).into_response(),
        Err(e) => api_error(e),
    }
}

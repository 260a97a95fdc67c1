use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, HeaderName, StatusCode, header},
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    api::cookies::{
        ACCESS_COOKIE, REFRESH_COOKIE, REFRESH_MAX_AGE, VERIFIER_COOKIE, VERIFIER_MAX_AGE,
        clear_cookie, read_cookie, set_cookie,
    },
    server::AppState,
    spotify::auth::{AuthError, authorize_url, exchange_code, refresh_token},
    types::Token,
    utils, warning,
};

type SetCookies = Vec<(HeaderName, String)>;

fn cookies(values: Vec<String>) -> AppendHeaders<SetCookies> {
    AppendHeaders(
        values
            .into_iter()
            .map(|value| (header::SET_COOKIE, value))
            .collect(),
    )
}

/// 302 to `location`, attaching the given `Set-Cookie` values.
fn found(location: &str, set: Vec<String>) -> Response {
    (
        StatusCode::FOUND,
        cookies(set),
        [(header::LOCATION, location.to_string())],
    )
        .into_response()
}

fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn error_redirect(state: &AppState, error: &str) -> Response {
    found(
        &format!(
            "{}/?error={}",
            state.settings.frontend_url,
            urlencoding::encode(error)
        ),
        Vec::new(),
    )
}

fn session_cookies(token: &Token, secure: bool) -> Vec<String> {
    vec![
        set_cookie(ACCESS_COOKIE, &token.access_token, token.expires_in, secure),
        set_cookie(REFRESH_COOKIE, &token.refresh_token, REFRESH_MAX_AGE, secure),
    ]
}

/// `GET /api/auth/login`: sends the browser to the consent page.
///
/// Without a client secret the login runs as PKCE and the verifier is parked
/// in a short-lived cookie until the callback.
pub async fn login(State(state): State<AppState>) -> Response {
    let oauth = &state.settings.oauth;
    if !oauth.uses_pkce() {
        return found(&authorize_url(oauth, None), Vec::new());
    }

    let verifier = utils::generate_code_verifier();
    let challenge = utils::generate_code_challenge(&verifier);
    found(
        &authorize_url(oauth, Some(&challenge)),
        vec![set_cookie(
            VERIFIER_COOKIE,
            &verifier,
            VERIFIER_MAX_AGE,
            state.settings.secure_cookies,
        )],
    )
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
}

/// `GET /api/auth/callback`: exchanges the code and stores the session cookies.
pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Response {
    if let Some(error) = params.error {
        return error_redirect(&state, &error);
    }
    let Some(code) = params.code else {
        return error_redirect(&state, "no_code");
    };

    let oauth = &state.settings.oauth;
    let verifier = if oauth.uses_pkce() {
        match read_cookie(&headers, VERIFIER_COOKIE) {
            Some(v) => Some(v),
            None => return error_redirect(&state, "missing_verifier"),
        }
    } else {
        None
    };

    match exchange_code(oauth, &code, verifier.as_deref()).await {
        Ok(token) => {
            let mut set = session_cookies(&token, state.settings.secure_cookies);
            if verifier.is_some() {
                set.push(clear_cookie(VERIFIER_COOKIE));
            }
            found(&format!("{}/", state.settings.frontend_url), set)
        }
        Err(AuthError::Rejected(code)) => error_redirect(&state, &code),
        Err(e) => {
            warning!("Token exchange error: {}", e);
            error_redirect(&state, "token_exchange_failed")
        }
    }
}

/// `POST /api/auth/refresh`: trades the refresh cookie for a new access cookie.
pub async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(current_refresh) = read_cookie(&headers, REFRESH_COOKIE) else {
        return json_error(StatusCode::UNAUTHORIZED, "No refresh token");
    };

    let secure = state.settings.secure_cookies;
    match refresh_token(&state.settings.oauth, &current_refresh).await {
        Ok(token) => {
            let mut set = vec![set_cookie(
                ACCESS_COOKIE,
                &token.access_token,
                token.expires_in,
                secure,
            )];
            // the old refresh token may stop working once a new one is issued
            if token.refresh_token != current_refresh {
                set.push(set_cookie(
                    REFRESH_COOKIE,
                    &token.refresh_token,
                    REFRESH_MAX_AGE,
                    secure,
                ));
            }
            (cookies(set), Json(json!({ "success": true }))).into_response()
        }
        Err(AuthError::Rejected(code)) => (
            StatusCode::UNAUTHORIZED,
            cookies(vec![clear_cookie(ACCESS_COOKIE), clear_cookie(REFRESH_COOKIE)]),
            Json(json!({ "error": code })),
        )
            .into_response(),
        Err(e) => {
            warning!("Token refresh error: {}", e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Refresh failed")
        }
    }
}

/// `POST /api/auth/logout`: drops the session cookies. Tokens are not revoked upstream.
pub async fn logout() -> Response {
    (
        cookies(vec![clear_cookie(ACCESS_COOKIE), clear_cookie(REFRESH_COOKIE)]),
        Json(json!({ "success": true })),
    )
        .into_response()
}

/// `GET /api/auth/status`: whether an access cookie is present. Not validated.
pub async fn status(headers: HeaderMap) -> Json<serde_json::Value> {
    let logged_in = read_cookie(&headers, ACCESS_COOKIE).is_some();
    Json(json!({ "loggedIn": logged_in }))
}

/// `GET /api/auth/token`: the raw access token for the Web Playback SDK,
/// which cannot read HTTP-only cookies itself.
pub async fn token(headers: HeaderMap) -> Response {
    match read_cookie(&headers, ACCESS_COOKIE) {
        Some(access_token) => Json(json!({ "access_token": access_token })).into_response(),
        None => json_error(StatusCode::UNAUTHORIZED, "Not authenticated"),
    }
}

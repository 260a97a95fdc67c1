use std::{path::PathBuf, sync::Arc};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, StatusCode, header},
};
use serde_json::Value;
use spotdeck::{
    config::{OAuthSettings, ServerSettings},
    server::{build_router, callback_router},
    types::PkceToken,
};
use tokio::sync::Mutex;
use tower::ServiceExt;

// Helper function to create settings that never reach a real Spotify host
fn test_settings(client_secret: Option<&str>) -> ServerSettings {
    ServerSettings {
        addr: "127.0.0.1:0".to_string(),
        oauth: OAuthSettings {
            client_id: "test-client".to_string(),
            client_secret: client_secret.map(str::to_string),
            redirect_uri: "http://127.0.0.1:3000/api/auth/callback".to_string(),
            scope: "streaming user-read-email".to_string(),
            auth_url: "https://accounts.example.test/authorize".to_string(),
            token_url: "http://127.0.0.1:9/api/token".to_string(),
        },
        api_url: "http://127.0.0.1:9/v1".to_string(),
        frontend_url: String::new(),
        secure_cookies: false,
        static_dir: PathBuf::from("does-not-exist"),
        cors_origins: vec!["http://localhost:3000".to_string()],
    }
}

fn app() -> Router {
    build_router(test_settings(Some("secret")))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn with_cookie(method: &str, uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_health() {
    let response = app().oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_status_without_cookie() {
    let response = app().oneshot(get("/api/auth/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["loggedIn"], false);
}

#[tokio::test]
async fn test_status_with_cookie() {
    let response = app()
        .oneshot(with_cookie(
            "GET",
            "/api/auth/status",
            "spotify_access_token=abc",
        ))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["loggedIn"], true);
}

#[tokio::test]
async fn test_token_requires_cookie() {
    let response = app().oneshot(get("/api/auth/token")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "Not authenticated");
}

#[tokio::test]
async fn test_token_returns_cookie_value() {
    let response = app()
        .oneshot(with_cookie(
            "GET",
            "/api/auth/token",
            "theme=dark; spotify_access_token=BQabc",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["access_token"], "BQabc");
}

#[tokio::test]
async fn test_logout_clears_both_cookies() {
    let response = app()
        .oneshot(with_cookie(
            "POST",
            "/api/auth/logout",
            "spotify_access_token=a; spotify_refresh_token=r",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 2);
    assert!(cookies.contains(&"spotify_access_token=; Path=/; HttpOnly; Max-Age=0".to_string()));
    assert!(cookies.contains(&"spotify_refresh_token=; Path=/; HttpOnly; Max-Age=0".to_string()));
    assert_eq!(json_body(response).await["success"], true);
}

#[tokio::test]
async fn test_refresh_without_cookie() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/refresh")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "No refresh token");
}

#[tokio::test]
async fn test_proxy_without_cookie() {
    let response = app()
        .oneshot(get("/api/spotify/me/player?market=DE"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "Not authenticated");
}

#[tokio::test]
async fn test_proxy_upstream_unreachable() {
    let response = app()
        .oneshot(with_cookie(
            "GET",
            "/api/spotify/me",
            "spotify_access_token=abc",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await["error"],
        "Failed to fetch from Spotify"
    );
}

#[tokio::test]
async fn test_home_and_sidebar_require_cookie() {
    for uri in ["/api/home", "/api/sidebar"] {
        let response = app().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
    }
}

#[tokio::test]
async fn test_login_with_client_secret() {
    let response = app().oneshot(get("/api/auth/login")).await.unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);

    let location = location(&response);
    assert!(location.starts_with("https://accounts.example.test/authorize?"));
    assert!(location.contains("client_id=test-client"));
    assert!(location.contains("response_type=code"));
    assert!(!location.contains("code_challenge"));
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn test_login_with_pkce() {
    let app = build_router(test_settings(None));
    let response = app.oneshot(get("/api/auth/login")).await.unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);

    let location = location(&response);
    assert!(location.contains("code_challenge_method=S256"));
    assert!(location.contains("code_challenge="));

    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with("spotify_pkce_verifier="));
    assert!(cookies[0].contains("HttpOnly"));
    assert!(cookies[0].contains("Max-Age=600"));
}

#[tokio::test]
async fn test_callback_without_code() {
    let response = app().oneshot(get("/api/auth/callback")).await.unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/?error=no_code");
}

#[tokio::test]
async fn test_callback_with_upstream_error() {
    let response = app()
        .oneshot(get("/api/auth/callback?error=access_denied"))
        .await
        .unwrap();
    assert_eq!(location(&response), "/?error=access_denied");
}

#[tokio::test]
async fn test_callback_error_is_percent_encoded() {
    let response = app()
        .oneshot(get("/api/auth/callback?error=a%20b%26c"))
        .await
        .unwrap();
    assert_eq!(location(&response), "/?error=a%20b%26c");
}

#[tokio::test]
async fn test_callback_pkce_without_verifier() {
    let app = build_router(test_settings(None));
    let response = app
        .oneshot(get("/api/auth/callback?code=abc"))
        .await
        .unwrap();
    assert_eq!(location(&response), "/?error=missing_verifier");
}

#[tokio::test]
async fn test_callback_exchange_failure() {
    let response = app()
        .oneshot(get("/api/auth/callback?code=abc"))
        .await
        .unwrap();
    assert_eq!(location(&response), "/?error=token_exchange_failed");
}

#[tokio::test]
async fn test_callback_redirects_to_frontend_url() {
    let mut settings = test_settings(Some("secret"));
    settings.frontend_url = "https://player.example.test".to_string();
    let response = build_router(settings)
        .oneshot(get("/api/auth/callback"))
        .await
        .unwrap();
    assert_eq!(
        location(&response),
        "https://player.example.test/?error=no_code"
    );
}

#[tokio::test]
async fn test_cors_preflight_allows_credentials() {
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/auth/status")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();

    let headers = response.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:3000"
    );
    assert_eq!(
        headers
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .unwrap(),
        "true"
    );
}

#[tokio::test]
async fn test_unknown_path_serves_index() {
    let dir = std::env::temp_dir().join(format!("spotdeck-static-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("index.html"), "<html>spotdeck</html>").unwrap();

    let mut settings = test_settings(Some("secret"));
    settings.static_dir = dir.clone();
    let response = build_router(settings)
        .oneshot(get("/playlist/37i9dQZF1DXcBWIGoYBM5M"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"<html>spotdeck</html>");

    std::fs::remove_dir_all(&dir).unwrap();
}

async fn text_body(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_terminal_callback_routes() {
    let shared: Arc<Mutex<Option<PkceToken>>> = Arc::new(Mutex::new(None));
    let oauth = test_settings(None).oauth;

    let response = callback_router(oauth.clone(), Arc::clone(&shared))
        .oneshot(get("/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = callback_router(oauth.clone(), Arc::clone(&shared))
        .oneshot(get("/callback?error=access_denied"))
        .await
        .unwrap();
    assert!(text_body(response).await.contains("cancelled"));

    // no login in progress, so there is no verifier to exchange the code with
    let response = callback_router(oauth, Arc::clone(&shared))
        .oneshot(get("/callback?code=abc"))
        .await
        .unwrap();
    assert!(text_body(response).await.contains("Missing PKCE code verifier"));
    assert!(shared.lock().await.is_none());
}

use std::sync::Arc;

use axum::{
    Extension, Router,
    http::{HeaderValue, Method, header},
    routing::{any, get, post},
};
use reqwest::Client;
use tokio::sync::Mutex;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::{ServeDir, ServeFile},
};

use crate::{
    Res, api,
    config::{OAuthSettings, ServerSettings},
    info,
    types::PkceToken,
};

/// Shared by every handler of the web server.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<ServerSettings>,
    pub http: Client,
}

impl AppState {
    pub fn new(settings: ServerSettings) -> Self {
        Self {
            settings: Arc::new(settings),
            http: Client::new(),
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Builds the web server: auth routes, Web API proxy, library endpoints and
/// the front end. Unknown paths serve `index.html` so client side routes
/// survive a reload.
pub fn build_router(settings: ServerSettings) -> Router {
    let static_dir = settings.static_dir.clone();
    let index = static_dir.join("index.html");
    let cors = cors_layer(&settings.cors_origins);
    let state = AppState::new(settings);

    Router::new()
        .route("/api/health", get(api::health))
        .route("/api/auth/login", get(api::login))
        .route("/api/auth/callback", get(api::callback))
        .route("/api/auth/refresh", post(api::refresh))
        .route("/api/auth/logout", post(api::logout))
        .route("/api/auth/status", get(api::status))
        .route("/api/auth/token", get(api::token))
        .route("/api/home", get(api::home))
        .route("/api/sidebar", get(api::sidebar))
        .route("/api/spotify/{*path}", any(api::proxy))
        .fallback_service(ServeDir::new(static_dir).fallback(ServeFile::new(index)))
        .layer(cors)
        .with_state(state)
}

pub async fn start_web_server(settings: ServerSettings) -> Res<()> {
    let addr = settings.addr.clone();
    if settings.oauth.uses_pkce() {
        info!("No client secret configured, logins use PKCE");
    }

    let app = build_router(settings);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Spotdeck running at http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Routes of the temporary server behind `spotdeck login`.
pub fn callback_router(settings: OAuthSettings, state: Arc<Mutex<Option<PkceToken>>>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/callback", get(api::pkce_callback))
        .layer(Extension(state))
        .layer(Extension(settings))
}

/// Serves the callback of `spotdeck login` until the process ends.
pub async fn start_callback_server(
    addr: &str,
    settings: OAuthSettings,
    state: Arc<Mutex<Option<PkceToken>>>,
) -> Res<()> {
    let app = callback_router(settings, state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

//! Configuration management for Spotdeck.
//!
//! This module handles loading and accessing configuration values from environment
//! variables and `.env` files. Values are read once into [`ServerSettings`] and
//! [`OAuthSettings`] at startup so request handlers never touch the environment.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. `.env` file in the working directory
//! 4. Application defaults (where applicable)

use std::{env, fmt, path::PathBuf};

pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:3000";
pub const DEFAULT_CLI_CALLBACK_ADDRESS: &str = "127.0.0.1:8888";
pub const DEFAULT_CLI_REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_STATIC_DIR: &str = "public";
pub const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";

/// Permissions requested from the user. `streaming` is what the Web Playback SDK needs.
pub const DEFAULT_SCOPE: &str = "playlist-read-private playlist-read-collaborative user-read-recently-played streaming user-read-playback-state user-modify-playback-state user-read-email user-read-private user-top-read";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(name) => write!(f, "{} must be set", name),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Loads environment variables from `.env` files.
///
/// Looks for `spotdeck/.env` in the platform-specific local data directory
/// first and then for a `.env` in the working directory. Neither file has to
/// exist; variables already present in the process environment always win.
///
/// # Directory Structure
///
/// - Linux: `~/.local/share/spotdeck/.env`
/// - macOS: `~/Library/Application Support/spotdeck/.env`
/// - Windows: `%LOCALAPPDATA%/spotdeck/.env`
///
/// # Errors
///
/// Returns an error string if the data directory cannot be created or an
/// existing `.env` file cannot be parsed.
pub async fn load_env() -> Result<(), String> {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("spotdeck/.env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if path.exists() {
        dotenv::from_path(&path).map_err(|e| format!("{}: {}", path.display(), e))?;
    }

    match dotenv::dotenv() {
        Ok(_) => Ok(()),
        Err(dotenv::Error::Io(_)) => Ok(()),
        Err(e) => Err(e.to_string()),
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn required_var(name: &'static str) -> Result<String, ConfigError> {
    optional_var(name).ok_or(ConfigError::Missing(name))
}

/// Returns the address the web server binds to (`SERVER_ADDRESS`).
pub fn server_addr() -> String {
    var_or("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS)
}

/// Returns the address of the temporary callback server used by `spotdeck login`.
pub fn cli_callback_addr() -> String {
    var_or("CLI_CALLBACK_ADDRESS", DEFAULT_CLI_CALLBACK_ADDRESS)
}

/// Returns the Spotify Web API base URL (`SPOTIFY_API_URL`).
///
/// Overridable so the client can be pointed at a local stand-in.
pub fn spotify_apiurl() -> String {
    var_or("SPOTIFY_API_URL", DEFAULT_API_URL)
        .trim_end_matches('/')
        .to_string()
}

/// Returns true when cookies must be issued with `Secure; SameSite=None`.
pub fn is_production() -> bool {
    matches!(optional_var("APP_ENV").as_deref(), Some("production"))
        || matches!(optional_var("NETLIFY").as_deref(), Some("true"))
}

/// Credentials and endpoints of the Spotify accounts service.
#[derive(Debug, Clone)]
pub struct OAuthSettings {
    pub client_id: String,
    /// Absent for public clients, which switches the flow to PKCE.
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub scope: String,
    pub auth_url: String,
    pub token_url: String,
}

impl OAuthSettings {
    /// Settings for the web server's login flow.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            client_id: required_var("SPOTIFY_CLIENT_ID")?,
            client_secret: optional_var("SPOTIFY_CLIENT_SECRET"),
            redirect_uri: required_var("SPOTIFY_REDIRECT_URI")?,
            scope: var_or("SPOTIFY_SCOPE", DEFAULT_SCOPE),
            auth_url: var_or("SPOTIFY_AUTH_URL", DEFAULT_AUTH_URL),
            token_url: var_or("SPOTIFY_TOKEN_URL", DEFAULT_TOKEN_URL),
        })
    }

    /// Settings for the terminal client. The CLI is a public client and always uses PKCE.
    pub fn for_cli() -> Result<Self, ConfigError> {
        Ok(Self {
            client_id: required_var("SPOTIFY_CLIENT_ID")?,
            client_secret: None,
            redirect_uri: var_or("CLI_REDIRECT_URI", DEFAULT_CLI_REDIRECT_URI),
            scope: var_or("SPOTIFY_SCOPE", DEFAULT_SCOPE),
            auth_url: var_or("SPOTIFY_AUTH_URL", DEFAULT_AUTH_URL),
            token_url: var_or("SPOTIFY_TOKEN_URL", DEFAULT_TOKEN_URL),
        })
    }

    pub fn uses_pkce(&self) -> bool {
        self.client_secret.is_none()
    }
}

/// Everything the web server needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: String,
    pub oauth: OAuthSettings,
    pub api_url: String,
    /// Prefix for post-login redirects. Empty means same origin.
    pub frontend_url: String,
    pub secure_cookies: bool,
    pub static_dir: PathBuf,
    pub cors_origins: Vec<String>,
}

impl ServerSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            addr: server_addr(),
            oauth: OAuthSettings::from_env()?,
            api_url: spotify_apiurl(),
            frontend_url: var_or("FRONTEND_URL", "")
                .trim_end_matches('/')
                .to_string(),
            secure_cookies: is_production(),
            static_dir: PathBuf::from(var_or("STATIC_DIR", DEFAULT_STATIC_DIR)),
            cors_origins: parse_origins(&var_or("CORS_ORIGINS", DEFAULT_CORS_ORIGINS)),
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().trim_end_matches('/').to_string())
        .filter(|o| !o.is_empty())
        .collect()
}

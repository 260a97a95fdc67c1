use std::path::PathBuf;

use chrono::Utc;

use crate::{config::OAuthSettings, spotify, types::Token};

/// Seconds before the reported expiry at which the cached token counts as stale.
const EXPIRY_MARGIN: u64 = 240;

/// Token cache of the terminal client.
///
/// The web server keeps tokens in cookies only; this file backed cache is what
/// `spotdeck login` writes and every other command reads.
pub struct TokenManager {
    token: Token,
    settings: OAuthSettings,
}

impl TokenManager {
    pub fn new(token: Token, settings: OAuthSettings) -> Self {
        TokenManager { token, settings }
    }

    pub async fn load(settings: OAuthSettings) -> Result<Self, String> {
        let path = Self::token_path();
        let content = async_fs::read_to_string(&path)
            .await
            .map_err(|e| e.to_string())?;
        let token: Token = serde_json::from_str(&content).map_err(|e| e.to_string())?;
        Ok(Self { token, settings })
    }

    pub async fn persist(&self) -> Result<(), String> {
        let path = Self::token_path();
        if let Some(parent) = path.parent() {
            async_fs::create_dir_all(parent)
                .await
                .map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(&self.token).map_err(|e| e.to_string())?;
        async_fs::write(path, json)
            .await
            .map_err(|e| e.to_string())
    }

    /// Removes the cached token. A missing file is not an error.
    pub async fn clear() -> Result<(), String> {
        match async_fs::remove_file(Self::token_path()).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.to_string()),
        }
    }

    /// Returns an access token, refreshing it first when it is about to expire.
    pub async fn get_valid_token(&mut self) -> Result<String, String> {
        if self.is_expired(Utc::now().timestamp() as u64) {
            self.force_refresh().await?;
        }

        Ok(self.token.access_token.clone())
    }

    /// Refreshes unconditionally, e.g. after the Web API answered 401.
    pub async fn force_refresh(&mut self) -> Result<(), String> {
        let new_token = spotify::auth::refresh_token(&self.settings, &self.token.refresh_token)
            .await
            .map_err(|e| e.to_string())?;
        self.token = new_token;
        self.persist().await
    }

    pub fn is_expired(&self, now: u64) -> bool {
        let expires_at = self.token.obtained_at + self.token.expires_in;
        now + EXPIRY_MARGIN >= expires_at
    }

    fn token_path() -> PathBuf {
        let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("spotdeck/cache/token.json");
        path
    }

    pub fn current_token(&self) -> &Token {
        &self.token
    }
}

//! # CLI Module
//!
//! Command implementations of the `spotdeck` binary: the web server itself and
//! a terminal remote that drives the same Spotify account.
//!
//! ## Command Categories
//!
//! ### Server
//!
//! - [`serve`] - Runs the same-origin web server (auth shim, proxy, front end)
//!
//! ### Authentication
//!
//! - [`auth`] - Terminal login through PKCE and a temporary callback server
//! - [`logout`] - Forgets the cached terminal token
//!
//! ### Playback
//!
//! - [`now_playing`] - Current track with extrapolated progress, optionally live
//! - [`play`], [`pause`], [`resume`], [`toggle`], [`next`], [`previous`]
//! - [`seek`], [`shuffle`], [`repeat`], [`volume`]
//! - [`devices`], [`transfer`] - Playback targets
//!
//! ### Library
//!
//! - [`playlists`] - Playlists with recently played ones first
//! - [`recent`] - Listening history
//! - [`home`] - The home feed sections
//!
//! ## Token handling
//!
//! Every Spotify command goes through [`with_token`]: the cached token is
//! refreshed when it is about to expire and once more if Spotify still
//! answers 401, then the command is retried a single time.
//!
//! ## Usage Patterns
//!
//! ```bash
//! spotdeck login
//! spotdeck play spotify:playlist:37i9dQZF1DXcBWIGoYBM5M --offset 3
//! spotdeck now --follow
//! spotdeck serve
//! ```

use crate::{
    config::OAuthSettings,
    error,
    management::TokenManager,
    spotify::ApiError,
};

mod auth;
mod library;
mod player;
mod serve;

pub use auth::{auth, logout};
pub use library::{home, playlists, recent};
pub use player::{
    devices, next, now_playing, pause, play, previous, repeat, resume, seek, shuffle, toggle,
    transfer, volume,
};
pub use serve::serve;

async fn load_token_manager() -> TokenManager {
    let settings = match OAuthSettings::for_cli() {
        Ok(s) => s,
        Err(e) => error!("{}", e),
    };

    match TokenManager::load(settings).await {
        Ok(t) => t,
        Err(e) => error!(
            "Failed to load token. Please run spotdeck login\n Error: {}",
            e
        ),
    }
}

/// Runs `op` with a valid access token, refreshing and retrying once on 401.
pub async fn with_token<T>(
    mut op: impl AsyncFnMut(String) -> Result<T, ApiError>,
) -> Result<T, ApiError> {
    let mut token_mgr = load_token_manager().await;
    let token = match token_mgr.get_valid_token().await {
        Ok(t) => t,
        Err(e) => error!(
            "Failed to refresh token. Please run spotdeck login\n Error: {}",
            e
        ),
    };

    match op(token).await {
        Err(ApiError::Unauthorized) => {
            if let Err(e) = token_mgr.force_refresh().await {
                error!(
                    "Session expired. Please run spotdeck login\n Error: {}",
                    e
                );
            }
            op(token_mgr.current_token().access_token.clone()).await
        }
        other => other,
    }
}

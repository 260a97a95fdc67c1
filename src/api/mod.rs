//! # API Module
//!
//! HTTP handlers of the Spotdeck server. The browser talks to these endpoints
//! only; it never sees a client secret and never calls Spotify's accounts
//! service itself.
//!
//! ## Endpoints
//!
//! ### Authentication (`/api/auth`)
//!
//! - [`login`] - Redirects to Spotify's consent page (PKCE when no client secret is configured)
//! - [`callback`] - Exchanges the authorization code and stores the token cookies
//! - [`refresh`] - Trades the refresh cookie for a new access cookie
//! - [`logout`] - Clears the token cookies
//! - [`status`] - Reports whether an access cookie is present
//! - [`token`] - Hands the raw access token to the Web Playback SDK
//!
//! ### Web API proxy
//!
//! - [`proxy`] - Forwards `/api/spotify/{*path}` with the cookie's access token
//!
//! ### Library
//!
//! - [`home`] - Greeting and home page sections
//! - [`sidebar`] - Playlists ordered by recent listening
//!
//! ### Monitoring
//!
//! - [`health`] - Status, timestamp and version
//!
//! ### Terminal login
//!
//! - [`pkce_callback`] - Callback of the temporary server started by `spotdeck login`
//!
//! ## Session model
//!
//! The server keeps no session state. Access and refresh tokens live in
//! HTTP-only cookies (see [`cookies`]); token expiry is discovered when
//! Spotify answers 401, which the proxy reports as `{"error":"Token expired"}`
//! so the front end can call [`refresh`] and retry.

pub mod cookies;

mod auth;
mod health;
mod home;
mod local;
mod proxy;

pub use auth::{callback, login, logout, refresh, status, token};
pub use health::health;
pub use home::{home, sidebar};
pub use local::pkce_callback;
pub use proxy::{proxy, upstream_url};

mod auth;
pub mod library;
mod playback;

pub use auth::TokenManager;
pub use playback::{PlaybackState, PlaybackSync, PlayerErrorKind, PlayerEvent, SyncOutcome};

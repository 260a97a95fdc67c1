use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tabled::Tabled;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    pub scope: String,
    pub expires_in: u64,
    pub obtained_at: u64,
}

#[derive(Debug, Clone)]
pub struct PkceToken {
    pub code_verifier: String,
    pub token: Option<Token>,
}

/// Raw body of the accounts service token endpoint. Errors come back in the same shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub token_type: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
    pub scope: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub height: Option<u32>,
    pub width: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimplifiedArtist {
    pub id: Option<String>,
    pub name: String,
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Album {
    /// Missing for the album of a local file.
    pub id: Option<String>,
    pub name: String,
    pub uri: Option<String>,
    #[serde(default)]
    pub album_type: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub artists: Vec<SimplifiedArtist>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: Option<String>,
    pub name: String,
    pub uri: String,
    pub duration_ms: u64,
    #[serde(default)]
    pub artists: Vec<SimplifiedArtist>,
    pub album: Option<Album>,
}

impl Track {
    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistOwner {
    pub id: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub uri: String,
    pub description: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<Image>>,
    pub owner: Option<PlaylistOwner>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icons: Vec<Image>,
}

/// Offset based page of results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paging<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    #[serde(rename = "type")]
    pub kind: String,
    pub uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayHistory {
    pub track: Track,
    pub played_at: String,
    pub context: Option<Context>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentlyPlayedResponse {
    pub items: Vec<PlayHistory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturedPlaylistsResponse {
    pub message: Option<String>,
    pub playlists: Paging<Playlist>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReleasesResponse {
    pub albums: Paging<Album>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoriesResponse {
    pub categories: Paging<Category>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub is_active: bool,
    pub volume_percent: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevicesResponse {
    pub devices: Vec<Device>,
}

/// Body of `GET /me/player`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentPlayback {
    pub device: Option<Device>,
    #[serde(default)]
    pub shuffle_state: bool,
    #[serde(default)]
    pub repeat_state: RepeatMode,
    /// Server side unix timestamp (ms) at which the snapshot was taken.
    pub timestamp: Option<i64>,
    pub progress_ms: Option<u64>,
    pub is_playing: bool,
    pub item: Option<Track>,
    pub context: Option<Context>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    #[default]
    Off,
    Context,
    Track,
}

impl RepeatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepeatMode::Off => "off",
            RepeatMode::Context => "context",
            RepeatMode::Track => "track",
        }
    }
}

impl fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RepeatMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(RepeatMode::Off),
            "context" => Ok(RepeatMode::Context),
            "track" => Ok(RepeatMode::Track),
            other => Err(format!(
                "invalid repeat mode '{}', expected off, context or track",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlayOffset {
    Position { position: u32 },
    Uri { uri: String },
}

/// Body of `PUT /me/player/play`. An empty body resumes the current context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uris: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<PlayOffset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_ms: Option<u64>,
}

impl PlayRequest {
    /// Plays a single track URI, or a context (album, playlist, artist) starting at `offset`.
    ///
    /// Without a URI the request is empty and resumes the current context.
    pub fn for_uri(uri: Option<String>, offset: Option<u32>, position_ms: Option<u64>) -> Self {
        let Some(uri) = uri else {
            return Self {
                position_ms,
                ..Self::default()
            };
        };

        if uri.starts_with("spotify:track:") || uri.starts_with("spotify:episode:") {
            Self {
                uris: Some(vec![uri]),
                position_ms,
                ..Self::default()
            }
        } else {
            Self {
                context_uri: Some(uri),
                offset: offset.map(|position| PlayOffset::Position { position }),
                position_ms,
                ..Self::default()
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferPlaybackRequest {
    pub device_ids: Vec<String>,
    pub play: bool,
}

/// Kind of a recently played context worth surfacing on the home feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextKind {
    Playlist,
    Album,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentContext {
    pub kind: ContextKind,
    pub uri: String,
    pub id: String,
}

/// A resolved entry of the "Recently Played" section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RecentItem {
    Playlist(Playlist),
    Album(Album),
}

impl RecentItem {
    pub fn name(&self) -> &str {
        match self {
            RecentItem::Playlist(p) => &p.name,
            RecentItem::Album(a) => &a.name,
        }
    }

    pub fn uri(&self) -> &str {
        match self {
            RecentItem::Playlist(p) => &p.uri,
            RecentItem::Album(a) => a.uri.as_deref().unwrap_or_default(),
        }
    }
}

/// Sidebar entry: either the fixed "Liked Songs" collection or a user playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidebarEntry {
    pub name: String,
    pub link: Option<String>,
    pub uri: Option<String>,
}

/// Home page payload. Empty sections are left out of the JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeFeed {
    pub greeting: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recently_played: Vec<RecentItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub top_tracks: Vec<Track>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub top_artists: Vec<Artist>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub featured: Vec<Playlist>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub new_releases: Vec<Album>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<Category>,
}

#[derive(Tabled)]
pub struct PlaylistTableRow {
    pub name: String,
    pub owner: String,
    pub uri: String,
}

#[derive(Tabled)]
pub struct RecentTableRow {
    pub played_at: String,
    pub track: String,
    pub artists: String,
}

#[derive(Tabled)]
pub struct DeviceTableRow {
    pub active: String,
    pub name: String,
    #[tabled(rename = "type")]
    pub kind: String,
    pub volume: String,
    pub id: String,
}

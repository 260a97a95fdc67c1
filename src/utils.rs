use std::collections::HashSet;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};

use crate::types::{ContextKind, PlayHistory, Playlist, RecentContext, SidebarEntry};

pub const LIKED_SONGS_URL: &str = "https://open.spotify.com/collection/tracks";
pub const MAX_RECENT_CONTEXTS: usize = 6;

pub fn generate_code_verifier() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(128)
        .map(char::from)
        .collect()
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Extracts the id from a `spotify:<type>:<id>` URI.
pub fn id_from_uri(uri: &str) -> Option<&str> {
    let parts: Vec<&str> = uri.split(':').collect();
    match parts.as_slice() {
        [_, _, id] if !id.is_empty() => Some(*id),
        _ => None,
    }
}

pub fn greeting(hour: u32) -> &'static str {
    if hour < 12 {
        "Good morning"
    } else if hour < 18 {
        "Good afternoon"
    } else {
        "Good evening"
    }
}

/// Formats milliseconds as `m:ss`, or `h:mm:ss` past the hour.
pub fn format_duration_ms(ms: u64) -> String {
    let total_secs = ms / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Parses `90`, `1:30` or `1:02:03` into milliseconds.
pub fn parse_position(input: &str) -> Result<u64, String> {
    let invalid = || format!("invalid position '{}'", input);
    let parts: Vec<&str> = input.trim().split(':').collect();
    if parts.is_empty() || parts.len() > 3 {
        return Err(invalid());
    }

    let mut secs: u64 = 0;
    for (i, part) in parts.iter().enumerate() {
        let value: u64 = part.parse().map_err(|_| invalid())?;
        if i > 0 && value >= 60 {
            return Err(invalid());
        }
        secs = secs
            .checked_mul(60)
            .and_then(|s| s.checked_add(value))
            .ok_or_else(invalid)?;
    }

    secs.checked_mul(1000).ok_or_else(invalid)
}

/// Playlist context URIs in the order they were last played, without duplicates.
pub fn recent_playlist_uris(history: &[PlayHistory]) -> Vec<String> {
    let mut seen = HashSet::new();
    history
        .iter()
        .filter_map(|item| item.context.as_ref())
        .filter(|ctx| ctx.kind == "playlist")
        .filter(|ctx| seen.insert(ctx.uri.clone()))
        .map(|ctx| ctx.uri.clone())
        .collect()
}

/// Moves recently played playlists to the front in history order.
///
/// The sort is stable, so playlists that were not played recently keep their
/// original relative order.
pub fn sort_playlists_by_recent(playlists: &mut [Playlist], recent_uris: &[String]) {
    playlists.sort_by_key(|p| {
        recent_uris
            .iter()
            .position(|uri| uri == &p.uri)
            .unwrap_or(usize::MAX)
    });
}

pub fn sidebar_entries(playlists: &[Playlist]) -> Vec<SidebarEntry> {
    let mut entries = vec![SidebarEntry {
        name: "Liked Songs".to_string(),
        link: Some(LIKED_SONGS_URL.to_string()),
        uri: None,
    }];
    entries.extend(playlists.iter().map(|p| SidebarEntry {
        name: p.name.clone(),
        link: p.external_urls.spotify.clone(),
        uri: Some(p.uri.clone()),
    }));
    entries
}

/// Distinct playlist and album contexts from the listening history, newest first.
pub fn recent_contexts(history: &[PlayHistory], max: usize) -> Vec<RecentContext> {
    let mut seen = HashSet::new();
    let mut contexts = Vec::new();

    for ctx in history.iter().filter_map(|item| item.context.as_ref()) {
        if contexts.len() >= max {
            break;
        }

        let kind = match ctx.kind.as_str() {
            "playlist" => ContextKind::Playlist,
            "album" => ContextKind::Album,
            _ => continue,
        };

        let Some(id) = id_from_uri(&ctx.uri) else {
            continue;
        };

        if !seen.insert(ctx.uri.clone()) {
            continue;
        }

        contexts.push(RecentContext {
            kind,
            uri: ctx.uri.clone(),
            id: id.to_string(),
        });
    }

    contexts
}

/// Renders a fixed-width text bar for a 0.0..=1.0 ratio.
pub fn progress_bar(ratio: f64, width: usize) -> String {
    let ratio = if ratio.is_nan() { 0.0 } else { ratio.clamp(0.0, 1.0) };
    let filled = (ratio * width as f64).round() as usize;
    format!("{}{}", "━".repeat(filled), "─".repeat(width - filled))
}

use crate::{
    spotify::{ApiError, library},
    types::{ContextKind, HomeFeed, RecentContext, RecentItem, SidebarEntry},
    utils, warning,
};

const SECTION_LIMIT: u32 = 6;
const HISTORY_LIMIT: u32 = 50;
const TOP_TIME_RANGE: &str = "short_term";

/// Keeps a failed home section from failing the whole feed.
///
/// Only an expired token is propagated, since every other section would fail
/// the same way and the caller has to refresh first.
fn section<T>(name: &str, result: Result<Vec<T>, ApiError>) -> Result<Vec<T>, ApiError> {
    match result {
        Ok(items) => Ok(items),
        Err(ApiError::Unauthorized) => Err(ApiError::Unauthorized),
        Err(e) => {
            warning!("Could not load {}: {}", name, e);
            Ok(Vec::new())
        }
    }
}

/// User playlists for the sidebar, recently played ones first, behind "Liked Songs".
pub async fn sidebar(api: &str, token: &str) -> Result<Vec<SidebarEntry>, ApiError> {
    let (playlists, history) = tokio::join!(
        library::get_playlists(api, token, 50),
        library::get_recently_played(api, token, HISTORY_LIMIT)
    );

    let mut playlists = playlists?;
    match history {
        Ok(history) => {
            let recent = utils::recent_playlist_uris(&history);
            utils::sort_playlists_by_recent(&mut playlists, &recent);
        }
        Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized),
        Err(e) => warning!("Could not fetch recently played: {}", e),
    }

    Ok(utils::sidebar_entries(&playlists))
}

/// Resolves contexts to full playlists/albums concurrently, dropping failed lookups.
pub async fn resolve_contexts(
    api: &str,
    token: &str,
    contexts: Vec<RecentContext>,
) -> Vec<RecentItem> {
    let mut handles = Vec::new();

    for ctx in contexts {
        let api = api.to_string();
        let token = token.to_string();
        let handle = tokio::spawn(async move {
            match ctx.kind {
                ContextKind::Playlist => library::get_playlist(&api, &token, &ctx.id)
                    .await
                    .map(RecentItem::Playlist),
                ContextKind::Album => library::get_album(&api, &token, &ctx.id)
                    .await
                    .map(RecentItem::Album),
            }
        });
        handles.push(handle);
    }

    let mut items = Vec::new();
    for handle in handles {
        match handle.await {
            Ok(Ok(item)) => items.push(item),
            Ok(Err(e)) => warning!("Failed to resolve recent context: {}", e),
            Err(e) => warning!("Task join error: {}", e),
        }
    }
    items
}

pub async fn recently_played(api: &str, token: &str) -> Result<Vec<RecentItem>, ApiError> {
    let history = library::get_recently_played(api, token, HISTORY_LIMIT).await?;
    let contexts = utils::recent_contexts(&history, utils::MAX_RECENT_CONTEXTS);
    if contexts.is_empty() {
        return Ok(Vec::new());
    }
    Ok(resolve_contexts(api, token, contexts).await)
}

/// Assembles the home page sections concurrently.
///
/// `api` is the Web API base URL, `hour` the local hour used for the greeting.
pub async fn home_feed(api: &str, token: &str, hour: u32) -> Result<HomeFeed, ApiError> {
    let (recent, top_tracks, top_artists, featured, new_releases, categories) = tokio::join!(
        recently_played(api, token),
        library::get_top_tracks(api, token, SECTION_LIMIT, TOP_TIME_RANGE),
        library::get_top_artists(api, token, SECTION_LIMIT, TOP_TIME_RANGE),
        library::get_featured_playlists(api, token, SECTION_LIMIT),
        library::get_new_releases(api, token, SECTION_LIMIT),
        library::get_categories(api, token, SECTION_LIMIT),
    );

    let (featured_message, featured) = match featured {
        Ok(res) => (res.message, Ok(res.playlists.items)),
        Err(e) => (None, Err(e)),
    };

    Ok(HomeFeed {
        greeting: utils::greeting(hour).to_string(),
        recently_played: section("recently played", recent)?,
        top_tracks: section("top tracks", top_tracks)?,
        top_artists: section("top artists", top_artists)?,
        featured: section("featured playlists", featured)?,
        featured_message,
        new_releases: section("new releases", new_releases)?,
        categories: section("categories", categories)?,
    })
}

use crate::{
    spotify::{ApiError, get_json},
    types::{
        Album, Artist, CategoriesResponse, Category, FeaturedPlaylistsResponse,
        NewReleasesResponse, Paging, PlayHistory, Playlist, RecentlyPlayedResponse, Track,
    },
};

pub const PLAYLIST_SUMMARY_FIELDS: &str = "id,name,uri,images,owner,description,external_urls";

pub async fn get_playlists(api: &str, token: &str, limit: u32) -> Result<Vec<Playlist>, ApiError> {
    let page: Paging<Playlist> =
        get_json(api, token, &format!("me/playlists?limit={}", limit.min(50))).await?;
    Ok(page.items)
}

/// Listening history, newest first. The Web API caps the window at 50 items.
pub async fn get_recently_played(
    api: &str,
    token: &str,
    limit: u32,
) -> Result<Vec<PlayHistory>, ApiError> {
    let res: RecentlyPlayedResponse = get_json(
        api,
        token,
        &format!("me/player/recently-played?limit={}", limit.min(50)),
    )
    .await?;
    Ok(res.items)
}

pub async fn get_top_artists(
    api: &str,
    token: &str,
    limit: u32,
    time_range: &str,
) -> Result<Vec<Artist>, ApiError> {
    let page: Paging<Artist> = get_json(
        api,
        token,
        &format!("me/top/artists?limit={}&time_range={}", limit, time_range),
    )
    .await?;
    Ok(page.items)
}

pub async fn get_top_tracks(
    api: &str,
    token: &str,
    limit: u32,
    time_range: &str,
) -> Result<Vec<Track>, ApiError> {
    let page: Paging<Track> = get_json(
        api,
        token,
        &format!("me/top/tracks?limit={}&time_range={}", limit, time_range),
    )
    .await?;
    Ok(page.items)
}

pub async fn get_featured_playlists(
    api: &str,
    token: &str,
    limit: u32,
) -> Result<FeaturedPlaylistsResponse, ApiError> {
    get_json(api, token, &format!("browse/featured-playlists?limit={}", limit)).await
}

pub async fn get_new_releases(api: &str, token: &str, limit: u32) -> Result<Vec<Album>, ApiError> {
    let res: NewReleasesResponse =
        get_json(api, token, &format!("browse/new-releases?limit={}", limit)).await?;
    Ok(res.albums.items)
}

pub async fn get_categories(
    api: &str,
    token: &str,
    limit: u32,
) -> Result<Vec<Category>, ApiError> {
    let res: CategoriesResponse =
        get_json(api, token, &format!("browse/categories?limit={}", limit)).await?;
    Ok(res.categories.items)
}

pub async fn get_playlist(api: &str, token: &str, id: &str) -> Result<Playlist, ApiError> {
    get_json(
        api,
        token,
        &format!("playlists/{}?fields={}", id, PLAYLIST_SUMMARY_FIELDS),
    )
    .await
}

pub async fn get_album(api: &str, token: &str, id: &str) -> Result<Album, ApiError> {
    get_json(api, token, &format!("albums/{}", id)).await
}

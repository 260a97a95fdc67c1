use reqwest::{Method, StatusCode};

use crate::{
    config,
    spotify::{ApiError, api_url, get_json, http_client, send},
    types::{
        CurrentPlayback, Device, DevicesResponse, PlayRequest, RepeatMode,
        TransferPlaybackRequest,
    },
};

/// Builds a `/me/player/...` path with the optional query pairs and `device_id`.
pub fn player_path(endpoint: &str, params: &[(&str, String)], device_id: Option<&str>) -> String {
    let mut query: Vec<String> = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect();
    if let Some(id) = device_id {
        query.push(format!("device_id={}", id));
    }

    let base = if endpoint.is_empty() {
        "me/player".to_string()
    } else {
        format!("me/player/{}", endpoint)
    };

    if query.is_empty() {
        base
    } else {
        format!("{}?{}", base, query.join("&"))
    }
}

async fn command(
    token: &str,
    method: Method,
    path: String,
    body: Option<&impl serde::Serialize>,
) -> Result<(), ApiError> {
    let mut request = http_client()
        .request(method, api_url(&path))
        .bearer_auth(token);
    request = match body {
        Some(body) => request.json(body),
        // the Web API rejects body-less PUT/POST without a length
        None => request.header(reqwest::header::CONTENT_LENGTH, 0),
    };

    send(request).await?;
    Ok(())
}

/// Fetches the current playback snapshot. `None` when nothing is playing (204).
pub async fn current_playback(token: &str) -> Result<Option<CurrentPlayback>, ApiError> {
    let request = http_client()
        .get(api_url("me/player?additional_types=track"))
        .bearer_auth(token);
    let response = send(request).await?;
    if response.status() == StatusCode::NO_CONTENT {
        return Ok(None);
    }

    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_slice(&bytes)?))
}

pub async fn devices(token: &str) -> Result<Vec<Device>, ApiError> {
    let res: DevicesResponse = get_json(&config::spotify_apiurl(), token, "me/player/devices").await?;
    Ok(res.devices)
}

/// Starts playback of a context, explicit tracks, or resumes when `request` is empty.
pub async fn play(
    token: &str,
    request: &PlayRequest,
    device_id: Option<&str>,
) -> Result<(), ApiError> {
    let path = player_path("play", &[], device_id);
    if request == &PlayRequest::default() {
        command(token, Method::PUT, path, None::<&PlayRequest>).await
    } else {
        command(token, Method::PUT, path, Some(request)).await
    }
}

pub async fn resume(token: &str, device_id: Option<&str>) -> Result<(), ApiError> {
    play(token, &PlayRequest::default(), device_id).await
}

pub async fn pause(token: &str, device_id: Option<&str>) -> Result<(), ApiError> {
    let path = player_path("pause", &[], device_id);
    command(token, Method::PUT, path, None::<&PlayRequest>).await
}

pub async fn seek(token: &str, position_ms: u64, device_id: Option<&str>) -> Result<(), ApiError> {
    let path = player_path("seek", &[("position_ms", position_ms.to_string())], device_id);
    command(token, Method::PUT, path, None::<&PlayRequest>).await
}

pub async fn next(token: &str, device_id: Option<&str>) -> Result<(), ApiError> {
    let path = player_path("next", &[], device_id);
    command(token, Method::POST, path, None::<&PlayRequest>).await
}

pub async fn previous(token: &str, device_id: Option<&str>) -> Result<(), ApiError> {
    let path = player_path("previous", &[], device_id);
    command(token, Method::POST, path, None::<&PlayRequest>).await
}

pub async fn shuffle(token: &str, state: bool, device_id: Option<&str>) -> Result<(), ApiError> {
    let path = player_path("shuffle", &[("state", state.to_string())], device_id);
    command(token, Method::PUT, path, None::<&PlayRequest>).await
}

pub async fn repeat(
    token: &str,
    mode: RepeatMode,
    device_id: Option<&str>,
) -> Result<(), ApiError> {
    let path = player_path("repeat", &[("state", mode.to_string())], device_id);
    command(token, Method::PUT, path, None::<&PlayRequest>).await
}

pub async fn set_volume(token: &str, percent: u8, device_id: Option<&str>) -> Result<(), ApiError> {
    let percent = percent.min(100);
    let path = player_path("volume", &[("volume_percent", percent.to_string())], device_id);
    command(token, Method::PUT, path, None::<&PlayRequest>).await
}

/// Moves playback to another device, optionally starting it there.
pub async fn transfer(token: &str, device_id: &str, play: bool) -> Result<(), ApiError> {
    let body = TransferPlaybackRequest {
        device_ids: vec![device_id.to_string()],
        play,
    };
    command(token, Method::PUT, player_path("", &[], None), Some(&body)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_path_appends_params_then_device() {
        assert_eq!(player_path("pause", &[], None), "me/player/pause");
        assert_eq!(
            player_path("seek", &[("position_ms", "1500".to_string())], Some("dev1")),
            "me/player/seek?position_ms=1500&device_id=dev1"
        );
        assert_eq!(player_path("", &[], Some("dev1")), "me/player?device_id=dev1");
    }
}

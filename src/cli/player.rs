use std::time::{Duration, Instant};

use chrono::Utc;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tabled::Table;

use crate::{
    cli::with_token,
    error, info,
    management::{PlaybackSync, SyncOutcome},
    spotify::{ApiError, player},
    success,
    types::{CurrentPlayback, DeviceTableRow, PlayRequest, RepeatMode},
    utils, warning,
};

const RESYNC_INTERVAL: Duration = Duration::from_secs(5);
const MIN_POLL_GAP: Duration = Duration::from_secs(2);
const TICK: Duration = Duration::from_millis(500);

fn report(result: Result<(), ApiError>, done: &str, action: &str) {
    match result {
        Ok(()) => success!("{}", done),
        Err(e) => error!("Failed to {}: {}", action, e),
    }
}

async fn fetch_playback() -> Result<Option<CurrentPlayback>, ApiError> {
    with_token(async |token| player::current_playback(&token).await).await
}

pub async fn play(
    uri: Option<String>,
    offset: Option<u32>,
    position_ms: Option<u64>,
    device: Option<String>,
) {
    let request = PlayRequest::for_uri(uri, offset, position_ms);
    let result =
        with_token(async |token| player::play(&token, &request, device.as_deref()).await).await;
    report(result, "Playback started", "start playback");
}

pub async fn pause(device: Option<String>) {
    let result = with_token(async |token| player::pause(&token, device.as_deref()).await).await;
    report(result, "Paused", "pause playback");
}

pub async fn resume(device: Option<String>) {
    let result = with_token(async |token| player::resume(&token, device.as_deref()).await).await;
    report(result, "Resumed", "resume playback");
}

pub async fn toggle(device: Option<String>) {
    let playing = match fetch_playback().await {
        Ok(snapshot) => snapshot.is_some_and(|s| s.is_playing),
        Err(e) => error!("Failed to read playback state: {}", e),
    };

    if playing {
        pause(device).await;
    } else {
        resume(device).await;
    }
}

pub async fn next(device: Option<String>) {
    let result = with_token(async |token| player::next(&token, device.as_deref()).await).await;
    report(result, "Skipped to next track", "skip");
}

pub async fn previous(device: Option<String>) {
    let result =
        with_token(async |token| player::previous(&token, device.as_deref()).await).await;
    report(result, "Back to previous track", "go back");
}

pub async fn seek(position_ms: u64, device: Option<String>) {
    let result =
        with_token(async |token| player::seek(&token, position_ms, device.as_deref()).await)
            .await;
    report(
        result,
        &format!("Seeked to {}", utils::format_duration_ms(position_ms)),
        "seek",
    );
}

pub async fn shuffle(state: bool, device: Option<String>) {
    let result =
        with_token(async |token| player::shuffle(&token, state, device.as_deref()).await).await;
    report(
        result,
        &format!("Shuffle {}", if state { "on" } else { "off" }),
        "set shuffle",
    );
}

pub async fn repeat(mode: RepeatMode, device: Option<String>) {
    let result =
        with_token(async |token| player::repeat(&token, mode, device.as_deref()).await).await;
    report(result, &format!("Repeat {}", mode), "set repeat mode");
}

pub async fn volume(percent: u8, device: Option<String>) {
    let result =
        with_token(async |token| player::set_volume(&token, percent, device.as_deref()).await)
            .await;
    report(result, &format!("Volume set to {}%", percent), "set volume");
}

pub async fn devices() {
    let devices = match with_token(async |token| player::devices(&token).await).await {
        Ok(d) => d,
        Err(e) => error!("Failed to list devices: {}", e),
    };

    if devices.is_empty() {
        info!("No devices available. Open Spotify or the web player first.");
        return;
    }

    let rows: Vec<DeviceTableRow> = devices
        .into_iter()
        .map(|d| DeviceTableRow {
            active: if d.is_active { "*".to_string() } else { String::new() },
            name: d.name,
            kind: d.kind,
            volume: d
                .volume_percent
                .map(|v| format!("{}%", v))
                .unwrap_or_default(),
            id: d.id.unwrap_or_default(),
        })
        .collect();

    println!("{}", Table::new(rows));
}

pub async fn transfer(device_id: String, play: bool) {
    let result = with_token(async |token| player::transfer(&token, &device_id, play).await).await;
    report(result, &format!("Playback moved to {}", device_id), "transfer playback");
}

fn describe(sync: &PlaybackSync) -> Option<String> {
    let state = sync.state()?;
    Some(format!(
        "{} - {}",
        state.track_name.as_deref().unwrap_or(&state.track_uri),
        state.artists.as_deref().unwrap_or_default()
    ))
}

/// Prints the current track, or follows it live with a progress bar until Ctrl-C.
pub async fn now_playing(follow: bool) {
    let snapshot = match fetch_playback().await {
        Ok(s) => s,
        Err(e) => error!("Failed to read playback state: {}", e),
    };

    let mut sync = PlaybackSync::new();
    sync.apply_snapshot(snapshot.as_ref(), Utc::now());

    if !follow {
        print_playback(&sync, snapshot.as_ref());
        return;
    }

    follow_playback(sync).await;
}

fn print_playback(sync: &PlaybackSync, snapshot: Option<&CurrentPlayback>) {
    let (Some(state), Some(title)) = (sync.state(), describe(sync)) else {
        info!("Nothing is playing");
        return;
    };

    let now = Utc::now();
    info!("{}", title.bold());
    println!(
        "{} {} {} / {}",
        if state.paused { "⏸" } else { "▶" },
        utils::progress_bar(state.progress_at(now), 30),
        utils::format_duration_ms(state.position_at(now)),
        utils::format_duration_ms(state.duration_ms())
    );

    if let Some(snapshot) = snapshot {
        let device = snapshot
            .device
            .as_ref()
            .map(|d| d.name.as_str())
            .unwrap_or("unknown device");
        println!(
            "on {} · shuffle {} · repeat {}",
            device,
            if snapshot.shuffle_state { "on" } else { "off" },
            snapshot.repeat_state
        );
    }
}

fn render(pb: &ProgressBar, sync: &PlaybackSync) {
    let Some(state) = sync.state() else {
        pb.set_length(1);
        pb.set_position(0);
        pb.set_message("nothing playing");
        return;
    };

    let now = Utc::now();
    let position = state.position_at(now);
    pb.set_length(state.duration_ms().max(1));
    pb.set_position(position);
    pb.set_message(format!(
        "{} {} / {}",
        if state.paused { "⏸" } else { "▶" },
        utils::format_duration_ms(position),
        utils::format_duration_ms(state.duration_ms())
    ));
}

/// Polls a snapshot every few seconds (or when the track ran out) and
/// extrapolates the position in between.
async fn follow_playback(mut sync: PlaybackSync) {
    let pb = ProgressBar::new(1);
    pb.set_style(
        ProgressStyle::with_template("{bar:40.green/white} {msg}")
            .unwrap()
            .progress_chars("━╸─"),
    );
    if let Some(title) = describe(&sync) {
        pb.println(format!("{}", title.bold()));
    }

    let mut last_poll = Instant::now();
    let mut ticker = tokio::time::interval(TICK);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                pb.finish_and_clear();
                return;
            }
            _ = ticker.tick() => {
                let since_poll = last_poll.elapsed();
                let due = since_poll >= RESYNC_INTERVAL
                    || (since_poll >= MIN_POLL_GAP && sync.needs_resync(Utc::now(), RESYNC_INTERVAL));

                if due {
                    last_poll = Instant::now();
                    match fetch_playback().await {
                        Ok(snapshot) => {
                            let outcome = sync.apply_snapshot(snapshot.as_ref(), Utc::now());
                            if outcome == (SyncOutcome::StateUpdated { track_changed: true }) {
                                if let Some(title) = describe(&sync) {
                                    pb.println(format!("{}", title.bold()));
                                }
                            }
                        }
                        Err(e) => pb.suspend(|| warning!("Failed to refresh playback state: {}", e)),
                    }
                }

                render(&pb, &sync);
            }
        }
    }
}

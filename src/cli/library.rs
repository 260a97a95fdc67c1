use std::time::Duration;

use chrono::{Local, Timelike};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tabled::Table;

use crate::{
    cli::with_token,
    config, error, info,
    management::library as feed,
    spotify::library,
    types::{HomeFeed, PlaylistTableRow, RecentTableRow},
    utils,
};

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb
}

pub async fn playlists() {
    let pb = spinner("Fetching playlists...");
    let api = config::spotify_apiurl();
    let result = with_token(async |token| {
        let (playlists, history) = tokio::join!(
            library::get_playlists(&api, &token, 50),
            library::get_recently_played(&api, &token, 50)
        );
        let mut playlists = playlists?;
        let recent = utils::recent_playlist_uris(&history.unwrap_or_default());
        utils::sort_playlists_by_recent(&mut playlists, &recent);
        Ok(playlists)
    })
    .await;
    pb.finish_and_clear();

    let playlists = match result {
        Ok(p) => p,
        Err(e) => error!("Failed to fetch playlists: {}", e),
    };

    if playlists.is_empty() {
        info!("No playlists found");
        return;
    }

    let rows: Vec<PlaylistTableRow> = playlists
        .into_iter()
        .map(|p| PlaylistTableRow {
            owner: p
                .owner
                .and_then(|o| o.display_name.or(Some(o.id)))
                .unwrap_or_default(),
            name: p.name,
            uri: p.uri,
        })
        .collect();

    println!("{}", Table::new(rows));
}

pub async fn recent(limit: u32) {
    let pb = spinner("Fetching listening history...");
    let api = config::spotify_apiurl();
    let result = with_token(async |token| {
        library::get_recently_played(&api, &token, limit.min(50)).await
    })
    .await;
    pb.finish_and_clear();

    let history = match result {
        Ok(h) => h,
        Err(e) => error!("Failed to fetch recently played tracks: {}", e),
    };

    if history.is_empty() {
        info!("Nothing played recently");
        return;
    }

    let rows: Vec<RecentTableRow> = history
        .into_iter()
        .map(|item| RecentTableRow {
            played_at: item.played_at,
            artists: item.track.artist_names(),
            track: item.track.name,
        })
        .collect();

    println!("{}", Table::new(rows));
}

pub async fn home() {
    let hour = Local::now().hour();
    let pb = spinner("Building home feed...");
    let api = config::spotify_apiurl();
    let result = with_token(async |token| feed::home_feed(&api, &token, hour).await).await;
    pb.finish_and_clear();

    match result {
        Ok(home) => print_home(&home),
        Err(e) => error!("Failed to build home feed: {}", e),
    }
}

fn print_section(title: &str, lines: impl Iterator<Item = String>) {
    let lines: Vec<String> = lines.collect();
    if lines.is_empty() {
        return;
    }
    println!("\n{}", title.bold());
    for line in lines {
        println!("  {}", line);
    }
}

fn print_home(home: &HomeFeed) {
    println!("{}", home.greeting.bold().green());

    print_section(
        "Recently played",
        home.recently_played
            .iter()
            .map(|item| format!("{}  {}", item.name(), item.uri().dimmed())),
    );
    print_section(
        "Your top tracks",
        home.top_tracks
            .iter()
            .map(|t| format!("{} - {}", t.name, t.artist_names())),
    );
    print_section(
        "Your top artists",
        home.top_artists.iter().map(|a| a.name.clone()),
    );
    print_section(
        home.featured_message.as_deref().unwrap_or("Featured playlists"),
        home.featured
            .iter()
            .map(|p| format!("{}  {}", p.name, p.uri.dimmed())),
    );
    print_section(
        "New releases",
        home.new_releases.iter().map(|a| {
            let artists = a
                .artists
                .iter()
                .map(|ar| ar.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            format!("{} - {}", a.name, artists)
        }),
    );
    print_section(
        "Browse categories",
        home.categories.iter().map(|c| c.name.clone()),
    );
}

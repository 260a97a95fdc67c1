use spotdeck::types::{
    Context, ContextKind, ExternalUrls, PlayHistory, PlayOffset, PlayRequest, Playlist, Track,
};
use spotdeck::utils::*;

// Helper function to create a test playlist
fn create_test_playlist(id: &str, name: &str) -> Playlist {
    Playlist {
        id: id.to_string(),
        name: name.to_string(),
        uri: format!("spotify:playlist:{}", id),
        description: None,
        images: None,
        owner: None,
        external_urls: ExternalUrls {
            spotify: Some(format!("https://open.spotify.com/playlist/{}", id)),
        },
    }
}

// Helper function to create a play history entry with an optional context
fn create_test_history(track: &str, context: Option<(&str, &str)>) -> PlayHistory {
    PlayHistory {
        track: Track {
            id: Some(track.to_string()),
            name: track.to_string(),
            uri: format!("spotify:track:{}", track),
            duration_ms: 180_000,
            artists: vec![],
            album: None,
        },
        played_at: "2024-05-01T10:00:00Z".to_string(),
        context: context.map(|(kind, uri)| Context {
            kind: kind.to_string(),
            uri: uri.to_string(),
        }),
    }
}

#[test]
fn test_generate_code_verifier() {
    let verifier = generate_code_verifier();

    // Should be exactly 128 characters
    assert_eq!(verifier.len(), 128);

    // Should contain only alphanumeric characters
    assert!(verifier.chars().all(|c| c.is_ascii_alphanumeric()));

    // Two generated verifiers should be different
    let verifier2 = generate_code_verifier();
    assert_ne!(verifier, verifier2);
}

#[test]
fn test_generate_code_challenge() {
    // RFC 7636 appendix B
    let challenge = generate_code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk");
    assert_eq!(challenge, "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");

    // Should be base64-encoded (URL-safe, no padding)
    let challenge = generate_code_challenge(&generate_code_verifier());
    assert_eq!(challenge.len(), 43);
    assert!(
        challenge
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    );
}

#[test]
fn test_id_from_uri() {
    assert_eq!(id_from_uri("spotify:playlist:37i9dQZF1DXcBWIGoYBM5M"), Some("37i9dQZF1DXcBWIGoYBM5M"));
    assert_eq!(id_from_uri("spotify:album:4aawyAB9vmqN3uQ7FjRGTy"), Some("4aawyAB9vmqN3uQ7FjRGTy"));

    // Malformed URIs have no id
    assert_eq!(id_from_uri("spotify:album:"), None);
    assert_eq!(id_from_uri("spotify:album"), None);
    assert_eq!(id_from_uri("spotify:user:me:collection"), None);
    assert_eq!(id_from_uri(""), None);
}

#[test]
fn test_greeting() {
    assert_eq!(greeting(0), "Good morning");
    assert_eq!(greeting(11), "Good morning");
    assert_eq!(greeting(12), "Good afternoon");
    assert_eq!(greeting(17), "Good afternoon");
    assert_eq!(greeting(18), "Good evening");
    assert_eq!(greeting(23), "Good evening");
}

#[test]
fn test_format_duration_ms() {
    assert_eq!(format_duration_ms(0), "0:00");
    assert_eq!(format_duration_ms(59_999), "0:59");
    assert_eq!(format_duration_ms(215_000), "3:35");
    assert_eq!(format_duration_ms(3_723_000), "1:02:03");
}

#[test]
fn test_parse_position() {
    assert_eq!(parse_position("90"), Ok(90_000));
    assert_eq!(parse_position("1:30"), Ok(90_000));
    assert_eq!(parse_position(" 1:02:03 "), Ok(3_723_000));
    assert_eq!(parse_position("0"), Ok(0));

    assert!(parse_position("").is_err());
    assert!(parse_position("1:60").is_err());
    assert!(parse_position("a:10").is_err());
    assert!(parse_position("1:2:3:4").is_err());
    assert!(parse_position("-5").is_err());
}

#[test]
fn test_parse_position_overflow() {
    assert!(parse_position("18446744073709551615").is_err());
    assert!(parse_position("18446744073709551:00").is_err());
    assert!(parse_position("99999999999999999:00:00").is_err());
    // largest whole second count that still fits in milliseconds
    assert_eq!(
        parse_position("18446744073709551"),
        Ok(18_446_744_073_709_551_000)
    );
}

#[test]
fn test_sort_playlists_by_recent() {
    let mut playlists = vec![
        create_test_playlist("a", "Alpha"),
        create_test_playlist("b", "Beta"),
        create_test_playlist("c", "Gamma"),
        create_test_playlist("d", "Delta"),
    ];
    let recent = vec![
        "spotify:playlist:c".to_string(),
        "spotify:playlist:a".to_string(),
    ];

    sort_playlists_by_recent(&mut playlists, &recent);

    let names: Vec<&str> = playlists.iter().map(|p| p.name.as_str()).collect();
    // Recently played first in history order, the rest keep their order
    assert_eq!(names, vec!["Gamma", "Alpha", "Beta", "Delta"]);
}

#[test]
fn test_recent_playlist_uris() {
    let history = vec![
        create_test_history("t1", Some(("playlist", "spotify:playlist:x"))),
        create_test_history("t2", Some(("album", "spotify:album:y"))),
        create_test_history("t3", None),
        create_test_history("t4", Some(("playlist", "spotify:playlist:z"))),
        create_test_history("t5", Some(("playlist", "spotify:playlist:x"))),
    ];

    assert_eq!(
        recent_playlist_uris(&history),
        vec!["spotify:playlist:x", "spotify:playlist:z"]
    );
}

#[test]
fn test_sidebar_entries() {
    let entries = sidebar_entries(&[create_test_playlist("a", "Alpha")]);

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].name, "Liked Songs");
    assert_eq!(entries[0].link.as_deref(), Some(LIKED_SONGS_URL));
    assert_eq!(entries[0].uri, None);
    assert_eq!(entries[1].name, "Alpha");
    assert_eq!(entries[1].uri.as_deref(), Some("spotify:playlist:a"));
    assert_eq!(
        entries[1].link.as_deref(),
        Some("https://open.spotify.com/playlist/a")
    );

    // Liked Songs is always present
    assert_eq!(sidebar_entries(&[]).len(), 1);
}

#[test]
fn test_recent_contexts() {
    let history = vec![
        create_test_history("t1", Some(("playlist", "spotify:playlist:p1"))),
        create_test_history("t2", Some(("playlist", "spotify:playlist:p1"))),
        create_test_history("t3", Some(("artist", "spotify:artist:ar1"))),
        create_test_history("t4", None),
        create_test_history("t5", Some(("album", "spotify:album:al1"))),
        create_test_history("t6", Some(("album", "spotify:album:"))),
    ];

    let contexts = recent_contexts(&history, MAX_RECENT_CONTEXTS);

    assert_eq!(contexts.len(), 2);
    assert_eq!(contexts[0].kind, ContextKind::Playlist);
    assert_eq!(contexts[0].id, "p1");
    assert_eq!(contexts[1].kind, ContextKind::Album);
    assert_eq!(contexts[1].uri, "spotify:album:al1");
}

#[test]
fn test_recent_contexts_limit() {
    let history: Vec<PlayHistory> = (0..10)
        .map(|i| {
            let uri = format!("spotify:playlist:p{}", i);
            let mut item = create_test_history("t", None);
            item.context = Some(Context {
                kind: "playlist".to_string(),
                uri,
            });
            item
        })
        .collect();

    let contexts = recent_contexts(&history, MAX_RECENT_CONTEXTS);
    assert_eq!(contexts.len(), 6);
    assert_eq!(contexts[5].id, "p5");
}

#[test]
fn test_progress_bar() {
    assert_eq!(progress_bar(0.0, 4), "────");
    assert_eq!(progress_bar(0.5, 4), "━━──");
    assert_eq!(progress_bar(1.0, 4), "━━━━");
    // Out of range ratios are clamped
    assert_eq!(progress_bar(2.0, 4), "━━━━");
    assert_eq!(progress_bar(f64::NAN, 4), "────");
}

#[test]
fn test_play_request_for_uri() {
    let track = PlayRequest::for_uri(Some("spotify:track:abc".to_string()), Some(3), None);
    assert_eq!(track.uris, Some(vec!["spotify:track:abc".to_string()]));
    assert_eq!(track.context_uri, None);
    assert_eq!(track.offset, None);

    let context = PlayRequest::for_uri(
        Some("spotify:playlist:xyz".to_string()),
        Some(3),
        Some(1000),
    );
    assert_eq!(context.context_uri.as_deref(), Some("spotify:playlist:xyz"));
    assert_eq!(context.offset, Some(PlayOffset::Position { position: 3 }));
    assert_eq!(context.position_ms, Some(1000));

    // No URI resumes, an empty body serializes to {}
    let resume = PlayRequest::for_uri(None, None, None);
    assert_eq!(resume, PlayRequest::default());
    assert_eq!(serde_json::to_string(&resume).unwrap(), "{}");
}

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::types::CurrentPlayback;

/// Transport and position of the current track as of the last sync.
///
/// Never persisted; rebuilt from player events or a `GET /me/player` snapshot.
/// The position between syncs is extrapolated from wall-clock time, frozen
/// while paused and clamped to the track duration.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub track_uri: String,
    pub track_name: Option<String>,
    pub artists: Option<String>,
    position_ms: u64,
    duration_ms: u64,
    pub paused: bool,
    pub synced_at: DateTime<Utc>,
}

impl PlaybackState {
    pub fn new(
        track_uri: impl Into<String>,
        position_ms: u64,
        duration_ms: u64,
        paused: bool,
        synced_at: DateTime<Utc>,
    ) -> Self {
        Self {
            track_uri: track_uri.into(),
            track_name: None,
            artists: None,
            position_ms: position_ms.min(duration_ms),
            duration_ms,
            paused,
            synced_at,
        }
    }

    pub fn with_metadata(mut self, track_name: impl Into<String>, artists: impl Into<String>) -> Self {
        self.track_name = Some(track_name.into());
        self.artists = Some(artists.into());
        self
    }

    /// Builds the state from a REST snapshot received at `received_at`.
    ///
    /// Returns `None` when the snapshot has no current item (ads, idle device).
    pub fn from_snapshot(snapshot: &CurrentPlayback, received_at: DateTime<Utc>) -> Option<Self> {
        let item = snapshot.item.as_ref()?;
        let state = Self::new(
            item.uri.clone(),
            snapshot.progress_ms.unwrap_or(0),
            item.duration_ms,
            !snapshot.is_playing,
            received_at,
        );
        Some(state.with_metadata(item.name.clone(), item.artist_names()))
    }

    /// Position reported by the last sync.
    pub fn synced_position_ms(&self) -> u64 {
        self.position_ms
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn position_at(&self, now: DateTime<Utc>) -> u64 {
        if self.paused {
            return self.position_ms;
        }
        // a clock that went backwards never moves the position back
        let elapsed = now
            .signed_duration_since(self.synced_at)
            .num_milliseconds()
            .max(0) as u64;
        self.position_ms.saturating_add(elapsed).min(self.duration_ms)
    }

    pub fn remaining_at(&self, now: DateTime<Utc>) -> u64 {
        self.duration_ms.saturating_sub(self.position_at(now))
    }

    /// Fraction of the track played, `0.0..=1.0`.
    pub fn progress_at(&self, now: DateTime<Utc>) -> f64 {
        if self.duration_ms == 0 {
            return 0.0;
        }
        self.position_at(now) as f64 / self.duration_ms as f64
    }

    pub fn is_finished_at(&self, now: DateTime<Utc>) -> bool {
        self.position_at(now) >= self.duration_ms
    }

    /// Re-anchors at `now` with the extrapolated position, then pauses.
    pub fn paused_at(&self, now: DateTime<Utc>) -> Self {
        let mut next = self.seeked_to(self.position_at(now), now);
        next.paused = true;
        next
    }

    pub fn resumed_at(&self, now: DateTime<Utc>) -> Self {
        let mut next = self.seeked_to(self.position_at(now), now);
        next.paused = false;
        next
    }

    pub fn seeked_to(&self, position_ms: u64, now: DateTime<Utc>) -> Self {
        Self {
            position_ms: position_ms.min(self.duration_ms),
            synced_at: now,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerErrorKind {
    Initialization,
    Authentication,
    /// The account cannot stream, usually because it is not Premium.
    Account,
    Playback,
}

/// Notifications from a playback target, mirroring the Web Playback SDK listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    Ready { device_id: String },
    NotReady { device_id: String },
    StateChanged(PlaybackState),
    /// The target reported that nothing is loaded.
    Cleared,
    Error { kind: PlayerErrorKind, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    DeviceReady,
    DeviceLost,
    StateUpdated { track_changed: bool },
    StateCleared,
    Failed(PlayerErrorKind),
    /// Stale state or an unrelated device; nothing changed.
    Ignored,
}

/// Device identity plus the latest [`PlaybackState`] of one playback session.
#[derive(Debug, Clone, Default)]
pub struct PlaybackSync {
    device_id: Option<String>,
    state: Option<PlaybackState>,
    last_error: Option<(PlayerErrorKind, String)>,
}

impl PlaybackSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    pub fn state(&self) -> Option<&PlaybackState> {
        self.state.as_ref()
    }

    pub fn last_error(&self) -> Option<&(PlayerErrorKind, String)> {
        self.last_error.as_ref()
    }

    pub fn apply(&mut self, event: PlayerEvent) -> SyncOutcome {
        match event {
            PlayerEvent::Ready { device_id } => {
                self.device_id = Some(device_id);
                self.last_error = None;
                SyncOutcome::DeviceReady
            }
            PlayerEvent::NotReady { device_id } => {
                if self.device_id.as_deref() == Some(device_id.as_str()) {
                    self.device_id = None;
                    SyncOutcome::DeviceLost
                } else {
                    SyncOutcome::Ignored
                }
            }
            PlayerEvent::StateChanged(next) => {
                if let Some(current) = &self.state {
                    if next.synced_at < current.synced_at {
                        return SyncOutcome::Ignored;
                    }
                }
                let track_changed = self
                    .state
                    .as_ref()
                    .is_none_or(|current| current.track_uri != next.track_uri);
                self.state = Some(next);
                SyncOutcome::StateUpdated { track_changed }
            }
            PlayerEvent::Cleared => {
                self.state = None;
                SyncOutcome::StateCleared
            }
            PlayerEvent::Error { kind, message } => {
                self.last_error = Some((kind, message));
                SyncOutcome::Failed(kind)
            }
        }
    }

    /// Applies a REST snapshot; `None` (HTTP 204) clears the state.
    pub fn apply_snapshot(
        &mut self,
        snapshot: Option<&CurrentPlayback>,
        received_at: DateTime<Utc>,
    ) -> SyncOutcome {
        if let Some(id) = snapshot
            .and_then(|s| s.device.as_ref())
            .and_then(|d| d.id.clone())
        {
            self.device_id = Some(id);
        }

        match snapshot.and_then(|s| PlaybackState::from_snapshot(s, received_at)) {
            Some(state) => self.apply(PlayerEvent::StateChanged(state)),
            None => self.apply(PlayerEvent::Cleared),
        }
    }

    pub fn position_at(&self, now: DateTime<Utc>) -> Option<u64> {
        self.state.as_ref().map(|s| s.position_at(now))
    }

    /// True when the extrapolation should be replaced by a fresh snapshot:
    /// no state yet, the track ran out while playing, or `interval` elapsed.
    pub fn needs_resync(&self, now: DateTime<Utc>, interval: Duration) -> bool {
        let Some(state) = &self.state else {
            return true;
        };
        if !state.paused && state.is_finished_at(now) {
            return true;
        }
        let elapsed = now
            .signed_duration_since(state.synced_at)
            .num_milliseconds()
            .max(0) as u128;
        elapsed >= interval.as_millis()
    }

    pub fn mark_paused(&mut self, now: DateTime<Utc>) {
        if let Some(state) = &self.state {
            self.state = Some(state.paused_at(now));
        }
    }

    pub fn mark_resumed(&mut self, now: DateTime<Utc>) {
        if let Some(state) = &self.state {
            self.state = Some(state.resumed_at(now));
        }
    }

    pub fn mark_seeked(&mut self, position_ms: u64, now: DateTime<Utc>) {
        if let Some(state) = &self.state {
            self.state = Some(state.seeked_to(position_ms, now));
        }
    }
}

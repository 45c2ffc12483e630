//! Payloads returned to the host
//!
//! These serialize to camelCase JSON so a bridge layer can pass them through
//! unchanged.

use std::time::Duration;

use dlna_api::{PositionInfo, TransportInfo, TransportState};
use serde::Serialize;

/// Outcome of an engine command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationStatus {
    pub success: bool,
    pub message: String,
}

impl OperationStatus {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Result of setting the volume: the level actually sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeLevel {
    pub volume: u8,
}

/// Result of reading the volume
///
/// Mute is never queried, so `muted` is always false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeStatus {
    pub volume: u8,
    pub muted: bool,
}

impl VolumeStatus {
    pub fn new(volume: u8) -> Self {
        Self {
            volume,
            muted: false,
        }
    }
}

/// What the renderer is doing, for "now playing" displays
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackStatus {
    pub state: TransportState,
    pub playing: bool,
    pub track_uri: String,
    pub position_secs: Option<u64>,
    pub duration_secs: Option<u64>,
}

impl PlaybackStatus {
    pub fn from_parts(transport: TransportInfo, position: PositionInfo) -> Self {
        Self {
            playing: transport.state.is_playing(),
            state: transport.state,
            track_uri: position.track_uri,
            position_secs: position.position.map(|d| d.as_secs()),
            duration_secs: position.duration.map(|d| d.as_secs()),
        }
    }

    pub fn position(&self) -> Option<Duration> {
        self.position_secs.map(Duration::from_secs)
    }
}

//! AVTransport operations
//!
//! Transport control: load a URI, play, pause, stop, seek, and the two
//! queries a "now playing" view needs.

use std::time::Duration;

use serde::Serialize;

use crate::operation::macros::define_upnp_operation;
use crate::operation::{optional, required, Validate};
use crate::time::parse_position;
use crate::{ApiError, Result};

/// `Unit` for seeking to a relative track position
pub const SEEK_REL_TIME: &str = "REL_TIME";

// =============================================================================
// TRANSPORT CONTROL
// =============================================================================

define_upnp_operation! {
    operation: SetAVTransportURI,
    action: "SetAVTransportURI",
    service: AVTransport,
    request: {
        current_uri: String => "CurrentURI",
        current_uri_meta_data: String => "CurrentURIMetaData",
    },
    response: (),
    parse: |_response| Ok(()),
}

impl Validate for SetAVTransportURIRequest {
    fn validate(&self) -> Result<()> {
        if self.current_uri.trim().is_empty() {
            return Err(ApiError::InvalidParameter(
                "CurrentURI must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

define_upnp_operation! {
    operation: Play,
    action: "Play",
    service: AVTransport,
    request: {
        speed: String => "Speed",
    },
    response: (),
    parse: |_response| Ok(()),
}

impl Validate for PlayRequest {
    fn validate(&self) -> Result<()> {
        if self.speed.is_empty() || self.speed.parse::<f32>().is_err() {
            return Err(ApiError::InvalidParameter(format!(
                "Speed must be numeric, got '{}'",
                self.speed
            )));
        }
        Ok(())
    }
}

define_upnp_operation! {
    operation: Pause,
    action: "Pause",
    service: AVTransport,
    request: {},
    response: (),
    parse: |_response| Ok(()),
}

impl Validate for PauseRequest {}

define_upnp_operation! {
    operation: Stop,
    action: "Stop",
    service: AVTransport,
    request: {},
    response: (),
    parse: |_response| Ok(()),
}

impl Validate for StopRequest {}

define_upnp_operation! {
    operation: Seek,
    action: "Seek",
    service: AVTransport,
    request: {
        unit: String => "Unit",
        target: String => "Target",
    },
    response: (),
    parse: |_response| Ok(()),
}

impl Validate for SeekRequest {
    fn validate(&self) -> Result<()> {
        if self.unit == SEEK_REL_TIME && parse_position(&self.target).is_none() {
            return Err(ApiError::InvalidParameter(format!(
                "REL_TIME target must be H:MM:SS, got '{}'",
                self.target
            )));
        }
        Ok(())
    }
}

// =============================================================================
// QUERIES
// =============================================================================

/// `CurrentTransportState` values
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TransportState {
    Playing,
    PausedPlayback,
    Stopped,
    Transitioning,
    NoMediaPresent,
    /// Vendor-specific state, kept verbatim
    Other(String),
}

impl TransportState {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "PLAYING" => TransportState::Playing,
            "PAUSED_PLAYBACK" => TransportState::PausedPlayback,
            "STOPPED" => TransportState::Stopped,
            "TRANSITIONING" => TransportState::Transitioning,
            "NO_MEDIA_PRESENT" => TransportState::NoMediaPresent,
            other => TransportState::Other(other.to_string()),
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, TransportState::Playing | TransportState::Transitioning)
    }
}

/// Output of `GetTransportInfo`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportInfo {
    pub state: TransportState,
    pub status: String,
    pub speed: String,
}

define_upnp_operation! {
    operation: GetTransportInfo,
    action: "GetTransportInfo",
    service: AVTransport,
    request: {},
    response: TransportInfo,
    parse: |response| {
        Ok(TransportInfo {
            state: TransportState::parse(&required(response, "CurrentTransportState")?),
            status: optional(response, "CurrentTransportStatus"),
            speed: optional(response, "CurrentSpeed"),
        })
    },
}

impl Validate for GetTransportInfoRequest {}

/// Output of `GetPositionInfo`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionInfo {
    pub track: u32,
    /// `None` when the renderer reports `NOT_IMPLEMENTED` or nothing usable
    pub duration: Option<Duration>,
    pub position: Option<Duration>,
    pub track_uri: String,
}

define_upnp_operation! {
    operation: GetPositionInfo,
    action: "GetPositionInfo",
    service: AVTransport,
    request: {},
    response: PositionInfo,
    parse: |response| {
        Ok(PositionInfo {
            track: optional(response, "Track").trim().parse().unwrap_or(0),
            duration: parse_position(&optional(response, "TrackDuration")),
            position: parse_position(&required(response, "RelTime")?),
            track_uri: optional(response, "TrackURI"),
        })
    },
}

impl Validate for GetPositionInfoRequest {}

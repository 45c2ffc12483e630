//! RenderingControl operations

use crate::operation::macros::define_upnp_operation;
use crate::operation::{required, Validate};
use crate::{ApiError, Result};

/// Channel every renderer supports
pub const MASTER_CHANNEL: &str = "Master";

/// Highest volume accepted by `SetVolume`
pub const MAX_VOLUME: u8 = 100;

define_upnp_operation! {
    operation: SetVolume,
    action: "SetVolume",
    service: RenderingControl,
    request: {
        channel: String => "Channel",
        desired_volume: u8 => "DesiredVolume",
    },
    response: (),
    parse: |_response| Ok(()),
}

impl Validate for SetVolumeRequest {
    fn validate(&self) -> Result<()> {
        if self.desired_volume > MAX_VOLUME {
            return Err(ApiError::InvalidParameter(format!(
                "DesiredVolume must be 0-{}, got {}",
                MAX_VOLUME, self.desired_volume
            )));
        }
        Ok(())
    }
}

define_upnp_operation! {
    operation: GetVolume,
    action: "GetVolume",
    service: RenderingControl,
    request: {
        channel: String => "Channel",
    },
    response: u8,
    parse: |response| {
        let raw = required(response, "CurrentVolume")?;
        let volume: u16 = raw.trim().parse().map_err(|_| {
            ApiError::ParseError(format!("CurrentVolume is not a number: '{}'", raw))
        })?;
        Ok(volume.min(u16::from(MAX_VOLUME)) as u8)
    },
}

impl Validate for GetVolumeRequest {}

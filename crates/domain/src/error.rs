//! Common error types used across the workspace.
//!
//! Each failure category is a typed error converted into [`CapaHubError`]
//! through `#[from]`. Adapters wrap their own errors in
//! [`CapaHubError::Transport`].

use std::time::Duration;

use crate::device_type::DeviceTypeKey;
use crate::id::{DeviceUuid, SubDeviceId};

/// Workspace-wide error.
#[derive(Debug, thiserror::Error)]
pub enum CapaHubError {
    /// No capability matched and no static fallback knows the device type.
    #[error("unknown device type {0}")]
    UnknownDeviceType(DeviceTypeKey),

    /// The transport did not answer in time.
    #[error("command timed out")]
    CommandTimeout(#[from] CommandTimeoutError),

    /// An otherwise well-formed message misses an expected key.
    #[error("malformed payload")]
    MalformedPayload(#[from] MalformedPayloadError),

    /// A hub-routed element targets a sub-device that is not registered.
    #[error("unknown sub-device")]
    UnknownSubDevice(#[from] UnknownSubDeviceError),

    /// The requested operation needs a capability the device was not composed with.
    #[error("device {device} does not support {capability}")]
    Unsupported {
        device: DeviceUuid,
        capability: &'static str,
    },

    /// A caller-supplied argument is out of range.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// The transport collaborator failed for another reason.
    #[error("transport error")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A command did not complete before its deadline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{namespace} on {device} did not answer within {timeout:?}")]
pub struct CommandTimeoutError {
    pub device: DeviceUuid,
    pub namespace: String,
    pub timeout: Duration,
}

/// An expected key is absent from a payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{namespace} payload is missing `{key}`")]
pub struct MalformedPayloadError {
    pub namespace: String,
    pub key: &'static str,
}

/// A hub element names a sub-device the inventory does not know.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("sub-device {subdevice} is not registered with hub {hub}")]
pub struct UnknownSubDeviceError {
    pub hub: DeviceUuid,
    pub subdevice: SubDeviceId,
}

/// Caller-supplied values rejected before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("channel {channel} cannot be addressed by {operation}")]
    ChannelOutOfRange {
        channel: u16,
        operation: &'static str,
    },
    #[error("luminance {0} is outside 0..=100")]
    LuminanceOutOfRange(u16),
    #[error("preset `{0}` is not supported")]
    UnsupportedPreset(String),
    #[error("sub-device {subdevice} belongs to hub {expected}, not {actual}")]
    ForeignHub {
        subdevice: SubDeviceId,
        expected: DeviceUuid,
        actual: DeviceUuid,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_timeout_into_workspace_error() {
        let err: CapaHubError = CommandTimeoutError {
            device: DeviceUuid::new(),
            namespace: "Appliance.Control.ToggleX".to_string(),
            timeout: Duration::from_millis(200),
        }
        .into();
        assert!(matches!(err, CapaHubError::CommandTimeout(_)));
    }

    #[test]
    fn should_display_missing_key() {
        let err = MalformedPayloadError {
            namespace: "Appliance.Control.Spray".to_string(),
            key: "spray",
        };
        assert_eq!(
            err.to_string(),
            "Appliance.Control.Spray payload is missing `spray`"
        );
    }

    #[test]
    fn should_display_unknown_subdevice() {
        let hub = DeviceUuid::new();
        let err = UnknownSubDeviceError {
            hub,
            subdevice: SubDeviceId::from("A1"),
        };
        assert_eq!(
            err.to_string(),
            format!("sub-device A1 is not registered with hub {hub}")
        );
    }

    #[test]
    fn should_convert_validation_error() {
        let err: CapaHubError = ValidationError::LuminanceOutOfRange(120).into();
        assert!(matches!(
            err,
            CapaHubError::Validation(ValidationError::LuminanceOutOfRange(120))
        ));
    }
}

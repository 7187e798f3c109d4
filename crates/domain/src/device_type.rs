//! Device type identity and the inventory records devices are built from.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::channel::ChannelInfo;
use crate::id::{DeviceUuid, SubDeviceId};

/// Identity of a device model. Two devices with the same key share one
/// composite type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceTypeKey {
    pub device_type: String,
    pub hardware_version: String,
    pub firmware_version: String,
}

impl DeviceTypeKey {
    #[must_use]
    pub fn new(
        device_type: impl Into<String>,
        hardware_version: impl Into<String>,
        firmware_version: impl Into<String>,
    ) -> Self {
        Self {
            device_type: device_type.into(),
            hardware_version: hardware_version.into(),
            firmware_version: firmware_version.into(),
        }
    }
}

/// `type:hw:fw`, with separators of missing trailing parts dropped.
impl fmt::Display for DeviceTypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = format!(
            "{}:{}:{}",
            self.device_type, self.hardware_version, self.firmware_version
        );
        f.write_str(joined.trim_matches(':'))
    }
}

/// The base every composite type ends with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseKind {
    Generic,
    Hub,
}

impl BaseKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Hub => "hub",
        }
    }
}

/// What the device inventory knows about a top-level device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub uuid: DeviceUuid,
    pub name: String,
    pub device_type: String,
    pub hardware_version: String,
    pub firmware_version: String,
    #[serde(default)]
    pub channels: Vec<ChannelInfo>,
}

impl DeviceInfo {
    #[must_use]
    pub fn type_key(&self) -> DeviceTypeKey {
        DeviceTypeKey::new(
            self.device_type.as_str(),
            self.hardware_version.as_str(),
            self.firmware_version.as_str(),
        )
    }
}

/// What the device inventory knows about a sub-device attached to a hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubDeviceInfo {
    pub id: SubDeviceId,
    pub name: String,
    pub subdevice_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_format_full_key() {
        let key = DeviceTypeKey::new("msl120", "2.0.0", "2.1.3");
        assert_eq!(key.to_string(), "msl120:2.0.0:2.1.3");
    }

    #[test]
    fn should_trim_missing_versions() {
        let key = DeviceTypeKey::new("mss310", "", "");
        assert_eq!(key.to_string(), "mss310");
    }

    #[test]
    fn should_derive_type_key_from_device_info() {
        let info = DeviceInfo {
            uuid: DeviceUuid::new(),
            name: "Desk lamp".to_string(),
            device_type: "msl120".to_string(),
            hardware_version: "2.0.0".to_string(),
            firmware_version: "2.1.3".to_string(),
            channels: Vec::new(),
        };
        assert_eq!(info.type_key(), DeviceTypeKey::new("msl120", "2.0.0", "2.1.3"));
    }
}

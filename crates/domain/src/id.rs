//! Typed identifier newtypes.
//!
//! Devices are identified by a UUID (reported in simple, hyphen-less form by
//! the inventory); sub-devices by a short opaque string assigned by their hub.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(uuid::Uuid);

        impl Default for $name {
            fn default() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl $name {
            /// Generate a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self::default()
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Access the inner UUID.
            #[must_use]
            pub fn as_uuid(self) -> uuid::Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0.simple(), f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s).map(Self)
            }
        }
    };
}

define_id!(
    /// Unique identifier of a top-level device (plug, light, hub, …).
    DeviceUuid
);

define_id!(
    /// Unique identifier for a [`DeviceEvent`](crate::event::DeviceEvent).
    EventId
);

/// Identifier of a sub-device, unique within its hub.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubDeviceId(String);

impl SubDeviceId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SubDeviceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SubDeviceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for SubDeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_generate_unique_ids_when_called_twice() {
        let a = DeviceUuid::new();
        let b = DeviceUuid::new();
        assert_ne!(a, b);
    }

    #[test]
    fn should_display_in_simple_form() {
        let id = DeviceUuid::new();
        let text = id.to_string();
        assert_eq!(text.len(), 32);
        assert!(!text.contains('-'));
    }

    #[test]
    fn should_parse_inventory_style_uuid() {
        let id: DeviceUuid = "2103159146551290848248e1e9a4b0f1".parse().unwrap();
        assert_eq!(id.to_string(), "2103159146551290848248e1e9a4b0f1");
    }

    #[test]
    fn should_return_error_when_parsing_invalid_uuid() {
        let result = DeviceUuid::from_str("not-a-uuid");
        assert!(result.is_err());
    }

    #[test]
    fn should_serialize_subdevice_id_as_plain_string() {
        let id = SubDeviceId::from("01008C11");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"01008C11\"");
    }
}

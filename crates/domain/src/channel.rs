//! Channels: addressable sub-units of a device.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Index of one addressable sub-unit (relay, LED driver segment, logical light).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Channel(u16);

impl Channel {
    /// The conventional default channel.
    pub const MAIN: Self = Self(0);

    #[must_use]
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(self) -> u16 {
        self.0
    }

    #[must_use]
    pub const fn is_main(self) -> bool {
        self.0 == 0
    }
}

impl From<u16> for Channel {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Description of a channel as discovered from the inventory, or as
/// synthesized by a remapping capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub channel: Channel,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_master: bool,
}

impl ChannelInfo {
    #[must_use]
    pub fn new(channel: impl Into<Channel>, name: Option<&str>, is_master: bool) -> Self {
        Self {
            channel: channel.into(),
            name: name.map(str::to_string),
            is_master,
        }
    }

    /// Parse the inventory's channel list. Entries are positional: the
    /// element at index *i* describes channel *i*. Each element may carry a
    /// `devName` and a `type`; a missing or empty list means a single main
    /// channel.
    #[must_use]
    pub fn parse_list(data: &[serde_json::Value]) -> Vec<Self> {
        if data.is_empty() {
            return vec![Self::new(Channel::MAIN, None, true)];
        }
        data.iter()
            .enumerate()
            .map(|(index, entry)| {
                let name = entry.get("devName").and_then(serde_json::Value::as_str);
                let index = u16::try_from(index).unwrap_or(u16::MAX);
                Self::new(index, name, index == 0)
            })
            .collect()
    }
}

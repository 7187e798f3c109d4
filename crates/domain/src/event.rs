//! Device events: a record of every dispatched message and confirmed command.

use serde::{Deserialize, Serialize};

use crate::id::{DeviceUuid, EventId};
use crate::observation::Source;
use crate::time::{Timestamp, now};

/// Something that touched a device's cached state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceEvent {
    pub id: EventId,
    pub device: DeviceUuid,
    pub namespace: String,
    pub source: Source,
    /// Whether at least one capability consumed the message.
    pub handled: bool,
    pub timestamp: Timestamp,
}

impl DeviceEvent {
    #[must_use]
    pub fn new(device: DeviceUuid, namespace: impl Into<String>, source: Source, handled: bool) -> Self {
        Self {
            id: EventId::new(),
            device,
            namespace: namespace.into(),
            source,
            handled,
            timestamp: now(),
        }
    }
}

//! Sub-device inventory port: resolve the sub-device a hub element targets.

use std::sync::Arc;

use capahub_domain::id::{DeviceUuid, SubDeviceId};

use crate::subdevice::SubDevice;

/// Looks up sub-devices registered under a hub.
pub trait SubDeviceInventory: Send + Sync {
    /// The sub-device `id` attached to `hub`, if registered.
    fn lookup_subdevice(&self, hub: DeviceUuid, id: &SubDeviceId) -> Option<Arc<SubDevice>>;
}

impl<T: SubDeviceInventory + ?Sized> SubDeviceInventory for Arc<T> {
    fn lookup_subdevice(&self, hub: DeviceUuid, id: &SubDeviceId) -> Option<Arc<SubDevice>> {
        (**self).lookup_subdevice(hub, id)
    }
}

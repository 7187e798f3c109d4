//! In-memory sub-device inventory.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use capahub_domain::id::{DeviceUuid, SubDeviceId};

use crate::ports::SubDeviceInventory;
use crate::subdevice::SubDevice;

/// Sub-devices keyed by `(hub, id)`.
#[derive(Default)]
pub struct InMemoryInventory {
    subdevices: RwLock<HashMap<(DeviceUuid, SubDeviceId), Arc<SubDevice>>>,
}

impl InMemoryInventory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `subdevice` under its hub, replacing any previous entry
    /// with the same id.
    pub fn register(&self, subdevice: Arc<SubDevice>) {
        let key = (subdevice.hub(), subdevice.id().clone());
        tracing::debug!(hub = %key.0, subdevice = %key.1, "registered sub-device");
        self.subdevices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, subdevice);
    }

    pub fn remove(&self, hub: DeviceUuid, id: &SubDeviceId) -> Option<Arc<SubDevice>> {
        self.subdevices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(hub, id.clone()))
    }

    /// Every sub-device of `hub`, sorted by id.
    #[must_use]
    pub fn subdevices_of(&self, hub: DeviceUuid) -> Vec<Arc<SubDevice>> {
        let mut found: Vec<_> = self
            .subdevices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|((owner, _), _)| *owner == hub)
            .map(|(_, subdevice)| Arc::clone(subdevice))
            .collect();
        found.sort_by(|a, b| a.id().cmp(b.id()));
        found
    }
}

impl SubDeviceInventory for InMemoryInventory {
    fn lookup_subdevice(&self, hub: DeviceUuid, id: &SubDeviceId) -> Option<Arc<SubDevice>> {
        self.subdevices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(hub, id.clone()))
            .cloned()
    }
}

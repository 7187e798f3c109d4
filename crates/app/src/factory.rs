//! Device factory: turns discovery data into live [`Device`]s and
//! [`SubDevice`]s.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use capahub_domain::ability::AbilitySet;
use capahub_domain::device_type::{DeviceInfo, SubDeviceInfo};
use capahub_domain::error::CapaHubError;
use capahub_domain::id::DeviceUuid;

use crate::composer::Composer;
use crate::device::Device;
use crate::inventory::InMemoryInventory;
use crate::ports::EventPublisher;
use crate::subdevice::{SubDevice, SubDeviceKind};

/// Builds devices from a composer, wiring each one to the shared
/// inventory and event publisher.
pub struct DeviceFactory {
    composer: Arc<Composer>,
    known_types: HashMap<String, AbilitySet>,
    inventory: Arc<InMemoryInventory>,
    events: Option<Arc<dyn EventPublisher>>,
    default_timeout: Option<Duration>,
}

impl DeviceFactory {
    #[must_use]
    pub fn new(composer: Arc<Composer>) -> Self {
        Self {
            composer,
            known_types: HashMap::new(),
            inventory: Arc::new(InMemoryInventory::new()),
            events: None,
            default_timeout: None,
        }
    }

    /// Abilities assumed for `device_type` when a device reports none the
    /// registry recognizes.
    #[must_use]
    pub fn with_known_type(mut self, device_type: &str, abilities: AbilitySet) -> Self {
        self.known_types
            .insert(device_type.to_ascii_lowercase(), abilities);
        self
    }

    #[must_use]
    pub fn with_inventory(mut self, inventory: Arc<InMemoryInventory>) -> Self {
        self.inventory = inventory;
        self
    }

    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventPublisher>) -> Self {
        self.events = Some(events);
        self
    }

    #[must_use]
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn inventory(&self) -> &Arc<InMemoryInventory> {
        &self.inventory
    }

    /// Compose and instantiate a device.
    ///
    /// # Errors
    ///
    /// [`CapaHubError::UnknownDeviceType`] when neither the reported
    /// abilities nor the known-type table yield a single capability.
    #[tracing::instrument(skip(self, info, abilities, transport), fields(device = %info.uuid, device_type = %info.device_type))]
    pub fn build<T>(&self, info: DeviceInfo, abilities: &AbilitySet, transport: T) -> Result<Device<T>, CapaHubError> {
        let key = info.type_key();
        let registry = self.composer.registry();
        let effective = if registry.matches_any(abilities, &info.device_type) {
            abilities
        } else if let Some(known) = self
            .known_types
            .get(&info.device_type.to_ascii_lowercase())
        {
            tracing::debug!("no recognized abilities reported, using known type");
            known
        } else {
            return Err(CapaHubError::UnknownDeviceType(key));
        };

        let composite = self.composer.compose(&key, effective);
        if composite.capabilities().is_empty() {
            return Err(CapaHubError::UnknownDeviceType(key));
        }

        let mut device = Device::new(info, composite, transport);
        if device.is_hub() {
            device = device.with_inventory(self.inventory.clone());
        }
        if let Some(events) = &self.events {
            device = device.with_events(Arc::clone(events));
        }
        if let Some(timeout) = self.default_timeout {
            device = device.with_default_timeout(timeout);
        }
        Ok(device)
    }

    /// Build the sub-device described by `info` and register it under
    /// `hub`. Unknown types get generic behaviour.
    pub fn build_subdevice(&self, info: SubDeviceInfo, hub: DeviceUuid) -> Arc<SubDevice> {
        let kind = SubDeviceKind::from_type(&info.subdevice_type).unwrap_or_else(|| {
            tracing::warn!(
                subdevice = %info.id,
                subdevice_type = %info.subdevice_type,
                "unknown sub-device type, using generic behaviour"
            );
            SubDeviceKind::Generic
        });
        let subdevice = Arc::new(SubDevice::new(hub, info, kind));
        self.inventory.register(Arc::clone(&subdevice));
        subdevice
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::CapabilityKind;
    use crate::ports::SubDeviceInventory;
    use crate::registry::Registry;
    use crate::testing::FakeTransport;
    use capahub_domain::ability::ns;
    use capahub_domain::id::SubDeviceId;

    fn factory() -> DeviceFactory {
        DeviceFactory::new(Arc::new(Composer::new(Arc::new(Registry::builtin()))))
    }

    fn info(device_type: &str) -> DeviceInfo {
        DeviceInfo {
            uuid: DeviceUuid::new(),
            name: device_type.to_string(),
            device_type: device_type.to_string(),
            hardware_version: "2.0.0".to_string(),
            firmware_version: "2.1.0".to_string(),
            channels: Vec::new(),
        }
    }

    fn abilities(names: &[&str]) -> AbilitySet {
        names.iter().copied().collect()
    }

    #[test]
    fn should_compose_from_reported_abilities() {
        let device = factory()
            .build(
                info("msl120"),
                &abilities(&[ns::CONTROL_TOGGLEX, ns::CONTROL_LUMINANCE]),
                FakeTransport::default(),
            )
            .unwrap();
        assert_eq!(
            device.capabilities(),
            &[CapabilityKind::ToggleX, CapabilityKind::Luminance]
        );
        assert!(!device.is_hub());
    }

    #[test]
    fn should_fall_back_to_known_type_when_no_abilities_reported() {
        let factory = factory().with_known_type("MSS210", abilities(&[ns::CONTROL_TOGGLEX]));
        let device = factory
            .build(info("mss210"), &AbilitySet::default(), FakeTransport::default())
            .unwrap();
        assert_eq!(device.capabilities(), &[CapabilityKind::ToggleX]);
    }

    #[test]
    fn should_fail_for_unknown_device_type() {
        let result = factory().build(
            info("mystery"),
            &abilities(&["Appliance.Control.Mystery"]),
            FakeTransport::default(),
        );
        assert!(matches!(result, Err(CapaHubError::UnknownDeviceType(_))));
    }

    #[test]
    fn should_wire_inventory_into_hubs() {
        let factory = factory();
        let hub = factory
            .build(
                info("msh300"),
                &abilities(&[ns::HUB_SUBDEVICE_LIST, ns::HUB_ONLINE]),
                FakeTransport::default(),
            )
            .unwrap();
        let sensor = factory.build_subdevice(
            SubDeviceInfo {
                id: SubDeviceId::from("A1"),
                name: "bedroom".to_string(),
                subdevice_type: "ms100".to_string(),
            },
            hub.uuid(),
        );

        assert!(hub.is_hub());
        assert_eq!(sensor.kind(), SubDeviceKind::Ms100);
        assert!(
            factory
                .inventory()
                .lookup_subdevice(hub.uuid(), &SubDeviceId::from("A1"))
                .is_some()
        );
        assert!(hub.subdevice(&SubDeviceId::from("A1")).is_some());
    }

    #[test]
    fn should_build_generic_subdevice_for_unknown_type() {
        let sub = factory().build_subdevice(
            SubDeviceInfo {
                id: SubDeviceId::from("Z9"),
                name: "smoke".to_string(),
                subdevice_type: "gs559".to_string(),
            },
            DeviceUuid::new(),
        );
        assert_eq!(sub.kind(), SubDeviceKind::Generic);
    }
}

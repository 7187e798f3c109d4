//! Fleet wiring: simulated appliances, the devices composed on top of
//! them, and their periodic refresh.

use std::sync::Arc;

use capahub_adapter_virtual::{
    VirtualAppliance, VirtualDiffuser, VirtualHub, VirtualPlantLight, VirtualPlug,
    VirtualSubDevice, VirtualTransport,
};
use capahub_app::composer::Composer;
use capahub_app::device::Device;
use capahub_app::event_bus::InProcessEventBus;
use capahub_app::factory::DeviceFactory;
use capahub_app::subdevice::SubDevice;
use capahub_domain::ability::AbilitySet;
use capahub_domain::channel::{Channel, ChannelInfo};
use capahub_domain::device_type::{DeviceInfo, SubDeviceInfo};
use capahub_domain::error::CapaHubError;
use capahub_domain::id::{DeviceUuid, SubDeviceId};

use crate::config::{ApplianceKind, Config, DeviceConfig, SubDeviceConfig};

/// A device talking to the shared virtual transport.
pub type FleetDevice = Device<Arc<VirtualTransport>>;

/// Errors raised while building the fleet.
#[derive(Debug, thiserror::Error)]
pub enum FleetError {
    #[error("device `{name}` could not be built")]
    Device {
        name: String,
        #[source]
        source: CapaHubError,
    },
}

/// Every configured device, ready to be polled.
pub struct Fleet {
    transport: Arc<VirtualTransport>,
    events: Arc<InProcessEventBus>,
    devices: Vec<FleetDevice>,
    subdevices: Vec<Arc<SubDevice>>,
}

impl Fleet {
    /// Build the simulated appliances described by `config` and compose a
    /// device for each through `composer`.
    ///
    /// # Errors
    ///
    /// [`FleetError::Device`] when a device type cannot be composed.
    pub fn build(config: &Config, composer: Arc<Composer>) -> Result<Self, FleetError> {
        let events = Arc::new(InProcessEventBus::new(256));
        let mut factory = DeviceFactory::new(composer)
            .with_events(events.clone())
            .with_default_timeout(config.default_timeout());
        for known in &config.known_types {
            let abilities: AbilitySet = known.abilities.iter().map(String::as_str).collect();
            factory = factory.with_known_type(&known.device_type, abilities);
        }

        let mut transport = VirtualTransport::new();
        let mut planned = Vec::with_capacity(config.devices.len());
        for device in &config.devices {
            let uuid = device.uuid.unwrap_or_else(DeviceUuid::new);
            let appliance = appliance(device);
            let abilities: AbilitySet = match &device.abilities {
                Some(names) => names.iter().map(String::as_str).collect(),
                None => appliance.abilities().into_iter().collect(),
            };
            transport.insert(uuid, appliance);
            planned.push((uuid, device, abilities));
        }
        let transport = Arc::new(transport);

        let mut devices = Vec::with_capacity(planned.len());
        let mut subdevices = Vec::new();
        for (uuid, config, abilities) in planned {
            let built = factory
                .build(info(uuid, config), &abilities, Arc::clone(&transport))
                .map_err(|source| FleetError::Device {
                    name: config.name.clone(),
                    source,
                })?;
            for sub in &config.subdevices {
                subdevices.push(factory.build_subdevice(
                    SubDeviceInfo {
                        id: SubDeviceId::from(sub.id.as_str()),
                        name: sub.name.clone(),
                        subdevice_type: sub.subdevice_type.clone(),
                    },
                    uuid,
                ));
            }
            tracing::info!(
                device = %uuid,
                name = %config.name,
                device_type = %built.composite().name(),
                capabilities = ?built.capabilities(),
                "device ready"
            );
            devices.push(built);
        }

        Ok(Self {
            transport,
            events,
            devices,
            subdevices,
        })
    }

    #[must_use]
    pub fn devices(&self) -> &[FleetDevice] {
        &self.devices
    }

    #[must_use]
    pub fn device(&self, name: &str) -> Option<&FleetDevice> {
        self.devices.iter().find(|d| d.name() == name)
    }

    #[must_use]
    pub fn subdevices(&self) -> &[Arc<SubDevice>] {
        &self.subdevices
    }

    #[must_use]
    pub fn transport(&self) -> &Arc<VirtualTransport> {
        &self.transport
    }

    #[must_use]
    pub fn events(&self) -> &Arc<InProcessEventBus> {
        &self.events
    }

    /// Run a full update on every device. Failures are logged and counted;
    /// one unreachable device does not stop the others.
    pub async fn update_all(&self) -> usize {
        let mut failures = 0;
        for device in &self.devices {
            if let Err(err) = device.update(None).await {
                failures += 1;
                tracing::warn!(device = %device.uuid(), name = device.name(), error = %err, "full update failed");
            }
        }
        failures
    }

    /// Log one line per device and sub-device with its cached state.
    pub fn log_summary(&self) {
        for device in &self.devices {
            tracing::info!(
                name = device.name(),
                online = ?device.online_status(),
                on = ?device.is_on(Channel::MAIN),
                light = ?device.light(Channel::MAIN),
                spray = ?device.spray_mode(Channel::MAIN),
                diffuser = ?device.diffuser_spray_mode(Channel::MAIN),
                updated = ?device.last_full_update(),
                "device state"
            );
        }
        for sub in &self.subdevices {
            tracing::info!(
                name = sub.name(),
                kind = sub.kind().as_str(),
                online = ?sub.online_status(),
                temperature = ?sub.temperature(),
                humidity = ?sub.humidity(),
                target = ?sub.target_temperature(),
                "sub-device state"
            );
        }
    }
}

fn appliance(config: &DeviceConfig) -> VirtualAppliance {
    match config.kind {
        ApplianceKind::Plug => VirtualAppliance::Plug(VirtualPlug::new(config.outlets)),
        ApplianceKind::PlantLight => VirtualAppliance::PlantLight(VirtualPlantLight::default()),
        ApplianceKind::Diffuser => VirtualAppliance::Diffuser(VirtualDiffuser::diffuser()),
        ApplianceKind::Humidifier => VirtualAppliance::Diffuser(VirtualDiffuser::humidifier()),
        ApplianceKind::Hub => {
            VirtualAppliance::Hub(VirtualHub::new(config.subdevices.iter().map(simulated).collect()))
        }
    }
}

fn simulated(config: &SubDeviceConfig) -> VirtualSubDevice {
    if config.subdevice_type.eq_ignore_ascii_case("mts100v3") {
        VirtualSubDevice::valve(&config.id, tenths(config.temperature))
    } else {
        VirtualSubDevice::sensor(&config.id, tenths(config.temperature), tenths(config.humidity))
    }
}

#[allow(clippy::cast_possible_truncation)]
fn tenths(value: f64) -> i64 {
    (value * 10.0).round() as i64
}

fn info(uuid: DeviceUuid, config: &DeviceConfig) -> DeviceInfo {
    let channels = if config.kind == ApplianceKind::Plug && config.outlets > 1 {
        (0..config.outlets)
            .filter_map(|i| u16::try_from(i).ok())
            .map(|i| ChannelInfo::new(i, None, i == 0))
            .collect()
    } else {
        Vec::new()
    };
    DeviceInfo {
        uuid,
        name: config.name.clone(),
        device_type: config.device_type.clone(),
        hardware_version: config.hardware_version.clone(),
        firmware_version: config.firmware_version.clone(),
        channels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capahub_app::registry::Registry;

    fn composer() -> Arc<Composer> {
        Arc::new(Composer::new(Arc::new(Registry::builtin())))
    }

    #[test]
    fn should_build_demo_fleet() {
        let fleet = Fleet::build(&Config::default(), composer()).unwrap();
        assert_eq!(fleet.devices().len(), 4);
        assert_eq!(fleet.subdevices().len(), 2);
        assert!(fleet.device("Hallway hub").unwrap().is_hub());
    }

    #[test]
    fn should_expose_plug_outlets_as_channels() {
        let mut config = Config::default();
        config.devices[0].outlets = 3;
        let fleet = Fleet::build(&config, composer()).unwrap();
        assert_eq!(fleet.device("Desk plug").unwrap().channels().len(), 3);
    }

    #[test]
    fn should_name_device_that_cannot_be_composed() {
        let mut config = Config::default();
        config.devices[0].abilities = Some(Vec::new());
        let err = Fleet::build(&config, composer()).err().unwrap();
        assert!(matches!(err, FleetError::Device { ref name, .. } if name == "Desk plug"));
    }

    #[test]
    fn should_convert_to_tenths() {
        assert_eq!(tenths(21.5), 215);
        assert_eq!(tenths(-3.0), -30);
    }
}

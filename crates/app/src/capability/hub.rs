//! Hub routing: notifications addressed to sub-devices.
//!
//! A hub message carries a list under a namespace-specific key; every
//! element names its target with `id`. Elements are routed one by one
//! through the [`SubDeviceInventory`](crate::ports::SubDeviceInventory).
//! An element for an unregistered sub-device is skipped; the rest of the
//! list is still delivered.

use std::sync::Arc;

use capahub_domain::ability::ns;
use capahub_domain::error::UnknownSubDeviceError;
use capahub_domain::id::SubDeviceId;
use serde_json::Value;

use super::payload::{self, Path};
use super::{DispatchContext, Handler};
use crate::device::Device;
use crate::subdevice::SubDevice;

/// Connectivity, switching and battery of every sub-device.
#[derive(Debug, Clone, Copy, Default)]
pub struct HubCore;

/// Temperature/humidity sensors.
#[derive(Debug, Clone, Copy, Default)]
pub struct HubSensor;

/// Thermostatic radiator valves.
#[derive(Debug, Clone, Copy, Default)]
pub struct HubMts100;

const CORE_PUSH: &[(&str, &str)] = &[
    (ns::HUB_ONLINE, "online"),
    (ns::HUB_TOGGLEX, "togglex"),
    (ns::HUB_BATTERY, "battery"),
];

const SENSOR_PUSH: &[(&str, &str)] = &[
    (ns::HUB_SENSOR_ALL, "all"),
    (ns::HUB_SENSOR_ALERT, "alert"),
    (ns::HUB_SENSOR_TEMPHUM, "tempHum"),
];

const MTS100_PUSH: &[(&str, &str)] = &[
    (ns::HUB_MTS100_ALL, "all"),
    (ns::HUB_MTS100_MODE, "mode"),
    (ns::HUB_MTS100_TEMPERATURE, "temperature"),
    (ns::HUB_MTS100_ADJUST, "adjust"),
];

fn key_for(map: &[(&str, &'static str)], namespace: &str) -> Option<&'static str> {
    map.iter()
        .find(|(candidate, _)| *candidate == namespace)
        .map(|(_, key)| *key)
}

/// Deliver every element of `payload[key]` to its sub-device.
fn route(
    namespace: &str,
    payload: &Value,
    key: &'static str,
    path: Path,
    ctx: &DispatchContext<'_>,
) -> bool {
    let Some(list) = payload::require(payload, namespace, key, path) else {
        return false;
    };
    let Some(elements) = list.as_array() else {
        payload::skip_element(namespace, key, list);
        return false;
    };
    let Some(inventory) = ctx.inventory else {
        tracing::warn!(hub = %ctx.device, namespace, "no sub-device inventory attached");
        return false;
    };

    for element in elements {
        let Some(id) = element.get("id").and_then(Value::as_str) else {
            payload::skip_element(namespace, key, element);
            continue;
        };
        let id = SubDeviceId::from(id);
        match inventory.lookup_subdevice(ctx.device, &id) {
            Some(subdevice) => {
                subdevice.handle_notification(namespace, element, ctx.source);
            }
            None => {
                let err = UnknownSubDeviceError {
                    hub: ctx.device,
                    subdevice: id,
                };
                tracing::warn!(error = %err, namespace, "skipping element");
            }
        }
    }
    true
}

impl Handler for HubCore {
    fn handle_push(&mut self, namespace: &str, payload: &Value, ctx: &DispatchContext<'_>) -> bool {
        key_for(CORE_PUSH, namespace)
            .is_some_and(|key| route(namespace, payload, key, Path::Push, ctx))
    }

    fn handle_update(&mut self, _: &str, _: &Value, _: &DispatchContext<'_>) -> bool {
        false
    }
}

impl Handler for HubSensor {
    fn handle_push(&mut self, namespace: &str, payload: &Value, ctx: &DispatchContext<'_>) -> bool {
        key_for(SENSOR_PUSH, namespace)
            .is_some_and(|key| route(namespace, payload, key, Path::Push, ctx))
    }

    fn handle_update(&mut self, namespace: &str, snapshot: &Value, ctx: &DispatchContext<'_>) -> bool {
        namespace == ns::HUB_SENSOR_ALL && route(namespace, snapshot, "all", Path::Snapshot, ctx)
    }
}

impl Handler for HubMts100 {
    fn handle_push(&mut self, namespace: &str, payload: &Value, ctx: &DispatchContext<'_>) -> bool {
        key_for(MTS100_PUSH, namespace)
            .is_some_and(|key| route(namespace, payload, key, Path::Push, ctx))
    }

    fn handle_update(&mut self, namespace: &str, snapshot: &Value, ctx: &DispatchContext<'_>) -> bool {
        namespace == ns::HUB_MTS100_ALL && route(namespace, snapshot, "all", Path::Snapshot, ctx)
    }
}

impl<T> Device<T> {
    /// A sub-device registered under this hub.
    #[must_use]
    pub fn subdevice(&self, id: &SubDeviceId) -> Option<Arc<SubDevice>> {
        self.inventory()?.lookup_subdevice(self.uuid(), id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::InMemoryInventory;
    use crate::ports::SubDeviceInventory;
    use crate::subdevice::SubDeviceKind;
    use capahub_domain::device_type::SubDeviceInfo;
    use capahub_domain::id::DeviceUuid;
    use capahub_domain::mode::OnlineStatus;
    use capahub_domain::observation::Source;
    use serde_json::json;

    fn inventory(hub: DeviceUuid, ids: &[&str]) -> InMemoryInventory {
        let inventory = InMemoryInventory::new();
        for id in ids {
            let info = SubDeviceInfo {
                id: SubDeviceId::from(*id),
                name: format!("sensor {id}"),
                subdevice_type: "ms100".to_string(),
            };
            inventory.register(Arc::new(SubDevice::new(hub, info, SubDeviceKind::Ms100)));
        }
        inventory
    }

    fn ctx(hub: DeviceUuid, inventory: &dyn SubDeviceInventory) -> DispatchContext<'_> {
        DispatchContext {
            device: hub,
            source: Source::Pushed,
            inventory: Some(inventory),
        }
    }

    #[test]
    fn should_route_elements_past_unknown_subdevice() {
        let hub = DeviceUuid::new();
        let inventory = inventory(hub, &["A1", "C3"]);
        let payload = json!({"online": [
            {"id": "A1", "online": {"status": 1}},
            {"id": "B2", "online": {"status": 1}},
            {"id": "C3", "online": {"status": 2}},
        ]});

        let handled = HubCore.handle_push(ns::HUB_ONLINE, &payload, &ctx(hub, &inventory));

        assert!(handled);
        let a1 = inventory.lookup_subdevice(hub, &SubDeviceId::from("A1")).unwrap();
        let c3 = inventory.lookup_subdevice(hub, &SubDeviceId::from("C3")).unwrap();
        assert_eq!(a1.online_status(), OnlineStatus::Online);
        assert_eq!(c3.online_status(), OnlineStatus::Offline);
    }

    #[test]
    fn should_not_handle_push_without_list_key() {
        let hub = DeviceUuid::new();
        let inventory = inventory(hub, &["A1"]);
        let payload = json!({"other": []});
        assert!(!HubCore.handle_push(ns::HUB_ONLINE, &payload, &ctx(hub, &inventory)));
    }

    #[test]
    fn should_ignore_namespaces_outside_push_map() {
        let hub = DeviceUuid::new();
        let inventory = inventory(hub, &["A1"]);
        let payload = json!({"all": [{"id": "A1"}]});
        assert!(!HubCore.handle_push(ns::HUB_SENSOR_ALL, &payload, &ctx(hub, &inventory)));
    }

    #[test]
    fn should_route_sensor_snapshot() {
        let hub = DeviceUuid::new();
        let inventory = inventory(hub, &["A1"]);
        let snapshot = json!({"all": [{"id": "A1", "temperature": {"latest": 215}, "online": {"status": 1}}]});
        let ctx = DispatchContext {
            source: Source::Polled,
            ..ctx(hub, &inventory)
        };

        assert!(HubSensor.handle_update(ns::HUB_SENSOR_ALL, &snapshot, &ctx));

        let a1 = inventory.lookup_subdevice(hub, &SubDeviceId::from("A1")).unwrap();
        assert_eq!(a1.temperature(), Some(21.5));
    }

    #[test]
    fn should_not_route_without_inventory() {
        let ctx = DispatchContext {
            device: DeviceUuid::new(),
            source: Source::Pushed,
            inventory: None,
        };
        let payload = json!({"battery": [{"id": "A1", "value": 80}]});
        assert!(!HubCore.handle_push(ns::HUB_BATTERY, &payload, &ctx));
    }
}

//! Virtual hub with attached sensors and radiator valves.

use std::sync::{Mutex, MutexGuard, PoisonError};

use capahub_app::ports::Method;
use capahub_domain::ability::ns;
use capahub_domain::time::now;
use serde_json::{Map, Value, json};

use super::{entries, field, int, system_all, unsupported};
use crate::error::VirtualError;

const PRESETS: [&str; 4] = ["custom", "comfort", "economy", "away"];

#[derive(Debug, Clone)]
enum Kind {
    /// Temperature and humidity in tenths.
    Sensor { temperature: i64, humidity: i64 },
    Valve {
        on: bool,
        mode: i64,
        room: i64,
        target: i64,
        presets: [i64; 4],
        /// Calibration offset in hundredths.
        adjust: i64,
    },
}

/// One simulated sub-device.
#[derive(Debug, Clone)]
pub struct VirtualSubDevice {
    id: String,
    battery: i64,
    kind: Kind,
}

impl VirtualSubDevice {
    /// A temperature/humidity sensor; readings in tenths.
    #[must_use]
    pub fn sensor(id: &str, temperature: i64, humidity: i64) -> Self {
        Self {
            id: id.to_string(),
            battery: 100,
            kind: Kind::Sensor {
                temperature,
                humidity,
            },
        }
    }

    /// A radiator valve, on, in custom mode; temperatures in tenths.
    #[must_use]
    pub fn valve(id: &str, room: i64) -> Self {
        Self {
            id: id.to_string(),
            battery: 100,
            kind: Kind::Valve {
                on: true,
                mode: 0,
                room,
                target: 200,
                presets: [200, 225, 180, 120],
                adjust: 0,
            },
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn is_sensor(&self) -> bool {
        matches!(self.kind, Kind::Sensor { .. })
    }

    /// Reported type of the sub-device.
    #[must_use]
    pub fn subdevice_type(&self) -> &'static str {
        match self.kind {
            Kind::Sensor { .. } => "ms100",
            Kind::Valve { .. } => "mts100v3",
        }
    }

    fn online(&self) -> Value {
        json!({"status": 1, "lastActiveTime": now().timestamp()})
    }

    fn valve_temperature(&self) -> Option<Value> {
        let Kind::Valve {
            room,
            target,
            presets,
            ..
        } = &self.kind
        else {
            return None;
        };
        let mut temperature = Map::new();
        temperature.insert("id".to_string(), json!(self.id));
        temperature.insert("room".to_string(), json!(room));
        temperature.insert("currentSet".to_string(), json!(target));
        temperature.insert("min".to_string(), json!(50));
        temperature.insert("max".to_string(), json!(350));
        temperature.insert("heating".to_string(), json!(i64::from(room < target)));
        temperature.insert("openWindow".to_string(), json!(0));
        for (name, value) in PRESETS.iter().zip(presets) {
            temperature.insert((*name).to_string(), json!(value));
        }
        Some(Value::Object(temperature))
    }

    fn valve_adjust(&self) -> Option<Value> {
        match self.kind {
            Kind::Valve { adjust, .. } => Some(json!({"id": self.id, "temperature": adjust})),
            Kind::Sensor { .. } => None,
        }
    }
}

/// A simulated hub.
pub struct VirtualHub {
    subdevices: Mutex<Vec<VirtualSubDevice>>,
}

impl VirtualHub {
    #[must_use]
    pub fn new(subdevices: Vec<VirtualSubDevice>) -> Self {
        Self {
            subdevices: Mutex::new(subdevices),
        }
    }

    #[must_use]
    pub fn abilities(&self) -> Vec<&'static str> {
        vec![
            ns::SYSTEM_ALL,
            ns::SYSTEM_ONLINE,
            ns::HUB_SUBDEVICE_LIST,
            ns::HUB_ONLINE,
            ns::HUB_TOGGLEX,
            ns::HUB_BATTERY,
            ns::HUB_SENSOR_ALL,
            ns::HUB_SENSOR_ALERT,
            ns::HUB_SENSOR_TEMPHUM,
            ns::HUB_MTS100_ALL,
            ns::HUB_MTS100_MODE,
            ns::HUB_MTS100_TEMPERATURE,
            ns::HUB_MTS100_ADJUST,
        ]
    }

    /// Snapshot of every attached sub-device.
    #[must_use]
    pub fn subdevices(&self) -> Vec<VirtualSubDevice> {
        self.lock().clone()
    }

    /// Target temperature of a valve, in tenths.
    #[must_use]
    pub fn valve_target(&self, id: &str) -> Option<i64> {
        self.lock().iter().find(|s| s.id == id).and_then(|s| match s.kind {
            Kind::Valve { target, .. } => Some(target),
            Kind::Sensor { .. } => None,
        })
    }

    /// Calibration offset of a valve, in hundredths.
    #[must_use]
    pub fn valve_adjust(&self, id: &str) -> Option<i64> {
        self.lock().iter().find(|s| s.id == id).and_then(|s| match s.kind {
            Kind::Valve { adjust, .. } => Some(adjust),
            Kind::Sensor { .. } => None,
        })
    }

    /// Change a sensor reading, as if the room had warmed up.
    pub fn set_sensor_reading(&self, id: &str, temperature: i64, humidity: i64) {
        if let Some(sub) = self.lock().iter_mut().find(|s| s.id == id) {
            sub.kind = Kind::Sensor {
                temperature,
                humidity,
            };
        }
    }

    pub(super) fn handle(&self, method: Method, namespace: &str, payload: &Value) -> Result<Value, VirtualError> {
        match (method, namespace) {
            (Method::Get, ns::SYSTEM_ALL) => {
                let subdevices: Vec<Value> = self
                    .lock()
                    .iter()
                    .map(|s| json!({"id": s.id, "status": 1}))
                    .collect();
                Ok(system_all(json!({"hub": {"subdevice": subdevices}})))
            }
            (Method::Get, ns::HUB_SUBDEVICE_LIST) => {
                let subdevices: Vec<Value> = self
                    .lock()
                    .iter()
                    .map(|s| json!({"id": s.id, "type": s.subdevice_type()}))
                    .collect();
                Ok(json!({"hub": {"subdevice": subdevices}}))
            }
            (Method::Get, ns::HUB_SENSOR_ALL) => Ok(json!({"all": self.sensor_all()})),
            (Method::Get, ns::HUB_MTS100_ALL) => Ok(json!({"all": self.valve_all()})),
            (Method::Get, ns::HUB_MTS100_TEMPERATURE) => {
                self.answer_valves(namespace, payload, "temperature", VirtualSubDevice::valve_temperature)
            }
            (Method::Get, ns::HUB_MTS100_ADJUST) => {
                self.answer_valves(namespace, payload, "adjust", VirtualSubDevice::valve_adjust)
            }
            (Method::Set, ns::HUB_TOGGLEX) => self.update_valves(namespace, payload, "togglex", |kind, entry| {
                if let (Kind::Valve { on, .. }, Some(onoff)) = (kind, int(entry, "onoff")) {
                    *on = onoff == 1;
                }
            }),
            (Method::Set, ns::HUB_MTS100_MODE) => self.update_valves(namespace, payload, "mode", |kind, entry| {
                if let (Kind::Valve { mode, .. }, Some(state)) = (kind, int(entry, "state")) {
                    *mode = state;
                }
            }),
            (Method::Set, ns::HUB_MTS100_TEMPERATURE) => {
                self.update_valves(namespace, payload, "temperature", |kind, entry| {
                    if let Kind::Valve {
                        target, presets, ..
                    } = kind
                    {
                        for (slot, name) in presets.iter_mut().zip(PRESETS) {
                            if let Some(value) = int(entry, name) {
                                *slot = value;
                            }
                        }
                        if let Some(custom) = int(entry, "custom") {
                            *target = custom;
                        }
                    }
                })
            }
            (Method::Set, ns::HUB_MTS100_ADJUST) => self.update_valves(namespace, payload, "adjust", |kind, entry| {
                if let (Kind::Valve { adjust, .. }, Some(value)) = (kind, int(entry, "temperature")) {
                    *adjust = value;
                }
            }),
            _ => Err(unsupported(method, namespace)),
        }
    }

    /// `{key: [..]}` with one element per requested valve.
    fn answer_valves(
        &self,
        namespace: &str,
        payload: &Value,
        key: &'static str,
        element: impl Fn(&VirtualSubDevice) -> Option<Value>,
    ) -> Result<Value, VirtualError> {
        let requested = field(payload, namespace, key)?;
        let subdevices = self.lock();
        let mut answer = Vec::new();
        for entry in entries(requested) {
            let id = entry.get("id").and_then(Value::as_str).unwrap_or_default();
            let sub = subdevices
                .iter()
                .find(|s| s.id == id)
                .ok_or_else(|| VirtualError::UnknownSubDevice(id.to_string()))?;
            answer.extend(element(sub));
        }
        let mut body = Map::new();
        body.insert(key.to_string(), Value::Array(answer));
        Ok(Value::Object(body))
    }

    fn sensor_all(&self) -> Vec<Value> {
        self.lock()
            .iter()
            .filter_map(|s| match s.kind {
                Kind::Sensor {
                    temperature,
                    humidity,
                } => Some(json!({
                    "id": s.id,
                    "online": s.online(),
                    "temperature": {
                        "latest": temperature,
                        "latestSampleTime": now().timestamp(),
                        "min": -200,
                        "max": 600,
                    },
                    "humidity": {"latest": humidity},
                })),
                Kind::Valve { .. } => None,
            })
            .collect()
    }

    fn valve_all(&self) -> Vec<Value> {
        self.lock()
            .iter()
            .filter_map(|s| match s.kind {
                Kind::Valve { on, mode, .. } => Some(json!({
                    "id": s.id,
                    "online": s.online(),
                    "togglex": {"onoff": i64::from(on)},
                    "mode": {"state": mode},
                    "temperature": s.valve_temperature(),
                })),
                Kind::Sensor { .. } => None,
            })
            .collect()
    }

    fn update_valves(
        &self,
        namespace: &str,
        payload: &Value,
        key: &'static str,
        apply: impl Fn(&mut Kind, &Value),
    ) -> Result<Value, VirtualError> {
        let list = field(payload, namespace, key)?;
        let mut subdevices = self.lock();
        for entry in entries(list) {
            let id = entry.get("id").and_then(Value::as_str).unwrap_or_default();
            let sub = subdevices
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or_else(|| VirtualError::UnknownSubDevice(id.to_string()))?;
            apply(&mut sub.kind, entry);
        }
        Ok(json!({}))
    }

    fn lock(&self) -> MutexGuard<'_, Vec<VirtualSubDevice>> {
        self.subdevices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hub() -> VirtualHub {
        VirtualHub::new(vec![
            VirtualSubDevice::sensor("A1", 215, 456),
            VirtualSubDevice::valve("V1", 190),
        ])
    }

    #[test]
    fn should_list_only_sensors_in_sensor_all() {
        let all = hub().handle(Method::Get, ns::HUB_SENSOR_ALL, &json!({"all": []})).unwrap();
        let items = all["all"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["id"], "A1");
        assert_eq!(items[0]["temperature"]["latest"], 215);
    }

    #[test]
    fn should_list_valves_with_temperatures() {
        let all = hub().handle(Method::Get, ns::HUB_MTS100_ALL, &json!({"all": []})).unwrap();
        let valve = &all["all"][0];
        assert_eq!(valve["id"], "V1");
        assert_eq!(valve["togglex"]["onoff"], 1);
        assert_eq!(valve["temperature"]["room"], 190);
        assert_eq!(valve["temperature"]["heating"], 1);
    }

    #[test]
    fn should_move_target_with_custom_temperature() {
        let hub = hub();
        hub.handle(
            Method::Set,
            ns::HUB_MTS100_TEMPERATURE,
            &json!({"temperature": [{"id": "V1", "custom": 215}]}),
        )
        .unwrap();
        assert_eq!(hub.valve_target("V1"), Some(215));
    }

    #[test]
    fn should_reject_command_for_unattached_subdevice() {
        let err = hub()
            .handle(
                Method::Set,
                ns::HUB_MTS100_MODE,
                &json!({"mode": [{"id": "ZZ", "state": 1}]}),
            )
            .unwrap_err();
        assert!(matches!(err, VirtualError::UnknownSubDevice(id) if id == "ZZ"));
    }

    #[test]
    fn should_answer_temperature_of_requested_valve() {
        let answer = hub()
            .handle(
                Method::Get,
                ns::HUB_MTS100_TEMPERATURE,
                &json!({"temperature": [{"id": "V1"}]}),
            )
            .unwrap();
        assert_eq!(answer["temperature"][0]["currentSet"], 200);
    }

    #[test]
    fn should_store_and_answer_valve_adjust() {
        let hub = hub();
        hub.handle(
            Method::Set,
            ns::HUB_MTS100_ADJUST,
            &json!({"adjust": [{"id": "V1", "temperature": -150}]}),
        )
        .unwrap();
        assert_eq!(hub.valve_adjust("V1"), Some(-150));

        let answer = hub
            .handle(Method::Get, ns::HUB_MTS100_ADJUST, &json!({"adjust": [{"id": "V1"}]}))
            .unwrap();
        assert_eq!(answer, json!({"adjust": [{"id": "V1", "temperature": -150}]}));
    }
}

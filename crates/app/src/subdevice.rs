//! Sub-devices: devices that only talk through a hub.
//!
//! A sub-device keeps its own cached state and receives the elements a
//! hub routed to it. It sends commands through its hub's transport.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use capahub_domain::ability::ns;
use capahub_domain::device_type::SubDeviceInfo;
use capahub_domain::error::{CapaHubError, MalformedPayloadError, ValidationError};
use capahub_domain::id::{DeviceUuid, SubDeviceId};
use capahub_domain::mode::{OnlineStatus, ThermostatMode};
use capahub_domain::observation::{Observation, Source};
use capahub_domain::time::{Timestamp, from_epoch_secs, now};
use serde_json::{Value, json};

use crate::device::Device;
use crate::ports::{Method, Transport};

/// Models with dedicated behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubDeviceKind {
    Generic,
    /// Temperature/humidity sensor.
    Ms100,
    /// Thermostatic radiator valve.
    Mts100v3,
}

impl SubDeviceKind {
    /// The dedicated kind for a reported sub-device type, if any.
    #[must_use]
    pub fn from_type(subdevice_type: &str) -> Option<Self> {
        match subdevice_type.to_ascii_lowercase().as_str() {
            "ms100" | "ms100f" => Some(Self::Ms100),
            "mts100v3" => Some(Self::Mts100v3),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Ms100 => "ms100",
            Self::Mts100v3 => "mts100v3",
        }
    }
}

/// Temperature presets of a valve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Preset {
    Custom,
    Comfort,
    Economy,
    Away,
}

impl Preset {
    pub const ALL: [Self; 4] = [Self::Custom, Self::Comfort, Self::Economy, Self::Away];

    /// Payload key of the preset.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Custom => "custom",
            Self::Comfort => "comfort",
            Self::Economy => "economy",
            Self::Away => "away",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Preset {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.key() == s)
            .ok_or_else(|| ValidationError::UnsupportedPreset(s.to_string()))
    }
}

/// One historical sensor reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
    pub temperature: f64,
    pub humidity: f64,
}

#[derive(Debug, Clone, Default)]
struct Common {
    online: Option<Observation<OnlineStatus>>,
    last_active: Option<Timestamp>,
    battery: Option<Observation<u8>>,
}

impl Common {
    fn apply_online(&mut self, element: &Value, source: Source) -> bool {
        let Some(online) = element.get("online") else {
            return false;
        };
        let status = online.get("status").and_then(Value::as_i64).unwrap_or(-1);
        self.online = Some(Observation::new(OnlineStatus::from_code(status), source));
        if let Some(active) = online.get("lastActiveTime").and_then(Value::as_i64) {
            self.last_active = from_epoch_secs(active);
        }
        true
    }

    fn apply_battery(&mut self, element: &Value, source: Source) -> bool {
        match element
            .get("value")
            .and_then(Value::as_i64)
            .and_then(|v| u8::try_from(v).ok())
        {
            Some(level) => {
                self.battery = Some(Observation::new(level, source));
                true
            }
            None => false,
        }
    }
}

/// Sensor readings, in tenths of a degree / percent as reported.
#[derive(Debug, Clone, Default)]
struct SensorState {
    temperature: Option<Observation<i64>>,
    humidity: Option<Observation<i64>>,
    sampled_at: Option<Timestamp>,
    min_temperature: Option<i64>,
    max_temperature: Option<i64>,
    samples: Vec<Sample>,
}

impl SensorState {
    fn handle(&mut self, common: &mut Common, namespace: &str, element: &Value, source: Source) -> bool {
        match namespace {
            ns::HUB_SENSOR_ALL => {
                common.apply_online(element, source);
                if let Some(temperature) = element.get("temperature") {
                    if let Some(latest) = int(temperature, "latest") {
                        self.temperature = Some(Observation::new(latest, source));
                    }
                    if let Some(at) = int(temperature, "latestSampleTime") {
                        self.sampled_at = from_epoch_secs(at);
                    }
                    self.min_temperature = int(temperature, "min").or(self.min_temperature);
                    self.max_temperature = int(temperature, "max").or(self.max_temperature);
                }
                if let Some(latest) = element.get("humidity").and_then(|h| int(h, "latest")) {
                    self.humidity = Some(Observation::new(latest, source));
                }
                true
            }
            ns::HUB_SENSOR_TEMPHUM => {
                let synced = int(element, "syncedTime").and_then(from_epoch_secs);
                match synced {
                    Some(at) if self.sampled_at.is_none_or(|last| at > last) => {
                        self.sampled_at = Some(at);
                        if let Some(t) = int(element, "latestTemperature") {
                            self.temperature = Some(Observation::new(t, source));
                        }
                        if let Some(h) = int(element, "latestHumidity") {
                            self.humidity = Some(Observation::new(h, source));
                        }
                    }
                    _ => tracing::debug!("skipping stale or unsynced reading"),
                }
                if let Some(samples) = element.get("sample").and_then(Value::as_array) {
                    self.samples = samples.iter().filter_map(parse_sample).collect();
                }
                true
            }
            ns::HUB_SENSOR_ALERT => {
                tracing::debug!("sensor alerts are not tracked");
                false
            }
            _ => false,
        }
    }
}

/// `[temperature, humidity, from, to, _]`.
fn parse_sample(raw: &Value) -> Option<Sample> {
    let fields = raw.as_array()?;
    let at = |i: usize| fields.get(i).and_then(Value::as_i64);
    Some(Sample {
        temperature: from_tenths(at(0)?)?,
        humidity: from_tenths(at(1)?)?,
        from: at(2).and_then(from_epoch_secs),
        to: at(3).and_then(from_epoch_secs),
    })
}

/// Valve state, temperatures in tenths of a degree as reported.
#[derive(Debug, Clone, Default)]
struct ValveState {
    on: Option<Observation<bool>>,
    mode: Option<Observation<ThermostatMode>>,
    room: Option<i64>,
    target: Option<Observation<i64>>,
    min: Option<i64>,
    max: Option<i64>,
    heating: Option<bool>,
    window_open: Option<bool>,
    presets: BTreeMap<Preset, i64>,
    /// Calibration offset in hundredths of a degree.
    adjust: Option<Observation<i64>>,
    sampled_at: Option<Timestamp>,
}

impl ValveState {
    fn handle(&mut self, common: &mut Common, namespace: &str, element: &Value, source: Source) -> bool {
        match namespace {
            ns::HUB_MTS100_ALL => {
                common.apply_online(element, source);
                if let Some(togglex) = element.get("togglex") {
                    self.apply_onoff(togglex, source);
                }
                if let Some(mode) = element.get("mode") {
                    self.apply_mode(mode, source);
                }
                if let Some(temperature) = element.get("temperature") {
                    self.apply_temperature(temperature, source);
                }
                true
            }
            ns::HUB_TOGGLEX => self.apply_onoff(element, source),
            ns::HUB_MTS100_MODE => self.apply_mode(element, source),
            ns::HUB_MTS100_TEMPERATURE => self.apply_temperature(element, source),
            ns::HUB_MTS100_ADJUST => self.apply_adjust(element, source),
            _ => false,
        }
    }

    fn apply_onoff(&mut self, element: &Value, source: Source) -> bool {
        match int(element, "onoff") {
            Some(onoff) => {
                self.on = Some(Observation::new(onoff == 1, source));
                true
            }
            None => false,
        }
    }

    fn apply_mode(&mut self, element: &Value, source: Source) -> bool {
        match int(element, "state").and_then(|s| ThermostatMode::try_from(s).ok()) {
            Some(mode) => {
                self.mode = Some(Observation::new(mode, source));
                true
            }
            None => false,
        }
    }

    /// Whether any temperature field was present.
    fn apply_temperature(&mut self, element: &Value, source: Source) -> bool {
        let mut read = false;
        let mut field = |key: &str| {
            let value = int(element, key);
            read |= value.is_some();
            value
        };
        if let Some(room) = field("room") {
            self.room = Some(room);
        }
        if let Some(target) = field("currentSet") {
            self.target = Some(Observation::new(target, source));
        }
        if let Some(min) = field("min") {
            self.min = Some(min);
        }
        if let Some(max) = field("max") {
            self.max = Some(max);
        }
        if let Some(heating) = field("heating") {
            self.heating = Some(heating == 1);
        }
        if let Some(open) = field("openWindow") {
            self.window_open = Some(open == 1);
        }
        for preset in Preset::ALL {
            if let Some(value) = field(preset.key()) {
                self.presets.insert(preset, value);
            }
        }
        if read {
            self.sampled_at = Some(now());
        }
        read
    }

    fn apply_adjust(&mut self, element: &Value, source: Source) -> bool {
        match int(element, "temperature") {
            Some(hundredths) => {
                self.adjust = Some(Observation::new(hundredths, source));
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone)]
enum Specific {
    Generic,
    Sensor(SensorState),
    Valve(ValveState),
}

#[derive(Debug, Clone)]
struct SubDeviceState {
    common: Common,
    specific: Specific,
}

fn int(value: &Value, key: &str) -> Option<i64> {
    value.get(key).and_then(Value::as_i64)
}

fn from_tenths(raw: i64) -> Option<f64> {
    i32::try_from(raw).ok().map(|v| f64::from(v) / 10.0)
}

fn from_hundredths(raw: i64) -> Option<f64> {
    i32::try_from(raw).ok().map(|v| f64::from(v) / 100.0)
}

#[allow(clippy::cast_possible_truncation)]
fn to_tenths(celsius: f64) -> i64 {
    (celsius * 10.0).round() as i64
}

#[allow(clippy::cast_possible_truncation)]
fn to_hundredths(celsius: f64) -> i64 {
    (celsius * 100.0).round() as i64
}

/// A device attached to a hub.
#[derive(Debug)]
pub struct SubDevice {
    id: SubDeviceId,
    hub: DeviceUuid,
    name: String,
    subdevice_type: String,
    kind: SubDeviceKind,
    state: Mutex<SubDeviceState>,
}

impl SubDevice {
    #[must_use]
    pub fn new(hub: DeviceUuid, info: SubDeviceInfo, kind: SubDeviceKind) -> Self {
        let specific = match kind {
            SubDeviceKind::Generic => Specific::Generic,
            SubDeviceKind::Ms100 => Specific::Sensor(SensorState::default()),
            SubDeviceKind::Mts100v3 => Specific::Valve(ValveState::default()),
        };
        Self {
            id: info.id,
            hub,
            name: info.name,
            subdevice_type: info.subdevice_type,
            kind,
            state: Mutex::new(SubDeviceState {
                common: Common::default(),
                specific,
            }),
        }
    }

    #[must_use]
    pub fn id(&self) -> &SubDeviceId {
        &self.id
    }

    #[must_use]
    pub fn hub(&self) -> DeviceUuid {
        self.hub
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn subdevice_type(&self) -> &str {
        &self.subdevice_type
    }

    #[must_use]
    pub fn kind(&self) -> SubDeviceKind {
        self.kind
    }

    /// Apply one element a hub routed here. Returns whether it was used.
    pub fn handle_notification(&self, namespace: &str, element: &Value, source: Source) -> bool {
        let mut guard = self.lock_state();
        let state = &mut *guard;
        let handled = match namespace {
            ns::HUB_ONLINE => state.common.apply_online(element, source),
            ns::HUB_BATTERY => state.common.apply_battery(element, source),
            _ => match &mut state.specific {
                Specific::Sensor(sensor) => sensor.handle(&mut state.common, namespace, element, source),
                Specific::Valve(valve) => valve.handle(&mut state.common, namespace, element, source),
                Specific::Generic => false,
            },
        };
        if !handled {
            tracing::debug!(subdevice = %self.id, kind = self.kind.as_str(), namespace, "element not handled");
        }
        handled
    }

    #[must_use]
    pub fn online_status(&self) -> OnlineStatus {
        self.lock_state()
            .common
            .online
            .as_ref()
            .map_or(OnlineStatus::Unknown, |o| o.value)
    }

    #[must_use]
    pub fn last_active(&self) -> Option<Timestamp> {
        self.lock_state().common.last_active
    }

    /// Battery level in percent.
    #[must_use]
    pub fn battery(&self) -> Option<u8> {
        self.lock_state().common.battery.as_ref().map(|o| o.value)
    }

    /// Latest temperature in °C: the sensor reading, or the room
    /// temperature a valve measures.
    #[must_use]
    pub fn temperature(&self) -> Option<f64> {
        match &self.lock_state().specific {
            Specific::Sensor(s) => s.temperature.as_ref().and_then(|o| from_tenths(o.value)),
            Specific::Valve(v) => v.room.and_then(from_tenths),
            Specific::Generic => None,
        }
    }

    /// Latest relative humidity in percent.
    #[must_use]
    pub fn humidity(&self) -> Option<f64> {
        match &self.lock_state().specific {
            Specific::Sensor(s) => s.humidity.as_ref().and_then(|o| from_tenths(o.value)),
            _ => None,
        }
    }

    #[must_use]
    pub fn last_sampled_time(&self) -> Option<Timestamp> {
        match &self.lock_state().specific {
            Specific::Sensor(s) => s.sampled_at,
            Specific::Valve(v) => v.sampled_at,
            Specific::Generic => None,
        }
    }

    #[must_use]
    pub fn samples(&self) -> Vec<Sample> {
        match &self.lock_state().specific {
            Specific::Sensor(s) => s.samples.clone(),
            _ => Vec::new(),
        }
    }

    #[must_use]
    pub fn min_supported_temperature(&self) -> Option<f64> {
        match &self.lock_state().specific {
            Specific::Sensor(s) => s.min_temperature.and_then(from_tenths),
            Specific::Valve(v) => v.min.and_then(from_tenths),
            Specific::Generic => None,
        }
    }

    #[must_use]
    pub fn max_supported_temperature(&self) -> Option<f64> {
        match &self.lock_state().specific {
            Specific::Sensor(s) => s.max_temperature.and_then(from_tenths),
            Specific::Valve(v) => v.max.and_then(from_tenths),
            Specific::Generic => None,
        }
    }

    #[must_use]
    pub fn is_on(&self) -> Option<bool> {
        self.valve(|v| v.on.as_ref().map(|o| o.value)).flatten()
    }

    #[must_use]
    pub fn mode(&self) -> Option<ThermostatMode> {
        self.valve(|v| v.mode.as_ref().map(|o| o.value)).flatten()
    }

    #[must_use]
    pub fn target_temperature(&self) -> Option<f64> {
        self.valve(|v| v.target.as_ref().and_then(|o| from_tenths(o.value)))
            .flatten()
    }

    /// The target temperature observation, with its source.
    #[must_use]
    pub fn observed_target(&self) -> Option<Observation<i64>> {
        self.valve(|v| v.target.clone()).flatten()
    }

    #[must_use]
    pub fn is_heating(&self) -> Option<bool> {
        self.valve(|v| v.heating).flatten()
    }

    #[must_use]
    pub fn is_window_open(&self) -> Option<bool> {
        self.valve(|v| v.window_open).flatten()
    }

    #[must_use]
    pub fn preset_temperature(&self, preset: Preset) -> Option<f64> {
        self.valve(|v| v.presets.get(&preset).copied().and_then(from_tenths))
            .flatten()
    }

    /// Calibration offset in °C added to the room reading.
    #[must_use]
    pub fn adjust(&self) -> Option<f64> {
        self.valve(|v| v.adjust.as_ref().and_then(|o| from_hundredths(o.value)))
            .flatten()
    }

    #[must_use]
    pub fn observed_adjust(&self) -> Option<Observation<i64>> {
        self.valve(|v| v.adjust.clone()).flatten()
    }

    fn valve<R>(&self, f: impl FnOnce(&ValveState) -> R) -> Option<R> {
        match &self.lock_state().specific {
            Specific::Valve(v) => Some(f(v)),
            _ => None,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SubDeviceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn commit_valve(&self, apply: impl FnOnce(&mut ValveState)) {
        if let Specific::Valve(valve) = &mut self.lock_state().specific {
            apply(valve);
        }
    }

    fn check_valve<T>(&self, hub: &Device<T>) -> Result<(), CapaHubError> {
        if hub.uuid() != self.hub {
            return Err(ValidationError::ForeignHub {
                subdevice: self.id.clone(),
                expected: self.hub,
                actual: hub.uuid(),
            }
            .into());
        }
        if self.kind != SubDeviceKind::Mts100v3 {
            return Err(CapaHubError::Unsupported {
                device: self.hub,
                capability: "valve",
            });
        }
        Ok(())
    }
}

impl SubDevice {
    /// # Errors
    ///
    /// [`ValidationError::ForeignHub`] when `hub` is not this sub-device's
    /// hub, [`CapaHubError::Unsupported`] on anything but a valve, or the
    /// command's own failure.
    pub async fn turn_on<T: Transport>(&self, hub: &Device<T>, timeout: Option<Duration>) -> Result<(), CapaHubError> {
        self.switch(hub, true, timeout).await
    }

    /// # Errors
    ///
    /// Same as [`turn_on`](Self::turn_on).
    pub async fn turn_off<T: Transport>(&self, hub: &Device<T>, timeout: Option<Duration>) -> Result<(), CapaHubError> {
        self.switch(hub, false, timeout).await
    }

    /// # Errors
    ///
    /// Same as [`turn_on`](Self::turn_on).
    pub async fn toggle<T: Transport>(&self, hub: &Device<T>, timeout: Option<Duration>) -> Result<(), CapaHubError> {
        let on = self.is_on().unwrap_or(false);
        self.switch(hub, !on, timeout).await
    }

    async fn switch<T: Transport>(&self, hub: &Device<T>, on: bool, timeout: Option<Duration>) -> Result<(), CapaHubError> {
        self.check_valve(hub)?;
        let payload = json!({"togglex": [{"id": self.id, "onoff": i64::from(on), "channel": 0}]});
        hub.execute(Method::Set, ns::HUB_TOGGLEX, payload, timeout).await?;
        self.commit_valve(|v| v.on = Some(Observation::new(on, Source::Optimistic)));
        hub.publish(ns::HUB_TOGGLEX, Source::Optimistic, true);
        Ok(())
    }

    /// # Errors
    ///
    /// Same as [`turn_on`](Self::turn_on).
    pub async fn set_mode<T: Transport>(
        &self,
        hub: &Device<T>,
        mode: ThermostatMode,
        timeout: Option<Duration>,
    ) -> Result<(), CapaHubError> {
        self.check_valve(hub)?;
        let payload = json!({"mode": [{"id": self.id, "state": i64::from(mode)}]});
        hub.execute(Method::Set, ns::HUB_MTS100_MODE, payload, timeout).await?;
        self.commit_valve(|v| v.mode = Some(Observation::new(mode, Source::Optimistic)));
        hub.publish(ns::HUB_MTS100_MODE, Source::Optimistic, true);
        Ok(())
    }

    /// Set the target temperature in °C.
    ///
    /// # Errors
    ///
    /// Same as [`turn_on`](Self::turn_on).
    pub async fn set_target_temperature<T: Transport>(
        &self,
        hub: &Device<T>,
        celsius: f64,
        timeout: Option<Duration>,
    ) -> Result<(), CapaHubError> {
        self.check_valve(hub)?;
        let tenths = to_tenths(celsius);
        let payload = json!({"temperature": [{"id": self.id, "custom": tenths}]});
        hub.execute(Method::Set, ns::HUB_MTS100_TEMPERATURE, payload, timeout)
            .await?;
        self.commit_valve(|v| v.target = Some(Observation::new(tenths, Source::Optimistic)));
        hub.publish(ns::HUB_MTS100_TEMPERATURE, Source::Optimistic, true);
        Ok(())
    }

    /// # Errors
    ///
    /// Same as [`turn_on`](Self::turn_on).
    pub async fn set_preset_temperature<T: Transport>(
        &self,
        hub: &Device<T>,
        preset: Preset,
        celsius: f64,
        timeout: Option<Duration>,
    ) -> Result<(), CapaHubError> {
        self.check_valve(hub)?;
        let tenths = to_tenths(celsius);
        let mut element = serde_json::Map::new();
        element.insert("id".to_string(), json!(self.id));
        element.insert(preset.key().to_string(), json!(tenths));
        let payload = json!({"temperature": [element]});
        hub.execute(Method::Set, ns::HUB_MTS100_TEMPERATURE, payload, timeout)
            .await?;
        self.commit_valve(|v| {
            v.presets.insert(preset, tenths);
        });
        hub.publish(ns::HUB_MTS100_TEMPERATURE, Source::Optimistic, true);
        Ok(())
    }

    /// Poll the valve's temperatures and return the room temperature.
    ///
    /// # Errors
    ///
    /// Same as [`turn_on`](Self::turn_on), plus
    /// [`CapaHubError::MalformedPayload`] when the answer has no element
    /// for this valve.
    pub async fn refresh_temperature<T: Transport>(
        &self,
        hub: &Device<T>,
        timeout: Option<Duration>,
    ) -> Result<Option<f64>, CapaHubError> {
        self.check_valve(hub)?;
        let payload = json!({"temperature": [{"id": self.id}]});
        let response = hub
            .execute(Method::Get, ns::HUB_MTS100_TEMPERATURE, payload, timeout)
            .await?;
        let element = self.own_element(&response, ns::HUB_MTS100_TEMPERATURE, "temperature")?;
        self.commit_valve(|v| {
            v.apply_temperature(element, Source::Polled);
        });
        Ok(self.temperature())
    }

    /// Set the calibration offset in °C. The hub takes it in hundredths.
    ///
    /// # Errors
    ///
    /// Same as [`turn_on`](Self::turn_on).
    pub async fn set_adjust<T: Transport>(
        &self,
        hub: &Device<T>,
        celsius: f64,
        timeout: Option<Duration>,
    ) -> Result<(), CapaHubError> {
        self.check_valve(hub)?;
        let hundredths = to_hundredths(celsius);
        let payload = json!({"adjust": [{"id": self.id, "temperature": hundredths}]});
        hub.execute(Method::Set, ns::HUB_MTS100_ADJUST, payload, timeout)
            .await?;
        self.commit_valve(|v| v.adjust = Some(Observation::new(hundredths, Source::Optimistic)));
        hub.publish(ns::HUB_MTS100_ADJUST, Source::Optimistic, true);
        Ok(())
    }

    /// Poll the calibration offset and return it in °C.
    ///
    /// # Errors
    ///
    /// Same as [`refresh_temperature`](Self::refresh_temperature).
    pub async fn refresh_adjust<T: Transport>(
        &self,
        hub: &Device<T>,
        timeout: Option<Duration>,
    ) -> Result<Option<f64>, CapaHubError> {
        self.check_valve(hub)?;
        let payload = json!({"adjust": [{"id": self.id}]});
        let response = hub
            .execute(Method::Get, ns::HUB_MTS100_ADJUST, payload, timeout)
            .await?;
        let element = self.own_element(&response, ns::HUB_MTS100_ADJUST, "adjust")?;
        self.commit_valve(|v| {
            v.apply_adjust(element, Source::Polled);
        });
        Ok(self.adjust())
    }

    /// The element of `response[key]` that carries this sub-device's id.
    fn own_element<'a>(
        &self,
        response: &'a Value,
        namespace: &str,
        key: &'static str,
    ) -> Result<&'a Value, MalformedPayloadError> {
        response
            .get(key)
            .and_then(Value::as_array)
            .and_then(|items| {
                items
                    .iter()
                    .find(|e| e.get("id").and_then(Value::as_str) == Some(self.id.as_str()))
            })
            .ok_or_else(|| MalformedPayloadError {
                namespace: namespace.to_string(),
                key,
            })
    }
}

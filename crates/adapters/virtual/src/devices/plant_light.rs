//! Virtual plant lamp: three switched channels and twelve raw luminance
//! channels.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use capahub_app::ports::Method;
use capahub_domain::ability::ns;
use serde_json::{Value, json};

use super::{channel, entries, field, int, system_all, unsupported};
use crate::error::VirtualError;

const SWITCHED_CHANNELS: usize = 3;
const LUMINANCE_CHANNELS: u16 = 12;

struct LampState {
    switched: [bool; SWITCHED_CHANNELS],
    luminance: BTreeMap<u16, u8>,
}

/// A simulated two-light plant lamp, dark at start.
pub struct VirtualPlantLight {
    state: Mutex<LampState>,
}

impl Default for VirtualPlantLight {
    fn default() -> Self {
        Self {
            state: Mutex::new(LampState {
                switched: [false; SWITCHED_CHANNELS],
                luminance: (0..LUMINANCE_CHANNELS).map(|c| (c, 0)).collect(),
            }),
        }
    }
}

impl VirtualPlantLight {
    #[must_use]
    pub fn abilities(&self) -> Vec<&'static str> {
        vec![
            ns::SYSTEM_ALL,
            ns::SYSTEM_ONLINE,
            ns::CONTROL_TOGGLEX,
            ns::CONTROL_LUMINANCE,
        ]
    }

    /// Raw level of one luminance channel.
    #[must_use]
    pub fn raw_luminance(&self, channel: u16) -> Option<u8> {
        self.lock().luminance.get(&channel).copied()
    }

    #[must_use]
    pub fn is_on(&self, channel: usize) -> Option<bool> {
        self.lock().switched.get(channel).copied()
    }

    pub(super) fn handle(&self, method: Method, namespace: &str, payload: &Value) -> Result<Value, VirtualError> {
        match (method, namespace) {
            (Method::Get, ns::SYSTEM_ALL) => {
                let togglex: Vec<Value> = self
                    .lock()
                    .switched
                    .iter()
                    .enumerate()
                    .map(|(channel, on)| json!({"channel": channel, "onoff": i64::from(*on)}))
                    .collect();
                Ok(system_all(json!({"togglex": togglex})))
            }
            (Method::Set, ns::CONTROL_TOGGLEX) => {
                let togglex = field(payload, namespace, "togglex")?;
                let mut state = self.lock();
                for entry in entries(togglex) {
                    let on = int(entry, "onoff") == Some(1);
                    if let Some(switched) = state.switched.get_mut(channel(entry)) {
                        *switched = on;
                    }
                }
                Ok(json!({}))
            }
            (Method::Get, ns::CONTROL_LUMINANCE) => {
                let requested = field(payload, namespace, "control")?;
                let state = self.lock();
                let control: Vec<Value> = entries(requested)
                    .into_iter()
                    .filter_map(|entry| {
                        let channel = u16::try_from(channel(entry)).ok()?;
                        let value = state.luminance.get(&channel)?;
                        Some(json!({"channel": channel, "value": value}))
                    })
                    .collect();
                Ok(json!({"control": control}))
            }
            (Method::Set, ns::CONTROL_LUMINANCE) => {
                let control = field(payload, namespace, "control")?;
                let mut state = self.lock();
                for entry in entries(control) {
                    let value = int(entry, "value").and_then(|v| u8::try_from(v).ok());
                    let channel = u16::try_from(channel(entry)).ok();
                    if let (Some(channel), Some(value)) = (channel, value)
                        && let Some(level) = state.luminance.get_mut(&channel)
                    {
                        *level = value;
                    }
                }
                Ok(json!({}))
            }
            _ => Err(unsupported(method, namespace)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LampState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

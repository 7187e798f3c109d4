//! Virtual smart plug: one or more switched outlets.

use std::sync::{Mutex, MutexGuard, PoisonError};

use capahub_app::ports::Method;
use capahub_domain::ability::ns;
use serde_json::{Value, json};

use super::{channel, entries, field, int, system_all, unsupported};
use crate::error::VirtualError;

/// A simulated multi-outlet plug, every outlet off at start.
pub struct VirtualPlug {
    outlets: Mutex<Vec<bool>>,
}

impl VirtualPlug {
    #[must_use]
    pub fn new(outlets: usize) -> Self {
        Self {
            outlets: Mutex::new(vec![false; outlets.max(1)]),
        }
    }

    #[must_use]
    pub fn abilities(&self) -> Vec<&'static str> {
        vec![
            ns::SYSTEM_ALL,
            ns::SYSTEM_ONLINE,
            ns::SYSTEM_RUNTIME,
            ns::CONTROL_TOGGLEX,
        ]
    }

    #[must_use]
    pub fn is_on(&self, outlet: usize) -> Option<bool> {
        self.lock().get(outlet).copied()
    }

    pub(super) fn handle(&self, method: Method, namespace: &str, payload: &Value) -> Result<Value, VirtualError> {
        match (method, namespace) {
            (Method::Get, ns::SYSTEM_ALL) => {
                let togglex: Vec<Value> = self
                    .lock()
                    .iter()
                    .enumerate()
                    .map(|(channel, on)| json!({"channel": channel, "onoff": i64::from(*on)}))
                    .collect();
                Ok(system_all(json!({"togglex": togglex})))
            }
            (Method::Get, ns::SYSTEM_RUNTIME) => Ok(json!({"runtime": {"signal": 87}})),
            (Method::Set, ns::CONTROL_TOGGLEX) => {
                let togglex = field(payload, namespace, "togglex")?;
                let mut outlets = self.lock();
                for entry in entries(togglex) {
                    let on = int(entry, "onoff") == Some(1);
                    if let Some(outlet) = outlets.get_mut(channel(entry)) {
                        *outlet = on;
                    }
                }
                Ok(json!({}))
            }
            _ => Err(unsupported(method, namespace)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<bool>> {
        self.outlets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

//! In-memory transport and device builders shared by unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Notify;

use capahub_domain::ability::AbilitySet;
use capahub_domain::device_type::DeviceInfo;
use capahub_domain::error::CapaHubError;
use capahub_domain::id::DeviceUuid;
use serde_json::{Value, json};

use crate::composer::Composer;
use crate::device::Device;
use crate::ports::{Command, Transport};
use crate::registry::Registry;

#[derive(Default)]
pub(crate) struct FakeTransport {
    responses: Mutex<HashMap<String, Value>>,
    sent: Mutex<Vec<Command>>,
    hanging: Mutex<bool>,
    failing: Mutex<bool>,
    answer_limit: Mutex<Option<usize>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeTransport {
    /// Answer `namespace` with `value` from now on. Unset namespaces get `{}`.
    pub(crate) fn respond(&self, namespace: &str, value: Value) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(namespace.to_string(), value);
    }

    /// Never answer again.
    pub(crate) fn hang(&self) {
        *self.hanging.lock().unwrap_or_else(PoisonError::into_inner) = true;
    }

    /// Answer the first `count` commands, then never again.
    pub(crate) fn hang_after(&self, count: usize) {
        *self.answer_limit.lock().unwrap_or_else(PoisonError::into_inner) = Some(count);
    }

    /// Hold every answer until the returned gate is notified once per
    /// command.
    pub(crate) fn gate(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&gate));
        gate
    }

    pub(crate) fn fail(&self) {
        *self.failing.lock().unwrap_or_else(PoisonError::into_inner) = true;
    }

    pub(crate) fn sent(&self) -> Vec<Command> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Transport for FakeTransport {
    async fn execute(&self, command: Command) -> Result<Value, CapaHubError> {
        let namespace = command.namespace.clone();
        let count = {
            let mut sent = self.sent.lock().unwrap_or_else(PoisonError::into_inner);
            sent.push(command);
            sent.len()
        };

        let over_limit = self
            .answer_limit
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some_and(|limit| count > limit);
        if over_limit || *self.hanging.lock().unwrap_or_else(PoisonError::into_inner) {
            return std::future::pending().await;
        }
        let gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner).clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if *self.failing.lock().unwrap_or_else(PoisonError::into_inner) {
            return Err(CapaHubError::Transport("connection refused".into()));
        }
        Ok(self
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&namespace)
            .cloned()
            .unwrap_or_else(|| json!({})))
    }
}

pub(crate) type TestDevice = Device<Arc<FakeTransport>>;

/// A device of `device_type` composed from `abilities` by a fresh composer.
pub(crate) fn device_with(abilities: &[&str], device_type: &str) -> (TestDevice, Arc<FakeTransport>) {
    let composer = Composer::new(Arc::new(Registry::builtin()));
    let info = DeviceInfo {
        uuid: DeviceUuid::new(),
        name: format!("test {device_type}"),
        device_type: device_type.to_string(),
        hardware_version: "1.0.0".to_string(),
        firmware_version: "1.0.0".to_string(),
        channels: Vec::new(),
    };
    let abilities: AbilitySet = abilities.iter().copied().collect();
    let composite = composer.compose(&info.type_key(), &abilities);
    let transport = Arc::new(FakeTransport::default());
    (Device::new(info, composite, Arc::clone(&transport)), transport)
}


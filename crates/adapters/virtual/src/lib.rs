//! # capahub-adapter-virtual
//!
//! Simulated appliances behind the [`Transport`] port, for testing and
//! demonstration.
//!
//! ## Provided appliances
//!
//! | Appliance | Answers | Behaviour |
//! |-----------|---------|-----------|
//! | [`VirtualPlug`] | `System.All`, `System.Runtime`, `Control.ToggleX` | Switched outlets |
//! | [`VirtualPlantLight`] | `System.All`, `Control.ToggleX`, `Control.Luminance` | Three switches, twelve raw LED channels |
//! | [`VirtualDiffuser`] | `System.All`, `Control.Diffuser.Spray` or `Control.Spray` | One spray channel |
//! | [`VirtualHub`] | `System.All`, `Hub.*` | Sensors and radiator valves |
//!
//! The transport records every command it receives and can be made
//! unresponsive, in which case commands never complete.
//!
//! ## Dependency rule
//!
//! Depends on `capahub-app` (port traits) and `capahub-domain` only.

mod devices;
mod error;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use capahub_app::ports::{Command, Transport};
use capahub_domain::error::CapaHubError;
use capahub_domain::id::DeviceUuid;
use serde_json::Value;

pub use devices::{
    VirtualAppliance, VirtualDiffuser, VirtualHub, VirtualPlantLight, VirtualPlug, VirtualSubDevice,
};
pub use error::VirtualError;

/// Transport answering from in-process simulated appliances.
#[derive(Default)]
pub struct VirtualTransport {
    appliances: HashMap<DeviceUuid, VirtualAppliance>,
    journal: Mutex<Vec<Command>>,
    unresponsive: AtomicBool,
    latency: Option<Duration>,
}

impl VirtualTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `appliance` under `uuid`, replacing any previous one.
    #[must_use]
    pub fn with_appliance(mut self, uuid: DeviceUuid, appliance: VirtualAppliance) -> Self {
        self.insert(uuid, appliance);
        self
    }

    /// Delay every answer by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn insert(&mut self, uuid: DeviceUuid, appliance: VirtualAppliance) {
        tracing::debug!(%uuid, kind = appliance.kind(), "attached virtual appliance");
        self.appliances.insert(uuid, appliance);
    }

    #[must_use]
    pub fn appliance(&self, uuid: DeviceUuid) -> Option<&VirtualAppliance> {
        self.appliances.get(&uuid)
    }

    /// When set, commands are recorded but never answered.
    pub fn set_unresponsive(&self, unresponsive: bool) {
        self.unresponsive.store(unresponsive, Ordering::SeqCst);
    }

    /// Every command received so far, oldest first.
    #[must_use]
    pub fn commands(&self) -> Vec<Command> {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn answer(&self, command: &Command) -> Result<Value, VirtualError> {
        let appliance = self
            .appliances
            .get(&command.device)
            .ok_or(VirtualError::UnknownDevice(command.device))?;
        appliance.handle(command.method, &command.namespace, &command.payload)
    }
}

impl Transport for VirtualTransport {
    async fn execute(&self, command: Command) -> Result<Value, CapaHubError> {
        tracing::debug!(
            device = %command.device,
            method = %command.method,
            namespace = %command.namespace,
            "virtual command"
        );
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command.clone());

        if self.unresponsive.load(Ordering::SeqCst) {
            return std::future::pending().await;
        }
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.answer(&command).map_err(VirtualError::into_domain)
    }
}

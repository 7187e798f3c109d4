//! Capabilities: independently-defined units of device behaviour.
//!
//! A [`CapabilityKind`] names a behaviour and says which abilities it
//! consumes; a [`Capability`] is the per-device instance holding that
//! behaviour's observed state. Devices are built from an ordered list of
//! kinds and fan every notification out to each instance in that order.
//!
//! Instances never fail while handling a notification. A handler returns
//! `true` when it consumed the message and `false` otherwise, logging any
//! shape problem it ran into.

mod diffuser_spray;
mod hub;
mod luminance;
mod payload;
mod plant_light;
mod set;
mod spray;
mod system;
mod toggle;

use capahub_domain::ability::ns;
use capahub_domain::channel::ChannelInfo;
use capahub_domain::id::DeviceUuid;
use capahub_domain::observation::Source;
use serde_json::{Value, json};

use crate::ports::SubDeviceInventory;

pub use diffuser_spray::DiffuserSpray;
pub use hub::{HubCore, HubMts100, HubSensor};
pub use luminance::Luminance;
pub use plant_light::{LightCommand, PlantLight};
pub use set::CapabilitySet;
pub use spray::Spray;
pub use system::{SystemAll, SystemOnline, SystemRuntime};
pub use toggle::{Toggle, ToggleX};

pub(crate) use payload::Path;

/// Every capability the crate ships with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CapabilityKind {
    SystemAll,
    SystemOnline,
    SystemRuntime,
    Toggle,
    ToggleX,
    Luminance,
    Spray,
    DiffuserSpray,
    HubCore,
    HubSensor,
    HubMts100,
    PlantLight,
}

/// Whether a capability owns device state or only synthesizes it from
/// sibling capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Primary,
    Derived,
}

impl CapabilityKind {
    /// Built-in kinds in registration order.
    pub const BUILTIN: [Self; 12] = [
        Self::SystemAll,
        Self::SystemOnline,
        Self::SystemRuntime,
        Self::Toggle,
        Self::ToggleX,
        Self::Luminance,
        Self::Spray,
        Self::DiffuserSpray,
        Self::HubCore,
        Self::HubSensor,
        Self::HubMts100,
        Self::PlantLight,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::SystemAll => "system_all",
            Self::SystemOnline => "system_online",
            Self::SystemRuntime => "system_runtime",
            Self::Toggle => "toggle",
            Self::ToggleX => "togglex",
            Self::Luminance => "luminance",
            Self::Spray => "spray",
            Self::DiffuserSpray => "diffuser_spray",
            Self::HubCore => "hub",
            Self::HubSensor => "hub_sensor",
            Self::HubMts100 => "hub_mts100",
            Self::PlantLight => "plant_light",
        }
    }

    #[must_use]
    pub fn role(self) -> Role {
        match self {
            Self::PlantLight => Role::Derived,
            _ => Role::Primary,
        }
    }

    /// Abilities whose presence selects this kind. Empty for kinds selected
    /// by device type.
    #[must_use]
    pub fn abilities(self) -> &'static [&'static str] {
        match self {
            Self::SystemAll => &[ns::SYSTEM_ALL],
            Self::SystemOnline => &[ns::SYSTEM_ONLINE],
            Self::SystemRuntime => &[ns::SYSTEM_RUNTIME],
            Self::Toggle => &[ns::CONTROL_TOGGLE],
            Self::ToggleX => &[ns::CONTROL_TOGGLEX],
            Self::Luminance => &[ns::CONTROL_LUMINANCE],
            Self::Spray => &[ns::CONTROL_SPRAY],
            Self::DiffuserSpray => &[ns::DIFFUSER_SPRAY],
            Self::HubCore => &[ns::HUB_ONLINE, ns::HUB_TOGGLEX, ns::HUB_BATTERY],
            Self::HubSensor => &[
                ns::HUB_SENSOR_ALL,
                ns::HUB_SENSOR_ALERT,
                ns::HUB_SENSOR_TEMPHUM,
            ],
            Self::HubMts100 => &[
                ns::HUB_MTS100_ALL,
                ns::HUB_MTS100_MODE,
                ns::HUB_MTS100_TEMPERATURE,
                ns::HUB_MTS100_ADJUST,
            ],
            Self::PlantLight => &[],
        }
    }

    /// Kinds this one makes redundant when both match.
    #[must_use]
    pub fn subsumes(self) -> &'static [CapabilityKind] {
        match self {
            Self::ToggleX => &[Self::Toggle],
            _ => &[],
        }
    }

    /// A fresh instance with no observed state.
    #[must_use]
    pub fn instantiate(self) -> Capability {
        match self {
            Self::SystemAll => Capability::SystemAll(SystemAll),
            Self::SystemOnline => Capability::SystemOnline(SystemOnline::default()),
            Self::SystemRuntime => Capability::SystemRuntime(SystemRuntime::default()),
            Self::Toggle => Capability::Toggle(Toggle::default()),
            Self::ToggleX => Capability::ToggleX(ToggleX::default()),
            Self::Luminance => Capability::Luminance(Luminance::default()),
            Self::Spray => Capability::Spray(Spray::default()),
            Self::DiffuserSpray => Capability::DiffuserSpray(DiffuserSpray::default()),
            Self::HubCore => Capability::HubCore(HubCore),
            Self::HubSensor => Capability::HubSensor(HubSensor),
            Self::HubMts100 => Capability::HubMts100(HubMts100),
            Self::PlantLight => Capability::PlantLight(PlantLight::default()),
        }
    }
}

impl std::fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What a handler may consult while processing one message.
#[derive(Clone, Copy)]
pub struct DispatchContext<'a> {
    pub device: DeviceUuid,
    pub source: Source,
    pub inventory: Option<&'a dyn SubDeviceInventory>,
}

/// A request a capability issues during a full poll.
#[derive(Debug, Clone, PartialEq)]
pub struct PollRequest {
    pub namespace: &'static str,
    pub payload: Value,
    /// Failures are logged instead of aborting the poll.
    pub best_effort: bool,
}

impl PollRequest {
    pub(crate) fn get(namespace: &'static str, payload: Value) -> Self {
        Self {
            namespace,
            payload,
            best_effort: false,
        }
    }
}

/// The two notification paths every capability takes part in.
pub(crate) trait Handler {
    /// An unsolicited message from the device.
    fn handle_push(&mut self, namespace: &str, payload: &Value, ctx: &DispatchContext<'_>) -> bool;

    /// The response to a full-state poll.
    fn handle_update(&mut self, namespace: &str, snapshot: &Value, ctx: &DispatchContext<'_>)
    -> bool;
}

/// Per-device capability instance.
#[derive(Debug, Clone)]
pub enum Capability {
    SystemAll(SystemAll),
    SystemOnline(SystemOnline),
    SystemRuntime(SystemRuntime),
    Toggle(Toggle),
    ToggleX(ToggleX),
    Luminance(Luminance),
    Spray(Spray),
    DiffuserSpray(DiffuserSpray),
    HubCore(HubCore),
    HubSensor(HubSensor),
    HubMts100(HubMts100),
    PlantLight(PlantLight),
}

impl Capability {
    #[must_use]
    pub fn kind(&self) -> CapabilityKind {
        match self {
            Self::SystemAll(_) => CapabilityKind::SystemAll,
            Self::SystemOnline(_) => CapabilityKind::SystemOnline,
            Self::SystemRuntime(_) => CapabilityKind::SystemRuntime,
            Self::Toggle(_) => CapabilityKind::Toggle,
            Self::ToggleX(_) => CapabilityKind::ToggleX,
            Self::Luminance(_) => CapabilityKind::Luminance,
            Self::Spray(_) => CapabilityKind::Spray,
            Self::DiffuserSpray(_) => CapabilityKind::DiffuserSpray,
            Self::HubCore(_) => CapabilityKind::HubCore,
            Self::HubSensor(_) => CapabilityKind::HubSensor,
            Self::HubMts100(_) => CapabilityKind::HubMts100,
            Self::PlantLight(_) => CapabilityKind::PlantLight,
        }
    }

    fn handler(&mut self) -> &mut dyn Handler {
        match self {
            Self::SystemAll(c) => c,
            Self::SystemOnline(c) => c,
            Self::SystemRuntime(c) => c,
            Self::Toggle(c) => c,
            Self::ToggleX(c) => c,
            Self::Luminance(c) => c,
            Self::Spray(c) => c,
            Self::DiffuserSpray(c) => c,
            Self::HubCore(c) => c,
            Self::HubSensor(c) => c,
            Self::HubMts100(c) => c,
            Self::PlantLight(c) => c,
        }
    }

    pub fn handle_push(&mut self, namespace: &str, payload: &Value, ctx: &DispatchContext<'_>) -> bool {
        self.handler().handle_push(namespace, payload, ctx)
    }

    pub fn handle_update(
        &mut self,
        namespace: &str,
        snapshot: &Value,
        ctx: &DispatchContext<'_>,
    ) -> bool {
        self.handler().handle_update(namespace, snapshot, ctx)
    }

    /// Replacement channel layout for devices whose abilities do not
    /// describe their logical channels.
    #[must_use]
    pub fn remap_channels(&self, discovered: &[ChannelInfo]) -> Option<Vec<ChannelInfo>> {
        match self {
            Self::PlantLight(c) => Some(c.remap_channels(discovered)),
            _ => None,
        }
    }

    /// What this capability asks the device for during a full poll.
    #[must_use]
    pub fn poll_request(&self) -> Option<PollRequest> {
        match self {
            Self::SystemAll(_) => Some(PollRequest::get(ns::SYSTEM_ALL, json!({}))),
            Self::SystemRuntime(_) => Some(PollRequest::get(ns::SYSTEM_RUNTIME, json!({}))),
            Self::HubSensor(_) => Some(PollRequest::get(ns::HUB_SENSOR_ALL, json!({"all": []}))),
            Self::HubMts100(_) => Some(PollRequest {
                best_effort: true,
                ..PollRequest::get(ns::HUB_MTS100_ALL, json!({"all": []}))
            }),
            Self::PlantLight(c) => Some(c.poll_request()),
            _ => None,
        }
    }
}

/// Typed access to one variant of [`Capability`].
pub trait CapabilityVariant: Sized {
    const KIND: CapabilityKind;

    fn from_ref(capability: &Capability) -> Option<&Self>;

    fn from_mut(capability: &mut Capability) -> Option<&mut Self>;
}

macro_rules! capability_variant {
    ($($variant:ident),+ $(,)?) => {
        $(
            impl CapabilityVariant for $variant {
                const KIND: CapabilityKind = CapabilityKind::$variant;

                fn from_ref(capability: &Capability) -> Option<&Self> {
                    match capability {
                        Capability::$variant(c) => Some(c),
                        _ => None,
                    }
                }

                fn from_mut(capability: &mut Capability) -> Option<&mut Self> {
                    match capability {
                        Capability::$variant(c) => Some(c),
                        _ => None,
                    }
                }
            }
        )+
    };
}

capability_variant!(
    SystemAll,
    SystemOnline,
    SystemRuntime,
    Toggle,
    ToggleX,
    Luminance,
    Spray,
    DiffuserSpray,
    HubCore,
    HubSensor,
    HubMts100,
    PlantLight,
);

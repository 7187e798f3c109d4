//! Simulated appliances: plug, plant lamp, diffuser, hub.
//!
//! Each appliance keeps its own state behind a mutex and answers the
//! requests a real device of its kind would.

mod diffuser;
mod hub;
mod plant_light;
mod plug;

pub use diffuser::VirtualDiffuser;
pub use hub::{VirtualHub, VirtualSubDevice};
pub use plant_light::VirtualPlantLight;
pub use plug::VirtualPlug;

use capahub_app::ports::Method;
use serde_json::{Value, json};

use crate::error::VirtualError;

/// Wrapper enum for the concrete simulated appliance types.
pub enum VirtualAppliance {
    Plug(VirtualPlug),
    PlantLight(VirtualPlantLight),
    Diffuser(VirtualDiffuser),
    Hub(VirtualHub),
}

impl VirtualAppliance {
    /// Short name used in logs and errors.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Plug(_) => "plug",
            Self::PlantLight(_) => "plant_light",
            Self::Diffuser(d) if d.is_legacy() => "humidifier",
            Self::Diffuser(_) => "diffuser",
            Self::Hub(_) => "hub",
        }
    }

    /// The abilities a device of this kind reports.
    #[must_use]
    pub fn abilities(&self) -> Vec<&'static str> {
        match self {
            Self::Plug(d) => d.abilities(),
            Self::PlantLight(d) => d.abilities(),
            Self::Diffuser(d) => d.abilities(),
            Self::Hub(d) => d.abilities(),
        }
    }

    /// Answer one request.
    ///
    /// # Errors
    ///
    /// Returns [`VirtualError::UnsupportedNamespace`] for requests the
    /// appliance does not know, or [`VirtualError::BadRequest`] for
    /// malformed ones.
    pub fn handle(&self, method: Method, namespace: &str, payload: &Value) -> Result<Value, VirtualError> {
        match self {
            Self::Plug(d) => d.handle(method, namespace, payload),
            Self::PlantLight(d) => d.handle(method, namespace, payload),
            Self::Diffuser(d) => d.handle(method, namespace, payload),
            Self::Hub(d) => d.handle(method, namespace, payload),
        }
        .map_err(|err| match err {
            VirtualError::UnsupportedNamespace { method, namespace, .. } => {
                VirtualError::UnsupportedNamespace {
                    appliance: self.kind(),
                    method,
                    namespace,
                }
            }
            other => other,
        })
    }
}

/// `{"all": {"system": {"online": ...}, "digest": digest}}`.
fn system_all(digest: Value) -> Value {
    json!({"all": {"system": {"online": {"status": 1}}, "digest": digest}})
}

fn unsupported(method: Method, namespace: &str) -> VirtualError {
    VirtualError::UnsupportedNamespace {
        appliance: "appliance",
        method,
        namespace: namespace.to_string(),
    }
}

fn field<'a>(payload: &'a Value, namespace: &str, key: &'static str) -> Result<&'a Value, VirtualError> {
    payload.get(key).ok_or_else(|| VirtualError::BadRequest {
        namespace: namespace.to_string(),
        key,
    })
}

/// An object is one entry, an array is a list of them.
fn entries(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

fn int(value: &Value, key: &str) -> Option<i64> {
    value.get(key).and_then(Value::as_i64)
}

fn channel(entry: &Value) -> usize {
    int(entry, "channel")
        .and_then(|c| usize::try_from(c).ok())
        .unwrap_or(0)
}

//! Abilities: the feature namespaces a device advertises when it connects.
//!
//! An ability is an opaque string. The well-known ones this crate can drive
//! are listed in [`ns`]; anything else is carried along untouched so the
//! composite type keeps a faithful copy of what the device reported.

use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Well-known ability namespaces.
pub mod ns {
    pub const SYSTEM_ALL: &str = "Appliance.System.All";
    pub const SYSTEM_ONLINE: &str = "Appliance.System.Online";
    pub const SYSTEM_RUNTIME: &str = "Appliance.System.Runtime";

    pub const CONTROL_TOGGLE: &str = "Appliance.Control.Toggle";
    pub const CONTROL_TOGGLEX: &str = "Appliance.Control.ToggleX";
    pub const CONTROL_LUMINANCE: &str = "Appliance.Control.Luminance";
    pub const CONTROL_SPRAY: &str = "Appliance.Control.Spray";
    pub const DIFFUSER_SPRAY: &str = "Appliance.Control.Diffuser.Spray";

    pub const HUB_SUBDEVICE_LIST: &str = "Appliance.Hub.SubdeviceList";
    pub const HUB_ONLINE: &str = "Appliance.Hub.Online";
    pub const HUB_TOGGLEX: &str = "Appliance.Hub.ToggleX";
    pub const HUB_BATTERY: &str = "Appliance.Hub.Battery";
    pub const HUB_SENSOR_ALL: &str = "Appliance.Hub.Sensor.All";
    pub const HUB_SENSOR_ALERT: &str = "Appliance.Hub.Sensor.Alert";
    pub const HUB_SENSOR_TEMPHUM: &str = "Appliance.Hub.Sensor.TempHum";
    pub const HUB_MTS100_ALL: &str = "Appliance.Hub.Mts100.All";
    pub const HUB_MTS100_MODE: &str = "Appliance.Hub.Mts100.Mode";
    pub const HUB_MTS100_TEMPERATURE: &str = "Appliance.Hub.Mts100.Temperature";
    pub const HUB_MTS100_ADJUST: &str = "Appliance.Hub.Mts100.Adjust";
}

/// One advertised feature namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ability(String);

impl Ability {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Ability {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Ability {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for Ability {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Ability {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Ability {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The set of abilities a device reported. Ordering carries no meaning, so
/// the set is kept sorted to make equal reports compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbilitySet(BTreeSet<Ability>);

impl AbilitySet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from the keys of an ability document as reported by the
    /// device (`{"Appliance.Control.ToggleX": {}, ...}`). Non-object input
    /// yields an empty set.
    #[must_use]
    pub fn from_document(document: &serde_json::Value) -> Self {
        document
            .as_object()
            .map(|map| map.keys().map(|k| Ability::from(k.as_str())).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn contains(&self, ability: &str) -> bool {
        self.0.contains(ability)
    }

    pub fn insert(&mut self, ability: impl Into<Ability>) -> bool {
        self.0.insert(ability.into())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ability> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<A: Into<Ability>> FromIterator<A> for AbilitySet {
    fn from_iter<I: IntoIterator<Item = A>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a AbilitySet {
    type Item = &'a Ability;
    type IntoIter = std::collections::btree_set::Iter<'a, Ability>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

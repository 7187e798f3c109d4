//! Capability registry: the process-wide catalog of capability kinds.
//!
//! Each entry pairs a kind with the predicate that selects it for a
//! `(ability, device type)` pair and the kinds it subsumes. Registration
//! order is significant: it is the order in which the composer considers
//! candidates, and it breaks ties between unrelated kinds claiming the same
//! ability.

use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

use capahub_domain::ability::{Ability, AbilitySet};

use crate::capability::{CapabilityKind, Role};
use crate::resolver::Candidate;

/// Device type of the two-light plant lamp.
pub const PLANT_LIGHT_DEVICE_TYPE: &str = "bgl120a";

static GLOBAL: OnceLock<Arc<Registry>> = OnceLock::new();

/// Decides whether a capability applies to one reported ability.
#[derive(Debug, Clone, Copy)]
pub enum Predicate {
    /// The ability is one of these namespaces.
    Abilities(&'static [&'static str]),
    /// The device is of this type, whatever the ability.
    DeviceType(&'static str),
    Custom(fn(&str, &str) -> bool),
}

impl Predicate {
    #[must_use]
    pub fn matches(&self, ability: &str, device_type: &str) -> bool {
        match self {
            Self::Abilities(names) => names.contains(&ability),
            Self::DeviceType(name) => name.eq_ignore_ascii_case(device_type),
            Self::Custom(f) => f(ability, device_type),
        }
    }
}

/// One registry entry.
#[derive(Debug, Clone, Copy)]
pub struct CapabilityDescriptor {
    pub kind: CapabilityKind,
    pub predicate: Predicate,
    /// Kinds made redundant by this one.
    pub subsumes: &'static [CapabilityKind],
}

impl CapabilityDescriptor {
    /// The descriptor a built-in kind registers with.
    #[must_use]
    pub fn builtin(kind: CapabilityKind) -> Self {
        let predicate = match kind {
            CapabilityKind::PlantLight => Predicate::DeviceType(PLANT_LIGHT_DEVICE_TYPE),
            other => Predicate::Abilities(other.abilities()),
        };
        Self {
            kind,
            predicate,
            subsumes: kind.subsumes(),
        }
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.kind.role()
    }
}

/// Ordered catalog of capability descriptors.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    descriptors: Vec<CapabilityDescriptor>,
}

impl Registry {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every built-in kind, in [`CapabilityKind::BUILTIN`] order.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for kind in CapabilityKind::BUILTIN {
            registry.register(kind);
        }
        registry
    }

    /// The shared built-in registry, created on first use.
    #[must_use]
    pub fn global() -> Arc<Registry> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::builtin())))
    }

    /// Register a built-in kind. Returns `false` if the kind is already
    /// present; the catalog is left as it was.
    pub fn register(&mut self, kind: CapabilityKind) -> bool {
        self.register_descriptor(CapabilityDescriptor::builtin(kind))
    }

    /// Register a descriptor with a custom predicate. Idempotent by kind.
    pub fn register_descriptor(&mut self, descriptor: CapabilityDescriptor) -> bool {
        if self.position(descriptor.kind).is_some() {
            return false;
        }
        tracing::debug!(capability = %descriptor.kind, "registered capability");
        self.descriptors.push(descriptor);
        true
    }

    /// Every descriptor, in registration order.
    #[must_use]
    pub fn all(&self) -> &[CapabilityDescriptor] {
        &self.descriptors
    }

    #[must_use]
    pub fn position(&self, kind: CapabilityKind) -> Option<usize> {
        self.descriptors.iter().position(|d| d.kind == kind)
    }

    /// Whether any descriptor matches any of `abilities`.
    #[must_use]
    pub fn matches_any(&self, abilities: &AbilitySet, device_type: &str) -> bool {
        self.descriptors.iter().any(|d| {
            abilities
                .iter()
                .any(|a| d.predicate.matches(a.as_str(), device_type))
        })
    }

    /// Matching descriptors in registration order, each with the abilities
    /// it matched. The result does not depend on the order of `abilities`.
    #[must_use]
    pub fn candidates(&self, abilities: &AbilitySet, device_type: &str) -> Vec<Candidate> {
        self.descriptors
            .iter()
            .filter_map(|descriptor| {
                let claimed: BTreeSet<Ability> = abilities
                    .iter()
                    .filter(|a| descriptor.predicate.matches(a.as_str(), device_type))
                    .cloned()
                    .collect();
                (!claimed.is_empty()).then(|| Candidate::new(*descriptor, claimed))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capahub_domain::ability::ns;

    #[test]
    fn should_register_every_builtin_kind_once() {
        let registry = Registry::builtin();
        assert_eq!(registry.all().len(), CapabilityKind::BUILTIN.len());
    }

    #[test]
    fn should_ignore_duplicate_registration() {
        let mut registry = Registry::builtin();
        let before: Vec<_> = registry.all().iter().map(|d| d.kind).collect();

        assert!(!registry.register(CapabilityKind::ToggleX));

        let after: Vec<_> = registry.all().iter().map(|d| d.kind).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn should_keep_registration_order() {
        let mut registry = Registry::empty();
        registry.register(CapabilityKind::Spray);
        registry.register(CapabilityKind::SystemAll);
        assert_eq!(registry.position(CapabilityKind::Spray), Some(0));
        assert_eq!(registry.position(CapabilityKind::SystemAll), Some(1));
    }

    #[test]
    fn should_match_plant_light_by_device_type() {
        let descriptor = CapabilityDescriptor::builtin(CapabilityKind::PlantLight);
        assert!(descriptor.predicate.matches(ns::SYSTEM_ALL, "bgl120a"));
        assert!(!descriptor.predicate.matches(ns::SYSTEM_ALL, "msl120"));
    }

    #[test]
    fn should_collect_claimed_abilities_per_candidate() {
        let registry = Registry::builtin();
        let abilities: AbilitySet = [ns::HUB_ONLINE, ns::HUB_TOGGLEX, ns::SYSTEM_ALL]
            .into_iter()
            .collect();

        let candidates = registry.candidates(&abilities, "msh300");

        let kinds: Vec<_> = candidates.iter().map(Candidate::kind).collect();
        assert_eq!(kinds, vec![CapabilityKind::SystemAll, CapabilityKind::HubCore]);
        assert_eq!(candidates[1].abilities().len(), 2);
    }

    #[test]
    fn should_accept_custom_predicate() {
        let mut registry = Registry::empty();
        registry.register_descriptor(CapabilityDescriptor {
            kind: CapabilityKind::Luminance,
            predicate: Predicate::Custom(|ability, _| ability.starts_with("Appliance.Control.Light")),
            subsumes: &[],
        });
        let abilities: AbilitySet = ["Appliance.Control.Light"].into_iter().collect();
        assert!(registry.matches_any(&abilities, "msl120"));
    }

    #[test]
    fn should_share_global_registry() {
        assert!(Arc::ptr_eq(&Registry::global(), &Registry::global()));
    }
}

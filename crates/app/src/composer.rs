//! Device-type composer: builds, once per device type key, the ordered
//! capability list every device of that model shares.
//!
//! Composition is memoized: the first caller for a key builds the type
//! under the write lock, concurrent callers for the same key wait and get
//! the same [`Arc`].

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use capahub_domain::ability::{AbilitySet, ns};
use capahub_domain::device_type::{BaseKind, DeviceTypeKey};

use crate::capability::{CapabilityKind, Role};
use crate::registry::Registry;
use crate::resolver::{self, Candidate};

static GLOBAL: OnceLock<Arc<Composer>> = OnceLock::new();

/// The composed type of one device model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeType {
    key: DeviceTypeKey,
    capabilities: Vec<CapabilityKind>,
    base: BaseKind,
    abilities: AbilitySet,
}

impl CompositeType {
    #[must_use]
    pub fn key(&self) -> &DeviceTypeKey {
        &self.key
    }

    #[must_use]
    pub fn name(&self) -> String {
        self.key.to_string()
    }

    /// Capabilities in dispatch order: primaries in registry order, then
    /// derived ones.
    #[must_use]
    pub fn capabilities(&self) -> &[CapabilityKind] {
        &self.capabilities
    }

    /// Always consulted last during dispatch.
    #[must_use]
    pub fn base(&self) -> BaseKind {
        self.base
    }

    /// The abilities the type was composed from.
    #[must_use]
    pub fn abilities(&self) -> &AbilitySet {
        &self.abilities
    }

    #[must_use]
    pub fn has(&self, kind: CapabilityKind) -> bool {
        self.capabilities.contains(&kind)
    }
}

/// Memoizing composer over one registry.
pub struct Composer {
    registry: Arc<Registry>,
    memo: RwLock<HashMap<DeviceTypeKey, Arc<CompositeType>>>,
}

impl Composer {
    #[must_use]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            memo: RwLock::new(HashMap::new()),
        }
    }

    /// Process-wide composer over [`Registry::global`].
    #[must_use]
    pub fn global() -> Arc<Composer> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::new(Registry::global()))))
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The composite type for `key`. `abilities` is only read the first
    /// time a key is seen; later calls return the memoized type.
    pub fn compose(&self, key: &DeviceTypeKey, abilities: &AbilitySet) -> Arc<CompositeType> {
        if let Some(found) = self.cached(key) {
            return found;
        }

        let mut memo = self.memo.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(found) = memo.get(key) {
            return Arc::clone(found);
        }
        let composite = Arc::new(self.build(key, abilities));
        tracing::info!(
            device_type = %key,
            capabilities = ?composite.capabilities(),
            base = composite.base().as_str(),
            "composed device type"
        );
        memo.insert(key.clone(), Arc::clone(&composite));
        composite
    }

    #[must_use]
    pub fn cached(&self, key: &DeviceTypeKey) -> Option<Arc<CompositeType>> {
        self.memo
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Number of memoized types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.memo.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn build(&self, key: &DeviceTypeKey, abilities: &AbilitySet) -> CompositeType {
        let candidates = self.registry.candidates(abilities, &key.device_type);
        let mut capabilities: Vec<CapabilityKind> = resolver::resolve(candidates)
            .iter()
            .map(Candidate::kind)
            .collect();
        capabilities.sort_by_key(|kind| (kind.role() == Role::Derived, self.registry.position(*kind)));

        // a hub that stops reporting the sub-device list is composed as generic
        let base = if abilities.contains(ns::HUB_SUBDEVICE_LIST) {
            BaseKind::Hub
        } else {
            BaseKind::Generic
        };

        CompositeType {
            key: key.clone(),
            capabilities,
            base,
            abilities: abilities.clone(),
        }
    }
}

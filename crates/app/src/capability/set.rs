//! The ordered capability instances of one device.

use capahub_domain::channel::ChannelInfo;
use capahub_domain::observation::Source;
use serde_json::Value;

use super::{
    Capability, CapabilityKind, CapabilityVariant, DispatchContext, Luminance, PlantLight,
    PollRequest, ToggleX,
};

/// Capability instances in dispatch order.
#[derive(Debug, Clone, Default)]
pub struct CapabilitySet {
    items: Vec<Capability>,
}

impl CapabilitySet {
    #[must_use]
    pub fn new(kinds: &[CapabilityKind]) -> Self {
        Self {
            items: kinds.iter().map(|k| k.instantiate()).collect(),
        }
    }

    pub fn kinds(&self) -> impl Iterator<Item = CapabilityKind> + '_ {
        self.items.iter().map(Capability::kind)
    }

    #[must_use]
    pub fn contains(&self, kind: CapabilityKind) -> bool {
        self.items.iter().any(|c| c.kind() == kind)
    }

    #[must_use]
    pub fn get<C: CapabilityVariant>(&self) -> Option<&C> {
        self.items.iter().find_map(C::from_ref)
    }

    pub fn get_mut<C: CapabilityVariant>(&mut self) -> Option<&mut C> {
        self.items.iter_mut().find_map(C::from_mut)
    }

    /// Offer one message to every capability, in order, then refresh
    /// derived state. No capability is skipped because an earlier one
    /// consumed the message.
    pub fn dispatch(
        &mut self,
        namespace: &str,
        payload: &Value,
        is_full_snapshot: bool,
        ctx: &DispatchContext<'_>,
    ) -> bool {
        let mut handled = false;
        for capability in &mut self.items {
            let consumed = if is_full_snapshot {
                capability.handle_update(namespace, payload, ctx)
            } else {
                capability.handle_push(namespace, payload, ctx)
            };
            tracing::trace!(capability = %capability.kind(), namespace, consumed, "offered message");
            handled |= consumed;
        }
        if handled {
            self.recompute_derived(ctx.source);
        }
        handled
    }

    /// Recompute every derived capability from its siblings.
    pub fn recompute_derived(&mut self, source: Source) {
        if !self.contains(CapabilityKind::PlantLight) {
            return;
        }
        let toggles = self.get::<ToggleX>().map(|t| t.states().clone());
        let luminance = self.get::<Luminance>().map(|l| l.states().clone());
        if let Some(plant) = self.get_mut::<PlantLight>() {
            plant.recompute(toggles.as_ref(), luminance.as_ref(), source);
        }
    }

    #[must_use]
    pub fn poll_requests(&self) -> Vec<PollRequest> {
        self.items.iter().filter_map(Capability::poll_request).collect()
    }

    /// The channel layout after every remapping capability had its say.
    #[must_use]
    pub fn remap_channels(&self, discovered: Vec<ChannelInfo>) -> Vec<ChannelInfo> {
        self.items
            .iter()
            .fold(discovered, |channels, capability| {
                capability.remap_channels(&channels).unwrap_or(channels)
            })
    }
}

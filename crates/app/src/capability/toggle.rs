//! On/off switching: the legacy single-channel `Toggle` and the
//! multi-channel `ToggleX`.

use std::time::Duration;

use capahub_domain::ability::ns;
use capahub_domain::channel::Channel;
use capahub_domain::error::{CapaHubError, ValidationError};
use capahub_domain::observation::{ChannelStates, Observation, Source};
use serde_json::{Value, json};

use super::payload::{self, Path};
use super::{DispatchContext, Handler};
use crate::device::Device;
use crate::ports::{Method, Transport};

/// Per-channel on/off cells fed from a list (or single object) of
/// `{channel, onoff}` elements.
#[derive(Debug, Clone, Default)]
struct OnOff {
    states: ChannelStates<bool>,
}

impl OnOff {
    fn apply(&mut self, namespace: &str, key: &'static str, value: &Value, source: Source) -> bool {
        if !(value.is_array() || value.is_object()) {
            payload::skip_element(namespace, key, value);
            return false;
        }
        for entry in payload::entries(value) {
            match (payload::channel_of(entry), payload::int(entry, "onoff")) {
                (Some(channel), Some(onoff)) => self.states.observe(channel, onoff == 1, source),
                _ => payload::skip_element(namespace, key, entry),
            }
        }
        true
    }
}

/// Legacy switching. Only the main channel is addressable.
#[derive(Debug, Clone, Default)]
pub struct Toggle {
    inner: OnOff,
}

impl Toggle {
    #[must_use]
    pub fn is_on(&self, channel: Channel) -> Option<bool> {
        self.inner.states.copied(channel)
    }

    #[must_use]
    pub fn states(&self) -> &ChannelStates<bool> {
        &self.inner.states
    }

    pub(crate) fn set(&mut self, channel: Channel, on: bool, source: Source) {
        self.inner.states.observe(channel, on, source);
    }
}

impl Handler for Toggle {
    fn handle_push(&mut self, namespace: &str, payload: &Value, ctx: &DispatchContext<'_>) -> bool {
        if namespace != ns::CONTROL_TOGGLE {
            return false;
        }
        payload::require(payload, namespace, "toggle", Path::Push)
            .is_some_and(|value| self.inner.apply(namespace, "toggle", value, ctx.source))
    }

    fn handle_update(&mut self, namespace: &str, snapshot: &Value, ctx: &DispatchContext<'_>) -> bool {
        if namespace != ns::SYSTEM_ALL {
            return false;
        }
        payload::require_path(snapshot, namespace, &["all", "control", "toggle"], Path::Snapshot)
            .is_some_and(|value| self.inner.apply(namespace, "toggle", value, ctx.source))
    }
}

/// Multi-channel switching.
#[derive(Debug, Clone, Default)]
pub struct ToggleX {
    inner: OnOff,
}

impl ToggleX {
    #[must_use]
    pub fn is_on(&self, channel: Channel) -> Option<bool> {
        self.inner.states.copied(channel)
    }

    #[must_use]
    pub fn states(&self) -> &ChannelStates<bool> {
        &self.inner.states
    }

    pub(crate) fn set(&mut self, channel: Channel, on: bool, source: Source) {
        self.inner.states.observe(channel, on, source);
    }
}

impl Handler for ToggleX {
    fn handle_push(&mut self, namespace: &str, payload: &Value, ctx: &DispatchContext<'_>) -> bool {
        if namespace != ns::CONTROL_TOGGLEX {
            return false;
        }
        payload::require(payload, namespace, "togglex", Path::Push)
            .is_some_and(|value| self.inner.apply(namespace, "togglex", value, ctx.source))
    }

    fn handle_update(&mut self, namespace: &str, snapshot: &Value, ctx: &DispatchContext<'_>) -> bool {
        if namespace != ns::SYSTEM_ALL {
            return false;
        }
        payload::require_path(snapshot, namespace, &["all", "digest", "togglex"], Path::Snapshot)
            .is_some_and(|value| self.inner.apply(namespace, "togglex", value, ctx.source))
    }
}

impl<T> Device<T> {
    /// Cached on/off state of `channel`. `ToggleX` wins when both switching
    /// capabilities are present.
    #[must_use]
    pub fn is_on(&self, channel: Channel) -> Option<bool> {
        self.read(|t: &ToggleX| t.is_on(channel))
            .or_else(|| self.read(|t: &Toggle| t.is_on(channel)))
            .flatten()
    }

    /// Like [`is_on`](Self::is_on), with where the value came from.
    #[must_use]
    pub fn observed_on(&self, channel: Channel) -> Option<Observation<bool>> {
        self.read(|t: &ToggleX| t.states().get(channel).cloned())
            .or_else(|| self.read(|t: &Toggle| t.states().get(channel).cloned()))
            .flatten()
    }
}

impl<T: Transport> Device<T> {
    /// # Errors
    ///
    /// [`CapaHubError::Unsupported`] without a switching capability, or the
    /// command's own failure.
    pub async fn turn_on(&self, channel: Channel, timeout: Option<Duration>) -> Result<(), CapaHubError> {
        self.switch(channel, true, timeout).await
    }

    /// # Errors
    ///
    /// Same as [`turn_on`](Self::turn_on).
    pub async fn turn_off(&self, channel: Channel, timeout: Option<Duration>) -> Result<(), CapaHubError> {
        self.switch(channel, false, timeout).await
    }

    /// Flip the cached state; an unknown state counts as off.
    ///
    /// # Errors
    ///
    /// Same as [`turn_on`](Self::turn_on).
    pub async fn toggle(&self, channel: Channel, timeout: Option<Duration>) -> Result<(), CapaHubError> {
        let on = self.is_on(channel).unwrap_or(false);
        self.switch(channel, !on, timeout).await
    }

    #[tracing::instrument(skip(self), fields(device = %self.uuid()))]
    async fn switch(&self, channel: Channel, on: bool, timeout: Option<Duration>) -> Result<(), CapaHubError> {
        let onoff = i64::from(on);
        if self.has::<ToggleX>() {
            let payload = json!({"togglex": {"onoff": onoff, "channel": channel.index()}});
            self.execute(Method::Set, ns::CONTROL_TOGGLEX, payload, timeout).await?;
            self.commit(ns::CONTROL_TOGGLEX, |t: &mut ToggleX| {
                t.set(channel, on, Source::Optimistic);
            });
        } else if self.has::<Toggle>() {
            if !channel.is_main() {
                return Err(ValidationError::ChannelOutOfRange {
                    channel: channel.index(),
                    operation: "toggle",
                }
                .into());
            }
            let payload = json!({"toggle": {"onoff": onoff}});
            self.execute(Method::Set, ns::CONTROL_TOGGLE, payload, timeout).await?;
            self.commit(ns::CONTROL_TOGGLE, |t: &mut Toggle| {
                t.set(channel, on, Source::Optimistic);
            });
        } else {
            return Err(self.unsupported::<ToggleX>());
        }
        Ok(())
    }
}

//! Oil diffuser spray mode. Same idea as humidifier spray, different
//! namespace and mode table.

use std::time::Duration;

use capahub_domain::ability::ns;
use capahub_domain::channel::Channel;
use capahub_domain::error::CapaHubError;
use capahub_domain::mode::DiffuserSprayMode;
use capahub_domain::observation::{ChannelStates, Source};
use serde_json::{Value, json};

use super::payload::{self, Path};
use super::{DispatchContext, Handler};
use crate::device::Device;
use crate::ports::{Method, Transport};

#[derive(Debug, Clone, Default)]
pub struct DiffuserSpray {
    states: ChannelStates<DiffuserSprayMode>,
}

impl DiffuserSpray {
    #[must_use]
    pub fn mode(&self, channel: Channel) -> Option<DiffuserSprayMode> {
        self.states.copied(channel)
    }

    fn apply(&mut self, namespace: &str, value: &Value, source: Source) -> bool {
        let Some(items) = value.as_array() else {
            payload::skip_element(namespace, "spray", value);
            return false;
        };
        for entry in items {
            let mode = payload::int(entry, "mode").and_then(|m| DiffuserSprayMode::try_from(m).ok());
            match (payload::channel_of(entry), mode) {
                (Some(channel), Some(mode)) => self.states.observe(channel, mode, source),
                _ => payload::skip_element(namespace, "spray", entry),
            }
        }
        true
    }
}

impl Handler for DiffuserSpray {
    fn handle_push(&mut self, namespace: &str, payload: &Value, ctx: &DispatchContext<'_>) -> bool {
        if namespace != ns::DIFFUSER_SPRAY {
            return false;
        }
        payload::require(payload, namespace, "spray", Path::Push)
            .is_some_and(|value| self.apply(namespace, value, ctx.source))
    }

    fn handle_update(&mut self, namespace: &str, snapshot: &Value, ctx: &DispatchContext<'_>) -> bool {
        if namespace != ns::SYSTEM_ALL {
            return false;
        }
        payload::require_path(
            snapshot,
            namespace,
            &["all", "digest", "diffuser", "spray"],
            Path::Snapshot,
        )
        .is_some_and(|value| self.apply(namespace, value, ctx.source))
    }
}

impl<T> Device<T> {
    #[must_use]
    pub fn diffuser_spray_mode(&self, channel: Channel) -> Option<DiffuserSprayMode> {
        self.read(|s: &DiffuserSpray| s.mode(channel)).flatten()
    }
}

impl<T: Transport> Device<T> {
    /// # Errors
    ///
    /// [`CapaHubError::Unsupported`] without diffuser spray control, or the
    /// command's own failure.
    #[tracing::instrument(skip(self), fields(device = %self.uuid()))]
    pub async fn set_diffuser_spray_mode(
        &self,
        mode: DiffuserSprayMode,
        channel: Channel,
        timeout: Option<Duration>,
    ) -> Result<(), CapaHubError> {
        self.require::<DiffuserSpray>()?;
        let payload = json!({"spray": [{"mode": i64::from(mode), "channel": channel.index()}]});
        self.execute(Method::Set, ns::DIFFUSER_SPRAY, payload, timeout)
            .await?;
        self.commit(ns::DIFFUSER_SPRAY, |s: &mut DiffuserSpray| {
            s.states.observe(channel, mode, Source::Optimistic);
        });
        Ok(())
    }
}

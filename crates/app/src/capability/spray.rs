//! Humidifier spray mode.

use std::time::Duration;

use capahub_domain::ability::ns;
use capahub_domain::channel::Channel;
use capahub_domain::error::CapaHubError;
use capahub_domain::mode::SprayMode;
use capahub_domain::observation::{ChannelStates, Source};
use serde_json::{Value, json};

use super::payload::{self, Path};
use super::{DispatchContext, Handler};
use crate::device::Device;
use crate::ports::{Method, Transport};

#[derive(Debug, Clone, Default)]
pub struct Spray {
    states: ChannelStates<SprayMode>,
}

impl Spray {
    #[must_use]
    pub fn mode(&self, channel: Channel) -> Option<SprayMode> {
        self.states.copied(channel)
    }

    #[must_use]
    pub fn states(&self) -> &ChannelStates<SprayMode> {
        &self.states
    }

    fn apply(&mut self, namespace: &str, value: &Value, source: Source) -> bool {
        if !(value.is_array() || value.is_object()) {
            payload::skip_element(namespace, "spray", value);
            return false;
        }
        for entry in payload::entries(value) {
            let mode = payload::int(entry, "mode").and_then(|m| SprayMode::try_from(m).ok());
            match (payload::channel_of(entry), mode) {
                (Some(channel), Some(mode)) => self.states.observe(channel, mode, source),
                _ => payload::skip_element(namespace, "spray", entry),
            }
        }
        true
    }
}

impl Handler for Spray {
    fn handle_push(&mut self, namespace: &str, payload: &Value, ctx: &DispatchContext<'_>) -> bool {
        if namespace != ns::CONTROL_SPRAY {
            return false;
        }
        payload::require(payload, namespace, "spray", Path::Push)
            .is_some_and(|value| self.apply(namespace, value, ctx.source))
    }

    fn handle_update(&mut self, namespace: &str, snapshot: &Value, ctx: &DispatchContext<'_>) -> bool {
        if namespace != ns::SYSTEM_ALL {
            return false;
        }
        payload::require_path(snapshot, namespace, &["all", "digest", "spray"], Path::Snapshot)
            .is_some_and(|value| self.apply(namespace, value, ctx.source))
    }
}

impl<T> Device<T> {
    #[must_use]
    pub fn spray_mode(&self, channel: Channel) -> Option<SprayMode> {
        self.read(|s: &Spray| s.mode(channel)).flatten()
    }
}

impl<T: Transport> Device<T> {
    /// # Errors
    ///
    /// [`CapaHubError::Unsupported`] without spray control, or the command's
    /// own failure.
    #[tracing::instrument(skip(self), fields(device = %self.uuid()))]
    pub async fn set_spray_mode(
        &self,
        mode: SprayMode,
        channel: Channel,
        timeout: Option<Duration>,
    ) -> Result<(), CapaHubError> {
        self.require::<Spray>()?;
        let payload = json!({"spray": {"channel": channel.index(), "mode": i64::from(mode)}});
        self.execute(Method::Set, ns::CONTROL_SPRAY, payload, timeout)
            .await?;
        self.commit(ns::CONTROL_SPRAY, |s: &mut Spray| {
            s.states.observe(channel, mode, Source::Optimistic);
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::device_with;
    use capahub_domain::id::DeviceUuid;

    fn ctx(source: Source) -> DispatchContext<'static> {
        DispatchContext {
            device: DeviceUuid::new(),
            source,
            inventory: None,
        }
    }

    #[test]
    fn should_read_modes_from_digest() {
        let mut spray = Spray::default();
        let snapshot = json!({"all": {"digest": {"spray": [{"channel": 0, "mode": 2}]}}});
        assert!(spray.handle_update(ns::SYSTEM_ALL, &snapshot, &ctx(Source::Polled)));
        assert_eq!(spray.mode(Channel::MAIN), Some(SprayMode::Intermittent));
    }

    #[test]
    fn should_skip_unknown_mode_code() {
        let mut spray = Spray::default();
        let payload = json!({"spray": [{"channel": 0, "mode": 9}, {"channel": 1, "mode": 1}]});
        assert!(spray.handle_push(ns::CONTROL_SPRAY, &payload, &ctx(Source::Pushed)));
        assert_eq!(spray.mode(Channel::MAIN), None);
        assert_eq!(spray.mode(Channel::new(1)), Some(SprayMode::Continuous));
    }

    #[test]
    fn should_not_handle_snapshot_without_spray_digest() {
        let mut spray = Spray::default();
        let snapshot = json!({"all": {"digest": {}}});
        assert!(!spray.handle_update(ns::SYSTEM_ALL, &snapshot, &ctx(Source::Polled)));
    }

    #[tokio::test]
    async fn should_send_mode_and_apply_optimistically() {
        let (device, transport) = device_with(&[ns::CONTROL_SPRAY], "msxh0");

        device
            .set_spray_mode(SprayMode::Continuous, Channel::MAIN, None)
            .await
            .unwrap();

        assert_eq!(
            transport.sent()[0].payload,
            json!({"spray": {"channel": 0, "mode": 1}})
        );
        assert_eq!(device.spray_mode(Channel::MAIN), Some(SprayMode::Continuous));
    }
}

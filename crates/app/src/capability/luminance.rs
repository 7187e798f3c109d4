//! Per-channel brightness.

use std::collections::BTreeMap;
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

/// Highest brightness a channel accepts.
pub const MAX_LUMINANCE: u8 = 100;

/// Brightness of every channel reported so far, 0..=100.
#[derive(Debug, Clone, Default)]
pub struct Luminance {
    states: ChannelStates<u8>,
}

impl Luminance {
    #[must_use]
    pub fn get(&self, channel: Channel) -> Option<u8> {
        self.states.copied(channel)
    }

    #[must_use]
    pub fn states(&self) -> &ChannelStates<u8> {
        &self.states
    }

    pub(crate) fn set(&mut self, channel: Channel, value: u8, source: Source) {
        self.states.observe(channel, value, source);
    }

    /// `control` is a list of `{channel, value}`.
    fn apply(&mut self, namespace: &str, control: &Value, source: Source) -> bool {
        let Some(items) = control.as_array() else {
            payload::skip_element(namespace, "control", control);
            return false;
        };
        for entry in items {
            let value = payload::int(entry, "value")
                .and_then(|v| u8::try_from(v).ok())
                .filter(|v| *v <= MAX_LUMINANCE);
            match (payload::channel_of(entry), value) {
                (Some(channel), Some(value)) => self.states.observe(channel, value, source),
                _ => payload::skip_element(namespace, "control", entry),
            }
        }
        true
    }
}

impl Handler for Luminance {
    fn handle_push(&mut self, namespace: &str, payload: &Value, ctx: &DispatchContext<'_>) -> bool {
        if namespace != ns::CONTROL_LUMINANCE {
            return false;
        }
        payload::require(payload, namespace, "control", Path::Push)
            .is_some_and(|control| self.apply(namespace, control, ctx.source))
    }

    /// Luminance is not part of the `System.All` digest; it is polled with
    /// an explicit channel read whose answer has the push shape.
    fn handle_update(&mut self, namespace: &str, snapshot: &Value, ctx: &DispatchContext<'_>) -> bool {
        if namespace != ns::CONTROL_LUMINANCE {
            return false;
        }
        payload::require(snapshot, namespace, "control", Path::Snapshot)
            .is_some_and(|control| self.apply(namespace, control, ctx.source))
    }
}

fn check(value: u8) -> Result<u8, ValidationError> {
    if value > MAX_LUMINANCE {
        return Err(ValidationError::LuminanceOutOfRange(u16::from(value)));
    }
    Ok(value)
}

impl<T> Device<T> {
    #[must_use]
    pub fn luminance(&self, channel: Channel) -> Option<u8> {
        self.read(|l: &Luminance| l.get(channel)).flatten()
    }

    #[must_use]
    pub fn observed_luminance(&self, channel: Channel) -> Option<Observation<u8>> {
        self.read(|l: &Luminance| l.states().get(channel).cloned())
            .flatten()
    }
}

impl<T: Transport> Device<T> {
    /// # Errors
    ///
    /// Same as [`bulk_set_luminance`](Self::bulk_set_luminance).
    pub async fn set_luminance(
        &self,
        channel: Channel,
        value: u8,
        timeout: Option<Duration>,
    ) -> Result<(), CapaHubError> {
        self.bulk_set_luminance(&BTreeMap::from([(channel, value)]), timeout)
            .await
    }

    /// Set several channels with one command. An empty map sends nothing.
    ///
    /// # Errors
    ///
    /// [`ValidationError::LuminanceOutOfRange`] before anything is sent,
    /// [`CapaHubError::Unsupported`] without luminance, or the command's
    /// own failure.
    #[tracing::instrument(skip(self), fields(device = %self.uuid()))]
    pub async fn bulk_set_luminance(
        &self,
        values: &BTreeMap<Channel, u8>,
        timeout: Option<Duration>,
    ) -> Result<(), CapaHubError> {
        self.require::<Luminance>()?;
        if values.is_empty() {
            return Ok(());
        }
        let payload = control_payload(values)?;
        self.execute(Method::Set, ns::CONTROL_LUMINANCE, payload, timeout)
            .await?;
        self.commit(ns::CONTROL_LUMINANCE, |l: &mut Luminance| {
            for (channel, value) in values {
                l.set(*channel, *value, Source::Optimistic);
            }
        });
        Ok(())
    }

    /// Read the given channels back from the device.
    ///
    /// # Errors
    ///
    /// [`CapaHubError::Unsupported`] without luminance, or the command's own
    /// failure.
    pub async fn refresh_luminance(
        &self,
        channels: impl IntoIterator<Item = Channel>,
        timeout: Option<Duration>,
    ) -> Result<(), CapaHubError> {
        self.require::<Luminance>()?;
        let request = luminance_request(channels);
        let response = self
            .execute(Method::Get, ns::CONTROL_LUMINANCE, request, timeout)
            .await?;
        self.dispatch(ns::CONTROL_LUMINANCE, &response, true);
        Ok(())
    }
}

/// `{"control": [{channel, value}, ..]}` for a bulk set, validated.
pub(crate) fn control_payload(values: &BTreeMap<Channel, u8>) -> Result<Value, ValidationError> {
    let control = values
        .iter()
        .map(|(channel, value)| check(*value).map(|value| json!({"channel": channel.index(), "value": value})))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(json!({"control": control}))
}

pub(crate) fn luminance_request(channels: impl IntoIterator<Item = Channel>) -> Value {
    let control: Vec<Value> = channels
        .into_iter()
        .map(|channel| json!({"channel": channel.index()}))
        .collect();
    json!({"control": control})
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
    fn should_store_reported_channels() {
        let mut luminance = Luminance::default();
        let payload = json!({"control": [{"channel": 3, "value": 40}, {"channel": 7, "value": 60}]});
        assert!(luminance.handle_push(ns::CONTROL_LUMINANCE, &payload, &ctx(Source::Pushed)));
        assert_eq!(luminance.get(Channel::new(3)), Some(40));
        assert_eq!(luminance.get(Channel::new(7)), Some(60));
        assert_eq!(luminance.get(Channel::new(4)), None);
    }

    #[test]
    fn should_skip_values_above_hundred_when_pushed() {
        let mut luminance = Luminance::default();
        let payload = json!({"control": [{"channel": 0, "value": 180}, {"channel": 1, "value": 100}]});
        assert!(luminance.handle_push(ns::CONTROL_LUMINANCE, &payload, &ctx(Source::Pushed)));
        assert_eq!(luminance.get(Channel::MAIN), None);
        assert_eq!(luminance.get(Channel::new(1)), Some(100));
    }

    #[test]
    fn should_not_handle_push_without_control() {
        let mut luminance = Luminance::default();
        assert!(!luminance.handle_push(ns::CONTROL_LUMINANCE, &json!({}), &ctx(Source::Pushed)));
    }

    #[test]
    fn should_ignore_system_all_snapshot() {
        let mut luminance = Luminance::default();
        let snapshot = json!({"all": {"digest": {}}});
        assert!(!luminance.handle_update(ns::SYSTEM_ALL, &snapshot, &ctx(Source::Polled)));
    }

    #[tokio::test]
    async fn should_send_bulk_command_and_apply_optimistically() {
        let (device, transport) = device_with(&[ns::CONTROL_LUMINANCE], "msl120");
        let values = BTreeMap::from([(Channel::new(0), 30), (Channel::new(1), 80)]);

        device.bulk_set_luminance(&values, None).await.unwrap();

        let sent = transport.sent();
        assert_eq!(
            sent[0].payload,
            json!({"control": [{"channel": 0, "value": 30}, {"channel": 1, "value": 80}]})
        );
        assert_eq!(device.luminance(Channel::new(1)), Some(80));
        assert_eq!(
            device.observed_luminance(Channel::new(0)).unwrap().source,
            Source::Optimistic
        );
    }

    #[tokio::test]
    async fn should_send_nothing_for_empty_bulk_set() {
        let (device, transport) = device_with(&[ns::CONTROL_LUMINANCE], "msl120");
        device.bulk_set_luminance(&BTreeMap::new(), None).await.unwrap();
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn should_reject_luminance_above_hundred() {
        let (device, transport) = device_with(&[ns::CONTROL_LUMINANCE], "msl120");
        let err = device.set_luminance(Channel::MAIN, 101, None).await.unwrap_err();
        assert!(matches!(
            err,
            CapaHubError::Validation(ValidationError::LuminanceOutOfRange(101))
        ));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn should_store_refreshed_channels_as_polled() {
        let (device, transport) = device_with(&[ns::CONTROL_LUMINANCE], "msl120");
        transport.respond(
            ns::CONTROL_LUMINANCE,
            json!({"control": [{"channel": 0, "value": 55}]}),
        );

        device.refresh_luminance([Channel::MAIN], None).await.unwrap();

        assert_eq!(transport.sent()[0].payload, json!({"control": [{"channel": 0}]}));
        let observed = device.observed_luminance(Channel::MAIN).unwrap();
        assert_eq!(observed.value, 55);
        assert_eq!(observed.source, Source::Polled);
    }
}

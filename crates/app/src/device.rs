//! Device instances: one per physical device.
//!
//! A [`Device`] owns the capability instances its composite type lists and
//! serializes every state change behind one lock: push notifications, poll
//! responses and optimistic writes after confirmed commands all go through
//! it. The lock is never held while a command is in flight.
//!
//! Capability-specific accessors and commands live next to each capability
//! in [`crate::capability`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use capahub_domain::ability::ns;
use capahub_domain::channel::ChannelInfo;
use capahub_domain::device_type::{BaseKind, DeviceInfo};
use capahub_domain::error::{CapaHubError, CommandTimeoutError};
use capahub_domain::event::DeviceEvent;
use capahub_domain::id::DeviceUuid;
use capahub_domain::observation::Source;
use capahub_domain::time::{Timestamp, now};
use serde_json::Value;

use crate::capability::{CapabilityKind, CapabilitySet, CapabilityVariant, DispatchContext};
use crate::composer::CompositeType;
use crate::ports::{Command, EventPublisher, Method, SubDeviceInventory, Transport};

/// Namespace prefix of every hub-routed message.
const HUB_NAMESPACE_PREFIX: &str = "Appliance.Hub.";

struct DeviceState {
    capabilities: CapabilitySet,
    last_full_update: Option<Timestamp>,
}

/// A device built from a composite type, talking through `T`.
pub struct Device<T> {
    info: DeviceInfo,
    composite: Arc<CompositeType>,
    channels: Vec<ChannelInfo>,
    transport: T,
    inventory: Option<Arc<dyn SubDeviceInventory>>,
    events: Option<Arc<dyn EventPublisher>>,
    default_timeout: Option<Duration>,
    state: Mutex<DeviceState>,
}

impl<T> Device<T> {
    /// Instantiate every capability of `composite` with empty state and
    /// apply channel remapping.
    #[must_use]
    pub fn new(info: DeviceInfo, composite: Arc<CompositeType>, transport: T) -> Self {
        let capabilities = CapabilitySet::new(composite.capabilities());
        let discovered = if info.channels.is_empty() {
            ChannelInfo::parse_list(&[])
        } else {
            info.channels.clone()
        };
        let channels = capabilities.remap_channels(discovered);
        Self {
            info,
            composite,
            channels,
            transport,
            inventory: None,
            events: None,
            default_timeout: None,
            state: Mutex::new(DeviceState {
                capabilities,
                last_full_update: None,
            }),
        }
    }

    /// Resolve hub elements through `inventory`.
    #[must_use]
    pub fn with_inventory(mut self, inventory: Arc<dyn SubDeviceInventory>) -> Self {
        self.inventory = Some(inventory);
        self
    }

    /// Announce every dispatch and confirmed command on `events`.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventPublisher>) -> Self {
        self.events = Some(events);
        self
    }

    /// Deadline applied to commands issued without one.
    #[must_use]
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn uuid(&self) -> DeviceUuid {
        self.info.uuid
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.info.name
    }

    #[must_use]
    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    #[must_use]
    pub fn composite(&self) -> &Arc<CompositeType> {
        &self.composite
    }

    /// Channel layout after remapping.
    #[must_use]
    pub fn channels(&self) -> &[ChannelInfo] {
        &self.channels
    }

    #[must_use]
    pub fn capabilities(&self) -> &[CapabilityKind] {
        self.composite.capabilities()
    }

    #[must_use]
    pub fn is_hub(&self) -> bool {
        self.composite.base() == BaseKind::Hub
    }

    /// When the last `System.All` snapshot was processed.
    #[must_use]
    pub fn last_full_update(&self) -> Option<Timestamp> {
        self.lock_state().last_full_update
    }

    /// Whether cached state has been seeded by at least one full poll.
    #[must_use]
    pub fn full_update_done(&self) -> bool {
        self.last_full_update().is_some()
    }

    /// Route one incoming message to every capability, in order, then to
    /// the base. Returns whether any capability consumed it. Never fails:
    /// shape problems are logged by the capability that met them.
    #[tracing::instrument(skip(self, payload), fields(device = %self.uuid()))]
    pub fn dispatch(&self, namespace: &str, payload: &Value, is_full_snapshot: bool) -> bool {
        let source = if is_full_snapshot {
            Source::Polled
        } else {
            Source::Pushed
        };
        let ctx = DispatchContext {
            device: self.uuid(),
            source,
            inventory: self.inventory.as_deref(),
        };

        let handled = {
            let mut state = self.lock_state();
            let handled = state
                .capabilities
                .dispatch(namespace, payload, is_full_snapshot, &ctx);
            self.base_fallback(&mut state, namespace, is_full_snapshot, handled);
            handled
        };

        self.publish(namespace, source, handled);
        handled
    }

    /// Runs after every capability had its chance.
    fn base_fallback(&self, state: &mut DeviceState, namespace: &str, is_full_snapshot: bool, handled: bool) {
        if is_full_snapshot && namespace == ns::SYSTEM_ALL {
            state.last_full_update = Some(now());
        }
        if handled {
            return;
        }
        match self.composite.base() {
            BaseKind::Hub if namespace.starts_with(HUB_NAMESPACE_PREFIX) => {
                tracing::warn!(namespace, "hub message not handled by any capability");
            }
            _ => tracing::debug!(namespace, "message not handled by any capability"),
        }
    }

    pub(crate) fn inventory(&self) -> Option<&dyn SubDeviceInventory> {
        self.inventory.as_deref()
    }

    pub(crate) fn has<C: CapabilityVariant>(&self) -> bool {
        self.composite.capabilities().contains(&C::KIND)
    }

    pub(crate) fn read<C: CapabilityVariant, R>(&self, f: impl FnOnce(&C) -> R) -> Option<R> {
        self.lock_state().capabilities.get::<C>().map(f)
    }

    pub(crate) fn unsupported<C: CapabilityVariant>(&self) -> CapaHubError {
        CapaHubError::Unsupported {
            device: self.uuid(),
            capability: C::KIND.name(),
        }
    }

    pub(crate) fn require<C: CapabilityVariant>(&self) -> Result<(), CapaHubError> {
        if self.has::<C>() {
            Ok(())
        } else {
            Err(self.unsupported::<C>())
        }
    }

    /// Apply a confirmed command's effect to cached state.
    pub(crate) fn commit<C: CapabilityVariant>(&self, namespace: &str, apply: impl FnOnce(&mut C)) {
        {
            let mut state = self.lock_state();
            if let Some(capability) = state.capabilities.get_mut::<C>() {
                apply(capability);
            }
            state.capabilities.recompute_derived(Source::Optimistic);
        }
        self.publish(namespace, Source::Optimistic, true);
    }

    /// Apply the effects of several confirmed commands in one critical
    /// section, then announce each namespace.
    pub(crate) fn commit_all(&self, namespaces: &[&str], apply: impl FnOnce(&mut CapabilitySet)) {
        {
            let mut state = self.lock_state();
            apply(&mut state.capabilities);
            state.capabilities.recompute_derived(Source::Optimistic);
        }
        for namespace in namespaces {
            self.publish(namespace, Source::Optimistic, true);
        }
    }

    pub(crate) fn publish(&self, namespace: &str, source: Source, handled: bool) {
        if let Some(events) = &self.events {
            events.publish(DeviceEvent::new(self.uuid(), namespace, source, handled));
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Transport> Device<T> {
    /// Send a command and wait for the answer, bounded by `timeout` (or the
    /// device default). Cached state is left untouched.
    ///
    /// # Errors
    ///
    /// [`CapaHubError::CommandTimeout`] when the deadline passes first, or
    /// whatever the transport reports.
    #[tracing::instrument(skip(self, payload), fields(device = %self.uuid()))]
    pub async fn execute(
        &self,
        method: Method,
        namespace: &str,
        payload: Value,
        timeout: Option<Duration>,
    ) -> Result<Value, CapaHubError> {
        let timeout = timeout.or(self.default_timeout);
        let command = Command {
            device: self.uuid(),
            method,
            namespace: namespace.to_string(),
            payload,
            timeout,
        };
        tracing::debug!(%method, "sending command");

        let response = self.transport.execute(command);
        match timeout {
            Some(limit) => tokio::time::timeout(limit, response)
                .await
                .map_err(|_| CommandTimeoutError {
                    device: self.uuid(),
                    namespace: namespace.to_string(),
                    timeout: limit,
                })?,
            None => response.await,
        }
    }

    /// Full poll: every capability's request in capability order, each
    /// answer dispatched as a full snapshot. `System.All` goes first.
    ///
    /// # Errors
    ///
    /// The first failing request that is not best-effort. Requests before
    /// it have already been applied.
    #[tracing::instrument(skip(self), fields(device = %self.uuid()))]
    pub async fn update(&self, timeout: Option<Duration>) -> Result<(), CapaHubError> {
        let requests = self.lock_state().capabilities.poll_requests();
        if requests.is_empty() {
            tracing::debug!("nothing to poll");
            return Ok(());
        }
        for request in requests {
            match self
                .execute(Method::Get, request.namespace, request.payload, timeout)
                .await
            {
                Ok(response) => {
                    self.dispatch(request.namespace, &response, true);
                }
                Err(err) if request.best_effort => {
                    tracing::warn!(error = %err, namespace = request.namespace, "poll failed, continuing");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::InProcessEventBus;
    use crate::testing::device_with;
    use capahub_domain::channel::Channel;
    use capahub_domain::mode::OnlineStatus;
    use serde_json::json;

    #[test]
    fn should_start_with_unknown_state() {
        let (device, _) = device_with(&[ns::SYSTEM_ALL, ns::CONTROL_TOGGLEX], "mss310");
        assert_eq!(device.is_on(Channel::MAIN), None);
        assert!(!device.full_update_done());
    }

    #[test]
    fn should_default_to_single_main_channel() {
        let (device, _) = device_with(&[ns::CONTROL_TOGGLEX], "mss310");
        assert_eq!(device.channels().len(), 1);
        assert!(device.channels()[0].is_master);
    }

    #[test]
    fn should_seed_state_from_full_snapshot() {
        let (device, _) = device_with(
            &[ns::SYSTEM_ALL, ns::SYSTEM_ONLINE, ns::CONTROL_TOGGLEX],
            "mss310",
        );
        let snapshot = json!({"all": {
            "system": {"online": {"status": 1}},
            "digest": {"togglex": [{"channel": 0, "onoff": 1}]}
        }});

        assert!(device.dispatch(ns::SYSTEM_ALL, &snapshot, true));

        assert_eq!(device.is_on(Channel::MAIN), Some(true));
        assert_eq!(device.online_status(), OnlineStatus::Online);
        assert!(device.full_update_done());
    }

    #[test]
    fn should_report_unhandled_namespace() {
        let (device, _) = device_with(&[ns::CONTROL_TOGGLEX], "mss310");
        assert!(!device.dispatch("Appliance.Control.Light", &json!({"light": {}}), false));
        assert_eq!(device.is_on(Channel::MAIN), None);
    }

    #[test]
    fn should_let_later_observation_win_regardless_of_source() {
        let (device, _) = device_with(&[ns::SYSTEM_ALL, ns::CONTROL_TOGGLEX], "mss310");
        device.dispatch(
            ns::CONTROL_TOGGLEX,
            &json!({"togglex": {"channel": 0, "onoff": 1}}),
            false,
        );
        device.dispatch(
            ns::SYSTEM_ALL,
            &json!({"all": {"digest": {"togglex": [{"channel": 0, "onoff": 0}]}}}),
            true,
        );
        let observed = device.observed_on(Channel::MAIN).unwrap();
        assert!(!observed.value);
        assert_eq!(observed.source, Source::Polled);
    }

    #[tokio::test]
    async fn should_keep_optimistic_write_when_push_arrives_while_command_in_flight() {
        let (device, transport) = device_with(&[ns::CONTROL_TOGGLEX], "mss310");
        let gate = transport.gate();

        let (result, ()) = tokio::join!(device.turn_on(Channel::MAIN, None), async {
            while transport.sent().is_empty() {
                tokio::task::yield_now().await;
            }
            device.dispatch(
                ns::CONTROL_TOGGLEX,
                &json!({"togglex": {"channel": 0, "onoff": 0}}),
                false,
            );
            assert_eq!(device.is_on(Channel::MAIN), Some(false));
            gate.notify_one();
        });

        result.unwrap();
        let observed = device.observed_on(Channel::MAIN).unwrap();
        assert!(observed.value);
        assert_eq!(observed.source, Source::Optimistic);
    }

    #[tokio::test]
    async fn should_let_push_after_completed_command_win() {
        let (device, _) = device_with(&[ns::CONTROL_TOGGLEX], "mss310");

        device.turn_on(Channel::MAIN, None).await.unwrap();
        device.dispatch(
            ns::CONTROL_TOGGLEX,
            &json!({"togglex": {"channel": 0, "onoff": 0}}),
            false,
        );

        let observed = device.observed_on(Channel::MAIN).unwrap();
        assert!(!observed.value);
        assert_eq!(observed.source, Source::Pushed);
    }

    #[tokio::test]
    async fn should_publish_event_per_dispatch() {
        let bus = Arc::new(InProcessEventBus::new(16));
        let (device, _) = device_with(&[ns::CONTROL_TOGGLEX], "mss310");
        let device = device.with_events(bus.clone());
        let mut rx = bus.subscribe();

        device.dispatch(
            ns::CONTROL_TOGGLEX,
            &json!({"togglex": {"channel": 0, "onoff": 1}}),
            false,
        );

        let event = rx.recv().await.unwrap();
        assert_eq!(event.device, device.uuid());
        assert_eq!(event.namespace, ns::CONTROL_TOGGLEX);
        assert_eq!(event.source, Source::Pushed);
        assert!(event.handled);
    }

    #[tokio::test]
    async fn should_publish_optimistic_event_after_confirmed_command() {
        let bus = Arc::new(InProcessEventBus::new(16));
        let (device, _) = device_with(&[ns::CONTROL_TOGGLEX], "mss310");
        let device = device.with_events(bus.clone());
        let mut rx = bus.subscribe();

        device.turn_on(Channel::MAIN, None).await.unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.source, Source::Optimistic);
    }

    #[tokio::test]
    async fn should_time_out_and_leave_state_untouched() {
        let (device, transport) = device_with(&[ns::CONTROL_TOGGLEX], "mss310");
        transport.hang();

        let err = device
            .turn_on(Channel::MAIN, Some(Duration::from_millis(20)))
            .await
            .unwrap_err();

        match err {
            CapaHubError::CommandTimeout(timeout) => {
                assert_eq!(timeout.namespace, ns::CONTROL_TOGGLEX);
                assert_eq!(timeout.timeout, Duration::from_millis(20));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
        assert_eq!(device.is_on(Channel::MAIN), None);
    }

    #[tokio::test]
    async fn should_apply_default_timeout() {
        let (device, transport) = device_with(&[ns::CONTROL_TOGGLEX], "mss310");
        let device = device.with_default_timeout(Duration::from_millis(20));
        transport.hang();

        let err = device.turn_off(Channel::MAIN, None).await.unwrap_err();
        assert!(matches!(err, CapaHubError::CommandTimeout(_)));
        assert_eq!(transport.sent()[0].timeout, Some(Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn should_poll_system_all_first() {
        let (device, transport) = device_with(
            &[ns::SYSTEM_RUNTIME, ns::SYSTEM_ALL, ns::CONTROL_TOGGLEX],
            "mss310",
        );
        transport.respond(
            ns::SYSTEM_ALL,
            json!({"all": {"digest": {"togglex": [{"channel": 0, "onoff": 1}]}}}),
        );
        transport.respond(ns::SYSTEM_RUNTIME, json!({"runtime": {"signal": 50}}));

        device.update(None).await.unwrap();

        let namespaces: Vec<_> = transport.sent().into_iter().map(|c| c.namespace).collect();
        assert_eq!(namespaces, vec![ns::SYSTEM_ALL, ns::SYSTEM_RUNTIME]);
        assert!(transport.sent().iter().all(|c| c.method == Method::Get));
        assert_eq!(device.is_on(Channel::MAIN), Some(true));
        assert_eq!(device.runtime_info(), Some(json!({"signal": 50})));
    }

    #[tokio::test]
    async fn should_surface_poll_failure() {
        let (device, transport) = device_with(&[ns::SYSTEM_ALL, ns::CONTROL_TOGGLEX], "mss310");
        transport.hang();

        let err = device
            .update(Some(Duration::from_millis(20)))
            .await
            .unwrap_err();
        assert!(matches!(err, CapaHubError::CommandTimeout(_)));
        assert!(!device.full_update_done());
    }

    #[tokio::test]
    async fn should_skip_poll_without_requests() {
        let (device, transport) = device_with(&[ns::CONTROL_TOGGLEX], "mss310");
        device.update(None).await.unwrap();
        assert!(transport.sent().is_empty());
    }
}

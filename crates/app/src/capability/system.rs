//! System namespaces: full-state polling, connectivity and runtime info.

use std::time::Duration;

use capahub_domain::ability::ns;
use capahub_domain::error::{CapaHubError, MalformedPayloadError};
use capahub_domain::mode::OnlineStatus;
use capahub_domain::observation::{Observation, Source};
use serde_json::{Value, json};

use super::payload::{self, Path};
use super::{DispatchContext, Handler};
use crate::device::Device;
use crate::ports::{Method, Transport};

/// Drives the `System.All` poll. Holds no state of its own: the snapshot
/// is fanned out to every capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAll;

impl Handler for SystemAll {
    fn handle_push(&mut self, _: &str, _: &Value, _: &DispatchContext<'_>) -> bool {
        false
    }

    fn handle_update(&mut self, _: &str, _: &Value, _: &DispatchContext<'_>) -> bool {
        false
    }
}

/// Connectivity of the device itself.
#[derive(Debug, Clone, Default)]
pub struct SystemOnline {
    status: Option<Observation<OnlineStatus>>,
}

impl SystemOnline {
    #[must_use]
    pub fn status(&self) -> Option<&Observation<OnlineStatus>> {
        self.status.as_ref()
    }

    fn apply(&mut self, namespace: &str, online: &Value, source: Source) -> bool {
        let Some(code) = payload::int(online, "status") else {
            payload::skip_element(namespace, "online", online);
            return false;
        };
        self.status = Some(Observation::new(OnlineStatus::from_code(code), source));
        true
    }
}

impl Handler for SystemOnline {
    fn handle_push(&mut self, namespace: &str, payload: &Value, ctx: &DispatchContext<'_>) -> bool {
        if namespace != ns::SYSTEM_ONLINE {
            return false;
        }
        payload::require(payload, namespace, "online", Path::Push)
            .is_some_and(|online| self.apply(namespace, online, ctx.source))
    }

    fn handle_update(&mut self, namespace: &str, snapshot: &Value, ctx: &DispatchContext<'_>) -> bool {
        if namespace != ns::SYSTEM_ALL {
            return false;
        }
        payload::require_path(snapshot, namespace, &["all", "system", "online"], Path::Snapshot)
            .is_some_and(|online| self.apply(namespace, online, ctx.source))
    }
}

/// Free-form runtime information (signal strength and the like).
#[derive(Debug, Clone, Default)]
pub struct SystemRuntime {
    info: Option<Observation<Value>>,
}

impl SystemRuntime {
    #[must_use]
    pub fn info(&self) -> Option<&Observation<Value>> {
        self.info.as_ref()
    }
}

impl Handler for SystemRuntime {
    fn handle_push(&mut self, _: &str, _: &Value, _: &DispatchContext<'_>) -> bool {
        false
    }

    fn handle_update(&mut self, namespace: &str, snapshot: &Value, ctx: &DispatchContext<'_>) -> bool {
        if namespace != ns::SYSTEM_RUNTIME {
            return false;
        }
        match payload::require(snapshot, namespace, "runtime", Path::Snapshot) {
            Some(runtime) => {
                self.info = Some(Observation::new(runtime.clone(), ctx.source));
                true
            }
            None => false,
        }
    }
}

impl<T> Device<T> {
    /// Last reported connectivity; unknown until the device says otherwise.
    #[must_use]
    pub fn online_status(&self) -> OnlineStatus {
        self.read(|s: &SystemOnline| s.status().map(|o| o.value))
            .flatten()
            .unwrap_or(OnlineStatus::Unknown)
    }

    /// Runtime information from the last poll.
    #[must_use]
    pub fn runtime_info(&self) -> Option<Value> {
        self.read(|s: &SystemRuntime| s.info().map(|o| o.value.clone()))
            .flatten()
    }
}

impl<T: Transport> Device<T> {
    /// Poll runtime information and return it.
    ///
    /// # Errors
    ///
    /// [`CapaHubError::Unsupported`] without the runtime ability,
    /// [`CapaHubError::MalformedPayload`] when the answer lacks `runtime`,
    /// or the command's own failure.
    pub async fn update_runtime_info(&self, timeout: Option<Duration>) -> Result<Value, CapaHubError> {
        self.require::<SystemRuntime>()?;
        let response = self
            .execute(Method::Get, ns::SYSTEM_RUNTIME, json!({}), timeout)
            .await?;
        self.dispatch(ns::SYSTEM_RUNTIME, &response, true);
        response.get("runtime").cloned().ok_or_else(|| {
            MalformedPayloadError {
                namespace: ns::SYSTEM_RUNTIME.to_string(),
                key: "runtime",
            }
            .into()
        })
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
    fn should_read_online_status_from_snapshot() {
        let mut online = SystemOnline::default();
        let snapshot = json!({"all": {"system": {"online": {"status": 2}}}});
        assert!(online.handle_update(ns::SYSTEM_ALL, &snapshot, &ctx(Source::Polled)));
        assert_eq!(online.status().unwrap().value, OnlineStatus::Offline);
    }

    #[test]
    fn should_read_online_status_from_push() {
        let mut online = SystemOnline::default();
        let payload = json!({"online": {"status": 1}});
        assert!(online.handle_push(ns::SYSTEM_ONLINE, &payload, &ctx(Source::Pushed)));
        assert_eq!(online.status().unwrap().value, OnlineStatus::Online);
    }

    #[test]
    fn should_not_handle_online_push_without_key() {
        let mut online = SystemOnline::default();
        assert!(!online.handle_push(ns::SYSTEM_ONLINE, &json!({"status": 1}), &ctx(Source::Pushed)));
        assert!(online.status().is_none());
    }

    #[test]
    fn should_never_consume_messages_itself() {
        let mut all = SystemAll;
        assert!(!all.handle_update(ns::SYSTEM_ALL, &json!({"all": {}}), &ctx(Source::Polled)));
    }

    #[tokio::test]
    async fn should_report_unknown_status_before_any_report() {
        let (device, _) = device_with(&[ns::SYSTEM_ONLINE], "mss310");
        assert_eq!(device.online_status(), OnlineStatus::Unknown);
    }

    #[tokio::test]
    async fn should_cache_polled_runtime_info() {
        let (device, transport) = device_with(&[ns::SYSTEM_RUNTIME], "mss310");
        transport.respond(ns::SYSTEM_RUNTIME, json!({"runtime": {"signal": 87}}));

        let info = device.update_runtime_info(None).await.unwrap();

        assert_eq!(info, json!({"signal": 87}));
        assert_eq!(device.runtime_info(), Some(json!({"signal": 87})));
    }

    #[tokio::test]
    async fn should_fail_when_runtime_answer_is_malformed() {
        let (device, transport) = device_with(&[ns::SYSTEM_RUNTIME], "mss310");
        transport.respond(ns::SYSTEM_RUNTIME, json!({"other": 1}));

        let err = device.update_runtime_info(None).await.unwrap_err();
        assert!(matches!(err, CapaHubError::MalformedPayload(_)));
    }
}

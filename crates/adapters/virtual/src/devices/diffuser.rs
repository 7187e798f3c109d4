//! Virtual diffuser: oil diffuser or, in legacy mode, a humidifier
//! speaking the older spray namespace.

use std::sync::{Mutex, MutexGuard, PoisonError};

use capahub_app::ports::Method;
use capahub_domain::ability::ns;
use serde_json::{Value, json};

use super::{channel, entries, field, int, system_all, unsupported};
use crate::error::VirtualError;

/// A simulated single-channel sprayer.
pub struct VirtualDiffuser {
    legacy: bool,
    mode: Mutex<i64>,
}

impl VirtualDiffuser {
    /// An oil diffuser, spray off.
    #[must_use]
    pub fn diffuser() -> Self {
        Self {
            legacy: false,
            mode: Mutex::new(2),
        }
    }

    /// A humidifier, spray off.
    #[must_use]
    pub fn humidifier() -> Self {
        Self {
            legacy: true,
            mode: Mutex::new(0),
        }
    }

    #[must_use]
    pub fn is_legacy(&self) -> bool {
        self.legacy
    }

    /// Raw spray mode code.
    #[must_use]
    pub fn mode(&self) -> i64 {
        *self.lock()
    }

    #[must_use]
    pub fn abilities(&self) -> Vec<&'static str> {
        let spray = if self.legacy {
            ns::CONTROL_SPRAY
        } else {
            ns::DIFFUSER_SPRAY
        };
        vec![ns::SYSTEM_ALL, ns::SYSTEM_ONLINE, spray]
    }

    pub(super) fn handle(&self, method: Method, namespace: &str, payload: &Value) -> Result<Value, VirtualError> {
        match (method, namespace, self.legacy) {
            (Method::Get, ns::SYSTEM_ALL, true) => {
                let spray = json!([{"channel": 0, "mode": self.mode()}]);
                Ok(system_all(json!({"spray": spray})))
            }
            (Method::Get, ns::SYSTEM_ALL, false) => {
                let spray = json!([{"channel": 0, "mode": self.mode()}]);
                Ok(system_all(json!({"diffuser": {"spray": spray}})))
            }
            (Method::Set, ns::CONTROL_SPRAY, true) | (Method::Set, ns::DIFFUSER_SPRAY, false) => {
                let spray = field(payload, namespace, "spray")?;
                for entry in entries(spray) {
                    if channel(entry) != 0 {
                        continue;
                    }
                    let mode = int(entry, "mode").ok_or_else(|| VirtualError::BadRequest {
                        namespace: namespace.to_string(),
                        key: "mode",
                    })?;
                    *self.lock() = mode;
                }
                Ok(json!({}))
            }
            _ => Err(unsupported(method, namespace)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, i64> {
        self.mode.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_report_mode_under_diffuser_digest() {
        let diffuser = VirtualDiffuser::diffuser();
        let all = diffuser
            .handle(Method::Get, ns::SYSTEM_ALL, &json!({}))
            .unwrap();
        assert_eq!(
            all["all"]["digest"]["diffuser"]["spray"],
            json!([{"channel": 0, "mode": 2}])
        );
    }

    #[test]
    fn should_set_humidifier_mode_from_single_entry() {
        let humidifier = VirtualDiffuser::humidifier();
        humidifier
            .handle(
                Method::Set,
                ns::CONTROL_SPRAY,
                &json!({"spray": {"channel": 0, "mode": 1}}),
            )
            .unwrap();
        assert_eq!(humidifier.mode(), 1);
    }

    #[test]
    fn should_refuse_namespace_of_the_other_flavour() {
        let diffuser = VirtualDiffuser::diffuser();
        let err = diffuser
            .handle(Method::Set, ns::CONTROL_SPRAY, &json!({"spray": {"mode": 1}}))
            .unwrap_err();
        assert!(matches!(err, VirtualError::UnsupportedNamespace { .. }));
    }
}

//! Virtual adapter error type.

use capahub_app::ports::Method;
use capahub_domain::error::CapaHubError;
use capahub_domain::id::DeviceUuid;

/// Errors raised by the simulated appliances.
#[derive(Debug, thiserror::Error)]
pub enum VirtualError {
    #[error("no simulated appliance with uuid {0}")]
    UnknownDevice(DeviceUuid),

    #[error("{appliance} does not answer {method} {namespace}")]
    UnsupportedNamespace {
        appliance: &'static str,
        method: Method,
        namespace: String,
    },

    #[error("{namespace} request is missing `{key}`")]
    BadRequest { namespace: String, key: &'static str },

    #[error("sub-device {0} is not attached to this hub")]
    UnknownSubDevice(String),
}

impl VirtualError {
    /// Convert into a [`CapaHubError::Transport`] for propagation across
    /// port boundaries.
    #[must_use]
    pub fn into_domain(self) -> CapaHubError {
        CapaHubError::Transport(Box::new(self))
    }
}

impl From<VirtualError> for CapaHubError {
    fn from(err: VirtualError) -> Self {
        err.into_domain()
    }
}

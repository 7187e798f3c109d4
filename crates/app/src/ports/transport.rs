//! Transport port: deliver a command to a device and return its response.
//!
//! The transport owns framing, signing and delivery. Devices only hand it a
//! [`Command`] and enforce the deadline themselves.

use std::future::Future;
use std::time::Duration;

use capahub_domain::error::CapaHubError;
use capahub_domain::id::DeviceUuid;
use serde_json::Value;

/// Request method carried in a command header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Set,
}

impl Method {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Set => "SET",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request addressed to a device.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub device: DeviceUuid,
    pub method: Method,
    pub namespace: String,
    pub payload: Value,
    /// Deadline the caller will enforce. Transports may use it to size
    /// their own retries.
    pub timeout: Option<Duration>,
}

/// Sends commands to devices.
pub trait Transport: Send + Sync {
    /// Deliver `command` and resolve with the device's response payload.
    fn execute(&self, command: Command) -> impl Future<Output = Result<Value, CapaHubError>> + Send;
}

impl<T: Transport> Transport for std::sync::Arc<T> {
    fn execute(&self, command: Command) -> impl Future<Output = Result<Value, CapaHubError>> + Send {
        (**self).execute(command)
    }
}

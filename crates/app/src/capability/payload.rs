//! Payload access shared by capability handlers.
//!
//! Handlers never fail: a missing key is logged and the message is reported
//! as not handled; a malformed list element is skipped.

use capahub_domain::channel::Channel;
use capahub_domain::error::MalformedPayloadError;
use serde_json::Value;

/// Which notification path a handler was invoked from. Missing keys in a
/// push are errors; in a snapshot they are routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Path {
    Push,
    Snapshot,
}

/// `payload[key]`, logging a missing key.
pub(crate) fn require<'a>(
    payload: &'a Value,
    namespace: &str,
    key: &'static str,
    path: Path,
) -> Option<&'a Value> {
    let found = payload.get(key);
    if found.is_none() {
        let err = MalformedPayloadError {
            namespace: namespace.to_string(),
            key,
        };
        match path {
            Path::Push => tracing::error!(error = %err, "dropping notification"),
            Path::Snapshot => tracing::warn!(error = %err, "skipping snapshot section"),
        }
    }
    found
}

/// Follow `keys` from `payload`, logging the first missing segment.
pub(crate) fn require_path<'a>(
    payload: &'a Value,
    namespace: &str,
    keys: &[&'static str],
    path: Path,
) -> Option<&'a Value> {
    keys.iter()
        .try_fold(payload, |value, key| require(value, namespace, key, path))
}

/// Devices send either one object or a list of objects for the same key.
pub(crate) fn entries(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![value],
        _ => Vec::new(),
    }
}

/// The `channel` of an element; the main channel when absent.
pub(crate) fn channel_of(entry: &Value) -> Option<Channel> {
    match entry.get("channel") {
        None => Some(Channel::MAIN),
        Some(raw) => raw
            .as_u64()
            .and_then(|c| u16::try_from(c).ok())
            .map(Channel::new),
    }
}

pub(crate) fn int(entry: &Value, key: &str) -> Option<i64> {
    entry.get(key).and_then(Value::as_i64)
}

/// Log and skip one element of a list.
pub(crate) fn skip_element(namespace: &str, key: &'static str, entry: &Value) {
    tracing::warn!(namespace, key, element = %entry, "skipping malformed element");
}

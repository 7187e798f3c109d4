//! Observed state: the per-channel cells a capability keeps.
//!
//! A cell is either absent (nothing observed yet) or holds the last observed
//! value together with its [`Source`]. Later observations always overwrite
//! earlier ones, whatever their source: arrival order is the only ordering.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::time::{Timestamp, now};

/// Where an observed value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Unsolicited notification pushed by the device.
    Pushed,
    /// Response to an explicit full-state poll.
    Polled,
    /// Written locally after a command was confirmed.
    Optimistic,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pushed => f.write_str("pushed"),
            Self::Polled => f.write_str("polled"),
            Self::Optimistic => f.write_str("optimistic"),
        }
    }
}

/// Last known value of one cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation<T> {
    pub value: T,
    pub source: Source,
    pub observed_at: Timestamp,
}

impl<T> Observation<T> {
    #[must_use]
    pub fn new(value: T, source: Source) -> Self {
        Self {
            value,
            source,
            observed_at: now(),
        }
    }
}

/// Channel-keyed cells of one capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelStates<T> {
    cells: BTreeMap<Channel, Observation<T>>,
}

impl<T> Default for ChannelStates<T> {
    fn default() -> Self {
        Self {
            cells: BTreeMap::new(),
        }
    }
}

impl<T> ChannelStates<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value for `channel`, creating the cell if needed.
    pub fn observe(&mut self, channel: Channel, value: T, source: Source) {
        self.cells.insert(channel, Observation::new(value, source));
    }

    #[must_use]
    pub fn get(&self, channel: Channel) -> Option<&Observation<T>> {
        self.cells.get(&channel)
    }

    #[must_use]
    pub fn value(&self, channel: Channel) -> Option<&T> {
        self.cells.get(&channel).map(|o| &o.value)
    }

    /// Channels observed so far, in ascending order.
    pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        self.cells.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Channel, &Observation<T>)> {
        self.cells.iter().map(|(c, o)| (*c, o))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }
}

impl<T: Copy> ChannelStates<T> {
    #[must_use]
    pub fn copied(&self, channel: Channel) -> Option<T> {
        self.value(channel).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_report_unknown_before_first_observation() {
        let states: ChannelStates<bool> = ChannelStates::new();
        assert!(states.get(Channel::MAIN).is_none());
        assert!(states.is_empty());
    }

    #[test]
    fn should_keep_value_and_source_after_observation() {
        let mut states = ChannelStates::new();
        states.observe(Channel::new(2), true, Source::Pushed);

        let cell = states.get(Channel::new(2)).unwrap();
        assert!(cell.value);
        assert_eq!(cell.source, Source::Pushed);
    }

    #[test]
    fn should_overwrite_regardless_of_source() {
        let mut states = ChannelStates::new();
        states.observe(Channel::MAIN, 10_u8, Source::Optimistic);
        states.observe(Channel::MAIN, 20_u8, Source::Polled);
        states.observe(Channel::MAIN, 30_u8, Source::Pushed);

        let cell = states.get(Channel::MAIN).unwrap();
        assert_eq!(cell.value, 30);
        assert_eq!(cell.source, Source::Pushed);
    }

    #[test]
    fn should_leave_other_channels_untouched() {
        let mut states = ChannelStates::new();
        states.observe(Channel::new(1), false, Source::Polled);
        states.observe(Channel::new(2), true, Source::Pushed);

        assert_eq!(states.copied(Channel::new(1)), Some(false));
        assert_eq!(states.channels().collect::<Vec<_>>(), vec![
            Channel::new(1),
            Channel::new(2)
        ]);
    }
}

//! In-process event bus backed by a tokio broadcast channel.

use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use capahub_domain::event::DeviceEvent;

use crate::ports::EventPublisher;

/// In-process event bus using a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the event is simply dropped).
pub struct InProcessEventBus {
    sender: broadcast::Sender<DeviceEvent>,
}

impl InProcessEventBus {
    /// Create a new event bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.sender.subscribe()
    }

    /// Same as [`subscribe`](Self::subscribe), as a stream. Lagging
    /// subscribers see a `Lagged` error item and then resume.
    #[must_use]
    pub fn stream(&self) -> BroadcastStream<DeviceEvent> {
        BroadcastStream::new(self.sender.subscribe())
    }
}

impl EventPublisher for InProcessEventBus {
    fn publish(&self, event: DeviceEvent) {
        // send only fails without receivers
        let _ = self.sender.send(event);
    }
}

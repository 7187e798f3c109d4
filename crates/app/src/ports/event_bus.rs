//! Event bus port: announce dispatch outcomes and confirmed commands.

use capahub_domain::event::DeviceEvent;

/// Publishes device events to interested subscribers.
///
/// Publishing is synchronous: it runs while a device finishes a dispatch and
/// must never wait on a subscriber.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: DeviceEvent);
}

impl<T: EventPublisher + ?Sized> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, event: DeviceEvent) {
        (**self).publish(event);
    }
}

//! Port definitions: traits that adapters implement.
//!
//! Devices reach the outside world through these seams only: commands go out
//! through a [`Transport`], hub notifications are routed through a
//! [`SubDeviceInventory`], and dispatch outcomes are announced through an
//! [`EventPublisher`].

pub mod event_bus;
pub mod inventory;
pub mod transport;

pub use event_bus::EventPublisher;
pub use inventory::SubDeviceInventory;
pub use transport::{Command, Method, Transport};

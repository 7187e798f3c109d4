//! # capahub-app
//!
//! Application layer: capability composition and the dispatch protocol.
//!
//! ## Responsibilities
//! - Keep the **capability registry** ([`registry::Registry`]) and resolve
//!   conflicts between matching capabilities ([`resolver`])
//! - **Compose** one shared type per device model, memoized by type key
//!   ([`composer::Composer`])
//! - Hold per-device, per-channel state and route pushes, poll answers and
//!   confirmed commands into it ([`device::Device`])
//! - Route hub batches to **sub-devices** ([`subdevice::SubDevice`])
//! - Define **port traits** adapters implement:
//!   - `Transport`: send a command, await the answer
//!   - `SubDeviceInventory`: resolve a hub element's target
//!   - `EventPublisher`: announce state changes
//! - Provide **in-process infrastructure** (event bus, inventory)
//!
//! ## Dependency rule
//! Depends on `capahub-domain` only (plus `tokio` for timeouts and channels).
//! Never imports adapter crates.

pub mod capability;
pub mod composer;
pub mod device;
pub mod event_bus;
pub mod factory;
pub mod inventory;
pub mod ports;
pub mod registry;
pub mod resolver;
pub mod subdevice;

#[cfg(test)]
mod testing;

//! # capahub-domain
//!
//! Pure domain model for devices whose features are declared at connection
//! time as a list of abilities.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Abilities** (opaque namespace strings advertised by a device)
//! - Define **Channels** (addressable sub-units a capability keys its state by)
//! - Define **Observations** (last-known value of a cell plus where it came from)
//! - Define **Device type keys** and the base kinds a composite type builds on
//! - Define feature values shared by capabilities (modes, light state, online status)
//! - Define **Events** emitted when a device's state is observed or commanded
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod ability;
pub mod channel;
pub mod device_type;
pub mod event;
pub mod light;
pub mod mode;
pub mod observation;

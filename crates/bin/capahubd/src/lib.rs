//! # capahubd: capahub daemon
//!
//! Composition root: configuration, the simulated fleet built on the
//! virtual transport, and the refresh loop driving it. Split into a library
//! so the end-to-end tests can wire the same fleet the daemon runs.
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

pub mod config;
pub mod fleet;

//! Address-space inventory and reservation engine.
//!
//! * [`lease`]: the process-wide store of time-bounded reservations.
//! * [`scanner`]: the probe engine that works out which addresses are in use.
//! * [`allocator`]: claims one free address of a network.
//! * [`inventory`]: owns the loaded networks and ties the pieces together.

pub mod allocator;
pub mod inventory;
pub mod lease;
pub mod network;
pub mod scanner;

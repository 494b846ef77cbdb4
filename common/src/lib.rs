//! Shared models for the address inventory.
//!
//! * [`network`]: network definitions, IPv4 range algebra, scan records and leases.
//! * [`config`]: runtime settings handed from the CLI to the engine.
//! * [`error`]: typed failures for ranges and definition files.

pub mod config;
pub mod error;
pub mod network;
pub mod utils;

//! Cross-crate scenarios: definition files through the loader, full inventory
//! scans, reservations and node lookup, all driven by scripted probes.

#[cfg(test)]
mod support;

#[cfg(test)]
mod inventory;

#[cfg(test)]
mod reservation;

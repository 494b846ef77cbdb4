//! Wire formats spoken by the probes: DNS queries and answers, ICMP echo.

pub mod dns;
pub mod icmp;

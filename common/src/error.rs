use std::net::Ipv4Addr;
use std::path::PathBuf;

use thiserror::Error;

/// Violations of the range preconditions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("invalid IPv4 CIDR block '{cidr}': {reason}")]
    InvalidCidr { cidr: String, reason: String },

    #[error("range end {end} lies before its start {start}")]
    EndBeforeStart { start: Ipv4Addr, end: Ipv4Addr },

    #[error("range {start}-{end} is not inside block {cidr}")]
    OutsideBlock {
        start: Ipv4Addr,
        end: Ipv4Addr,
        cidr: String,
    },
}

/// Failures while reading the network definition file.
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed YAML definitions")]
    Yaml(#[from] serde_yaml::Error),

    #[error("malformed JSON definitions")]
    Json(#[from] serde_json::Error),

    #[error("unsupported definition format '{0}' (expected .yaml, .yml or .json)")]
    UnsupportedFormat(String),

    #[error("network name '{0}' is defined more than once")]
    DuplicateName(String),

    #[error("network '{network}' is invalid")]
    Invalid {
        network: String,
        #[source]
        source: RangeError,
    },
}

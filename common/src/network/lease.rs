use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A time-bounded reservation of one address.
///
/// The zero value (`Lease::default()`) stands for "no lease": empty comment and
/// owner, expiry at the Unix epoch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    pub comment: String,
    pub owner: String,
    pub locked_until: DateTime<Utc>,
}

impl Lease {
    pub fn new(comment: &str, owner: &str, locked_until: DateTime<Utc>) -> Self {
        Self {
            comment: comment.to_string(),
            owner: owner.to_string(),
            locked_until,
        }
    }

    /// A lease locks its address as long as it names a purpose or an owner.
    ///
    /// Expiry does not factor in here. Expired leases stay locked until the
    /// store sweeps them.
    pub fn is_locked(&self) -> bool {
        !self.comment.is_empty() || !self.owner.is_empty()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.locked_until <= now
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

//! Wall-clock seconds since the Unix epoch.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch.
///
/// Delivery-log timestamps are written as lowercase hex seconds, so a signed
/// 64-bit value covers every representable record. Negative values never
/// appear in log files; `-1` is used by callers as the "open bound" marker.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Seconds(pub i64);

impl Seconds {
    /// Current wall-clock time.
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Seconds(secs as i64)
    }

    pub fn get(&self) -> i64 {
        self.0
    }

    pub fn saturating_add(&self, rhs: i64) -> Self {
        Seconds(self.0.saturating_add(rhs))
    }
}

impl std::fmt::Display for Seconds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Seconds {
    fn from(value: i64) -> Self {
        Seconds(value)
    }
}

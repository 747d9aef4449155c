//! Scheduling priority shared by the ready queue, conditions and the alarm clock.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Numeric scheduling priority. Lower numbers are more urgent.
///
/// The ordering contract is purely numeric: `Priority(0)` is dispatched before
/// `Priority(1)`, and so on. [`Priority::LOWEST`] is the sentinel used when a
/// caller does not care about urgency; it sorts after every other value.
///
/// The alarm clock reuses this type with the wake-up tick as the value, which
/// gives earliest-deadline-first ordering without a separate timer heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(u64);

impl Priority {
    /// The most urgent priority.
    pub const HIGHEST: Self = Self(0);

    /// The least urgent priority; default for threads and condition waits.
    pub const LOWEST: Self = Self(u64::MAX);

    /// Create a priority from its numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Numeric value of this priority.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Whether this is the [`Priority::LOWEST`] sentinel.
    #[must_use]
    pub const fn is_lowest(self) -> bool {
        self.0 == u64::MAX
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::LOWEST
    }
}

impl From<u64> for Priority {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_lowest() {
            write!(f, "lowest")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::values::WholeTicks;

/// Which path a time update took through a clock domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeUpdate {
    /// Counter moved forward; `ticks` whole tick boundaries were crossed
    Advanced { ticks: WholeTicks },
    /// Backward step within the jitter band, counter left untouched
    Jitter,
    /// Backward step beyond the jitter band, counter forced back
    Regressed,
    /// Floating-point time fell below the origin and the origin moved
    Rebased,
    /// Input was not a finite number
    Ignored,
}

impl TimeUpdate {
    /// Whole ticks the observer was notified of
    pub fn ticks(&self) -> WholeTicks {
        match self {
            TimeUpdate::Advanced { ticks } => *ticks,
            _ => 0,
        }
    }

    /// Returns true if the update went through the anomaly handling
    pub fn is_anomaly(&self) -> bool {
        matches!(
            self,
            TimeUpdate::Jitter | TimeUpdate::Regressed | TimeUpdate::Rebased
        )
    }
}

use serde::{Deserialize, Serialize};

use crate::values::{Units, WholeTicks};

/// Exact elapsed-time state of one clock domain
///
/// This is what a save-state writer persists; the floating-point base is
/// deliberately absent since it belongs to the host session, not the guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockSnapshot {
    pub frequency: u64,
    pub frequency_divisor: u64,
    pub counter: Units,
    pub counter_whole: WholeTicks,
}

impl ClockSnapshot {
    /// Divisor is valid and `counter_whole` agrees with `counter`
    pub fn is_consistent(&self) -> bool {
        self.frequency_divisor != 0 && self.counter_whole == self.counter / self.frequency_divisor
    }
}

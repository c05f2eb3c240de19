mod frequency;
mod tolerance;

pub use frequency::Frequency;
pub use tolerance::JitterTolerance;

/// Exact count of sub-tick units (1 unit = 1 / frequency numerator seconds)
pub type Units = u64;

/// Count of whole ticks (1 tick = frequency divisor units)
pub type WholeTicks = u64;

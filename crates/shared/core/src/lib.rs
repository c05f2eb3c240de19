//! emuclock Core Domain
//!
//! Pure value types for exact emulated-hardware timekeeping.
//! This crate contains no I/O and is 100% unit testable.

pub mod entities;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{ClockSnapshot, TimeAnomaly, TimeUpdate};
pub use values::{Frequency, JitterTolerance, Units, WholeTicks};

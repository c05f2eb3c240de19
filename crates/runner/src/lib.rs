//! emuclock Runner
//!
//! Drives a machine's clock domains from the host:
//!
//! - **Host**: floating-point host time sources (scaled, frozen, jittered)
//! - **Machine**: the default PC domain layout or one loaded from JSON
//! - **Timing loop**: samples host time on a tokio interval and pushes it
//!   into the group, master first

pub mod host;
pub mod machine;
pub mod timing_loop;

pub use host::{HostClock, JitteredSource, TimeScale};
pub use machine::{MachineConfig, build_machine, load_machine};
pub use timing_loop::{DriveMode, LoopStats, TimingLoop, TimingLoopConfig};

//! emuclock Clock Domains
//!
//! Exact, drift-free time for emulated hardware:
//!
//! ## Domain Hierarchy
//!
//! ```text
//! ClockGroup (owns diagnostics + warn-once latch)
//!     │
//!     ├── ClockDomain "cpu"  100 MHz        (master)
//!     │
//!     ├── ClockDomain "bus"  100 MHz / 3    (slave, phase-derived)
//!     │
//!     └── ClockDomain "pit"  1.193182 MHz   (slave)
//! ```
//!
//! ## Usage
//!
//! ```
//! use emuclock_clock::{ClockDomain, ClockGroup, RecordingSink};
//!
//! let sink = RecordingSink::new();
//! let mut group = ClockGroup::new(sink.clone());
//! let cpu = group.insert(ClockDomain::with_frequency(100_000_000).named("cpu")).unwrap();
//! let bus = group
//!     .insert(ClockDomain::with_rational(100_000_000, 3).unwrap().named("bus").master(false))
//!     .unwrap();
//!
//! group.set_base(0.0);
//! group.domain_mut(cpu).unwrap().set_time(100_000_000); // one second
//! group.sync_slaves();
//! assert_eq!(group.domain(bus).unwrap().counter_whole(), 33_333_333);
//! assert!(sink.is_empty());
//! ```

mod config;
mod diagnostics;
mod domain;
mod group;
mod shared;

pub use config::{ClockDomainConfig, ClockGroupConfig};
pub use diagnostics::{Diagnostics, LogSink, RecordingSink};
pub use domain::ClockDomain;
pub use group::{ClockGroup, DomainId, TimedDomain};
pub use shared::SharedClockDomain;

// Re-export the ports and value types for convenience
pub use emuclock_core::{ClockSnapshot, Frequency, JitterTolerance, TimeAnomaly, TimeUpdate};
pub use emuclock_ports::{
    ClockError, ClockResult, DiagnosticSink, HostTimeSource, NullObserver, TimeObserver,
};

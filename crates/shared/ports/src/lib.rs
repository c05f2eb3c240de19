//! emuclock Ports
//!
//! Port definitions (traits) for the emuclock timing core.
//! These define the boundaries between clock domains, the hardware models
//! they drive, the host time they are driven by, and the diagnostics they emit.

mod clock;
mod diagnostics;
mod error;
mod observer;

pub use clock::HostTimeSource;
pub use diagnostics::DiagnosticSink;
pub use error::{ClockError, ClockResult};
pub use observer::{NullObserver, TimeObserver};

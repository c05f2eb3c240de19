//! emuclock Devices
//!
//! Hardware timing models that observe clock domains:
//!
//! - **PIT**: 8253/8254 counter channel at 105/88 MHz (exactly 13_125_000 / 11 Hz)
//! - **Retrace**: CRT beam position and the VGA status register bits
//! - **PCM**: sample pump pulling audio from an external sample generator
//!
//! Every model implements [`TimeObserver`](emuclock_ports::TimeObserver) and
//! resolves a batch of `n` ticks in one step.

pub mod pcm;
pub mod pit;
pub mod retrace;

pub use pcm::{SampleGenerator, SamplePump, SquareWave};
pub use pit::{PIT_INPUT_DIVISOR, PIT_INPUT_NUMERATOR, PitChannel, PitMode};
pub use retrace::{CrtTiming, Retrace, VGA_DOT_CLOCK_HZ};

use emuclock_clock::ClockDomain;
use emuclock_core::WholeTicks;
use emuclock_ports::{ClockResult, TimeObserver};
use log::debug;
use serde::{Deserialize, Serialize};

/// PIT input clock numerator: 14.31818 MHz / 12 = 13_125_000 / 11 Hz
pub const PIT_INPUT_NUMERATOR: u64 = 13_125_000;

/// PIT input clock divisor
pub const PIT_INPUT_DIVISOR: u64 = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PitMode {
    /// Mode 0: one interrupt when the count expires
    InterruptOnTerminalCount,
    /// Mode 2: one interrupt every `reload` input ticks
    RateGenerator,
    /// Mode 3: same interrupt period as mode 2
    SquareWaveGenerator,
}

impl PitMode {
    fn periodic(&self) -> bool {
        matches!(self, PitMode::RateGenerator | PitMode::SquareWaveGenerator)
    }
}

/// One 8253/8254 counter channel
///
/// Counts down on every input tick of its clock domain. Each
/// `on_advance(n)` is resolved arithmetically, so a catch-up of millions of
/// ticks costs the same as one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PitChannel {
    mode: PitMode,
    reload: u16,
    /// Input ticks left until the next terminal count (0 when disarmed)
    remaining: u64,
    armed: bool,
    irqs_raised: u64,
    irqs_pending: u64,
}

impl PitChannel {
    pub fn new() -> Self {
        Self {
            mode: PitMode::RateGenerator,
            reload: 0,
            remaining: 0,
            armed: false,
            irqs_raised: 0,
            irqs_pending: 0,
        }
    }

    /// Clock domain for this channel at the PIT input rate, not master
    pub fn into_domain(self) -> ClockResult<ClockDomain<PitChannel>> {
        Ok(
            ClockDomain::with_rational(PIT_INPUT_NUMERATOR, PIT_INPUT_DIVISOR)?
                .named("pit")
                .master(false)
                .with_observer(self),
        )
    }

    /// Load a mode and reload value; counting restarts from the reload value
    pub fn program(&mut self, mode: PitMode, reload: u16) {
        debug!("PIT: program {:?} reload {}", mode, reload);
        self.mode = mode;
        self.reload = reload;
        self.remaining = self.period();
        self.armed = true;
    }

    /// Input ticks per interrupt; a reload of 0 means 65536
    pub fn period(&self) -> u64 {
        match self.reload {
            0 => 0x1_0000,
            v => v as u64,
        }
    }

    pub fn mode(&self) -> PitMode {
        self.mode
    }

    pub fn armed(&self) -> bool {
        self.armed
    }

    /// Current count as the guest would latch it
    pub fn count(&self) -> u16 {
        if !self.armed {
            return 0;
        }
        // 65536 reads back as 0
        self.remaining as u16
    }

    pub fn irqs_raised(&self) -> u64 {
        self.irqs_raised
    }

    /// Interrupts not yet taken by the interrupt controller
    pub fn irqs_pending(&self) -> u64 {
        self.irqs_pending
    }

    /// Hand all pending interrupts to the caller
    pub fn take_irqs(&mut self) -> u64 {
        std::mem::take(&mut self.irqs_pending)
    }

    fn raise(&mut self, count: u64) {
        self.irqs_raised += count;
        self.irqs_pending += count;
    }
}

impl Default for PitChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeObserver for PitChannel {
    fn on_advance(&mut self, whole_ticks: WholeTicks) {
        if !self.armed {
            return;
        }
        if whole_ticks < self.remaining {
            self.remaining -= whole_ticks;
            return;
        }

        let past = whole_ticks - self.remaining;
        if self.mode.periodic() {
            let period = self.period();
            self.raise(1 + past / period);
            self.remaining = period - past % period;
        } else {
            self.raise(1);
            self.remaining = 0;
            self.armed = false;
        }
    }

    fn on_rebase(&mut self) {
        debug!("PIT: host time rebased, {} interrupts pending", self.irqs_pending);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_channel_disarmed() {
        let mut ch = PitChannel::new();
        ch.on_advance(1_000_000);
        assert_eq!(ch.irqs_raised(), 0);
        assert_eq!(ch.count(), 0);
    }

    #[test]
    fn test_rate_generator_batches() {
        let mut ch = PitChannel::new();
        ch.program(PitMode::RateGenerator, 100);

        ch.on_advance(99);
        assert_eq!(ch.irqs_raised(), 0);
        assert_eq!(ch.count(), 1);

        ch.on_advance(1);
        assert_eq!(ch.irqs_raised(), 1);
        assert_eq!(ch.count(), 100);

        // 10 periods plus 30 ticks in one batch
        ch.on_advance(1_030);
        assert_eq!(ch.irqs_raised(), 11);
        assert_eq!(ch.count(), 70);
        assert_eq!(ch.take_irqs(), 11);
        assert_eq!(ch.irqs_pending(), 0);
    }

    #[test]
    fn test_one_shot_fires_once() {
        let mut ch = PitChannel::new();
        ch.program(PitMode::InterruptOnTerminalCount, 500);

        ch.on_advance(10_000);
        assert_eq!(ch.irqs_raised(), 1);
        assert!(!ch.armed());
        ch.on_advance(10_000);
        assert_eq!(ch.irqs_raised(), 1);
    }

    #[test]
    fn test_zero_reload_is_65536() {
        let mut ch = PitChannel::new();
        ch.program(PitMode::SquareWaveGenerator, 0);
        assert_eq!(ch.period(), 65_536);
        assert_eq!(ch.count(), 0);

        ch.on_advance(65_536 * 18);
        assert_eq!(ch.irqs_raised(), 18);
    }

    #[test]
    fn test_domain_rate() {
        let domain = PitChannel::new().into_domain().unwrap();
        assert_eq!(domain.frequency(), 13_125_000);
        assert_eq!(domain.frequency_divisor(), 11);
        assert!(!domain.is_master());
    }
}

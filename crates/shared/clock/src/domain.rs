use emuclock_core::{
    ClockSnapshot, Frequency, JitterTolerance, TimeAnomaly, TimeUpdate, Units, WholeTicks,
};
use emuclock_ports::{ClockError, ClockResult, NullObserver, TimeObserver};
use log::debug;

use crate::config::ClockDomainConfig;
use crate::diagnostics::Diagnostics;

/// One independently clocked unit of emulated hardware time
///
/// The domain runs at `frequency / frequency_divisor` Hz. Time is kept as an
/// exact integer `counter` in units of `1 / frequency` seconds, so one whole
/// tick is `frequency_divisor` units. Forward progress is reported to the
/// observer once per update that crosses a tick boundary, with the number of
/// boundaries crossed.
///
/// ```
/// use emuclock_clock::ClockDomain;
///
/// // 33.333...MHz bus clock
/// let mut bus = ClockDomain::with_rational(100_000_000, 3).unwrap().named("bus");
/// assert_eq!(bus.advance(7), 2);
/// assert_eq!((bus.counter(), bus.counter_whole()), (7, 2));
/// ```
#[derive(Debug)]
pub struct ClockDomain<O: TimeObserver = NullObserver> {
    frequency: u64,
    frequency_divisor: u64,
    /// Elapsed time in units of `frequency`
    counter: Units,
    /// Elapsed time in units of `frequency / frequency_divisor`
    counter_whole: WholeTicks,
    /// Origin subtracted from floating-point host times
    time_base: f64,
    name: String,
    is_master: bool,
    jitter_tolerance: JitterTolerance,
    observer: O,
    diagnostics: Diagnostics,
}

impl ClockDomain<NullObserver> {
    /// Stopped domain: 0 Hz, divisor 1, master
    pub fn new() -> Self {
        Self::from_frequency(Frequency::ZERO)
    }

    /// Integer-rate domain
    pub fn with_frequency(hz: u64) -> Self {
        Self::from_frequency(Frequency::hz(hz))
    }

    /// Domain running at exactly `frequency / divisor` Hz
    pub fn with_rational(frequency: u64, divisor: u64) -> ClockResult<Self> {
        let rate = Frequency::new(frequency, divisor).ok_or(ClockError::ZeroDivisor)?;
        Ok(Self::from_frequency(rate))
    }

    pub fn from_frequency(rate: Frequency) -> Self {
        Self {
            frequency: rate.numerator(),
            frequency_divisor: rate.divisor(),
            counter: 0,
            counter_whole: 0,
            time_base: 0.0,
            name: String::new(),
            is_master: true,
            jitter_tolerance: JitterTolerance::default(),
            observer: NullObserver,
            diagnostics: Diagnostics::default(),
        }
    }

    /// Build a domain from its construction-time parameters
    pub fn from_config(config: &ClockDomainConfig) -> ClockResult<Self> {
        config.validate()?;
        Ok(Self::from_frequency(config.rate()?)
            .named(config.name.clone())
            .master(config.master)
            .with_jitter_tolerance(config.jitter_tolerance))
    }
}

impl Default for ClockDomain<NullObserver> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: TimeObserver> ClockDomain<O> {
    /// Replace the observer, keeping every other field
    pub fn with_observer<P: TimeObserver>(self, observer: P) -> ClockDomain<P> {
        ClockDomain {
            frequency: self.frequency,
            frequency_divisor: self.frequency_divisor,
            counter: self.counter,
            counter_whole: self.counter_whole,
            time_base: self.time_base,
            name: self.name,
            is_master: self.is_master,
            jitter_tolerance: self.jitter_tolerance,
            observer,
            diagnostics: self.diagnostics,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn master(mut self, is_master: bool) -> Self {
        self.is_master = is_master;
        self
    }

    /// Join the suppression group behind `diagnostics`
    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_jitter_tolerance(mut self, tolerance: JitterTolerance) -> Self {
        self.jitter_tolerance = tolerance;
        self
    }

    // Accessors

    pub fn frequency(&self) -> u64 {
        self.frequency
    }

    pub fn frequency_divisor(&self) -> u64 {
        self.frequency_divisor
    }

    pub fn rate(&self) -> Frequency {
        // frequency_divisor is never zero
        Frequency::new(self.frequency, self.frequency_divisor).unwrap_or(Frequency::ZERO)
    }

    pub fn counter(&self) -> Units {
        self.counter
    }

    pub fn counter_whole(&self) -> WholeTicks {
        self.counter_whole
    }

    pub fn time_base(&self) -> f64 {
        self.time_base
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn is_master(&self) -> bool {
        self.is_master
    }

    pub fn set_master(&mut self, is_master: bool) {
        self.is_master = is_master;
    }

    pub fn jitter_tolerance(&self) -> JitterTolerance {
        self.jitter_tolerance
    }

    pub fn set_jitter_tolerance(&mut self, tolerance: JitterTolerance) {
        self.jitter_tolerance = tolerance;
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn set_diagnostics(&mut self, diagnostics: Diagnostics) {
        self.diagnostics = diagnostics;
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    pub fn into_observer(self) -> O {
        self.observer
    }

    /// Elapsed time in seconds, for display only
    pub fn elapsed_seconds(&self) -> f64 {
        if self.frequency == 0 {
            return 0.0;
        }
        self.counter as f64 / self.frequency as f64
    }

    // State transitions

    /// Change the rate; the counter restarts from zero
    ///
    /// The old counter is in units of the old frequency and is not rescaled.
    /// Callers that need continuity snapshot their own state first.
    pub fn set_frequency(&mut self, frequency: u64, divisor: u64) -> ClockResult<()> {
        if divisor == 0 {
            return Err(ClockError::ZeroDivisor);
        }
        debug!(
            "Clock domain {}: frequency {}/{} -> {}/{}",
            self.name, self.frequency, self.frequency_divisor, frequency, divisor
        );
        self.frequency = frequency;
        self.frequency_divisor = divisor;
        self.counter = 0;
        self.counter_whole = 0;
        Ok(())
    }

    /// Set the floating-point origin; the counter restarts from zero
    pub fn set_base(&mut self, host_seconds: f64) {
        self.time_base = host_seconds;
        self.counter = 0;
        self.counter_whole = 0;
    }

    /// Drive the domain from a floating-point host time in seconds
    ///
    /// Times below the origin trigger a rebase: the origin is moved to the
    /// negative offset, the observer is told, and the exact counter is set
    /// to zero through [`ClockDomain::set_time`]. When the counter is further
    /// from zero than the jitter band, that reset is itself a major
    /// regression, so the sink receives two reports: the rebase, then the
    /// regression.
    pub fn set_time_seconds(&mut self, host_seconds: f64) -> TimeUpdate {
        if !host_seconds.is_finite() {
            debug!(
                "Clock domain {}: ignoring non-finite host time {}",
                self.name, host_seconds
            );
            return TimeUpdate::Ignored;
        }

        let offset = host_seconds - self.time_base;
        if offset < 0.0 {
            self.diagnostics
                .report(&self.name, &TimeAnomaly::RebaseRequired { offset });
            self.time_base = offset;
            self.observer.on_rebase();
            self.set_time(0);
            return TimeUpdate::Rebased;
        }

        // Saturating float-to-int cast
        let units = (offset * self.frequency as f64).floor() as u64;
        self.set_time(units)
    }

    /// Drive the domain to an exact counter value
    ///
    /// - at or ahead of the counter: advance normally
    /// - behind by no more than the jitter band: ignored
    /// - further behind: counter forced back, no notification
    pub fn set_time(&mut self, count: Units) -> TimeUpdate {
        if count >= self.counter {
            let ticks = self.advance(count - self.counter);
            return TimeUpdate::Advanced { ticks };
        }

        let band = self.jitter_tolerance.band(self.frequency);
        if count.saturating_add(band) >= self.counter {
            self.diagnostics.report(
                &self.name,
                &TimeAnomaly::MinorJitter {
                    requested: count,
                    counter: self.counter,
                },
            );
            TimeUpdate::Jitter
        } else {
            self.diagnostics.report(
                &self.name,
                &TimeAnomaly::MajorRegression {
                    requested: count,
                    counter: self.counter,
                },
            );
            self.counter = count;
            self.counter_whole = count / self.frequency_divisor;
            TimeUpdate::Regressed
        }
    }

    /// Move forward by `delta` counter units
    ///
    /// Returns the number of whole ticks crossed. The observer is called once
    /// with that number when it is non-zero, however large `delta` is.
    pub fn advance(&mut self, delta: Units) -> WholeTicks {
        let divisor = self.frequency_divisor as u128;
        let wrapped = (self.counter as u128 % divisor) + delta as u128;

        let Some(counter) = self.counter.checked_add(delta) else {
            // Pinned at u64::MAX; only the boundaries actually reached count
            self.counter = u64::MAX;
            let whole = self.counter / self.frequency_divisor;
            let ticks = whole - self.counter_whole;
            self.counter_whole = whole;
            if ticks > 0 {
                self.observer.on_advance(ticks);
            }
            return ticks;
        };
        self.counter = counter;
        if wrapped < divisor {
            return 0;
        }

        let ticks = (wrapped / divisor) as u64;
        self.counter_whole += ticks;
        self.observer.on_advance(ticks);
        ticks
    }

    // Persistence

    pub fn snapshot(&self) -> ClockSnapshot {
        ClockSnapshot {
            frequency: self.frequency,
            frequency_divisor: self.frequency_divisor,
            counter: self.counter,
            counter_whole: self.counter_whole,
        }
    }

    /// Restore exact state saved by [`ClockDomain::snapshot`]
    ///
    /// Name, master flag, origin and observer are left as they are.
    pub fn restore(&mut self, snapshot: &ClockSnapshot) -> ClockResult<()> {
        if snapshot.frequency_divisor == 0 {
            return Err(ClockError::ZeroDivisor);
        }
        if !snapshot.is_consistent() {
            return Err(ClockError::InconsistentSnapshot {
                counter: snapshot.counter,
                divisor: snapshot.frequency_divisor,
                whole: snapshot.counter_whole,
            });
        }
        self.frequency = snapshot.frequency;
        self.frequency_divisor = snapshot.frequency_divisor;
        self.counter = snapshot.counter;
        self.counter_whole = snapshot.counter_whole;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingSink;
    use std::sync::Arc;

    /// Records every notification it receives
    #[derive(Debug, Default)]
    struct Recorder {
        advances: Vec<WholeTicks>,
        rebases: usize,
    }

    impl TimeObserver for Recorder {
        fn on_advance(&mut self, whole_ticks: WholeTicks) {
            self.advances.push(whole_ticks);
        }

        fn on_rebase(&mut self) {
            self.rebases += 1;
        }
    }

    fn recorded(
        frequency: u64,
        divisor: u64,
    ) -> (ClockDomain<Recorder>, Arc<RecordingSink>) {
        let sink = RecordingSink::new();
        let domain = ClockDomain::with_rational(frequency, divisor)
            .unwrap()
            .named("test")
            .with_diagnostics(Diagnostics::new(sink.clone()))
            .with_observer(Recorder::default());
        (domain, sink)
    }

    #[test]
    fn test_default_construction() {
        let domain = ClockDomain::new();
        assert_eq!(domain.frequency(), 0);
        assert_eq!(domain.frequency_divisor(), 1);
        assert!(domain.is_master());
        assert_eq!(domain.counter(), 0);

        let integer = ClockDomain::with_frequency(1_193_182);
        assert_eq!(integer.frequency_divisor(), 1);
        assert!(matches!(
            ClockDomain::with_rational(1, 0),
            Err(ClockError::ZeroDivisor)
        ));
    }

    #[test]
    fn test_advance_batches_ticks() {
        let (mut domain, _) = recorded(100_000_000, 3);

        assert_eq!(domain.advance(7), 2);
        assert_eq!(domain.counter(), 7);
        assert_eq!(domain.counter_whole(), 2);
        assert_eq!(domain.observer().advances, vec![2]);
    }

    #[test]
    fn test_advance_within_partial_tick_is_silent() {
        let (mut domain, _) = recorded(100_000_000, 3);

        assert_eq!(domain.advance(1), 0);
        assert_eq!(domain.advance(1), 0);
        assert!(domain.observer().advances.is_empty());

        // Third unit completes the first tick
        assert_eq!(domain.advance(1), 1);
        assert_eq!(domain.observer().advances, vec![1]);
        assert_eq!(domain.counter_whole(), 1);
    }

    #[test]
    fn test_whole_counter_tracks_floor() {
        let (mut domain, _) = recorded(100_000_000, 7);
        let deltas = [0u64, 3, 4, 6, 1, 13, 14, 0, 2, 99, 5, 700_001];

        for delta in deltas {
            domain.advance(delta);
            assert_eq!(domain.counter_whole(), domain.counter() / 7);
        }
        let notified: u64 = domain.observer().advances.iter().sum();
        assert_eq!(notified, domain.counter_whole());
    }

    #[test]
    fn test_increasing_set_time_matches_counter() {
        let (mut domain, sink) = recorded(1_000, 4);
        let initial_whole = domain.counter() / 4;

        for count in [1u64, 5, 6, 11, 12, 400, 401, 9_999] {
            domain.set_time(count);
            assert_eq!(domain.counter(), count);
        }

        let notified: u64 = domain.observer().advances.iter().sum();
        assert_eq!(notified, 9_999 / 4 - initial_whole);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_jitter_is_ignored_and_reported_once() {
        let (mut domain, sink) = recorded(1_000, 1);
        domain.set_time(500);

        assert_eq!(domain.set_time(480), TimeUpdate::Jitter);
        assert_eq!(domain.counter(), 500);
        assert_eq!(domain.set_time(400), TimeUpdate::Jitter);
        assert_eq!(domain.counter(), 500);

        assert_eq!(sink.count("jitter"), 1);
    }

    #[test]
    fn test_major_regression_forces_counter() {
        let (mut domain, sink) = recorded(1_000, 1);
        domain.set_time(500);
        domain.set_time(480);
        let advances_before = domain.observer().advances.len();

        assert_eq!(domain.set_time(100), TimeUpdate::Regressed);
        assert_eq!(domain.counter(), 100);
        assert_eq!(domain.counter_whole(), 100);
        assert_eq!(domain.observer().advances.len(), advances_before);

        domain.set_time(500);
        domain.set_time(0);
        assert_eq!(sink.count("regression"), 2);
        assert_eq!(sink.count("jitter"), 1);
    }

    #[test]
    fn test_jitter_band_boundary() {
        let (mut domain, _) = recorded(1_000, 1);
        domain.set_time(1_000);

        // Exactly frequency / 10 behind is still jitter
        assert_eq!(domain.set_time(900), TimeUpdate::Jitter);
        assert_eq!(domain.counter(), 1_000);
        // One more unit is a regression
        assert_eq!(domain.set_time(899), TimeUpdate::Regressed);
        assert_eq!(domain.counter(), 899);
    }

    #[test]
    fn test_configurable_tolerance() {
        let (domain, _) = recorded(1_000, 1);
        let mut domain = domain.with_jitter_tolerance(JitterTolerance::Disabled);
        domain.set_time(500);
        assert_eq!(domain.set_time(499), TimeUpdate::Regressed);

        domain.set_jitter_tolerance(JitterTolerance::Units(300));
        domain.set_time(800);
        assert_eq!(domain.set_time(500), TimeUpdate::Jitter);
        assert_eq!(domain.counter(), 800);
    }

    #[test]
    fn test_set_frequency_resets_counter() {
        let (mut domain, _) = recorded(1_000, 1);
        domain.set_time(12_345);

        domain.set_frequency(100_000_000, 3).unwrap();
        assert_eq!(domain.counter(), 0);
        assert_eq!(domain.counter_whole(), 0);
        assert_eq!(domain.rate(), Frequency::new(100_000_000, 3).unwrap());

        assert!(matches!(
            domain.set_frequency(5, 0),
            Err(ClockError::ZeroDivisor)
        ));
        assert_eq!(domain.frequency(), 100_000_000);
    }

    #[test]
    fn test_float_time_converts_with_floor() {
        let (mut domain, _) = recorded(1_000, 1);
        domain.set_base(10.0);

        assert_eq!(
            domain.set_time_seconds(10.2505),
            TimeUpdate::Advanced { ticks: 250 }
        );
        assert_eq!(domain.counter(), 250);
        assert!((domain.elapsed_seconds() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_rebase_below_origin() {
        let (mut domain, sink) = recorded(1_000, 1);
        domain.set_base(10.0);
        domain.set_time_seconds(10.05);

        assert_eq!(domain.set_time_seconds(7.5), TimeUpdate::Rebased);
        assert_eq!(domain.time_base(), -2.5);
        assert_eq!(domain.observer().rebases, 1);
        // Counter 50 is within the 100-unit band of zero, so it stays
        assert_eq!(domain.counter(), 50);
        assert_eq!(sink.count("rebase"), 1);
    }

    #[test]
    fn test_rebase_after_long_run_snaps_counter() {
        let (mut domain, sink) = recorded(1_000, 1);
        domain.set_base(1.0);
        domain.set_time_seconds(5.0);
        assert_eq!(domain.counter(), 4_000);

        domain.set_time_seconds(0.0);
        assert_eq!(domain.counter(), 0);
        assert_eq!(domain.counter_whole(), 0);
        assert_eq!(sink.count("rebase"), 1);
        assert_eq!(sink.count("regression"), 1);
    }

    #[test]
    fn test_non_finite_time_ignored() {
        let (mut domain, sink) = recorded(1_000, 1);
        domain.set_time(10);

        assert_eq!(domain.set_time_seconds(f64::NAN), TimeUpdate::Ignored);
        assert_eq!(domain.set_time_seconds(f64::INFINITY), TimeUpdate::Ignored);
        assert_eq!(domain.counter(), 10);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_snapshot_restore() {
        let (mut domain, _) = recorded(100_000_000, 3);
        domain.advance(1_000_000_001);
        let snap = domain.snapshot();

        let mut other = ClockDomain::new();
        other.restore(&snap).unwrap();
        assert_eq!(other.counter(), 1_000_000_001);
        assert_eq!(other.counter_whole(), 333_333_333);
        assert_eq!(other.frequency_divisor(), 3);

        let bad = ClockSnapshot {
            counter_whole: 1,
            ..snap
        };
        assert!(matches!(
            other.restore(&bad),
            Err(ClockError::InconsistentSnapshot { .. })
        ));
    }

    #[test]
    fn test_counter_saturates_at_max() {
        let (mut domain, _) = recorded(1_000, 1);
        domain.set_time(u64::MAX);
        assert_eq!(domain.advance(1), 0);
        assert_eq!(domain.counter(), u64::MAX);
        assert_eq!(domain.counter_whole(), u64::MAX);

        let (mut domain, _) = recorded(100_000_000, 3);
        domain.set_time(u64::MAX - 1);
        assert_eq!(domain.counter_whole(), (u64::MAX - 1) / 3);

        assert_eq!(domain.advance(10), 1);
        assert_eq!(domain.counter(), u64::MAX);
        assert_eq!(domain.counter_whole(), u64::MAX / 3);
        assert_eq!(domain.observer().advances.last(), Some(&1));

        // Saturating float conversion lands on the same ceiling
        let (mut domain, sink) = recorded(44_100, 1);
        domain.set_time_seconds(1e15);
        assert_eq!(domain.counter(), u64::MAX);
        assert_eq!(domain.counter_whole(), u64::MAX);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_rename_and_master_flag() {
        let mut domain = ClockDomain::with_frequency(44_100).named("pcm").master(false);
        assert_eq!(domain.name(), "pcm");
        assert!(!domain.is_master());

        domain.set_name("opl3");
        domain.set_master(true);
        assert_eq!(domain.name(), "opl3");
        assert!(domain.is_master());
    }
}

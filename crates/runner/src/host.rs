use emuclock_ports::HostTimeSource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Time scale modes for the host clock
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TimeScale {
    /// Real-time (1:1 ratio with the host's monotonic clock)
    #[default]
    Normal,
    /// Accelerated time (multiplier applied to elapsed time)
    Fast(u32),
    /// Decelerated time (divisor applied to elapsed time)
    Slow(u32),
    /// Fixed time (only advances when explicitly moved)
    Fixed,
}

#[derive(Debug)]
struct HostState {
    scale: TimeScale,
    /// Host instant the current scale segment started at
    segment_start: Instant,
    /// Emulated seconds at the start of the current segment
    segment_seconds: f64,
}

/// Host time index in seconds, derived from the monotonic host clock
///
/// The value is what an emulator's scheduler would hand to its clock
/// domains: a floating-point seconds count that can be sped up, slowed
/// down, frozen and stepped for testing.
#[derive(Debug)]
pub struct HostClock {
    state: Mutex<HostState>,
    name: String,
}

impl HostClock {
    /// Real-time clock starting at `start_seconds`
    pub fn new(start_seconds: f64) -> Self {
        Self::with_scale(start_seconds, TimeScale::Normal)
    }

    /// Frozen clock that only moves through [`HostClock::advance`]
    pub fn fixed(start_seconds: f64) -> Self {
        Self::with_scale(start_seconds, TimeScale::Fixed)
    }

    pub fn with_scale(start_seconds: f64, scale: TimeScale) -> Self {
        Self {
            state: Mutex::new(HostState {
                scale,
                segment_start: Instant::now(),
                segment_seconds: start_seconds,
            }),
            name: "HostClock".to_string(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Change the time scale without a discontinuity
    pub fn set_time_scale(&self, scale: TimeScale) {
        let mut state = self.lock();
        let now = Instant::now();
        state.segment_seconds = Self::seconds_at(&state, now);
        state.segment_start = now;
        state.scale = scale;
    }

    pub fn time_scale(&self) -> TimeScale {
        self.lock().scale
    }

    /// Move time forward by `duration`
    ///
    /// This is primarily useful in Fixed mode for deterministic testing.
    /// In other modes, it shifts the current segment.
    pub fn advance(&self, duration: Duration) {
        self.lock().segment_seconds += duration.as_secs_f64();
    }

    /// Explicitly set the current time
    ///
    /// Warning: setting an earlier value is a host time reset; clock domains
    /// driven from this source will rebase.
    pub fn set_seconds(&self, seconds: f64) {
        let mut state = self.lock();
        state.segment_start = Instant::now();
        state.segment_seconds = seconds;
    }

    fn seconds_at(state: &HostState, now: Instant) -> f64 {
        let real = now.duration_since(state.segment_start).as_secs_f64();
        let scaled = match state.scale {
            TimeScale::Normal => real,
            TimeScale::Fast(multiplier) => real * multiplier as f64,
            TimeScale::Slow(0) | TimeScale::Fixed => 0.0,
            TimeScale::Slow(divisor) => real / divisor as f64,
        };
        state.segment_seconds + scaled
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl HostTimeSource for HostClock {
    fn now_seconds(&self) -> f64 {
        Self::seconds_at(&self.lock(), Instant::now())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Host time source with floating-point index noise
///
/// Wraps another source and subtracts a random amount up to `amplitude`
/// seconds from every reading, reproducing the small backward steps an
/// accumulated floating-point time index produces.
#[derive(Debug)]
pub struct JitteredSource<S: HostTimeSource> {
    inner: S,
    amplitude: f64,
    rng: Mutex<StdRng>,
}

impl<S: HostTimeSource> JitteredSource<S> {
    pub fn new(inner: S, amplitude: f64) -> Self {
        Self {
            inner,
            amplitude,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Create with a specific seed for reproducible runs
    pub fn with_seed(inner: S, amplitude: f64, seed: u64) -> Self {
        Self {
            inner,
            amplitude,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }
}

impl<S: HostTimeSource> HostTimeSource for JitteredSource<S> {
    fn now_seconds(&self) -> f64 {
        let noise = if self.amplitude > 0.0 {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            rng.gen_range(0.0..self.amplitude)
        } else {
            0.0
        };
        self.inner.now_seconds() - noise
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_fixed_mode() {
        let clock = HostClock::fixed(5.0);
        let t1 = clock.now_seconds();
        thread::sleep(Duration::from_millis(10));
        assert_eq!(clock.now_seconds(), t1);

        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.now_seconds(), 5.25);
    }

    #[test]
    fn test_normal_mode_advances() {
        let clock = HostClock::new(0.0);
        let t1 = clock.now_seconds();
        thread::sleep(Duration::from_millis(10));
        let t2 = clock.now_seconds();
        assert!(t2 - t1 >= 0.009);
    }

    #[test]
    fn test_scale_change_is_continuous() {
        let clock = HostClock::with_scale(1.0, TimeScale::Fast(100));
        thread::sleep(Duration::from_millis(5));
        clock.set_time_scale(TimeScale::Fixed);
        let frozen = clock.now_seconds();

        assert!(frozen >= 1.0 + 0.5);
        assert_eq!(clock.time_scale(), TimeScale::Fixed);
        assert_eq!(clock.now_seconds(), frozen);
    }

    #[test]
    fn test_set_seconds_resets() {
        let clock = HostClock::fixed(100.0);
        clock.set_seconds(0.25);
        assert_eq!(clock.now_seconds(), 0.25);
    }

    #[test]
    fn test_jitter_bounded() {
        let source = JitteredSource::with_seed(HostClock::fixed(10.0), 0.001, 7);
        for _ in 0..1_000 {
            let t = source.now_seconds();
            assert!(t <= 10.0 && t > 10.0 - 0.001);
        }
        assert_eq!(source.name(), "HostClock");
    }
}

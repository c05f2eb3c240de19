//! Timing loop - periodically pushes host time into a clock group
//!
//! Stands in for the emulator's scheduler: on every tick of a tokio interval
//! it reads the host time source and hands the value to the group. Which
//! domains see the floating-point value depends on [`DriveMode`].

use emuclock_clock::{ClockGroup, TimeUpdate};
use emuclock_ports::HostTimeSource;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// How host time reaches the domains of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriveMode {
    /// Only the master sees host time; slaves follow it exactly
    #[default]
    MasterSlave,
    /// Every domain converts host time on its own
    Broadcast,
}

/// Timing loop configuration
#[derive(Debug, Clone)]
pub struct TimingLoopConfig {
    /// Interval between host time samples (ms)
    pub interval_ms: u64,
    /// Total host run time
    pub duration: Duration,
    pub drive_mode: DriveMode,
}

impl Default for TimingLoopConfig {
    fn default() -> Self {
        Self {
            interval_ms: 10,
            duration: Duration::from_secs(1),
            drive_mode: DriveMode::default(),
        }
    }
}

/// Counters accumulated over a run
#[derive(Debug, Clone, Default)]
pub struct LoopStats {
    /// Host time samples taken
    pub steps: u64,
    /// Whole ticks notified, by domain name
    pub ticks_by_domain: HashMap<String, u64>,
    /// Updates that went through jitter, regression or rebase handling
    pub anomalies: u64,
    /// Last host time pushed
    pub last_host_seconds: f64,
}

/// Drives a [`ClockGroup`] from a [`HostTimeSource`]
pub struct TimingLoop<S: HostTimeSource> {
    source: Arc<S>,
    group: ClockGroup,
    config: TimingLoopConfig,
    stats: LoopStats,
}

impl<S: HostTimeSource> TimingLoop<S> {
    /// Create a loop; every domain's origin is set to the source's current time
    pub fn new(source: Arc<S>, mut group: ClockGroup, config: TimingLoopConfig) -> Self {
        let origin = source.now_seconds();
        group.set_base(origin);
        log::debug!(
            "Timing loop: {} domains, origin {:.6}s from {}",
            group.len(),
            origin,
            source.name()
        );

        Self {
            source,
            group,
            config,
            stats: LoopStats {
                last_host_seconds: origin,
                ..LoopStats::default()
            },
        }
    }

    pub fn group(&self) -> &ClockGroup {
        &self.group
    }

    pub fn group_mut(&mut self) -> &mut ClockGroup {
        &mut self.group
    }

    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    /// Sample host time once and push it into the group
    pub fn step(&mut self) -> Vec<TimeUpdate> {
        let now = self.source.now_seconds();
        self.stats.steps += 1;
        self.stats.last_host_seconds = now;

        let updates: Vec<_> = match self.config.drive_mode {
            DriveMode::Broadcast => self.group.set_time_seconds(now),
            DriveMode::MasterSlave => match self.group.master() {
                Some(master) => {
                    let update = self
                        .group
                        .domain_mut(master)
                        .map(|d| d.set_time_seconds(now))
                        .unwrap_or(TimeUpdate::Ignored);
                    let mut updates = vec![(master, update)];
                    updates.extend(self.group.sync_slaves());
                    updates
                }
                None => {
                    log::warn!("Timing loop: no master domain, broadcasting host time");
                    self.group.set_time_seconds(now)
                }
            },
        };

        let mut result = Vec::with_capacity(updates.len());
        for (id, update) in updates {
            if update.is_anomaly() {
                self.stats.anomalies += 1;
            }
            if let Some(domain) = self.group.domain(id) {
                *self
                    .stats
                    .ticks_by_domain
                    .entry(domain.name().to_string())
                    .or_default() += update.ticks();
            }
            result.push(update);
        }
        result
    }

    /// Run until the configured duration has elapsed on the tokio clock
    pub async fn run(mut self) -> (ClockGroup, LoopStats) {
        let period = Duration::from_millis(self.config.interval_ms.max(1));
        let mut interval = tokio::time::interval(period);
        let deadline = tokio::time::Instant::now() + self.config.duration;

        log::info!(
            "Timing loop started ({}ms interval, {:?})",
            self.config.interval_ms,
            self.config.duration
        );
        loop {
            interval.tick().await;
            self.step();
            if tokio::time::Instant::now() >= deadline {
                break;
            }
        }
        log::info!(
            "Timing loop stopped after {} steps ({} anomalies)",
            self.stats.steps,
            self.stats.anomalies
        );

        (self.group, self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostClock;
    use emuclock_clock::{ClockDomain, RecordingSink};

    fn group() -> ClockGroup {
        let mut group = ClockGroup::new(RecordingSink::new());
        group
            .insert(ClockDomain::with_frequency(1_000).named("master"))
            .unwrap();
        group
            .insert(
                ClockDomain::with_rational(1_000, 3)
                    .unwrap()
                    .named("third")
                    .master(false),
            )
            .unwrap();
        group
    }

    #[test]
    fn test_master_slave_step() {
        let clock = Arc::new(HostClock::fixed(50.0));
        let mut timing = TimingLoop::new(clock.clone(), group(), TimingLoopConfig::default());

        clock.advance(Duration::from_millis(375));
        let updates = timing.step();

        assert_eq!(updates[0], TimeUpdate::Advanced { ticks: 375 });
        assert_eq!(updates[1], TimeUpdate::Advanced { ticks: 125 });
        assert_eq!(timing.stats().ticks_by_domain["third"], 125);
        assert_eq!(timing.stats().steps, 1);
    }

    #[test]
    fn test_broadcast_step() {
        let clock = Arc::new(HostClock::fixed(0.0));
        let config = TimingLoopConfig {
            drive_mode: DriveMode::Broadcast,
            ..TimingLoopConfig::default()
        };
        let mut timing = TimingLoop::new(clock.clone(), group(), config);

        clock.advance(Duration::from_micros(31_250));
        timing.step();
        let third = timing.group().find("third").unwrap();
        assert_eq!(timing.group().domain(third).unwrap().counter_whole(), 10);
    }

    #[test]
    fn test_host_reset_counts_anomaly() {
        let clock = Arc::new(HostClock::fixed(10.0));
        let mut timing = TimingLoop::new(clock.clone(), group(), TimingLoopConfig::default());

        clock.advance(Duration::from_secs(2));
        timing.step();
        clock.set_seconds(1.0);
        let updates = timing.step();

        // Master rebases and snaps back; the slave follows it down
        assert_eq!(updates, vec![TimeUpdate::Rebased, TimeUpdate::Regressed]);
        assert_eq!(timing.stats().anomalies, 2);
    }
}

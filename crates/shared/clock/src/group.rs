use emuclock_core::{ClockSnapshot, Frequency, TimeUpdate, Units, WholeTicks};
use emuclock_ports::{ClockError, ClockResult, DiagnosticSink, TimeObserver};
use log::debug;
use std::any::Any;
use std::sync::Arc;

use crate::config::ClockGroupConfig;
use crate::diagnostics::Diagnostics;
use crate::domain::ClockDomain;

/// Object-safe view of a clock domain, whatever its observer type
///
/// Domains are `Send` so a whole group can be moved into a driver task.
pub trait TimedDomain: Any + Send {
    fn name(&self) -> &str;
    fn is_master(&self) -> bool;
    fn set_master(&mut self, is_master: bool);
    fn rate(&self) -> Frequency;
    fn counter(&self) -> Units;
    fn counter_whole(&self) -> WholeTicks;
    fn set_base(&mut self, host_seconds: f64);
    fn set_time_seconds(&mut self, host_seconds: f64) -> TimeUpdate;
    fn set_time(&mut self, count: Units) -> TimeUpdate;
    fn advance(&mut self, delta: Units) -> WholeTicks;
    fn snapshot(&self) -> ClockSnapshot;
    fn set_diagnostics(&mut self, diagnostics: Diagnostics);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<O: TimeObserver + Send + 'static> TimedDomain for ClockDomain<O> {
    fn name(&self) -> &str {
        ClockDomain::name(self)
    }

    fn is_master(&self) -> bool {
        ClockDomain::is_master(self)
    }

    fn set_master(&mut self, is_master: bool) {
        ClockDomain::set_master(self, is_master);
    }

    fn rate(&self) -> Frequency {
        ClockDomain::rate(self)
    }

    fn counter(&self) -> Units {
        ClockDomain::counter(self)
    }

    fn counter_whole(&self) -> WholeTicks {
        ClockDomain::counter_whole(self)
    }

    fn set_base(&mut self, host_seconds: f64) {
        ClockDomain::set_base(self, host_seconds);
    }

    fn set_time_seconds(&mut self, host_seconds: f64) -> TimeUpdate {
        ClockDomain::set_time_seconds(self, host_seconds)
    }

    fn set_time(&mut self, count: Units) -> TimeUpdate {
        ClockDomain::set_time(self, count)
    }

    fn advance(&mut self, delta: Units) -> WholeTicks {
        ClockDomain::advance(self, delta)
    }

    fn snapshot(&self) -> ClockSnapshot {
        ClockDomain::snapshot(self)
    }

    fn set_diagnostics(&mut self, diagnostics: Diagnostics) {
        ClockDomain::set_diagnostics(self, diagnostics);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Handle to a domain inside a [`ClockGroup`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DomainId(usize);

impl DomainId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A set of related clock domains sharing one diagnostic channel
///
/// The group owns the jitter warn-once latch for its members and carries the
/// master/slave convention: one domain is the authoritative time source,
/// the others are phase-derived from it. The master flag is a contract
/// consulted by collaborators; the group only keeps it unique when asked to
/// via [`ClockGroup::designate_master`].
///
/// ```text
/// master (100 MHz)
///     │
///     ├── bus   (100 MHz / 3)
///     └── pit   (1.193182 MHz)
/// ```
pub struct ClockGroup {
    diagnostics: Diagnostics,
    domains: Vec<Box<dyn TimedDomain>>,
}

impl ClockGroup {
    pub fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self::with_diagnostics(Diagnostics::new(sink))
    }

    pub fn with_log_sink() -> Self {
        Self::with_diagnostics(Diagnostics::log())
    }

    pub fn with_diagnostics(diagnostics: Diagnostics) -> Self {
        Self {
            diagnostics,
            domains: Vec::new(),
        }
    }

    /// Build a group of observer-less domains from configuration
    pub fn from_config(config: &ClockGroupConfig, diagnostics: Diagnostics) -> ClockResult<Self> {
        config.validate()?;
        let mut group = Self::with_diagnostics(diagnostics);
        for domain in &config.domains {
            group.insert(ClockDomain::from_config(domain)?)?;
        }
        Ok(group)
    }

    /// Add a domain; it joins this group's diagnostic channel
    ///
    /// Named domains must be unique within the group.
    pub fn insert<O: TimeObserver + Send + 'static>(
        &mut self,
        mut domain: ClockDomain<O>,
    ) -> ClockResult<DomainId> {
        if !domain.name().is_empty() && self.find(domain.name()).is_some() {
            return Err(ClockError::DuplicateDomain(domain.name().to_string()));
        }
        domain.set_diagnostics(self.diagnostics.clone());
        debug!(
            "Clock group: added domain '{}' at {} (master: {})",
            domain.name(),
            domain.rate(),
            domain.is_master()
        );
        self.domains.push(Box::new(domain));
        Ok(DomainId(self.domains.len() - 1))
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<DomainId> {
        self.domains
            .iter()
            .position(|d| d.name() == name)
            .map(DomainId)
    }

    pub fn domain(&self, id: DomainId) -> Option<&dyn TimedDomain> {
        self.domains.get(id.0).map(|d| d.as_ref())
    }

    pub fn domain_mut(&mut self, id: DomainId) -> Option<&mut (dyn TimedDomain + 'static)> {
        self.domains.get_mut(id.0).map(|d| d.as_mut())
    }

    /// Typed access; `None` if the id is unknown or `O` is not its observer type
    pub fn get<O: TimeObserver + Send + 'static>(
        &self,
        id: DomainId,
    ) -> Option<&ClockDomain<O>> {
        self.domains.get(id.0)?.as_any().downcast_ref()
    }

    pub fn get_mut<O: TimeObserver + Send + 'static>(
        &mut self,
        id: DomainId,
    ) -> Option<&mut ClockDomain<O>> {
        self.domains.get_mut(id.0)?.as_any_mut().downcast_mut()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DomainId, &dyn TimedDomain)> {
        self.domains
            .iter()
            .enumerate()
            .map(|(i, d)| (DomainId(i), d.as_ref()))
    }

    /// First domain flagged as master
    pub fn master(&self) -> Option<DomainId> {
        self.domains.iter().position(|d| d.is_master()).map(DomainId)
    }

    /// Make `id` the only master in the group
    pub fn designate_master(&mut self, id: DomainId) -> ClockResult<()> {
        if id.0 >= self.domains.len() {
            return Err(ClockError::InvalidConfig(format!(
                "no clock domain with index {}",
                id.0
            )));
        }
        for (i, domain) in self.domains.iter_mut().enumerate() {
            domain.set_master(i == id.0);
        }
        Ok(())
    }

    /// Set the floating-point origin of every domain
    pub fn set_base(&mut self, host_seconds: f64) {
        for domain in &mut self.domains {
            domain.set_base(host_seconds);
        }
    }

    /// Push a floating-point host time into every domain, master first
    ///
    /// Returns each domain's update in the order it was applied.
    pub fn set_time_seconds(&mut self, host_seconds: f64) -> Vec<(DomainId, TimeUpdate)> {
        self.master_first()
            .into_iter()
            .map(|i| (DomainId(i), self.domains[i].set_time_seconds(host_seconds)))
            .collect()
    }

    /// Bring every slave to the master's exact time
    ///
    /// A slave's target is `master.counter * slave.frequency / master.frequency`,
    /// computed in 128-bit integers, so rational slaves stay in lock-step with
    /// the master without floating point. Returns each slave's update; a
    /// master that moved backwards shows up here as slave regressions.
    pub fn sync_slaves(&mut self) -> Vec<(DomainId, TimeUpdate)> {
        let Some(master) = self.master() else {
            return Vec::new();
        };
        let master_counter = self.domains[master.0].counter() as u128;
        let master_frequency = self.domains[master.0].rate().numerator() as u128;
        if master_frequency == 0 {
            return Vec::new();
        }

        self.domains
            .iter_mut()
            .enumerate()
            .filter(|(i, domain)| *i != master.0 && !domain.is_master())
            .map(|(i, domain)| {
                let target = master_counter * domain.rate().numerator() as u128 / master_frequency;
                let update = domain.set_time(u64::try_from(target).unwrap_or(u64::MAX));
                (DomainId(i), update)
            })
            .collect()
    }

    /// Exact state of every domain, keyed by name
    pub fn snapshot_all(&self) -> Vec<(String, ClockSnapshot)> {
        self.domains
            .iter()
            .map(|d| (d.name().to_string(), d.snapshot()))
            .collect()
    }

    fn master_first(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.domains.len()).collect();
        order.sort_by_key(|&i| !self.domains[i].is_master());
        order
    }
}

impl Default for ClockGroup {
    fn default() -> Self {
        Self::with_log_sink()
    }
}

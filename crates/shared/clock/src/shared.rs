use emuclock_core::{TimeUpdate, Units, WholeTicks};
use emuclock_ports::{NullObserver, TimeObserver};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::ClockDomain;

/// Clock domain that several threads may drive
///
/// Each update takes the domain's lock for the whole counter update plus
/// observer dispatch, so one forward update still yields exactly one
/// notification even with several producers.
pub struct SharedClockDomain<O: TimeObserver = NullObserver> {
    inner: Arc<Mutex<ClockDomain<O>>>,
}

impl<O: TimeObserver> SharedClockDomain<O> {
    pub fn new(domain: ClockDomain<O>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(domain)),
        }
    }

    /// Exclusive access for anything beyond the common updates
    pub fn lock(&self) -> MutexGuard<'_, ClockDomain<O>> {
        // A panic inside an observer leaves the counter itself consistent
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_time_seconds(&self, host_seconds: f64) -> TimeUpdate {
        self.lock().set_time_seconds(host_seconds)
    }

    pub fn set_time(&self, count: Units) -> TimeUpdate {
        self.lock().set_time(count)
    }

    pub fn advance(&self, delta: Units) -> WholeTicks {
        self.lock().advance(delta)
    }

    pub fn counter(&self) -> Units {
        self.lock().counter()
    }

    pub fn counter_whole(&self) -> WholeTicks {
        self.lock().counter_whole()
    }
}

impl<O: TimeObserver> Clone for SharedClockDomain<O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

use emuclock_core::TimeAnomaly;
use emuclock_ports::DiagnosticSink;
use log::warn;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Diagnostic channel shared by a group of clock domains
///
/// Owns the sink and the group's "jitter already reported" latch. Minor
/// jitter is reported once per group; rebases and major regressions are
/// reported every time. Cloning shares both the sink and the latch, so
/// every domain handed a clone belongs to the same suppression group.
#[derive(Clone)]
pub struct Diagnostics {
    sink: Arc<dyn DiagnosticSink>,
    jitter_reported: Arc<AtomicBool>,
}

impl Diagnostics {
    /// Create a new suppression group writing to `sink`
    pub fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            sink,
            jitter_reported: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a new suppression group writing through the `log` facade
    pub fn log() -> Self {
        Self::new(Arc::new(LogSink))
    }

    /// Forward an anomaly to the sink, applying the jitter latch
    pub fn report(&self, domain: &str, anomaly: &TimeAnomaly) {
        if anomaly.is_suppressible() && self.jitter_reported.swap(true, Ordering::Relaxed) {
            return;
        }
        self.sink.report(domain, anomaly);
    }

    /// Whether this group has already reported minor jitter
    pub fn jitter_reported(&self) -> bool {
        self.jitter_reported.load(Ordering::Relaxed)
    }

    /// Re-arm the jitter latch so the next jitter event is reported again
    pub fn reset_jitter_latch(&self) {
        self.jitter_reported.store(false, Ordering::Relaxed);
    }

    /// True when both handles belong to the same suppression group
    pub fn same_group(&self, other: &Diagnostics) -> bool {
        Arc::ptr_eq(&self.jitter_reported, &other.jitter_reported)
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::log()
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("jitter_reported", &self.jitter_reported())
            .finish_non_exhaustive()
    }
}

/// Sink that writes warnings through the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&self, domain: &str, anomaly: &TimeAnomaly) {
        warn!("Clock domain {} warning: {}", domain, anomaly);
    }
}

/// Sink that keeps every report in memory
///
/// Used by tests and by hosts that surface timing anomalies in their own UI.
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<(String, TimeAnomaly)>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// All reports so far, oldest first
    pub fn records(&self) -> Vec<(String, TimeAnomaly)> {
        self.lock().clone()
    }

    /// Number of reports with the given anomaly label ("rebase", "jitter", "regression")
    pub fn count(&self, label: &str) -> usize {
        self.lock()
            .iter()
            .filter(|(_, anomaly)| anomaly.label() == label)
            .count()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(String, TimeAnomaly)>> {
        // A panicking reader cannot leave the Vec half-written
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&self, domain: &str, anomaly: &TimeAnomaly) {
        self.lock().push((domain.to_string(), *anomaly));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jitter() -> TimeAnomaly {
        TimeAnomaly::MinorJitter {
            requested: 480,
            counter: 500,
        }
    }

    #[test]
    fn test_jitter_reported_once_per_group() {
        let sink = RecordingSink::new();
        let diagnostics = Diagnostics::new(sink.clone());
        let sibling = diagnostics.clone();

        diagnostics.report("pit", &jitter());
        sibling.report("vga", &jitter());
        diagnostics.report("pit", &jitter());

        assert_eq!(sink.count("jitter"), 1);
        assert!(sibling.jitter_reported());
        assert!(diagnostics.same_group(&sibling));
    }

    #[test]
    fn test_separate_groups_have_separate_latches() {
        let sink = RecordingSink::new();
        let a = Diagnostics::new(sink.clone());
        let b = Diagnostics::new(sink.clone());

        a.report("a", &jitter());
        b.report("b", &jitter());

        assert_eq!(sink.count("jitter"), 2);
        assert!(!a.same_group(&b));
    }

    #[test]
    fn test_regressions_never_suppressed() {
        let sink = RecordingSink::new();
        let diagnostics = Diagnostics::new(sink.clone());
        let regression = TimeAnomaly::MajorRegression {
            requested: 100,
            counter: 500,
        };

        for _ in 0..3 {
            diagnostics.report("pit", &regression);
        }

        assert_eq!(sink.count("regression"), 3);
        assert_eq!(sink.records()[0].0, "pit");
    }

    #[test]
    fn test_reset_latch() {
        let sink = RecordingSink::new();
        let diagnostics = Diagnostics::new(sink.clone());

        diagnostics.report("pit", &jitter());
        diagnostics.reset_jitter_latch();
        diagnostics.report("pit", &jitter());

        assert_eq!(sink.len(), 2);
        sink.clear();
        assert!(sink.is_empty());
    }
}

use emuclock_core::TimeAnomaly;

/// Port for the severity-filtered diagnostic sink clock domains report to
///
/// The wording of the emitted text is not load-bearing; which anomalies are
/// reported, and how often, is decided by the caller.
pub trait DiagnosticSink: Send + Sync {
    /// Record an anomaly observed by the domain called `domain`
    fn report(&self, domain: &str, anomaly: &TimeAnomaly);
}

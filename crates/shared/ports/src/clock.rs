/// Port for the host-side time index that drives clock domains
///
/// This allows the system to use different time sources:
/// - A monotonic host clock (optionally scaled) for interactive runs
/// - A manually stepped clock for deterministic tests
/// - A noisy wrapper that reproduces floating-point jitter
pub trait HostTimeSource: Send + Sync {
    /// Seconds elapsed according to this source
    ///
    /// Not guaranteed to be monotonic; clock domains tolerate small
    /// backward steps.
    fn now_seconds(&self) -> f64;

    /// Get the source's name/identifier for debugging
    fn name(&self) -> &str {
        "HostTimeSource"
    }
}

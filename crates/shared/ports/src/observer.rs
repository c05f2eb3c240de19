use emuclock_core::WholeTicks;

/// Port through which hardware models observe time progress
///
/// A clock domain calls `on_advance` exactly once for every forward update
/// that crosses at least one tick boundary, passing the number of boundaries
/// crossed. Implementations batch their own catch-up work from that count.
pub trait TimeObserver {
    /// `whole_ticks` (>= 1) tick boundaries were crossed
    fn on_advance(&mut self, whole_ticks: WholeTicks) {
        let _ = whole_ticks;
    }

    /// The domain's floating-point origin moved because host time went
    /// below it
    fn on_rebase(&mut self) {}
}

/// Observer that ignores every notification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NullObserver;

impl TimeObserver for NullObserver {}

impl<T: TimeObserver + ?Sized> TimeObserver for Box<T> {
    fn on_advance(&mut self, whole_ticks: WholeTicks) {
        (**self).on_advance(whole_ticks);
    }

    fn on_rebase(&mut self) {
        (**self).on_rebase();
    }
}

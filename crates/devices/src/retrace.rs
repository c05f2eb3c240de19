use emuclock_clock::ClockDomain;
use emuclock_core::WholeTicks;
use emuclock_ports::TimeObserver;
use log::debug;
use serde::{Deserialize, Serialize};

/// Standard VGA dot clock for 640x480
pub const VGA_DOT_CLOCK_HZ: u64 = 25_175_000;

/// Input Status #1 (port 0x3DA): display disabled (horizontal or vertical blank)
pub const STATUS_DISPLAY_DISABLED: u8 = 0x01;

/// Input Status #1 (port 0x3DA): vertical retrace in progress
pub const STATUS_VERTICAL_RETRACE: u8 = 0x08;

/// CRT raster geometry, in dots and lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrtTiming {
    pub h_total: u64,
    pub h_display: u64,
    pub v_total: u64,
    pub v_display: u64,
    pub v_sync_start: u64,
    pub v_sync_end: u64,
}

impl CrtTiming {
    /// 640x480 @ 60 Hz
    pub const VGA_640X480: Self = Self {
        h_total: 800,
        h_display: 640,
        v_total: 525,
        v_display: 480,
        v_sync_start: 490,
        v_sync_end: 492,
    };

    pub fn dots_per_frame(&self) -> u64 {
        self.h_total * self.v_total
    }
}

/// Raster beam position tracker for a CRT controller
///
/// Driven by a dot-clock domain: every whole tick is one dot. Guest code
/// polling port 0x3DA for vertical retrace sees a beam position that is
/// exact with respect to emulated time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Retrace {
    timing: CrtTiming,
    /// Dot index within the current frame
    position: u64,
    frames: u64,
}

impl Retrace {
    pub fn new(timing: CrtTiming) -> Self {
        Self {
            timing,
            position: 0,
            frames: 0,
        }
    }

    /// Master dot-clock domain for this raster
    pub fn into_domain(self, dot_clock_hz: u64) -> ClockDomain<Retrace> {
        ClockDomain::with_frequency(dot_clock_hz)
            .named("vga")
            .with_observer(self)
    }

    pub fn timing(&self) -> CrtTiming {
        self.timing
    }

    /// Completed frames since power-on
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Current line; 0 for a raster with no dots per line
    pub fn scanline(&self) -> u64 {
        self.position.checked_div(self.timing.h_total).unwrap_or(0)
    }

    pub fn dot(&self) -> u64 {
        self.position.checked_rem(self.timing.h_total).unwrap_or(0)
    }

    pub fn in_vertical_retrace(&self) -> bool {
        (self.timing.v_sync_start..self.timing.v_sync_end).contains(&self.scanline())
    }

    pub fn in_display(&self) -> bool {
        self.scanline() < self.timing.v_display && self.dot() < self.timing.h_display
    }

    /// Value read from Input Status #1
    pub fn status_register(&self) -> u8 {
        let mut status = 0;
        if !self.in_display() {
            status |= STATUS_DISPLAY_DISABLED;
        }
        if self.in_vertical_retrace() {
            status |= STATUS_VERTICAL_RETRACE;
        }
        status
    }
}

impl Default for Retrace {
    fn default() -> Self {
        Self::new(CrtTiming::VGA_640X480)
    }
}

impl TimeObserver for Retrace {
    fn on_advance(&mut self, whole_ticks: WholeTicks) {
        let frame = self.timing.dots_per_frame();
        if frame == 0 {
            return;
        }
        let position = self.position as u128 + whole_ticks as u128;
        self.frames += (position / frame as u128) as u64;
        self.position = (position % frame as u128) as u64;
    }

    fn on_rebase(&mut self) {
        debug!(
            "VGA: host time rebased at frame {} line {}",
            self.frames,
            self.scanline()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_and_status() {
        let mut crt = Retrace::default();
        assert!(crt.in_display());
        assert_eq!(crt.status_register(), 0);

        // Right border of line 0
        crt.on_advance(700);
        assert_eq!((crt.scanline(), crt.dot()), (0, 700));
        assert_eq!(crt.status_register(), STATUS_DISPLAY_DISABLED);

        // Into vertical sync
        crt.on_advance(490 * 800 - 700);
        assert_eq!(crt.scanline(), 490);
        assert!(crt.in_vertical_retrace());
        assert_eq!(
            crt.status_register(),
            STATUS_DISPLAY_DISABLED | STATUS_VERTICAL_RETRACE
        );
    }

    #[test]
    fn test_frames_counted_in_one_batch() {
        let mut crt = Retrace::default();
        crt.on_advance(CrtTiming::VGA_640X480.dots_per_frame() * 60 + 801);

        assert_eq!(crt.frames(), 60);
        assert_eq!((crt.scanline(), crt.dot()), (1, 1));
    }

    #[test]
    fn test_empty_raster_reads_as_blank() {
        let timing = CrtTiming {
            h_total: 0,
            ..CrtTiming::VGA_640X480
        };
        let mut crt = Retrace::new(timing);
        crt.on_advance(1_000);

        assert_eq!((crt.scanline(), crt.dot()), (0, 0));
        assert_eq!(crt.frames(), 0);
        assert!(!crt.in_vertical_retrace());
        assert_eq!(crt.status_register(), 0);
    }

    #[test]
    fn test_one_second_of_dot_clock() {
        let mut domain = Retrace::default().into_domain(VGA_DOT_CLOCK_HZ);
        domain.set_base(0.0);
        domain.set_time_seconds(1.0);

        // 25_175_000 / 420_000 = 59.94 frames
        assert_eq!(domain.observer().frames(), 59);
        assert_eq!(domain.counter_whole(), VGA_DOT_CLOCK_HZ);
    }
}

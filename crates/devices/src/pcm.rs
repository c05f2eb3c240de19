use emuclock_clock::ClockDomain;
use emuclock_core::WholeTicks;
use emuclock_ports::TimeObserver;
use log::{debug, warn};
use std::collections::VecDeque;

/// Sample-generation API of an audio source
///
/// Synthesis engines (wavetable MIDI, FM, PC speaker) render on demand; the
/// pump decides how many samples are due.
pub trait SampleGenerator {
    /// Fill `out` with the next `out.len()` mono samples
    fn render(&mut self, out: &mut [i16]);

    /// Advance past `samples` samples nobody will hear
    ///
    /// The default renders into a small stack buffer and discards it;
    /// generators with closed-form phase should override it.
    fn skip(&mut self, samples: u64) {
        let mut discard = [0i16; 256];
        let mut left = samples;
        while left > 0 {
            let n = left.min(discard.len() as u64) as usize;
            self.render(&mut discard[..n]);
            left -= n as u64;
        }
    }
}

impl<G: SampleGenerator + ?Sized> SampleGenerator for Box<G> {
    fn render(&mut self, out: &mut [i16]) {
        (**self).render(out);
    }

    fn skip(&mut self, samples: u64) {
        (**self).skip(samples);
    }
}

/// Square wave with an exact integer phase accumulator
///
/// Toggles `2 * tone_hz` times per second of output; no error accumulates
/// however long it runs.
#[derive(Debug, Clone)]
pub struct SquareWave {
    sample_rate: u64,
    tone_hz: u64,
    amplitude: i16,
    phase: u64,
    high: bool,
}

impl SquareWave {
    pub fn new(sample_rate: u64, tone_hz: u64, amplitude: i16) -> Self {
        Self {
            sample_rate,
            tone_hz,
            amplitude,
            phase: 0,
            high: true,
        }
    }

    pub fn set_tone(&mut self, tone_hz: u64) {
        self.tone_hz = tone_hz;
    }
}

impl SampleGenerator for SquareWave {
    fn render(&mut self, out: &mut [i16]) {
        for sample in out.iter_mut() {
            *sample = if self.high {
                self.amplitude
            } else {
                -self.amplitude
            };
            if self.sample_rate == 0 {
                continue;
            }
            self.phase += 2 * self.tone_hz;
            while self.phase >= self.sample_rate {
                self.phase -= self.sample_rate;
                self.high = !self.high;
            }
        }
    }

    fn skip(&mut self, samples: u64) {
        if self.sample_rate == 0 {
            return;
        }
        let total = self.phase as u128 + 2 * self.tone_hz as u128 * samples as u128;
        let toggles = total / self.sample_rate as u128;
        if toggles % 2 == 1 {
            self.high = !self.high;
        }
        self.phase = (total % self.sample_rate as u128) as u64;
    }
}

/// Buffers samples from a generator as its output clock ticks
///
/// Attached to a domain running at the output sample rate: each
/// `on_advance(n)` renders exactly `n` samples in one call. The host audio
/// callback drains the buffer; if it falls behind, the oldest samples are
/// dropped and counted as overrun.
#[derive(Debug)]
pub struct SamplePump<G: SampleGenerator> {
    generator: G,
    buffer: VecDeque<i16>,
    capacity: usize,
    scratch: Vec<i16>,
    rendered: u64,
    overrun: u64,
}

impl<G: SampleGenerator> SamplePump<G> {
    pub fn new(generator: G, capacity: usize) -> Self {
        Self {
            generator,
            buffer: VecDeque::with_capacity(capacity),
            capacity,
            scratch: Vec::new(),
            rendered: 0,
            overrun: 0,
        }
    }

    /// Slave domain at `sample_rate` Hz feeding this pump
    pub fn into_domain(self, name: impl Into<String>, sample_rate: u64) -> ClockDomain<Self> {
        ClockDomain::with_frequency(sample_rate)
            .named(name)
            .master(false)
            .with_observer(self)
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn generator_mut(&mut self) -> &mut G {
        &mut self.generator
    }

    /// Samples rendered since creation, including dropped ones
    pub fn rendered(&self) -> u64 {
        self.rendered
    }

    /// Samples dropped because the buffer was full
    pub fn overrun(&self) -> u64 {
        self.overrun
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Move up to `out.len()` buffered samples into `out`
    pub fn drain(&mut self, out: &mut [i16]) -> usize {
        let count = out.len().min(self.buffer.len());
        for (slot, sample) in out.iter_mut().zip(self.buffer.drain(..count)) {
            *slot = sample;
        }
        count
    }
}

impl<G: SampleGenerator> TimeObserver for SamplePump<G> {
    fn on_advance(&mut self, whole_ticks: WholeTicks) {
        self.rendered = self.rendered.saturating_add(whole_ticks);

        // Only the newest `capacity` samples can end up in the buffer
        let kept = whole_ticks.min(self.capacity as u64);
        let skipped = whole_ticks - kept;
        if skipped > 0 {
            self.generator.skip(skipped);
        }

        let kept = kept as usize;
        self.scratch.clear();
        self.scratch.resize(kept, 0);
        self.generator.render(&mut self.scratch);

        let overflow = (self.buffer.len() + kept).saturating_sub(self.capacity);
        self.buffer.drain(..overflow);
        let dropped = skipped.saturating_add(overflow as u64);
        if dropped > 0 {
            self.overrun = self.overrun.saturating_add(dropped);
            warn!("PCM: buffer overrun, dropped {} samples", dropped);
        }
        self.buffer.extend(self.scratch.iter().copied());
    }

    fn on_rebase(&mut self) {
        debug!("PCM: host time rebased with {} samples buffered", self.buffer.len());
    }
}

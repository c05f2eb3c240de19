//! Machine setup - the set of clock domains a PC emulator starts with
//!
//! Either built from a JSON group configuration or from the default PC
//! layout: a CPU master, a derived bus clock and the timed devices.

use emuclock_clock::{ClockDomain, ClockGroup, ClockGroupConfig, ClockResult, Diagnostics};
use emuclock_devices::{PitChannel, PitMode, Retrace, SamplePump, SquareWave, VGA_DOT_CLOCK_HZ};

/// Default machine layout
#[derive(Debug, Clone)]
pub struct MachineConfig {
    /// CPU core clock (master)
    pub cpu_hz: u64,
    /// Bus clock as a fraction of the CPU clock
    pub bus_divisor: u64,
    /// PIT channel 0 reload value
    pub pit_reload: u16,
    /// PCM output rate
    pub sample_rate: u64,
    /// PCM buffer capacity in samples
    pub sample_buffer: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            cpu_hz: 100_000_000,
            bus_divisor: 3,
            pit_reload: 0,
            sample_rate: 44_100,
            sample_buffer: 1 << 16,
        }
    }
}

/// Build the default machine's clock group
pub fn build_machine(config: &MachineConfig, diagnostics: Diagnostics) -> ClockResult<ClockGroup> {
    let mut group = ClockGroup::with_diagnostics(diagnostics);

    group.insert(ClockDomain::with_frequency(config.cpu_hz).named("cpu"))?;
    group.insert(
        ClockDomain::with_rational(config.cpu_hz, config.bus_divisor)?
            .named("bus")
            .master(false),
    )?;

    let mut pit = PitChannel::new();
    pit.program(PitMode::RateGenerator, config.pit_reload);
    group.insert(pit.into_domain()?)?;

    group.insert(
        Retrace::default()
            .into_domain(VGA_DOT_CLOCK_HZ)
            .master(false),
    )?;
    group.insert(
        SamplePump::new(
            SquareWave::new(config.sample_rate, 440, 8_000),
            config.sample_buffer,
        )
        .into_domain("pcm", config.sample_rate),
    )?;

    log::info!(
        "Machine: {} clock domains, master {}",
        group.len(),
        config.cpu_hz
    );
    Ok(group)
}

/// Build a group of plain domains from a configuration file's contents
pub fn load_machine(config: &ClockGroupConfig, diagnostics: Diagnostics) -> ClockResult<ClockGroup> {
    let group = ClockGroup::from_config(config, diagnostics)?;
    log::info!("Machine: {} clock domains from configuration", group.len());
    Ok(group)
}

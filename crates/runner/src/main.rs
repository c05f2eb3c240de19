use emuclock_clock::{ClockGroupConfig, Diagnostics};
use emuclock_runner::{
    DriveMode, HostClock, JitteredSource, MachineConfig, TimingLoop, TimingLoopConfig,
    build_machine, load_machine,
};
use std::sync::Arc;
use std::time::Duration;

/// Usage: emuclock [config.json] [seconds]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let config_path = args.next().filter(|a| a != "-");
    let seconds: f64 = match args.next() {
        Some(s) => s.parse()?,
        None => 1.0,
    };

    let group = match &config_path {
        Some(path) => load_machine(&ClockGroupConfig::from_json_file(path)?, Diagnostics::log())?,
        None => build_machine(&MachineConfig::default(), Diagnostics::log())?,
    };

    // Float host index with a little noise, as a real scheduler would produce
    let source = Arc::new(JitteredSource::new(HostClock::new(0.0).named("host"), 1e-5));
    let config = TimingLoopConfig {
        interval_ms: 10,
        duration: Duration::try_from_secs_f64(seconds)?,
        drive_mode: DriveMode::MasterSlave,
    };

    let (group, stats) = TimingLoop::new(source, group, config).run().await;

    log::info!(
        "Ran {} steps to host time {:.6}s ({} anomalies)",
        stats.steps,
        stats.last_host_seconds,
        stats.anomalies
    );
    for (name, snapshot) in group.snapshot_all() {
        log::info!(
            "  {:<6} {:>14} whole ticks at {}/{} Hz",
            name,
            snapshot.counter_whole,
            snapshot.frequency,
            snapshot.frequency_divisor
        );
    }
    Ok(())
}

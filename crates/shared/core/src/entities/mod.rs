mod anomaly;
mod snapshot;
mod update;

pub use anomaly::TimeAnomaly;
pub use snapshot::ClockSnapshot;
pub use update::TimeUpdate;

use thiserror::Error;

/// Construction and configuration errors
///
/// Time anomalies are never errors; they are reported to the diagnostic
/// sink and handled in place. These cover invalid setup only.
#[derive(Error, Debug)]
pub enum ClockError {
    #[error("Frequency divisor must be at least 1")]
    ZeroDivisor,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Inconsistent snapshot: counter {counter} / divisor {divisor} != whole {whole}")]
    InconsistentSnapshot {
        counter: u64,
        divisor: u64,
        whole: u64,
    },

    #[error("Duplicate clock domain name: {0}")]
    DuplicateDomain(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ClockResult<T> = std::result::Result<T, ClockError>;

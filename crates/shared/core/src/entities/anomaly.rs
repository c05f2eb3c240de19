use serde::{Deserialize, Serialize};
use std::fmt;

use crate::values::Units;

/// Time irregularity observed by a clock domain
///
/// None of these stop emulation. Each is handled locally by policy and
/// reported to the diagnostic sink.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TimeAnomaly {
    /// Host time fell below the domain's floating-point origin.
    /// `offset` is the (negative) distance below the old origin, in seconds.
    RebaseRequired { offset: f64 },
    /// Exact time landed slightly behind the counter, within the jitter band
    MinorJitter { requested: Units, counter: Units },
    /// Exact time landed behind the counter by more than the jitter band
    MajorRegression { requested: Units, counter: Units },
}

impl TimeAnomaly {
    /// Short machine-friendly label
    pub fn label(&self) -> &'static str {
        match self {
            TimeAnomaly::RebaseRequired { .. } => "rebase",
            TimeAnomaly::MinorJitter { .. } => "jitter",
            TimeAnomaly::MajorRegression { .. } => "regression",
        }
    }

    /// Jitter is expected numerical noise; only its first report matters
    pub fn is_suppressible(&self) -> bool {
        matches!(self, TimeAnomaly::MinorJitter { .. })
    }
}

impl fmt::Display for TimeAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeAnomaly::RebaseRequired { offset } => {
                write!(f, "time went backwards below base (offset {offset}s)")
            }
            TimeAnomaly::MinorJitter { requested, counter } => write!(
                f,
                "time jumped slightly backwards ({requested} < {counter}), ignoring"
            ),
            TimeAnomaly::MajorRegression { requested, counter } => {
                write!(f, "time went backwards ({counter} -> {requested})")
            }
        }
    }
}

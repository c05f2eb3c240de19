use serde::{Deserialize, Serialize};

/// How far behind the current counter an exact time update may land and
/// still be treated as jitter rather than a real regression
///
/// Upstream floating-point time indices wobble by small amounts; the right
/// band depends on the time source plugged in, so it is configured per domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JitterTolerance {
    /// `1/n` of a second in the domain's own unit (`frequency / n`)
    FractionOfSecond(u64),
    /// A fixed number of counter units
    Units(u64),
    /// Every backward update is a regression
    Disabled,
}

impl JitterTolerance {
    /// Width of the band, in counter units, for a domain whose counter
    /// advances `frequency` units per second
    pub fn band(&self, frequency: u64) -> u64 {
        match *self {
            JitterTolerance::FractionOfSecond(0) => 0,
            JitterTolerance::FractionOfSecond(n) => frequency / n,
            JitterTolerance::Units(units) => units,
            JitterTolerance::Disabled => 0,
        }
    }
}

impl Default for JitterTolerance {
    fn default() -> Self {
        JitterTolerance::FractionOfSecond(10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_tenth_of_second() {
        assert_eq!(JitterTolerance::default().band(1_000), 100);
        assert_eq!(JitterTolerance::default().band(100_000_000), 10_000_000);
    }

    #[test]
    fn test_other_bands() {
        assert_eq!(JitterTolerance::Units(42).band(1_000), 42);
        assert_eq!(JitterTolerance::Disabled.band(1_000), 0);
        assert_eq!(JitterTolerance::FractionOfSecond(0).band(1_000), 0);
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_string(&JitterTolerance::FractionOfSecond(20)).unwrap();
        assert_eq!(json, r#"{"fraction_of_second":20}"#);
        let parsed: JitterTolerance = serde_json::from_str(r#""disabled""#).unwrap();
        assert_eq!(parsed, JitterTolerance::Disabled);
    }
}

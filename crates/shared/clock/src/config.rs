//! Construction-time configuration for clock domains and groups

use emuclock_core::{Frequency, JitterTolerance};
use emuclock_ports::{ClockError, ClockResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Parameters for one clock domain
///
/// ```json
/// { "name": "bus", "frequency": 100000000, "divisor": 3, "master": false }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockDomainConfig {
    /// Diagnostic label
    pub name: String,
    /// Rate numerator in Hz
    pub frequency: u64,
    /// Rate denominator
    #[serde(default = "default_divisor")]
    pub divisor: u64,
    /// Whether this domain is authoritative for its group
    #[serde(default = "default_master")]
    pub master: bool,
    /// Backward band accepted as jitter
    #[serde(default)]
    pub jitter_tolerance: JitterTolerance,
}

fn default_divisor() -> u64 {
    1
}

fn default_master() -> bool {
    true
}

impl ClockDomainConfig {
    /// Integer-rate master domain
    pub fn new(name: impl Into<String>, frequency: u64) -> Self {
        Self {
            name: name.into(),
            frequency,
            divisor: default_divisor(),
            master: default_master(),
            jitter_tolerance: JitterTolerance::default(),
        }
    }

    /// Rational-rate domain
    pub fn rational(name: impl Into<String>, frequency: u64, divisor: u64) -> Self {
        Self {
            divisor,
            ..Self::new(name, frequency)
        }
    }

    pub fn slave(mut self) -> Self {
        self.master = false;
        self
    }

    pub fn with_tolerance(mut self, tolerance: JitterTolerance) -> Self {
        self.jitter_tolerance = tolerance;
        self
    }

    pub fn rate(&self) -> ClockResult<Frequency> {
        Frequency::new(self.frequency, self.divisor).ok_or(ClockError::ZeroDivisor)
    }

    pub fn validate(&self) -> ClockResult<()> {
        if self.divisor == 0 {
            return Err(ClockError::ZeroDivisor);
        }
        if self.jitter_tolerance == JitterTolerance::FractionOfSecond(0) {
            return Err(ClockError::InvalidConfig(format!(
                "domain '{}': jitter fraction must be non-zero",
                self.name
            )));
        }
        Ok(())
    }
}

impl Default for ClockDomainConfig {
    fn default() -> Self {
        Self::new("clock", 0)
    }
}

/// Parameters for a group of domains sharing one diagnostic channel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClockGroupConfig {
    pub domains: Vec<ClockDomainConfig>,
}

impl ClockGroupConfig {
    pub fn from_json_str(json: &str) -> ClockResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> ClockResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Every domain is valid and names are unique
    pub fn validate(&self) -> ClockResult<()> {
        let mut seen = HashSet::new();
        for domain in &self.domains {
            domain.validate()?;
            if !seen.insert(domain.name.as_str()) {
                return Err(ClockError::DuplicateDomain(domain.name.clone()));
            }
        }
        Ok(())
    }
}

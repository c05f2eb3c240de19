use std::fmt;

/// Rational clock rate in Hz: `numerator / divisor`
///
/// Real hardware clocks are frequently derived from a master crystal by
/// integer division (33.333...MHz is 100MHz / 3). Storing the rate as a
/// fraction keeps every derived count exact.
///
/// The divisor is always at least 1; the only way to build a `Frequency`
/// with a caller-supplied divisor is [`Frequency::new`], which rejects zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frequency {
    numerator: u64,
    divisor: u64,
}

impl Frequency {
    /// A stopped clock (0 Hz)
    pub const ZERO: Self = Self {
        numerator: 0,
        divisor: 1,
    };

    /// Integer frequency in Hz
    pub const fn hz(hz: u64) -> Self {
        Self {
            numerator: hz,
            divisor: 1,
        }
    }

    /// Rational frequency `numerator / divisor` Hz
    ///
    /// Returns `None` when `divisor` is zero.
    pub fn new(numerator: u64, divisor: u64) -> Option<Self> {
        if divisor == 0 {
            return None;
        }
        Some(Self { numerator, divisor })
    }

    /// Numerator in Hz; also the number of counter units per second
    pub fn numerator(&self) -> u64 {
        self.numerator
    }

    /// Denominator; also the number of counter units per whole tick
    pub fn divisor(&self) -> u64 {
        self.divisor
    }

    /// Same rate with numerator and divisor divided by their gcd
    pub fn reduced(self) -> Self {
        if self.numerator == 0 {
            return Self::ZERO;
        }
        let g = gcd(self.numerator, self.divisor);
        Self {
            numerator: self.numerator / g,
            divisor: self.divisor / g,
        }
    }

    /// Derive a clock running at `self * mul / div`
    ///
    /// The result is reduced. Returns `None` if `div` is zero or the reduced
    /// fraction no longer fits in 64 bits.
    ///
    /// ```
    /// use emuclock_core::Frequency;
    ///
    /// let master = Frequency::hz(100_000_000);
    /// let bus = master.derive(1, 3).unwrap();
    /// assert_eq!((bus.numerator(), bus.divisor()), (100_000_000, 3));
    /// ```
    pub fn derive(self, mul: u64, div: u64) -> Option<Self> {
        if div == 0 {
            return None;
        }
        let num = self.numerator as u128 * mul as u128;
        let den = self.divisor as u128 * div as u128;
        if num == 0 {
            return Some(Self::ZERO);
        }
        let g = gcd_u128(num, den);
        let numerator = u64::try_from(num / g).ok()?;
        let divisor = u64::try_from(den / g).ok()?;
        Some(Self { numerator, divisor })
    }

    /// True when both fractions describe the same rate, reduced or not
    pub fn same_rate(&self, other: &Frequency) -> bool {
        self.numerator as u128 * other.divisor as u128
            == other.numerator as u128 * self.divisor as u128
    }

    /// Approximate rate in Hz, for display and host-side pacing only
    pub fn as_f64(&self) -> f64 {
        self.numerator as f64 / self.divisor as f64
    }

    pub fn is_zero(&self) -> bool {
        self.numerator == 0
    }
}

impl Default for Frequency {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.divisor == 1 {
            write!(f, "{} Hz", self.numerator)
        } else {
            write!(
                f,
                "{}/{} Hz (~{:.3} Hz)",
                self.numerator,
                self.divisor,
                self.as_f64()
            )
        }
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn gcd_u128(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

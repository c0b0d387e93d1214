use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Errors from parsing a threshold level specification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleParseError {
    #[error("invalid level {0:?}: expected an integer")]
    InvalidLevel(String),
    #[error("empty level specification")]
    Empty,
}

/// Escalation plan for the minimum transferable value over a turn.
///
/// The MTV starts from a base of 0.01 and is multiplied by 10 to the next
/// exponent at the start of each successive time window: `"3+1+1"` means
/// the first window runs with MTV 10, the second with 100, and everything
/// after that with 1000. Once the exponent list is exhausted the threshold
/// stays where it is.
///
/// # Examples
///
/// ```
/// use barter_engine::turn::schedule::ThresholdSchedule;
/// use rust_decimal_macros::dec;
///
/// let schedule: ThresholdSchedule = "3+1+1".parse().unwrap();
/// assert_eq!(schedule.threshold_for_window(0), dec!(10));
/// assert_eq!(schedule.threshold_for_window(1), dec!(100));
/// assert_eq!(schedule.threshold_for_window(2), dec!(1000));
/// assert_eq!(schedule.threshold_for_window(9), dec!(1000));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdSchedule {
    /// Decimal exponents applied at the start of successive windows.
    pub exponents: Vec<u32>,
    /// Duration of each calculation window.
    pub timespan: Duration,
}

impl ThresholdSchedule {
    /// The base minimum transferable value every schedule starts from.
    pub fn base_mtv() -> Decimal {
        Decimal::new(1, 2) // 0.01
    }

    pub fn new(exponents: Vec<u32>, timespan: Duration) -> Self {
        Self {
            exponents,
            timespan,
        }
    }

    /// A single unlimited window at the given order of magnitude.
    pub fn fixed(exponent: u32) -> Self {
        Self::new(vec![exponent], Duration::from_secs(3600))
    }

    /// The MTV in force during the given window (0-based), i.e. the base
    /// scaled by the cumulative exponents up to and including it. Windows
    /// past the end of the list keep the last threshold.
    pub fn threshold_for_window(&self, window: usize) -> Decimal {
        let exponent: u32 = self.exponents.iter().take(window + 1).sum();
        let ten = Decimal::from(10);
        (0..exponent).fold(Self::base_mtv(), |mtv, _| mtv * ten)
    }
}

impl Default for ThresholdSchedule {
    fn default() -> Self {
        Self::new(vec![0], Duration::from_secs(3600))
    }
}

impl FromStr for ThresholdSchedule {
    type Err = ScheduleParseError;

    /// Parse a `+`-separated exponent list like `"0+3+30"`, with the
    /// default one-hour window. Negative levels clamp to zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(ScheduleParseError::Empty);
        }
        let mut exponents = Vec::new();
        for part in s.split('+') {
            let level: i64 = part
                .trim()
                .parse()
                .map_err(|_| ScheduleParseError::InvalidLevel(part.to_string()))?;
            exponents.push(level.max(0) as u32);
        }
        Ok(Self::new(exponents, Duration::from_secs(3600)))
    }
}

use std::{fmt::Display, str::FromStr};

use anyhow::anyhow;

/// Number of bookable slots per hour.
const QUARTERS_PER_HOUR: u32 = 4;
/// Largest value whose minute count still fits in a `u32`.
const MAX_QUARTERS: u32 = u32::MAX / 15;

/// Booked time in quarter hour steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hours {
    quarters: u32,
}

impl Hours {
    pub const ZERO: Hours = Hours { quarters: 0 };
    pub const QUARTER: Hours = Hours { quarters: 1 };

    pub fn from_quarters(quarters: u32) -> Self {
        Self { quarters }
    }

    pub fn quarters(self) -> u32 {
        self.quarters
    }

    pub fn is_positive(self) -> bool {
        self.quarters > 0
    }

    pub fn as_f64(self) -> f64 {
        self.quarters as f64 / QUARTERS_PER_HOUR as f64
    }

    pub fn increment(self) -> Self {
        Self::from_quarters(self.quarters.saturating_add(1).min(MAX_QUARTERS))
    }

    /// Never goes below zero.
    pub fn decrement(self) -> Self {
        Self::from_quarters(self.quarters.saturating_sub(1))
    }

    /// `H:MM`, the way the stepper shows it.
    pub fn display_time(self) -> String {
        let minutes = self.quarters * 15;
        format!("{}:{:02}", minutes / 60, minutes % 60)
    }
}

impl Display for Hours {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}h", self.as_f64())
    }
}

impl FromStr for Hours {
    type Err = anyhow::Error;

    /// Accepts decimal hours (`1.5`, `1,5`) or `H:MM` (`1:30`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let minutes = if let Some((h, m)) = s.split_once(':') {
            let h: u32 = h.parse()?;
            let m: u32 = m.parse()?;
            if m >= 60 {
                return Err(anyhow!("Minutes must be below 60, got {m}"));
            }
            h.checked_mul(60)
                .and_then(|v| v.checked_add(m))
                .ok_or_else(|| anyhow!("Hours out of range, got {s}"))?
        } else {
            let value: f64 = s.replace(',', ".").parse()?;
            if !value.is_finite() || value < 0. {
                return Err(anyhow!("Hours can't be negative, got {value}"));
            }
            if value * QUARTERS_PER_HOUR as f64 > MAX_QUARTERS as f64 {
                return Err(anyhow!("Hours out of range, got {value}"));
            }
            let minutes = value * 60.;
            if minutes.fract() != 0. {
                return Err(anyhow!("Hours must be given in quarter hours, got {value}"));
            }
            minutes as u32
        };

        if minutes % 15 != 0 {
            return Err(anyhow!("Hours must be given in quarter hours, got {s}"));
        }
        Ok(Self::from_quarters(minutes / 15))
    }
}

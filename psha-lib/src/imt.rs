//! Intensity measure types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Intensity measure type: the spectral quantity a hazard curve is computed
/// for.
///
/// The spectral acceleration variants mirror the periods for which the
/// built-in GMPE coefficient tables are published (0.3 s, 1.0 s and 3.0 s).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Imt {
    /// Peak ground acceleration (g).
    Pga,
    /// Peak ground velocity (cm/s).
    Pgv,
    /// 5%-damped spectral acceleration at 0.3 s (g).
    Sa0P3,
    /// 5%-damped spectral acceleration at 1.0 s (g).
    Sa1P0,
    /// 5%-damped spectral acceleration at 3.0 s (g).
    Sa3P0,
}

impl Imt {
    /// Spectral period in seconds; `None` for non-spectral measures (PGV).
    /// PGA is treated as zero-period spectral acceleration.
    pub fn period(&self) -> Option<f64> {
        match self {
            Imt::Pga => Some(0.0),
            Imt::Pgv => None,
            Imt::Sa0P3 => Some(0.3),
            Imt::Sa1P0 => Some(1.0),
            Imt::Sa3P0 => Some(3.0),
        }
    }

    /// `true` for acceleration-valued measures expressed in units of g.
    pub fn is_acceleration(&self) -> bool {
        !matches!(self, Imt::Pgv)
    }
}

impl fmt::Display for Imt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Imt::Pga => "PGA",
            Imt::Pgv => "PGV",
            Imt::Sa0P3 => "SA(0.3s)",
            Imt::Sa1P0 => "SA(1.0s)",
            Imt::Sa3P0 => "SA(3.0s)",
        };
        write!(f, "{label}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_periods() {
        assert_eq!(Imt::Pga.period(), Some(0.0));
        assert_eq!(Imt::Pgv.period(), None);
        assert_eq!(Imt::Sa1P0.period(), Some(1.0));
    }

    #[test]
    fn test_display() {
        assert_eq!(Imt::Sa0P3.to_string(), "SA(0.3s)");
        assert_eq!(Imt::Pga.to_string(), "PGA");
    }
}

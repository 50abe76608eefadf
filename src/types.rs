//! Unit types: Bps, Pct

use std::fmt;

/// Basis points per unit fraction (1 bps = 0.01%).
pub const BPS_PER_UNIT: f64 = 10_000.0;

/// A rate or rate offset in basis points.
///
/// `Bps(25.0)` is 0.25%. Signed: `Bps(-10.0)` is a 10 bps cut.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Bps(pub f64);

impl Bps {
    pub const ZERO: Bps = Bps(0.0);

    /// Convert a plain fraction (e.g. `0.0025`) to basis points.
    #[inline]
    pub fn from_fraction(fraction: f64) -> Self {
        Bps(fraction * BPS_PER_UNIT)
    }

    /// The rate as a plain fraction (e.g. `25 bps` → `0.0025`).
    #[inline]
    pub fn to_fraction(self) -> f64 {
        self.0 / BPS_PER_UNIT
    }

    /// The rate in percent (e.g. `25 bps` → `0.25`).
    #[inline]
    pub fn to_percent(self) -> f64 {
        self.0 / 100.0
    }
}

impl fmt::Display for Bps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+.2} bps", self.0)
    }
}

/// A signed percentage change. `Pct(-30.0)` is a 30% drop.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Pct(pub f64);

impl Pct {
    pub const ZERO: Pct = Pct(0.0);

    /// The multiplier this change applies: `Pct(-30.0)` → `0.7`.
    #[inline]
    pub fn multiplier(self) -> f64 {
        1.0 + self.0 / 100.0
    }
}

impl fmt::Display for Pct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+.1}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bps_conversions() {
        assert_eq!(Bps(25.0).to_fraction(), 0.0025);
        assert_eq!(Bps(-100.0).to_percent(), -1.0);
        assert!((Bps::from_fraction(0.0015).0 - 15.0).abs() < 1e-12);
    }

    #[test]
    fn pct_multiplier() {
        assert_eq!(Pct(-30.0).multiplier(), 0.7);
        assert_eq!(Pct::ZERO.multiplier(), 1.0);
        assert_eq!(Pct(25.0).multiplier(), 1.25);
    }

    #[test]
    fn display() {
        assert_eq!(format!("{}", Bps(-10.0)), "-10.00 bps");
        assert_eq!(format!("{}", Bps(25.07)), "+25.07 bps");
        assert_eq!(format!("{}", Pct(-30.0)), "-30.0%");
        assert_eq!(format!("{}", Pct(0.0)), "+0.0%");
    }
}

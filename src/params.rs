//! Scenario parameters: the market changes applied to the baseline.

use crate::error::{Result, ScenarioError};
use crate::types::{Bps, Pct};

/// How the traded-value change is applied. Exactly one basis is used per
/// evaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum VolumeBasis {
    /// Change the annual traded value directly.
    #[default]
    TotalAnnualValue,
    /// Change average daily traded value, annualized over the baseline's
    /// own trading days.
    Adtv,
}

/// One set of scenario deltas. A plain value: every evaluation receives it
/// explicitly, there is no ambient "current scenario".
///
/// ```
/// use proforma::{Bps, Pct, ScenarioParameters};
///
/// let params = ScenarioParameters::reset()
///     .with_commission_rate_delta(Bps(-5.0))
///     .with_traded_value_change(Pct(-20.0));
/// assert_eq!(params.interest_rate_delta, Bps::ZERO);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields, default))]
pub struct ScenarioParameters {
    /// Offset added to the implied commission rate
    #[cfg_attr(feature = "serde", serde(rename = "commission_rate_delta_bps"))]
    pub commission_rate_delta: Bps,
    /// Change in traded value (or ADTV, depending on basis)
    #[cfg_attr(feature = "serde", serde(rename = "traded_value_change_pct"))]
    pub traded_value_change: Pct,
    /// Overrides the configured volume basis when set
    pub volume_basis: Option<VolumeBasis>,
    /// Offset added to the implied interest rate on the investment portfolio
    #[cfg_attr(feature = "serde", serde(rename = "interest_rate_delta_bps"))]
    pub interest_rate_delta: Bps,
}

impl ScenarioParameters {
    /// All deltas zero: reproduces the baseline.
    pub fn reset() -> Self {
        Self::default()
    }

    /// Commission cut, volume slump and a rate-cutting cycle.
    pub fn bear_case() -> Self {
        Self {
            commission_rate_delta: Bps(-10.0),
            traded_value_change: Pct(-30.0),
            volume_basis: None,
            interest_rate_delta: Bps(-100.0),
        }
    }

    /// Volume pick-up at unchanged pricing and rates.
    pub fn bull_case() -> Self {
        Self {
            commission_rate_delta: Bps::ZERO,
            traded_value_change: Pct(25.0),
            volume_basis: None,
            interest_rate_delta: Bps::ZERO,
        }
    }

    pub fn with_commission_rate_delta(mut self, delta: Bps) -> Self {
        self.commission_rate_delta = delta;
        self
    }

    pub fn with_traded_value_change(mut self, change: Pct) -> Self {
        self.traded_value_change = change;
        self
    }

    pub fn with_interest_rate_delta(mut self, delta: Bps) -> Self {
        self.interest_rate_delta = delta;
        self
    }

    pub fn with_volume_basis(mut self, basis: VolumeBasis) -> Self {
        self.volume_basis = Some(basis);
        self
    }

    /// Reject non-finite deltas and a zero-day ADTV basis.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("commission_rate_delta_bps", self.commission_rate_delta.0),
            ("traded_value_change_pct", self.traded_value_change.0),
            ("interest_rate_delta_bps", self.interest_rate_delta.0),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(ScenarioError::InvalidParameter {
                    field,
                    value,
                    reason: "must be finite",
                });
            }
        }
        Ok(())
    }
}

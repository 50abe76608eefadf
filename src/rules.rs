//! Allocation rules: how each P&L line responds to traded volume, plus the
//! engine options that are fixed for a configuration period.

use rustc_hash::FxHashSet;

use crate::error::{Result, ScenarioError};
use crate::line::LineItem;
use crate::params::VolumeBasis;
use crate::types::Bps;

/// Tolerance on `fixed + variable == 1`.
const SPLIT_TOLERANCE: f64 = 1e-9;

/// Split of one line into a fixed portion and a portion that scales
/// linearly with traded value.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct LineSplit {
    pub line: LineItem,
    pub fixed: f64,
    pub variable: f64,
}

impl LineSplit {
    /// Split with the given variable fraction; the rest is fixed.
    pub fn new(line: LineItem, variable: f64) -> Self {
        Self {
            line,
            fixed: 1.0 - variable,
            variable,
        }
    }

    fn validate(&self) -> Result<()> {
        let key = self.line.key();
        if self.line.is_formula_driven() {
            return Err(ScenarioError::InvalidRules(format!(
                "{key} is formula-driven and cannot carry a split"
            )));
        }
        for (name, value) in [("fixed", self.fixed), ("variable", self.variable)] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ScenarioError::InvalidRules(format!(
                    "{key}: {name} fraction must be in [0, 1], got {value}"
                )));
            }
        }
        let sum = self.fixed + self.variable;
        if (sum - 1.0).abs() > SPLIT_TOLERANCE {
            return Err(ScenarioError::InvalidRules(format!(
                "{key}: fixed + variable must equal 1, got {sum}"
            )));
        }
        Ok(())
    }
}

/// Which interest-rate moves a scenario may request.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "mode", rename_all = "snake_case", deny_unknown_fields)
)]
pub enum InterestRateSteps {
    /// Only these moves (bps) are supported.
    Enumerated { levels_bps: Vec<f64> },
    /// Any move within `[min_bps, max_bps]`.
    Continuous { min_bps: f64, max_bps: f64 },
}

impl Default for InterestRateSteps {
    fn default() -> Self {
        InterestRateSteps::Enumerated {
            levels_bps: vec![25.0, 0.0, -25.0, -50.0, -100.0],
        }
    }
}

impl InterestRateSteps {
    /// Whether `delta` is a move this configuration supports.
    pub fn allows(&self, delta: Bps) -> bool {
        match self {
            InterestRateSteps::Enumerated { levels_bps } => levels_bps
                .iter()
                .any(|level| (level - delta.0).abs() < SPLIT_TOLERANCE),
            InterestRateSteps::Continuous { min_bps, max_bps } => {
                (*min_bps..=*max_bps).contains(&delta.0)
            }
        }
    }

    /// The configured moves, for an enumerated set.
    pub fn levels(&self) -> Option<Vec<Bps>> {
        match self {
            InterestRateSteps::Enumerated { levels_bps } => {
                Some(levels_bps.iter().copied().map(Bps).collect())
            }
            InterestRateSteps::Continuous { .. } => None,
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            InterestRateSteps::Enumerated { levels_bps } => {
                if levels_bps.is_empty() {
                    return Err(ScenarioError::InvalidRules(
                        "interest_rate_steps: levels_bps must not be empty".into(),
                    ));
                }
                if let Some(bad) = levels_bps.iter().find(|l| !l.is_finite()) {
                    return Err(ScenarioError::InvalidRules(format!(
                        "interest_rate_steps: level {bad} is not finite"
                    )));
                }
            }
            InterestRateSteps::Continuous { min_bps, max_bps } => {
                if !min_bps.is_finite() || !max_bps.is_finite() || min_bps > max_bps {
                    return Err(ScenarioError::InvalidRules(format!(
                        "interest_rate_steps: invalid range [{min_bps}, {max_bps}]"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// What happens when a delta would push a rate or traded value below zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ClampPolicy {
    /// Floor at zero.
    #[default]
    Clamp,
    /// Refuse the scenario with `InvalidParameter`.
    Reject,
}

/// Static engine configuration for one reporting period.
///
/// Loaded once at start (see the `serde` feature) and shared read-only by
/// every evaluation. Lines without a split are treated as fully fixed.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields, default))]
pub struct AllocationRules {
    /// Reporting period the splits were calibrated on
    pub version: String,
    pub lines: Vec<LineSplit>,
    /// Default basis when a scenario does not override it
    pub volume_basis: VolumeBasis,
    pub interest_rate_steps: InterestRateSteps,
    pub clamp_policy: ClampPolicy,
}

impl Default for AllocationRules {
    /// Splits observed in the Q3 2025 reporting period.
    fn default() -> Self {
        Self {
            version: "2025-Q3".into(),
            lines: vec![
                LineSplit::new(LineItem::ClearingSettlementDepositary, 1.0),
                LineSplit::new(LineItem::BrokerageFees, 0.5),
                LineSplit {
                    line: LineItem::OtherFees,
                    fixed: 0.7,
                    variable: 0.3,
                },
            ],
            volume_basis: VolumeBasis::TotalAnnualValue,
            interest_rate_steps: InterestRateSteps::default(),
            clamp_policy: ClampPolicy::Clamp,
        }
    }
}

impl AllocationRules {
    /// Split configured for `line`, if any.
    pub fn split_for(&self, line: LineItem) -> Option<&LineSplit> {
        self.lines.iter().find(|split| split.line == line)
    }

    /// Fraction of `line` that scales with traded value (0 if unlisted).
    pub fn variable_fraction(&self, line: LineItem) -> f64 {
        self.split_for(line).map_or(0.0, |split| split.variable)
    }

    /// Check every invariant.
    pub fn validate(&self) -> Result<()> {
        let mut seen = FxHashSet::default();
        for split in &self.lines {
            split.validate()?;
            if !seen.insert(split.line) {
                return Err(ScenarioError::InvalidRules(format!(
                    "duplicate split for {}",
                    split.line.key()
                )));
            }
        }
        self.interest_rate_steps.validate()
    }
}

//! Sensitivity analysis: two-parameter grids and the interest-rate ladder.
//!
//! Every cell is an independent call to [`evaluate`]; with the `parallel`
//! feature the cells run on the rayon pool and are collected by index, so the
//! output order never depends on scheduling.

use log::debug;

use crate::baseline::BaselineMetrics;
use crate::engine::evaluate;
use crate::error::{Result, ScenarioError};
use crate::line::LineItem;
use crate::params::ScenarioParameters;
use crate::rules::AllocationRules;
use crate::statement::LineValue;
use crate::types::{Bps, Pct};

/// A scenario parameter that can be swept.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SweepParam {
    CommissionRateDeltaBps,
    TradedValueChangePct,
    InterestRateDeltaBps,
}

impl SweepParam {
    pub fn key(self) -> &'static str {
        match self {
            SweepParam::CommissionRateDeltaBps => "commission_rate_delta_bps",
            SweepParam::TradedValueChangePct => "traded_value_change_pct",
            SweepParam::InterestRateDeltaBps => "interest_rate_delta_bps",
        }
    }

    /// `params` with this parameter replaced by `value`.
    pub fn apply(self, params: ScenarioParameters, value: f64) -> ScenarioParameters {
        match self {
            SweepParam::CommissionRateDeltaBps => params.with_commission_rate_delta(Bps(value)),
            SweepParam::TradedValueChangePct => params.with_traded_value_change(Pct(value)),
            SweepParam::InterestRateDeltaBps => params.with_interest_rate_delta(Bps(value)),
        }
    }
}

/// One axis of a sensitivity grid: the parameter and its values, in order.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct SweepAxis {
    pub param: SweepParam,
    pub values: Vec<f64>,
}

impl SweepAxis {
    pub fn new(param: SweepParam, values: Vec<f64>) -> Self {
        Self { param, values }
    }

    /// `points` evenly spaced values from `min` to `max` inclusive.
    ///
    /// ```
    /// use proforma::{SweepAxis, SweepParam};
    ///
    /// let axis = SweepAxis::linear(SweepParam::TradedValueChangePct, -40.0, 30.0, 8).unwrap();
    /// assert_eq!(axis.values, vec![-40.0, -30.0, -20.0, -10.0, 0.0, 10.0, 20.0, 30.0]);
    /// ```
    pub fn linear(param: SweepParam, min: f64, max: f64, points: usize) -> Result<Self> {
        if !(min.is_finite() && max.is_finite()) || min > max {
            return Err(ScenarioError::InvalidParameter {
                field: param.key(),
                value: min,
                reason: "axis range must be finite with min <= max",
            });
        }
        let values = match points {
            0 => {
                return Err(ScenarioError::InvalidParameter {
                    field: param.key(),
                    value: 0.0,
                    reason: "axis needs at least one point",
                });
            }
            1 => vec![min],
            n => {
                let span = max - min;
                let last = (n - 1) as f64;
                (0..n).map(|i| min + span * i as f64 / last).collect()
            }
        };
        Ok(Self { param, values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One grid point.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SensitivityCell {
    pub params: ScenarioParameters,
    pub net_profit: f64,
}

/// Row-major grid of net profit over two swept parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SensitivityMatrix {
    rows: SweepAxis,
    cols: SweepAxis,
    /// Baseline net profit, for reading cells as changes
    baseline_net_profit: f64,
    cells: Vec<SensitivityCell>,
}

impl SensitivityMatrix {
    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.cols.len())
    }

    pub fn rows(&self) -> &SweepAxis {
        &self.rows
    }

    pub fn cols(&self) -> &SweepAxis {
        &self.cols
    }

    pub fn baseline_net_profit(&self) -> f64 {
        self.baseline_net_profit
    }

    /// All cells, row-major.
    pub fn cells(&self) -> &[SensitivityCell] {
        &self.cells
    }

    pub fn get(&self, i: usize, j: usize) -> Option<&SensitivityCell> {
        if i < self.rows.len() && j < self.cols.len() {
            self.cells.get(i * self.cols.len() + j)
        } else {
            None
        }
    }

    /// Cells of row `i`.
    pub fn row(&self, i: usize) -> Option<&[SensitivityCell]> {
        let width = self.cols.len();
        (i < self.rows.len()).then(|| &self.cells[i * width..(i + 1) * width])
    }
}

/// Evaluate net profit over the cross product of two axes.
///
/// Cell `(i, j)` is `evaluate` on `fixed` with `rows.values[i]` and
/// `cols.values[j]` substituted. Any failing cell fails the whole grid.
pub fn generate(
    baseline: &BaselineMetrics,
    rows: &SweepAxis,
    cols: &SweepAxis,
    fixed: &ScenarioParameters,
    rules: &AllocationRules,
) -> Result<SensitivityMatrix> {
    if rows.param == cols.param {
        return Err(ScenarioError::InvalidParameter {
            field: rows.param.key(),
            value: 0.0,
            reason: "both axes sweep the same parameter",
        });
    }
    for axis in [rows, cols] {
        if let Some(&bad) = axis.values.iter().find(|v| !v.is_finite()) {
            return Err(ScenarioError::InvalidParameter {
                field: axis.param.key(),
                value: bad,
                reason: "axis values must be finite",
            });
        }
    }

    let width = cols.len();
    let n = rows.len() * width;
    let cell = |k: usize| -> Result<SensitivityCell> {
        let params = cols
            .param
            .apply(rows.param.apply(*fixed, rows.values[k / width]), cols.values[k % width]);
        let statement = evaluate(baseline, &params, rules)?;
        Ok(SensitivityCell {
            params,
            net_profit: statement.net_profit().scenario,
        })
    };

    #[cfg(feature = "parallel")]
    let cells: Result<Vec<SensitivityCell>> = {
        use rayon::prelude::*;
        (0..n).into_par_iter().map(cell).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let cells: Result<Vec<SensitivityCell>> = (0..n).map(cell).collect();

    let cells = cells?;
    debug!(
        "sensitivity grid {} x {} ({} x {})",
        rows.len(),
        width,
        rows.param.key(),
        cols.param.key()
    );
    Ok(SensitivityMatrix {
        rows: rows.clone(),
        cols: cols.clone(),
        baseline_net_profit: baseline.net_profit(),
        cells,
    })
}

/// One rung of the interest-rate ladder.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RateLadderRow {
    pub delta: Bps,
    /// Effective portfolio yield after the move
    pub interest_rate: Bps,
    pub investment_income: LineValue,
    /// Scenario net profit minus baseline net profit
    pub net_profit_impact: f64,
}

/// Investment income and net profit under each rate move in `deltas`, with
/// every other parameter taken from `fixed`.
pub fn interest_rate_ladder(
    baseline: &BaselineMetrics,
    deltas: &[Bps],
    fixed: &ScenarioParameters,
    rules: &AllocationRules,
) -> Result<Vec<RateLadderRow>> {
    deltas
        .iter()
        .map(|&delta| {
            let statement = evaluate(baseline, &fixed.with_interest_rate_delta(delta), rules)?;
            Ok(RateLadderRow {
                delta,
                interest_rate: statement.drivers().interest_rate,
                investment_income: statement.line(LineItem::InvestmentIncome),
                net_profit_impact: statement.net_profit().delta(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline() -> BaselineMetrics {
        BaselineMetrics::builder()
            .line(LineItem::TradingCommission, 412.5)
            .line(LineItem::ClearingSettlementDepositary, 82.0)
            .line(LineItem::InvestmentIncome, 220.0)
            .line(LineItem::GeneralAdminExpenses, 160.0)
            .total_traded_value(165_000.0)
            .investment_portfolio_size(4_400.0)
            .tax_rate(0.09)
            .build()
            .unwrap()
    }

    fn axes() -> (SweepAxis, SweepAxis) {
        (
            SweepAxis::new(SweepParam::TradedValueChangePct, vec![-40.0, -20.0, 0.0, 20.0]),
            SweepAxis::new(SweepParam::CommissionRateDeltaBps, vec![-10.0, -5.0, 0.0]),
        )
    }

    #[test]
    fn shape_and_order() {
        let (rows, cols) = axes();
        let m = generate(
            &baseline(),
            &rows,
            &cols,
            &ScenarioParameters::reset(),
            &AllocationRules::default(),
        )
        .unwrap();

        assert_eq!(m.shape(), (4, 3));
        assert_eq!(m.cells().len(), 12);
        let cell = m.get(1, 2).unwrap();
        assert_eq!(cell.params.traded_value_change, Pct(-20.0));
        assert_eq!(cell.params.commission_rate_delta, Bps(0.0));
        assert!(m.get(4, 0).is_none());
        assert!(m.get(0, 3).is_none());
        assert_eq!(m.row(3).unwrap().len(), 3);

        // Zero-delta cell equals the baseline
        assert_eq!(m.get(2, 2).unwrap().net_profit, m.baseline_net_profit());
    }

    #[test]
    fn cells_match_direct_evaluation() {
        let (rows, cols) = axes();
        let b = baseline();
        let rules = AllocationRules::default();
        let fixed = ScenarioParameters::reset().with_interest_rate_delta(Bps(-25.0));
        let m = generate(&b, &rows, &cols, &fixed, &rules).unwrap();

        for (i, &r) in rows.values.iter().enumerate() {
            for (j, &c) in cols.values.iter().enumerate() {
                let params = fixed
                    .with_traded_value_change(Pct(r))
                    .with_commission_rate_delta(Bps(c));
                let direct = evaluate(&b, &params, &rules).unwrap();
                assert_eq!(m.get(i, j).unwrap().net_profit, direct.net_profit().scenario);
            }
        }
    }

    #[test]
    fn same_parameter_twice_is_rejected() {
        let axis = SweepAxis::new(SweepParam::CommissionRateDeltaBps, vec![0.0]);
        let err = generate(
            &baseline(),
            &axis,
            &axis,
            &ScenarioParameters::reset(),
            &AllocationRules::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ScenarioError::InvalidParameter { .. }));
    }

    #[test]
    fn failing_cell_fails_the_grid() {
        let rows = SweepAxis::new(SweepParam::InterestRateDeltaBps, vec![0.0, -30.0]);
        let cols = SweepAxis::new(SweepParam::TradedValueChangePct, vec![0.0]);
        let result = generate(
            &baseline(),
            &rows,
            &cols,
            &ScenarioParameters::reset(),
            &AllocationRules::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn empty_axis_gives_empty_grid() {
        let rows = SweepAxis::new(SweepParam::TradedValueChangePct, vec![]);
        let cols = SweepAxis::new(SweepParam::CommissionRateDeltaBps, vec![0.0, 5.0]);
        let m = generate(
            &baseline(),
            &rows,
            &cols,
            &ScenarioParameters::reset(),
            &AllocationRules::default(),
        )
        .unwrap();
        assert_eq!(m.shape(), (0, 2));
        assert!(m.cells().is_empty());
    }

    #[test]
    fn linear_axis() {
        let axis = SweepAxis::linear(SweepParam::CommissionRateDeltaBps, -10.0, 5.0, 4).unwrap();
        assert_eq!(axis.values, vec![-10.0, -5.0, 0.0, 5.0]);
        assert_eq!(
            SweepAxis::linear(SweepParam::CommissionRateDeltaBps, 3.0, 9.0, 1)
                .unwrap()
                .values,
            vec![3.0]
        );
        assert!(SweepAxis::linear(SweepParam::CommissionRateDeltaBps, 5.0, -5.0, 3).is_err());
        assert!(SweepAxis::linear(SweepParam::CommissionRateDeltaBps, 0.0, 1.0, 0).is_err());
    }

    #[test]
    fn ladder() {
        let rules = AllocationRules::default();
        let deltas = rules.interest_rate_steps.levels().unwrap();
        let rows =
            interest_rate_ladder(&baseline(), &deltas, &ScenarioParameters::reset(), &rules)
                .unwrap();

        assert_eq!(rows.len(), 5);
        let cut = rows.iter().find(|r| r.delta == Bps(-100.0)).unwrap();
        assert!((cut.investment_income.scenario - 176.0).abs() < 1e-9);
        assert!((cut.net_profit_impact - (-44.0 * 0.91)).abs() < 1e-9);
        let flat = rows.iter().find(|r| r.delta == Bps(0.0)).unwrap();
        assert_eq!(flat.net_profit_impact, 0.0);
    }
}

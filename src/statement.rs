//! ProFormaStatement: the two-column (baseline / scenario) income statement
//! produced by one evaluation.

use std::fmt;

use crate::line::{LineCategory, LineItem};
use crate::params::{ScenarioParameters, VolumeBasis};
use crate::types::Bps;

/// A figure in both columns.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineValue {
    pub baseline: f64,
    pub scenario: f64,
}

impl LineValue {
    #[inline]
    pub fn new(baseline: f64, scenario: f64) -> Self {
        Self { baseline, scenario }
    }

    /// Scenario minus baseline.
    #[inline]
    pub fn delta(&self) -> f64 {
        self.scenario - self.baseline
    }

    /// Relative change in percent. Zero when the baseline is zero.
    pub fn pct_change(&self) -> f64 {
        if self.baseline == 0.0 {
            0.0
        } else {
            self.delta() / self.baseline.abs() * 100.0
        }
    }
}

impl std::ops::Add for LineValue {
    type Output = LineValue;

    fn add(self, rhs: LineValue) -> LineValue {
        LineValue::new(self.baseline + rhs.baseline, self.scenario + rhs.scenario)
    }
}

impl std::ops::Sub for LineValue {
    type Output = LineValue;

    fn sub(self, rhs: LineValue) -> LineValue {
        LineValue::new(self.baseline - rhs.baseline, self.scenario - rhs.scenario)
    }
}

/// One row of the statement.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StatementLine {
    pub item: LineItem,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub value: LineValue,
}

/// The intermediate quantities the scenario was computed from.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ScenarioDrivers {
    /// Effective commission rate after the delta (and any clamp)
    pub commission_rate: Bps,
    pub traded_value: f64,
    pub adtv: f64,
    /// Effective / baseline traded value (1 when the baseline is zero)
    pub volume_factor: f64,
    /// Effective yield on the investment portfolio
    pub interest_rate: Bps,
    pub volume_basis: VolumeBasis,
    pub commission_rate_clamped: bool,
    pub traded_value_clamped: bool,
    pub interest_rate_clamped: bool,
}

/// Pro-forma income statement.
///
/// Built only by [`evaluate`](crate::evaluate); never mutated afterwards.
/// Totals are derived from the lines on demand.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ProFormaStatement {
    params: ScenarioParameters,
    drivers: ScenarioDrivers,
    lines: [StatementLine; LineItem::COUNT],
}

impl ProFormaStatement {
    /// `values` must be indexed in [`LineItem::ALL`] order.
    pub(crate) fn new(
        params: ScenarioParameters,
        drivers: ScenarioDrivers,
        values: [LineValue; LineItem::COUNT],
    ) -> Self {
        let lines = std::array::from_fn(|i| StatementLine {
            item: LineItem::ALL[i],
            value: values[i],
        });
        Self {
            params,
            drivers,
            lines,
        }
    }

    /// Parameters this statement was evaluated with.
    pub fn params(&self) -> &ScenarioParameters {
        &self.params
    }

    pub fn drivers(&self) -> &ScenarioDrivers {
        &self.drivers
    }

    /// Every line, in statement order.
    pub fn lines(&self) -> &[StatementLine] {
        &self.lines
    }

    /// Both columns of one line.
    #[inline]
    pub fn line(&self, item: LineItem) -> LineValue {
        self.lines[item as usize].value
    }

    fn sum_where(&self, keep: impl Fn(LineItem) -> bool, signed: bool) -> LineValue {
        self.lines
            .iter()
            .filter(|l| keep(l.item))
            .fold(LineValue::default(), |acc, l| {
                let sign = if signed { l.item.profit_sign() } else { 1.0 };
                LineValue::new(
                    acc.baseline + sign * l.value.baseline,
                    acc.scenario + sign * l.value.scenario,
                )
            })
    }

    // === Totals ===

    pub fn total_fee_income(&self) -> LineValue {
        self.sum_where(|item| item.category() == LineCategory::FeeIncome, false)
    }

    /// Fee income plus investment, dividend and other income.
    pub fn total_income(&self) -> LineValue {
        self.sum_where(
            |item| matches!(item.category(), LineCategory::FeeIncome | LineCategory::OtherIncome),
            false,
        )
    }

    pub fn total_expenses(&self) -> LineValue {
        self.sum_where(|item| item.category() == LineCategory::Expense, false)
    }

    /// Signed sum of every line except tax, in statement order.
    pub fn pre_tax_income(&self) -> LineValue {
        self.sum_where(|item| item.category() != LineCategory::Tax, true)
    }

    pub fn tax(&self) -> LineValue {
        self.line(LineItem::CorporateTax)
    }

    pub fn net_profit(&self) -> LineValue {
        self.pre_tax_income() - self.tax()
    }
}

impl fmt::Display for ProFormaStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<36} {:>14} {:>14} {:>14} {:>9}",
            "Line", "Baseline", "Scenario", "Change", "%"
        )?;
        let row = |f: &mut fmt::Formatter<'_>, label: &str, v: LineValue| {
            writeln!(
                f,
                "{:<36} {:>14.2} {:>14.2} {:>14.2} {:>8.1}%",
                label,
                v.baseline,
                v.scenario,
                v.delta(),
                v.pct_change()
            )
        };
        for line in &self.lines {
            if line.item == LineItem::CorporateTax {
                row(f, "Pre-tax Income", self.pre_tax_income())?;
            }
            row(f, line.item.label(), line.value)?;
        }
        row(f, "Net Profit", self.net_profit())?;

        let d = &self.drivers;
        writeln!(f)?;
        writeln!(f, "Commission rate: {:.2} bps", d.commission_rate.0)?;
        writeln!(
            f,
            "Traded value:    {:.2} (ADTV {:.2}, factor {:.4})",
            d.traded_value, d.adtv, d.volume_factor
        )?;
        write!(f, "Interest rate:   {:.2}%", d.interest_rate.to_percent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drivers() -> ScenarioDrivers {
        ScenarioDrivers {
            commission_rate: Bps(25.0),
            traded_value: 1_000.0,
            adtv: 1_000.0 / 252.0,
            volume_factor: 1.0,
            interest_rate: Bps(500.0),
            volume_basis: VolumeBasis::TotalAnnualValue,
            commission_rate_clamped: false,
            traded_value_clamped: false,
            interest_rate_clamped: false,
        }
    }

    fn statement() -> ProFormaStatement {
        let mut values = [LineValue::default(); LineItem::COUNT];
        values[LineItem::TradingCommission as usize] = LineValue::new(100.0, 80.0);
        values[LineItem::OtherFees as usize] = LineValue::new(20.0, 20.0);
        values[LineItem::InvestmentIncome as usize] = LineValue::new(30.0, 25.0);
        values[LineItem::GeneralAdminExpenses as usize] = LineValue::new(50.0, 50.0);
        values[LineItem::CorporateTax as usize] = LineValue::new(10.0, 7.5);
        ProFormaStatement::new(ScenarioParameters::reset(), drivers(), values)
    }

    #[test]
    fn lines_are_in_statement_order() {
        let s = statement();
        let items: Vec<_> = s.lines().iter().map(|l| l.item).collect();
        assert_eq!(items, LineItem::ALL);
        assert_eq!(s.line(LineItem::OtherFees), LineValue::new(20.0, 20.0));
    }

    #[test]
    fn totals() {
        let s = statement();
        assert_eq!(s.total_fee_income(), LineValue::new(120.0, 100.0));
        assert_eq!(s.total_income(), LineValue::new(150.0, 125.0));
        assert_eq!(s.total_expenses(), LineValue::new(50.0, 50.0));
        assert_eq!(s.pre_tax_income(), LineValue::new(100.0, 75.0));
        assert_eq!(s.net_profit(), LineValue::new(90.0, 67.5));
    }

    #[test]
    fn pct_change_handles_zero_baseline() {
        assert_eq!(LineValue::new(0.0, 5.0).pct_change(), 0.0);
        assert_eq!(LineValue::new(200.0, 150.0).pct_change(), -25.0);
        assert_eq!(LineValue::new(-100.0, -50.0).pct_change(), 50.0);
    }

    #[test]
    fn display_renders_every_line() {
        let text = statement().to_string();
        for item in LineItem::ALL {
            assert!(text.contains(item.label()), "missing {item:?}");
        }
        assert!(text.contains("Net Profit"));
        assert!(text.contains("25.00 bps"));
    }
}

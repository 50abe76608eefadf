//! Command implementations. Each returns the rendered output so the binary
//! only has to print it.

use std::fmt;

use log::info;
use proforma::{
    AllocationRules, BaselineMetrics, Bps, ProFormaStatement, RateLadderRow, ScenarioParameters,
    SensitivityMatrix, SweepParam, WaterfallBridge, evaluate, sensitivity, waterfall,
};

use crate::config::{Config, MatrixConfig, ScenarioConfig};
use crate::error::Result;
use crate::input::{Override, apply_overrides};

/// Everything a command needs, resolved from config and flags.
#[derive(Debug, Clone)]
pub struct Session {
    pub baseline: BaselineMetrics,
    pub rules: AllocationRules,
    pub params: ScenarioParameters,
    pub matrix: MatrixConfig,
    pub ladder: Vec<Bps>,
}

impl Session {
    /// Flag values in `scenario` take precedence over the config file;
    /// `overrides` are applied to the baseline in order.
    pub fn new(config: Config, scenario: ScenarioConfig, overrides: &[Override]) -> Result<Self> {
        let baseline = apply_overrides(&config.baseline.build()?, overrides)?;
        let ladder = config.ladder_deltas();
        let params = config.scenario.merge(scenario).params();
        Ok(Session {
            baseline,
            rules: config.rules,
            params,
            matrix: config.matrix,
            ladder,
        })
    }

    fn statement(&self) -> Result<ProFormaStatement> {
        info!(
            "Evaluating: commission {}, volume {}, rate {}",
            self.params.commission_rate_delta,
            self.params.traded_value_change,
            self.params.interest_rate_delta
        );
        Ok(evaluate(&self.baseline, &self.params, &self.rules)?)
    }

    /// Full two-column statement.
    pub fn evaluate(&self, json: bool) -> Result<String> {
        let statement = self.statement()?;
        if json {
            return Ok(serde_json::to_string_pretty(&statement)?);
        }
        Ok(statement.to_string())
    }

    /// Net profit grid over the configured axes.
    pub fn matrix(&self, json: bool) -> Result<String> {
        info!(
            "Generating {} x {} grid",
            self.matrix.rows.len(),
            self.matrix.cols.len()
        );
        let grid = sensitivity::generate(
            &self.baseline,
            &self.matrix.rows,
            &self.matrix.cols,
            &self.params,
            &self.rules,
        )?;
        if json {
            return Ok(serde_json::to_string_pretty(&grid)?);
        }
        Ok(MatrixTable(&grid).to_string())
    }

    /// Baseline → scenario net profit bridge.
    pub fn bridge(&self, json: bool) -> Result<String> {
        let statement = self.statement()?;
        let bridge = waterfall::build_from_baseline(&statement)?;
        if json {
            return Ok(serde_json::to_string_pretty(&bridge)?);
        }
        Ok(BridgeTable(&bridge).to_string())
    }

    /// Investment income and net profit under each ladder rate move.
    pub fn rates(&self, json: bool) -> Result<String> {
        info!("Running {} rate moves", self.ladder.len());
        let rows =
            sensitivity::interest_rate_ladder(&self.baseline, &self.ladder, &self.params, &self.rules)?;
        if json {
            return Ok(serde_json::to_string_pretty(&rows)?);
        }
        Ok(LadderTable {
            baseline: &self.baseline,
            rows: &rows,
        }
        .to_string())
    }
}

fn axis_label(param: SweepParam, value: f64) -> String {
    match param {
        SweepParam::TradedValueChangePct => format!("{value:+.1}%"),
        SweepParam::CommissionRateDeltaBps | SweepParam::InterestRateDeltaBps => {
            format!("{value:+.1}bp")
        }
    }
}

/// Net profit grid as a table: one row per row-axis value.
struct MatrixTable<'a>(&'a SensitivityMatrix);

impl fmt::Display for MatrixTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grid = self.0;
        let (rows, cols) = (grid.rows(), grid.cols());
        writeln!(
            f,
            "NET PROFIT: {} (rows) x {} (cols), baseline {:.2}",
            rows.param.key(),
            cols.param.key(),
            grid.baseline_net_profit()
        )?;
        write!(f, "{:>10}", "")?;
        for &c in &cols.values {
            write!(f, " {:>12}", axis_label(cols.param, c))?;
        }
        writeln!(f)?;
        for (i, &r) in rows.values.iter().enumerate() {
            write!(f, "{:>10}", axis_label(rows.param, r))?;
            for cell in grid.row(i).unwrap_or_default() {
                write!(f, " {:>12.2}", cell.net_profit)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Bridge steps followed by the impact summary.
struct BridgeTable<'a>(&'a WaterfallBridge);

impl fmt::Display for BridgeTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bridge = self.0;
        writeln!(f, "{:<36} {:>14.2}", "Baseline net profit", bridge.start())?;
        for step in bridge.steps() {
            writeln!(f, "{:<36} {:>+14.2}", step.label, step.delta)?;
        }
        writeln!(f, "{:<36} {:>14.2}", "Scenario net profit", bridge.end())?;
        writeln!(f)?;
        writeln!(f, "Trading activity impact: {:+.2}", bridge.trading_activity_impact())?;
        writeln!(f, "Interest rate impact:    {:+.2}", bridge.interest_rate_impact())?;
        writeln!(f, "Total impact:            {:+.2}", bridge.total_impact())
    }
}

/// Interest-rate ladder with the current portfolio yield as a header.
struct LadderTable<'a> {
    baseline: &'a BaselineMetrics,
    rows: &'a [RateLadderRow],
}

impl fmt::Display for LadderTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Portfolio {:.2}, current yield {:.2}%",
            self.baseline.investment_portfolio_size(),
            self.baseline.implied_interest_rate() * 100.0
        )?;
        writeln!(
            f,
            "{:>10} {:>10} {:>16} {:>16}",
            "Move", "Yield", "Invest. income", "Net profit chg"
        )?;
        for row in self.rows {
            writeln!(
                f,
                "{:>10} {:>9.2}% {:>16.2} {:>+16.2}",
                format!("{:+.0}bp", row.delta.0),
                row.interest_rate.to_percent(),
                row.investment_income.scenario,
                row.net_profit_impact
            )?;
        }
        Ok(())
    }
}

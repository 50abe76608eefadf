//! Waterfall bridges: net profit change decomposed into one step per line.

use log::debug;
use rustc_hash::FxHashSet;

use crate::error::{Result, ScenarioError};
use crate::line::LineItem;
use crate::statement::ProFormaStatement;

/// Relative closure tolerance for `start + Σ delta == end`.
pub const BRIDGE_TOLERANCE: f64 = 1e-6;

/// One step of the bridge. `end == start + delta`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct WaterfallStep {
    pub item: LineItem,
    pub label: &'static str,
    pub start: f64,
    /// Contribution to net profit: negative for lost income or added cost
    pub delta: f64,
    pub end: f64,
}

/// Ordered chain of steps from one net profit to another.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct WaterfallBridge {
    start: f64,
    end: f64,
    steps: Vec<WaterfallStep>,
}

impl WaterfallBridge {
    /// Net profit the bridge starts from.
    pub fn start(&self) -> f64 {
        self.start
    }

    /// Net profit the bridge ends at.
    pub fn end(&self) -> f64 {
        self.end
    }

    /// Steps in [`LineItem::BRIDGE_ORDER`].
    pub fn steps(&self) -> &[WaterfallStep] {
        &self.steps
    }

    pub fn step(&self, item: LineItem) -> Option<&WaterfallStep> {
        self.steps.iter().find(|s| s.item == item)
    }

    fn delta_of(&self, item: LineItem) -> f64 {
        self.step(item).map_or(0.0, |s| s.delta)
    }

    /// Commission plus clearing & settlement: the lines driven by trading.
    pub fn trading_activity_impact(&self) -> f64 {
        self.delta_of(LineItem::TradingCommission)
            + self.delta_of(LineItem::ClearingSettlementDepositary)
    }

    pub fn interest_rate_impact(&self) -> f64 {
        self.delta_of(LineItem::InvestmentIncome)
    }

    pub fn total_impact(&self) -> f64 {
        self.end - self.start
    }
}

/// Bridge from the scenario column of `from` to the scenario column of `to`.
///
/// Passing a reset statement as `from` gives the usual baseline-to-scenario
/// bridge; any two scenarios may be compared.
pub fn build(from: &ProFormaStatement, to: &ProFormaStatement) -> Result<WaterfallBridge> {
    assemble(
        from.net_profit().scenario,
        to.net_profit().scenario,
        |item| to.line(item).scenario - from.line(item).scenario,
    )
}

/// Bridge from a statement's own baseline column to its scenario column.
pub fn build_from_baseline(statement: &ProFormaStatement) -> Result<WaterfallBridge> {
    let net = statement.net_profit();
    assemble(net.baseline, net.scenario, |item| statement.line(item).delta())
}

fn assemble(start: f64, end: f64, change: impl Fn(LineItem) -> f64) -> Result<WaterfallBridge> {
    let mut steps = Vec::with_capacity(LineItem::COUNT);
    let mut running = start;
    for item in LineItem::BRIDGE_ORDER {
        let delta = item.profit_sign() * change(item);
        steps.push(WaterfallStep {
            item,
            label: item.label(),
            start: running,
            delta,
            end: running + delta,
        });
        running += delta;
    }

    let mut seen = FxHashSet::default();
    if !steps.iter().all(|s| seen.insert(s.item)) || seen.len() != LineItem::COUNT {
        return Err(ScenarioError::ImbalancedBridge {
            expected: end,
            actual: running,
        });
    }
    let tolerance = BRIDGE_TOLERANCE * 1f64.max(start.abs()).max(end.abs());
    if (running - end).abs() > tolerance {
        return Err(ScenarioError::ImbalancedBridge {
            expected: end,
            actual: running,
        });
    }

    debug!("waterfall {start:.2} -> {end:.2} over {} steps", steps.len());
    Ok(WaterfallBridge { start, end, steps })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        AllocationRules, BaselineMetrics, Bps, Pct, ScenarioParameters, evaluate,
    };

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

    fn run(params: ScenarioParameters) -> ProFormaStatement {
        evaluate(&baseline(), &params, &AllocationRules::default()).unwrap()
    }

    #[test]
    fn reset_gives_all_zero_steps() {
        let stmt = run(ScenarioParameters::reset());
        let bridge = build_from_baseline(&stmt).unwrap();
        assert_eq!(bridge.start(), bridge.end());
        assert_eq!(bridge.steps().len(), LineItem::COUNT);
        assert!(bridge.steps().iter().all(|s| s.delta == 0.0));
    }

    #[test]
    fn chain_closes_and_is_ordered() {
        let stmt = run(ScenarioParameters::bear_case());
        let bridge = build_from_baseline(&stmt).unwrap();

        let items: Vec<_> = bridge.steps().iter().map(|s| s.item).collect();
        assert_eq!(items, LineItem::BRIDGE_ORDER);
        assert_eq!(bridge.steps()[0].start, bridge.start());
        for pair in bridge.steps().windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        let last = bridge.steps().last().unwrap();
        assert!((last.end - bridge.end()).abs() < 1e-6);
    }

    #[test]
    fn signs_follow_profit_direction() {
        let stmt = run(ScenarioParameters::bear_case());
        let bridge = build_from_baseline(&stmt).unwrap();

        // Lost commission and interest are negative steps; lower profit means
        // lower tax, a positive step.
        assert!(bridge.step(LineItem::TradingCommission).unwrap().delta < 0.0);
        assert!(bridge.interest_rate_impact() < 0.0);
        assert!(bridge.step(LineItem::CorporateTax).unwrap().delta > 0.0);
        assert_eq!(bridge.step(LineItem::GeneralAdminExpenses).unwrap().delta, 0.0);
    }

    #[test]
    fn impact_views() {
        let stmt = run(ScenarioParameters::bear_case());
        let bridge = build_from_baseline(&stmt).unwrap();

        let commission = stmt.line(LineItem::TradingCommission).delta();
        let clearing = stmt.line(LineItem::ClearingSettlementDepositary).delta();
        assert!((bridge.trading_activity_impact() - (commission + clearing)).abs() < 1e-9);
        assert!(
            (bridge.interest_rate_impact() - stmt.line(LineItem::InvestmentIncome).delta()).abs()
                < 1e-9
        );
        assert!((bridge.total_impact() - stmt.net_profit().delta()).abs() < 1e-9);
    }

    #[test]
    fn bridges_two_scenarios() {
        let a = run(ScenarioParameters::reset().with_commission_rate_delta(Bps(-5.0)));
        let b = run(ScenarioParameters::reset().with_traded_value_change(Pct(20.0)));
        let bridge = build(&a, &b).unwrap();

        assert_eq!(bridge.start(), a.net_profit().scenario);
        assert_eq!(bridge.end(), b.net_profit().scenario);
        let sum: f64 = bridge.steps().iter().map(|s| s.delta).sum();
        assert!((bridge.start() + sum - bridge.end()).abs() < 1e-6);
    }
}

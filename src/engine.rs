//! Scenario evaluation: baseline + parameters + rules → pro-forma statement.
//!
//! Every scenario figure is computed as "baseline + increment", so a zero
//! delta leaves the increment at exactly zero and reproduces the baseline
//! column bit for bit.

use log::debug;

use crate::baseline::{BaselineMetrics, tax_on};
use crate::error::{Result, ScenarioError};
use crate::line::{LineCategory, LineItem};
use crate::params::ScenarioParameters;
use crate::rules::{AllocationRules, ClampPolicy};
use crate::statement::{LineValue, ProFormaStatement, ScenarioDrivers};
use crate::types::Bps;

/// How far below zero a value may land before `ClampPolicy::Reject` refuses it.
const NEGATIVE_TOLERANCE: f64 = 1e-9;

/// Evaluate one scenario.
///
/// Pure and deterministic: identical inputs give bit-identical output.
///
/// ```
/// use proforma::{evaluate, AllocationRules, BaselineMetrics, Bps, LineItem, Pct, ScenarioParameters};
///
/// let baseline = BaselineMetrics::builder()
///     .line(LineItem::TradingCommission, 412.5)
///     .total_traded_value(165_000.0)
///     .build()
///     .unwrap();
/// let params = ScenarioParameters::reset()
///     .with_commission_rate_delta(Bps(-10.0))
///     .with_traded_value_change(Pct(-30.0));
///
/// let stmt = evaluate(&baseline, &params, &AllocationRules::default()).unwrap();
/// assert!((stmt.line(LineItem::TradingCommission).scenario - 173.25).abs() < 1e-9);
/// ```
pub fn evaluate(
    baseline: &BaselineMetrics,
    params: &ScenarioParameters,
    rules: &AllocationRules,
) -> Result<ProFormaStatement> {
    baseline.validate()?;
    rules.validate()?;
    params.validate()?;
    if !rules.interest_rate_steps.allows(params.interest_rate_delta) {
        return Err(ScenarioError::InvalidParameter {
            field: "interest_rate_delta_bps",
            value: params.interest_rate_delta.0,
            reason: "not a configured interest-rate step",
        });
    }

    let basis = params.volume_basis.unwrap_or(rules.volume_basis);
    let policy = rules.clamp_policy;

    // Commission rate
    let base_rate = baseline.implied_commission_rate();
    let (commission_rate, commission_rate_clamped) = floor_at_zero(
        base_rate.0 + params.commission_rate_delta.0,
        "commission_rate_delta_bps",
        params.commission_rate_delta.0,
        policy,
    )?;

    // Traded value. Under either basis the change lands on the annual figure:
    // ADTV is annualized over the baseline's own trading days, so
    // ADTV × (1 + pct) × days == traded × (1 + pct).
    let base_traded = baseline.total_traded_value();
    let (traded_value, traded_value_clamped) = floor_at_zero(
        base_traded * params.traded_value_change.multiplier(),
        "traded_value_change_pct",
        params.traded_value_change.0,
        policy,
    )?;
    let volume_factor = if base_traded > 0.0 {
        traded_value / base_traded
    } else {
        1.0
    };

    // Interest rate
    let portfolio = baseline.investment_portfolio_size();
    let base_interest = Bps::from_fraction(baseline.implied_interest_rate());
    let (interest_rate, interest_rate_clamped) = if portfolio > 0.0 {
        floor_at_zero(
            base_interest.0 + params.interest_rate_delta.0,
            "interest_rate_delta_bps",
            params.interest_rate_delta.0,
            policy,
        )?
    } else {
        (base_interest.0, false)
    };

    let mut values = [LineValue::default(); LineItem::COUNT];
    for (slot, item) in values.iter_mut().zip(LineItem::ALL) {
        let base = baseline.line(item);
        let scenario = match item {
            LineItem::TradingCommission => {
                if commission_rate_clamped {
                    0.0
                } else {
                    let increment = traded_value * params.commission_rate_delta.to_fraction();
                    (base * volume_factor + increment).max(0.0)
                }
            }
            LineItem::InvestmentIncome => {
                if portfolio <= 0.0 {
                    base
                } else if interest_rate_clamped {
                    0.0
                } else {
                    (base + portfolio * params.interest_rate_delta.to_fraction()).max(0.0)
                }
            }
            // Filled in once pre-tax income is known
            LineItem::CorporateTax => 0.0,
            _ => {
                let variable = rules.variable_fraction(item);
                base + variable * base * (volume_factor - 1.0)
            }
        };
        *slot = LineValue::new(base, scenario);
    }

    let pre_tax = pre_tax_income(&values);
    values[LineItem::CorporateTax as usize] = LineValue::new(
        tax_on(pre_tax.baseline, baseline.tax_rate()),
        tax_on(pre_tax.scenario, baseline.tax_rate()),
    );

    let drivers = ScenarioDrivers {
        commission_rate: Bps(commission_rate),
        traded_value,
        adtv: traded_value / f64::from(baseline.trading_days()),
        volume_factor,
        interest_rate: Bps(interest_rate),
        volume_basis: basis,
        commission_rate_clamped,
        traded_value_clamped,
        interest_rate_clamped,
    };
    Ok(ProFormaStatement::new(*params, drivers, values))
}

/// Signed sum of the non-tax lines, in statement order.
fn pre_tax_income(values: &[LineValue; LineItem::COUNT]) -> LineValue {
    LineItem::ALL
        .iter()
        .zip(values)
        .filter(|(item, _)| item.category() != LineCategory::Tax)
        .fold(LineValue::default(), |acc, (item, v)| {
            let sign = item.profit_sign();
            LineValue::new(acc.baseline + sign * v.baseline, acc.scenario + sign * v.scenario)
        })
}

/// Apply the clamp policy to an effective value. Returns the value and
/// whether it was floored.
fn floor_at_zero(
    value: f64,
    field: &'static str,
    input: f64,
    policy: ClampPolicy,
) -> Result<(f64, bool)> {
    if value >= 0.0 {
        return Ok((value, false));
    }
    if policy == ClampPolicy::Reject && value < -NEGATIVE_TOLERANCE {
        return Err(ScenarioError::InvalidParameter {
            field,
            value: input,
            reason: "drives the effective value below zero",
        });
    }
    debug!("{field} = {input}: effective value {value} floored at zero");
    Ok((0.0, true))
}

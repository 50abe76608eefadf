//! Baseline financial metrics: the actual (annualized) figures every scenario
//! is measured against.
//!
//! A [`BaselineMetrics`] can only be obtained through [`BaselineBuilder::build`]
//! or [`BaselineMetrics::with_override`], both of which recompute the derived
//! rates and validate the invariants. Overrides never mutate: they return a new
//! record, so evaluations already running against the old one are unaffected.

use std::fmt;
use std::str::FromStr;

use rustc_hash::FxHashMap;

use crate::error::{Result, ScenarioError};
use crate::line::LineItem;
use crate::types::Bps;

/// Trading days per year used to derive ADTV when none is given.
pub const DEFAULT_TRADING_DAYS: u32 = 252;

/// Maximum gap between a stated commission rate and the rate implied by
/// commission income / traded value.
pub const IMPLIED_RATE_TOLERANCE_BPS: f64 = 0.01;

/// Lines supplied as baseline inputs (every line except the derived tax).
const INPUT_LINES: [LineItem; 11] = [
    LineItem::TradingCommission,
    LineItem::BrokerageFees,
    LineItem::ClearingSettlementDepositary,
    LineItem::ListingMarketData,
    LineItem::OtherFees,
    LineItem::InvestmentIncome,
    LineItem::DividendIncome,
    LineItem::OtherIncome,
    LineItem::GeneralAdminExpenses,
    LineItem::Amortisation,
    LineItem::InterestExpense,
];

/// Corporate tax on a pre-tax result. Losses attract no tax.
#[inline]
pub(crate) fn tax_on(pre_tax_income: f64, tax_rate: f64) -> f64 {
    (pre_tax_income * tax_rate).max(0.0)
}

/// Interest-earning assets, split the way the balance sheet reports them.
///
/// Only rate-sensitive holdings count: fixed-income instruments carried at fair
/// value are included, equity holdings are not.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields, default))]
pub struct InvestmentPortfolio {
    /// Term deposits and cash at banks
    pub deposits: f64,
    /// Sukuk and bonds at amortised cost
    pub amortised_cost: f64,
    /// Debt instruments at fair value through OCI
    pub fvtoci_debt: f64,
}

impl InvestmentPortfolio {
    pub fn total(&self) -> f64 {
        self.deposits + self.amortised_cost + self.fvtoci_debt
    }
}

/// Immutable baseline record.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BaselineMetrics {
    trading_commission_income: f64,
    brokerage_fees: f64,
    clearing_settlement_depositary: f64,
    listing_market_data: f64,
    other_fees: f64,
    investment_income: f64,
    dividend_income: f64,
    other_income: f64,
    general_admin_expenses: f64,
    amortisation: f64,
    interest_expense: f64,
    investment_portfolio_size: f64,
    total_traded_value: f64,
    trading_days: u32,
    tax_rate: f64,
    implied_commission_rate_bps: Bps,
}

impl BaselineMetrics {
    /// Start a new builder.
    pub fn builder() -> BaselineBuilder {
        BaselineBuilder::default()
    }

    // === Queries ===

    #[inline]
    pub fn trading_commission_income(&self) -> f64 {
        self.trading_commission_income
    }

    #[inline]
    pub fn investment_income(&self) -> f64 {
        self.investment_income
    }

    #[inline]
    pub fn investment_portfolio_size(&self) -> f64 {
        self.investment_portfolio_size
    }

    #[inline]
    pub fn total_traded_value(&self) -> f64 {
        self.total_traded_value
    }

    #[inline]
    pub fn trading_days(&self) -> u32 {
        self.trading_days
    }

    /// Corporate tax rate as a fraction (e.g. `0.0849`).
    #[inline]
    pub fn tax_rate(&self) -> f64 {
        self.tax_rate
    }

    /// Average daily traded value.
    pub fn adtv(&self) -> f64 {
        self.total_traded_value / f64::from(self.trading_days)
    }

    /// Commission income / traded value, in basis points.
    #[inline]
    pub fn implied_commission_rate(&self) -> Bps {
        self.implied_commission_rate_bps
    }

    /// Investment income / interest-earning portfolio, as a fraction.
    /// Zero when the portfolio is empty.
    pub fn implied_interest_rate(&self) -> f64 {
        if self.investment_portfolio_size > 0.0 {
            self.investment_income / self.investment_portfolio_size
        } else {
            0.0
        }
    }

    /// Baseline value of a P&L line. The tax line is derived from pre-tax income.
    pub fn line(&self, item: LineItem) -> f64 {
        match item {
            LineItem::TradingCommission => self.trading_commission_income,
            LineItem::BrokerageFees => self.brokerage_fees,
            LineItem::ClearingSettlementDepositary => self.clearing_settlement_depositary,
            LineItem::ListingMarketData => self.listing_market_data,
            LineItem::OtherFees => self.other_fees,
            LineItem::InvestmentIncome => self.investment_income,
            LineItem::DividendIncome => self.dividend_income,
            LineItem::OtherIncome => self.other_income,
            LineItem::GeneralAdminExpenses => self.general_admin_expenses,
            LineItem::Amortisation => self.amortisation,
            LineItem::InterestExpense => self.interest_expense,
            LineItem::CorporateTax => tax_on(self.pre_tax_income(), self.tax_rate),
        }
    }

    /// Income minus expenses, before tax.
    pub fn pre_tax_income(&self) -> f64 {
        INPUT_LINES
            .iter()
            .map(|&item| item.profit_sign() * self.line(item))
            .sum()
    }

    pub fn net_profit(&self) -> f64 {
        let pre_tax = self.pre_tax_income();
        pre_tax - tax_on(pre_tax, self.tax_rate)
    }

    // === Validation ===

    /// Check every invariant. The engine calls this before evaluating.
    pub fn validate(&self) -> Result<()> {
        for item in INPUT_LINES {
            check_amount(item.key(), self.line(item))?;
        }
        check_amount("investment_portfolio_size", self.investment_portfolio_size)?;
        check_amount("total_traded_value", self.total_traded_value)?;

        if self.trading_days == 0 {
            return Err(ScenarioError::InconsistentBaseline {
                field: "trading_days",
                computed: 0.0,
                expected: f64::from(DEFAULT_TRADING_DAYS),
            });
        }
        if !self.tax_rate.is_finite() || !(0.0..=1.0).contains(&self.tax_rate) {
            return Err(ScenarioError::InconsistentBaseline {
                field: "tax_rate",
                computed: self.tax_rate,
                expected: self.tax_rate.clamp(0.0, 1.0),
            });
        }
        if self.total_traded_value == 0.0 && self.trading_commission_income > 0.0 {
            return Err(ScenarioError::InconsistentBaseline {
                field: "trading_commission_income",
                computed: self.trading_commission_income,
                expected: 0.0,
            });
        }
        // Investment income implies a portfolio earning it
        if self.investment_portfolio_size == 0.0 && self.investment_income > 0.0 {
            return Err(ScenarioError::InconsistentBaseline {
                field: "investment_income",
                computed: self.investment_income,
                expected: 0.0,
            });
        }

        let implied = implied_rate(self.trading_commission_income, self.total_traded_value);
        let stated = self.implied_commission_rate_bps;
        if !stated.0.is_finite() || (stated.0 - implied.0).abs() > IMPLIED_RATE_TOLERANCE_BPS {
            return Err(ScenarioError::InconsistentBaseline {
                field: "implied_commission_rate_bps",
                computed: stated.0,
                expected: implied.0,
            });
        }
        Ok(())
    }

    // === Overrides ===

    /// Return a new record with one figure replaced.
    ///
    /// The implied commission rate is always recomputed. Overriding the rate
    /// itself re-derives commission income from the traded value.
    pub fn with_override(&self, field: BaselineField, value: f64) -> Result<BaselineMetrics> {
        let mut next = self.clone();
        match field {
            BaselineField::Line(item) => match next.line_mut(item) {
                Some(slot) => *slot = value,
                None => {
                    return Err(ScenarioError::InconsistentBaseline {
                        field: "corporate_tax",
                        computed: value,
                        expected: self.line(LineItem::CorporateTax),
                    });
                }
            },
            BaselineField::InvestmentPortfolioSize => next.investment_portfolio_size = value,
            BaselineField::TotalTradedValue => next.total_traded_value = value,
            BaselineField::TradingDays => {
                if !(value.is_finite() && value >= 1.0 && value.fract() == 0.0) {
                    return Err(ScenarioError::InconsistentBaseline {
                        field: "trading_days",
                        computed: value,
                        expected: f64::from(self.trading_days),
                    });
                }
                next.trading_days = value as u32;
            }
            BaselineField::TaxRate => next.tax_rate = value,
            BaselineField::ImpliedCommissionRate => {
                next.trading_commission_income = next.total_traded_value * Bps(value).to_fraction();
            }
        }
        next.implied_commission_rate_bps =
            implied_rate(next.trading_commission_income, next.total_traded_value);
        next.validate()?;
        Ok(next)
    }

    /// Storage for an input line. `None` for the derived tax line.
    fn line_mut(&mut self, item: LineItem) -> Option<&mut f64> {
        let slot = match item {
            LineItem::TradingCommission => &mut self.trading_commission_income,
            LineItem::BrokerageFees => &mut self.brokerage_fees,
            LineItem::ClearingSettlementDepositary => &mut self.clearing_settlement_depositary,
            LineItem::ListingMarketData => &mut self.listing_market_data,
            LineItem::OtherFees => &mut self.other_fees,
            LineItem::InvestmentIncome => &mut self.investment_income,
            LineItem::DividendIncome => &mut self.dividend_income,
            LineItem::OtherIncome => &mut self.other_income,
            LineItem::GeneralAdminExpenses => &mut self.general_admin_expenses,
            LineItem::Amortisation => &mut self.amortisation,
            LineItem::InterestExpense => &mut self.interest_expense,
            LineItem::CorporateTax => return None,
        };
        Some(slot)
    }
}

fn implied_rate(commission: f64, traded_value: f64) -> Bps {
    if traded_value > 0.0 {
        Bps::from_fraction(commission / traded_value)
    } else {
        Bps::ZERO
    }
}

fn check_amount(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ScenarioError::InconsistentBaseline {
            field,
            computed: value,
            expected: 0.0,
        })
    }
}

/// A baseline figure that may be overridden by hand.
///
/// Closed set: parsing rejects any key not listed here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BaselineField {
    Line(LineItem),
    InvestmentPortfolioSize,
    TotalTradedValue,
    TradingDays,
    TaxRate,
    ImpliedCommissionRate,
}

impl fmt::Display for BaselineField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaselineField::Line(item) => f.write_str(item.key()),
            BaselineField::InvestmentPortfolioSize => f.write_str("investment_portfolio_size"),
            BaselineField::TotalTradedValue => f.write_str("total_traded_value"),
            BaselineField::TradingDays => f.write_str("trading_days"),
            BaselineField::TaxRate => f.write_str("tax_rate"),
            BaselineField::ImpliedCommissionRate => f.write_str("implied_commission_rate_bps"),
        }
    }
}

/// Error for an unrecognized override key.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown baseline field '{0}'")]
pub struct UnknownField(pub String);

impl FromStr for BaselineField {
    type Err = UnknownField;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "investment_portfolio_size" => Ok(BaselineField::InvestmentPortfolioSize),
            "total_traded_value" => Ok(BaselineField::TotalTradedValue),
            "trading_days" => Ok(BaselineField::TradingDays),
            "tax_rate" => Ok(BaselineField::TaxRate),
            "implied_commission_rate_bps" => Ok(BaselineField::ImpliedCommissionRate),
            other => other
                .parse::<LineItem>()
                .ok()
                .filter(|item| *item != LineItem::CorporateTax)
                .map(BaselineField::Line)
                .ok_or_else(|| UnknownField(other.to_string())),
        }
    }
}

/// Assembles a [`BaselineMetrics`] from extracted or hand-entered figures.
///
/// ```
/// use proforma::{BaselineMetrics, LineItem};
///
/// let baseline = BaselineMetrics::builder()
///     .line(LineItem::TradingCommission, 310_195.0)
///     .line(LineItem::InvestmentIncome, 165_348.0)
///     .period_months(9) // nine-month actuals, annualized on build
///     .total_traded_value(165_000_000.0)
///     .investment_portfolio_size(4_502_339.0)
///     .tax_rate(0.0849)
///     .build()
///     .unwrap();
///
/// assert!((baseline.trading_commission_income() - 413_593.33).abs() < 0.01);
/// ```
#[derive(Clone, Debug, Default)]
pub struct BaselineBuilder {
    lines: FxHashMap<LineItem, f64>,
    portfolio_size: Option<f64>,
    portfolio: Option<InvestmentPortfolio>,
    total_traded_value: f64,
    trading_days: Option<u32>,
    tax_rate: f64,
    period_months: Option<u32>,
    stated_commission_rate: Option<Bps>,
}

impl BaselineBuilder {
    /// Set a P&L line (income or expense, as a positive amount).
    pub fn line(mut self, item: LineItem, value: f64) -> Self {
        self.lines.insert(item, value);
        self
    }

    pub fn investment_portfolio_size(mut self, value: f64) -> Self {
        self.portfolio_size = Some(value);
        self
    }

    /// Derive the portfolio size from its balance-sheet components.
    /// Takes precedence over [`investment_portfolio_size`](Self::investment_portfolio_size).
    pub fn portfolio(mut self, portfolio: InvestmentPortfolio) -> Self {
        self.portfolio = Some(portfolio);
        self
    }

    pub fn total_traded_value(mut self, value: f64) -> Self {
        self.total_traded_value = value;
        self
    }

    pub fn trading_days(mut self, days: u32) -> Self {
        self.trading_days = Some(days);
        self
    }

    /// Tax rate as a fraction (e.g. `0.0849` for 8.49%).
    pub fn tax_rate(mut self, rate: f64) -> Self {
        self.tax_rate = rate;
        self
    }

    /// Line figures cover `months` months and are annualized on build.
    /// Balances and the (already annual) traded value are not scaled.
    pub fn period_months(mut self, months: u32) -> Self {
        self.period_months = Some(months);
        self
    }

    /// A commission rate quoted separately from the figures (e.g. entered by
    /// hand). Build fails if it disagrees with the implied rate.
    pub fn stated_commission_rate(mut self, rate: Bps) -> Self {
        self.stated_commission_rate = Some(rate);
        self
    }

    pub fn build(self) -> Result<BaselineMetrics> {
        if let Some(&tax) = self.lines.get(&LineItem::CorporateTax) {
            return Err(ScenarioError::InconsistentBaseline {
                field: "corporate_tax",
                computed: tax,
                expected: 0.0,
            });
        }

        let annualization = match self.period_months {
            None | Some(12) => 1.0,
            Some(months @ 1..=11) => 12.0 / f64::from(months),
            Some(months) => {
                return Err(ScenarioError::InconsistentBaseline {
                    field: "period_months",
                    computed: f64::from(months),
                    expected: 12.0,
                });
            }
        };
        let flow = |item: LineItem| self.lines.get(&item).copied().unwrap_or(0.0) * annualization;

        let investment_portfolio_size = match (self.portfolio, self.portfolio_size) {
            (Some(portfolio), _) => portfolio.total(),
            (None, Some(size)) => size,
            (None, None) => 0.0,
        };

        let trading_commission_income = flow(LineItem::TradingCommission);
        let implied = implied_rate(trading_commission_income, self.total_traded_value);
        // A quoted rate is only a cross-check; the record keeps the derived one
        let off = |rate: &Bps| {
            !rate.0.is_finite() || (rate.0 - implied.0).abs() > IMPLIED_RATE_TOLERANCE_BPS
        };
        if let Some(stated) = self.stated_commission_rate.filter(off) {
            return Err(ScenarioError::InconsistentBaseline {
                field: "implied_commission_rate_bps",
                computed: stated.0,
                expected: implied.0,
            });
        }

        let baseline = BaselineMetrics {
            trading_commission_income,
            brokerage_fees: flow(LineItem::BrokerageFees),
            clearing_settlement_depositary: flow(LineItem::ClearingSettlementDepositary),
            listing_market_data: flow(LineItem::ListingMarketData),
            other_fees: flow(LineItem::OtherFees),
            investment_income: flow(LineItem::InvestmentIncome),
            dividend_income: flow(LineItem::DividendIncome),
            other_income: flow(LineItem::OtherIncome),
            general_admin_expenses: flow(LineItem::GeneralAdminExpenses),
            amortisation: flow(LineItem::Amortisation),
            interest_expense: flow(LineItem::InterestExpense),
            investment_portfolio_size,
            total_traded_value: self.total_traded_value,
            trading_days: self.trading_days.unwrap_or(DEFAULT_TRADING_DAYS),
            tax_rate: self.tax_rate,
            implied_commission_rate_bps: implied,
        };
        baseline.validate()?;
        Ok(baseline)
    }
}

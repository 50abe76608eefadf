//! Income-statement line catalogue.

use std::fmt;
use std::str::FromStr;

/// Which block of the income statement a line belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LineCategory {
    FeeIncome,
    OtherIncome,
    Expense,
    Tax,
}

/// A single P&L line. Variants are declared in statement order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LineItem {
    TradingCommission,
    BrokerageFees,
    ClearingSettlementDepositary,
    ListingMarketData,
    OtherFees,
    InvestmentIncome,
    DividendIncome,
    OtherIncome,
    GeneralAdminExpenses,
    Amortisation,
    InterestExpense,
    CorporateTax,
}

impl LineItem {
    /// Number of lines on the statement.
    pub const COUNT: usize = 12;

    /// Every line, in statement order.
    pub const ALL: [LineItem; Self::COUNT] = [
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
        LineItem::CorporateTax,
    ];

    /// Order in which a profit bridge walks the lines: the two scenario
    /// drivers first, then volume-linked fees, fixed income, costs and tax.
    pub const BRIDGE_ORDER: [LineItem; Self::COUNT] = [
        LineItem::TradingCommission,
        LineItem::InvestmentIncome,
        LineItem::ClearingSettlementDepositary,
        LineItem::BrokerageFees,
        LineItem::ListingMarketData,
        LineItem::OtherFees,
        LineItem::DividendIncome,
        LineItem::OtherIncome,
        LineItem::GeneralAdminExpenses,
        LineItem::Amortisation,
        LineItem::InterestExpense,
        LineItem::CorporateTax,
    ];

    pub fn category(self) -> LineCategory {
        match self {
            LineItem::TradingCommission
            | LineItem::BrokerageFees
            | LineItem::ClearingSettlementDepositary
            | LineItem::ListingMarketData
            | LineItem::OtherFees => LineCategory::FeeIncome,
            LineItem::InvestmentIncome | LineItem::DividendIncome | LineItem::OtherIncome => {
                LineCategory::OtherIncome
            }
            LineItem::GeneralAdminExpenses | LineItem::Amortisation | LineItem::InterestExpense => {
                LineCategory::Expense
            }
            LineItem::CorporateTax => LineCategory::Tax,
        }
    }

    /// +1 if the line adds to profit, -1 if it reduces it.
    #[inline]
    pub fn profit_sign(self) -> f64 {
        match self.category() {
            LineCategory::FeeIncome | LineCategory::OtherIncome => 1.0,
            LineCategory::Expense | LineCategory::Tax => -1.0,
        }
    }

    /// Lines computed by a dedicated formula rather than an allocation split.
    pub fn is_formula_driven(self) -> bool {
        matches!(
            self,
            LineItem::TradingCommission | LineItem::InvestmentIncome | LineItem::CorporateTax
        )
    }

    /// Configuration key (snake_case).
    pub fn key(self) -> &'static str {
        match self {
            LineItem::TradingCommission => "trading_commission",
            LineItem::BrokerageFees => "brokerage_fees",
            LineItem::ClearingSettlementDepositary => "clearing_settlement_depositary",
            LineItem::ListingMarketData => "listing_market_data",
            LineItem::OtherFees => "other_fees",
            LineItem::InvestmentIncome => "investment_income",
            LineItem::DividendIncome => "dividend_income",
            LineItem::OtherIncome => "other_income",
            LineItem::GeneralAdminExpenses => "general_admin_expenses",
            LineItem::Amortisation => "amortisation",
            LineItem::InterestExpense => "interest_expense",
            LineItem::CorporateTax => "corporate_tax",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            LineItem::TradingCommission => "Trading Commission Fees",
            LineItem::BrokerageFees => "Brokerage Fees",
            LineItem::ClearingSettlementDepositary => "Clearing, Settlement & Depositary",
            LineItem::ListingMarketData => "Listing & Market Data Fees",
            LineItem::OtherFees => "Other Fees",
            LineItem::InvestmentIncome => "Investment Income",
            LineItem::DividendIncome => "Dividend Income",
            LineItem::OtherIncome => "Other Income",
            LineItem::GeneralAdminExpenses => "General & Administrative Expenses",
            LineItem::Amortisation => "Amortisation",
            LineItem::InterestExpense => "Interest Expense",
            LineItem::CorporateTax => "Corporate Tax",
        }
    }
}

impl fmt::Display for LineItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error for an unrecognized line key.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown P&L line '{0}'")]
pub struct UnknownLine(pub String);

impl FromStr for LineItem {
    type Err = UnknownLine;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LineItem::ALL
            .iter()
            .copied()
            .find(|line| line.key() == s)
            .ok_or_else(|| UnknownLine(s.to_string()))
    }
}

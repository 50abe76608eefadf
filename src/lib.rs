//! # proforma
//!
//! A deterministic pro-forma income statement engine for exchange operators.
//!
//! Starting from a baseline of annual financial metrics, the engine models how
//! commission-rate changes, trading-volume shifts and interest-rate moves flow
//! through every line of the income statement down to net profit.
//!
//! ## Features
//!
//! - **Evaluation**: one scenario → two-column (baseline / scenario) statement
//! - **Sensitivity grids**: net profit over the cross product of two parameters
//! - **Waterfall bridges**: net profit change decomposed line by line
//! - **Versioned allocation rules**: per-line fixed/variable splits as data
//! - **Exact identity**: a zero-delta scenario reproduces the baseline bit for bit
//!
//! ## Quick Start
//!
//! ```
//! use proforma::{evaluate, waterfall, AllocationRules, BaselineMetrics, Bps, LineItem, Pct,
//!                ScenarioParameters};
//!
//! let baseline = BaselineMetrics::builder()
//!     .line(LineItem::TradingCommission, 412.5)
//!     .line(LineItem::ClearingSettlementDepositary, 82.0)
//!     .line(LineItem::InvestmentIncome, 220.0)
//!     .line(LineItem::GeneralAdminExpenses, 160.0)
//!     .total_traded_value(165_000.0)
//!     .investment_portfolio_size(4_400.0)
//!     .tax_rate(0.09)
//!     .build()
//!     .unwrap();
//!
//! // 10 bps commission cut on 30% lower volume
//! let params = ScenarioParameters::reset()
//!     .with_commission_rate_delta(Bps(-10.0))
//!     .with_traded_value_change(Pct(-30.0));
//!
//! let rules = AllocationRules::default();
//! let stmt = evaluate(&baseline, &params, &rules).unwrap();
//! assert!((stmt.drivers().commission_rate.0 - 15.0).abs() < 1e-9);
//!
//! let bridge = waterfall::build_from_baseline(&stmt).unwrap();
//! assert!((bridge.total_impact() - stmt.net_profit().delta()).abs() < 1e-9);
//! ```
//!
//! ## Sensitivity Grids
//!
//! ```
//! use proforma::{sensitivity, AllocationRules, BaselineMetrics, LineItem, ScenarioParameters,
//!                SweepAxis, SweepParam};
//!
//! let baseline = BaselineMetrics::builder()
//!     .line(LineItem::TradingCommission, 412.5)
//!     .total_traded_value(165_000.0)
//!     .build()
//!     .unwrap();
//!
//! let volume = SweepAxis::linear(SweepParam::TradedValueChangePct, -40.0, 30.0, 8).unwrap();
//! let rate = SweepAxis::new(SweepParam::CommissionRateDeltaBps, vec![-10.0, -5.0, 0.0, 5.0]);
//! let grid = sensitivity::generate(
//!     &baseline,
//!     &volume,
//!     &rate,
//!     &ScenarioParameters::reset(),
//!     &AllocationRules::default(),
//! )
//! .unwrap();
//! assert_eq!(grid.shape(), (8, 4));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Enables |
//! |---------|---------|
//! | `serde` | Serialize outputs; deserialize rules and parameters |
//! | `parallel` | Evaluate sensitivity cells on the rayon pool |

mod baseline;
mod engine;
mod error;
mod line;
mod params;
mod rules;
pub mod sensitivity;
mod statement;
mod types;
pub mod waterfall;

// Re-export public API
pub use baseline::{
    BaselineBuilder, BaselineField, BaselineMetrics, DEFAULT_TRADING_DAYS,
    IMPLIED_RATE_TOLERANCE_BPS, InvestmentPortfolio, UnknownField,
};
pub use engine::evaluate;
pub use error::{Result, ScenarioError};
pub use line::{LineCategory, LineItem, UnknownLine};
pub use params::{ScenarioParameters, VolumeBasis};
pub use rules::{AllocationRules, ClampPolicy, InterestRateSteps, LineSplit};
pub use sensitivity::{RateLadderRow, SensitivityCell, SensitivityMatrix, SweepAxis, SweepParam};
pub use statement::{LineValue, ProFormaStatement, ScenarioDrivers, StatementLine};
pub use types::{BPS_PER_UNIT, Bps, Pct};
pub use waterfall::{WaterfallBridge, WaterfallStep};

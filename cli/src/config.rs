//! TOML configuration loading and validation.

use std::path::Path;

use log::info;
use proforma::{
    AllocationRules, BaselineMetrics, Bps, InvestmentPortfolio, LineItem, Pct,
    ScenarioParameters, SweepAxis, SweepParam, VolumeBasis,
};
use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub baseline: BaselineConfig,
    #[serde(default)]
    pub rules: AllocationRules,
    #[serde(default)]
    pub scenario: ScenarioConfig,
    #[serde(default)]
    pub matrix: MatrixConfig,
    #[serde(default)]
    pub ladder: LadderConfig,
}

/// Manually entered baseline figures.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BaselineConfig {
    /// Months covered by the line figures; annualized when below 12
    pub period_months: Option<u32>,
    pub total_traded_value: f64,
    pub trading_days: Option<u32>,
    #[serde(default)]
    pub tax_rate: f64,
    pub investment_portfolio_size: Option<f64>,
    /// Balance-sheet components; overrides `investment_portfolio_size`
    pub portfolio: Option<InvestmentPortfolio>,
    /// Commission rate quoted separately, checked against the figures
    pub commission_rate_bps: Option<f64>,
    /// Line figures keyed by line name (e.g. `brokerage_fees`)
    #[serde(default)]
    pub lines: FxHashMap<String, f64>,
}

impl BaselineConfig {
    /// Assemble and validate the baseline.
    pub fn build(&self) -> Result<BaselineMetrics> {
        let mut builder = BaselineMetrics::builder()
            .total_traded_value(self.total_traded_value)
            .tax_rate(self.tax_rate);
        for (key, &value) in &self.lines {
            let item = key
                .parse::<LineItem>()
                .map_err(|e| Error::Config(format!("[baseline.lines] {e}")))?;
            builder = builder.line(item, value);
        }
        if let Some(months) = self.period_months {
            builder = builder.period_months(months);
        }
        if let Some(days) = self.trading_days {
            builder = builder.trading_days(days);
        }
        if let Some(size) = self.investment_portfolio_size {
            builder = builder.investment_portfolio_size(size);
        }
        if let Some(portfolio) = self.portfolio {
            builder = builder.portfolio(portfolio);
        }
        if let Some(rate) = self.commission_rate_bps {
            builder = builder.stated_commission_rate(Bps(rate));
        }
        builder
            .build()
            .map_err(|e| Error::Config(format!("[baseline] {e}")))
    }
}

/// Named parameter sets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    #[default]
    Reset,
    Bear,
    Bull,
}

impl Preset {
    pub fn params(self) -> ScenarioParameters {
        match self {
            Preset::Reset => ScenarioParameters::reset(),
            Preset::Bear => ScenarioParameters::bear_case(),
            Preset::Bull => ScenarioParameters::bull_case(),
        }
    }
}

/// Scenario to run: a preset plus individual overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ScenarioConfig {
    pub preset: Option<Preset>,
    pub commission_rate_delta_bps: Option<f64>,
    pub traded_value_change_pct: Option<f64>,
    pub interest_rate_delta_bps: Option<f64>,
    pub volume_basis: Option<VolumeBasis>,
}

impl ScenarioConfig {
    /// `other`'s settings take precedence where given.
    pub fn merge(self, other: ScenarioConfig) -> ScenarioConfig {
        ScenarioConfig {
            preset: other.preset.or(self.preset),
            commission_rate_delta_bps: other
                .commission_rate_delta_bps
                .or(self.commission_rate_delta_bps),
            traded_value_change_pct: other.traded_value_change_pct.or(self.traded_value_change_pct),
            interest_rate_delta_bps: other.interest_rate_delta_bps.or(self.interest_rate_delta_bps),
            volume_basis: other.volume_basis.or(self.volume_basis),
        }
    }

    pub fn params(&self) -> ScenarioParameters {
        let mut params = self.preset.unwrap_or_default().params();
        if let Some(bps) = self.commission_rate_delta_bps {
            params = params.with_commission_rate_delta(Bps(bps));
        }
        if let Some(pct) = self.traded_value_change_pct {
            params = params.with_traded_value_change(Pct(pct));
        }
        if let Some(bps) = self.interest_rate_delta_bps {
            params = params.with_interest_rate_delta(Bps(bps));
        }
        if let Some(basis) = self.volume_basis {
            params = params.with_volume_basis(basis);
        }
        params
    }
}

/// Axes of the sensitivity grid.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct MatrixConfig {
    pub rows: SweepAxis,
    pub cols: SweepAxis,
}

impl Default for MatrixConfig {
    /// Volume −40 % … +30 % against commission −10 … +5 bps.
    fn default() -> Self {
        Self {
            rows: SweepAxis::new(
                SweepParam::TradedValueChangePct,
                vec![-40.0, -30.0, -20.0, -10.0, 0.0, 10.0, 20.0, 30.0],
            ),
            cols: SweepAxis::new(
                SweepParam::CommissionRateDeltaBps,
                vec![-10.0, -5.0, 0.0, 5.0],
            ),
        }
    }
}

/// Rate moves for the interest-rate ladder. Defaults to the configured
/// enumerated steps.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LadderConfig {
    pub deltas_bps: Option<Vec<f64>>,
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        info!(
            "Loaded {} (rules {}, {} line splits)",
            path.display(),
            config.rules.version,
            config.rules.lines.len()
        );
        Ok(config)
    }

    /// Validate config invariants.
    fn validate(&self) -> Result<()> {
        self.rules
            .validate()
            .map_err(|e| Error::Config(e.to_string()))?;
        self.baseline.build()?;
        if self.matrix.rows.param == self.matrix.cols.param {
            return Err(Error::Config(
                "[matrix] rows and cols must sweep different parameters".into(),
            ));
        }
        if self.ladder.deltas_bps.is_none() && self.rules.interest_rate_steps.levels().is_none() {
            return Err(Error::Config(
                "[ladder] deltas_bps is required with continuous interest-rate steps".into(),
            ));
        }
        let steps = &self.rules.interest_rate_steps;
        let deltas = self.ladder.deltas_bps.iter().flatten();
        if let Some(bad) = deltas.copied().find(|&d| !steps.allows(Bps(d))) {
            return Err(Error::Config(format!(
                "[ladder] {bad} bps is not a configured interest-rate step"
            )));
        }
        Ok(())
    }

    /// Rate moves for the ladder, in configured order.
    pub fn ladder_deltas(&self) -> Vec<Bps> {
        match &self.ladder.deltas_bps {
            Some(deltas) => deltas.iter().copied().map(Bps).collect(),
            None => self.rules.interest_rate_steps.levels().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proforma::{ClampPolicy, InterestRateSteps};

    fn example_toml() -> &'static str {
        r#"
[baseline]
period_months = 9
total_traded_value = 165000
tax_rate = 0.09

[baseline.lines]
trading_commission = 309.375
brokerage_fees = 41.4
clearing_settlement_depositary = 61.5
investment_income = 165.0
general_admin_expenses = 120.0

[baseline.portfolio]
deposits = 3000
amortised_cost = 1200
fvtoci_debt = 200

[rules]
version = "2025-Q3"
clamp_policy = "reject"

[[rules.lines]]
line = "clearing_settlement_depositary"
fixed = 0.0
variable = 1.0

[[rules.lines]]
line = "other_fees"
fixed = 0.7
variable = 0.3

[scenario]
preset = "bear"
traded_value_change_pct = -20

[matrix]
rows = { param = "interest_rate_delta_bps", values = [-50, -25, 0] }
cols = { param = "traded_value_change_pct", values = [-10, 0, 10] }
"#
    }

    #[test]
    fn parse_example_config() {
        let config: Config = toml::from_str(example_toml()).unwrap();
        config.validate().unwrap();
        assert_eq!(config.baseline.period_months, Some(9));
        assert_eq!(config.rules.clamp_policy, ClampPolicy::Reject);
        assert_eq!(config.rules.lines.len(), 2);
        assert_eq!(config.matrix.rows.param, SweepParam::InterestRateDeltaBps);
        assert_eq!(config.scenario.preset, Some(Preset::Bear));
    }

    #[test]
    fn baseline_is_annualized() {
        let config: Config = toml::from_str(example_toml()).unwrap();
        let baseline = config.baseline.build().unwrap();
        assert!((baseline.trading_commission_income() - 412.5).abs() < 1e-9);
        assert!((baseline.implied_commission_rate().0 - 25.0).abs() < 1e-9);
        assert_eq!(baseline.investment_portfolio_size(), 4_400.0);
        assert!((baseline.implied_interest_rate() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn scenario_preset_with_override() {
        let config: Config = toml::from_str(example_toml()).unwrap();
        let params = config.scenario.params();
        assert_eq!(params.commission_rate_delta, Bps(-10.0));
        assert_eq!(params.traded_value_change, Pct(-20.0));
        assert_eq!(params.interest_rate_delta, Bps(-100.0));
    }

    #[test]
    fn merge_prefers_other() {
        let file = ScenarioConfig {
            preset: Some(Preset::Bull),
            commission_rate_delta_bps: Some(-5.0),
            ..Default::default()
        };
        let flags = ScenarioConfig {
            commission_rate_delta_bps: Some(-2.0),
            ..Default::default()
        };
        let merged = file.merge(flags);
        assert_eq!(merged.preset, Some(Preset::Bull));
        assert_eq!(merged.commission_rate_delta_bps, Some(-2.0));
    }

    #[test]
    fn defaults_when_sections_missing() {
        let config: Config = toml::from_str(
            r#"
[baseline]
total_traded_value = 0
"#,
        )
        .unwrap();
        config.validate().unwrap();
        assert_eq!(config.rules, AllocationRules::default());
        assert_eq!(config.matrix, MatrixConfig::default());
        assert_eq!(config.scenario.params(), ScenarioParameters::reset());
        assert_eq!(config.ladder_deltas().len(), 5);
    }

    #[test]
    fn unknown_keys_rejected() {
        let typo = example_toml().replace("clamp_policy", "clamp_mode");
        assert!(toml::from_str::<Config>(&typo).is_err());

        let bad_line = example_toml().replace("brokerage_fees", "brokerage");
        let config: Config = toml::from_str(&bad_line).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("unknown P&L line 'brokerage'"));

        let extra = format!("{}\n[reporting]\ncurrency = \"AED\"\n", example_toml());
        assert!(toml::from_str::<Config>(&extra).is_err());
    }

    #[test]
    fn validate_catches_bad_split() {
        let mut config: Config = toml::from_str(example_toml()).unwrap();
        config.rules.lines[1].variable = 0.5;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn validate_catches_inconsistent_rate() {
        let mut config: Config = toml::from_str(example_toml()).unwrap();
        config.baseline.commission_rate_bps = Some(30.0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("implied_commission_rate_bps"));
    }

    #[test]
    fn validate_catches_same_axes() {
        let mut config: Config = toml::from_str(example_toml()).unwrap();
        config.matrix.cols.param = SweepParam::InterestRateDeltaBps;
        assert!(config.validate().is_err());
    }

    #[test]
    fn continuous_steps_need_ladder() {
        let mut config: Config = toml::from_str(example_toml()).unwrap();
        config.rules.interest_rate_steps = InterestRateSteps::Continuous {
            min_bps: -100.0,
            max_bps: 100.0,
        };
        assert!(config.validate().is_err());
        config.ladder.deltas_bps = Some(vec![-75.0, 0.0, 75.0]);
        config.validate().unwrap();
        assert_eq!(config.ladder_deltas(), vec![Bps(-75.0), Bps(0.0), Bps(75.0)]);

        config.ladder.deltas_bps = Some(vec![-150.0, 0.0]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn ladder_must_use_enumerated_steps() {
        let mut config: Config = toml::from_str(example_toml()).unwrap();
        config.ladder.deltas_bps = Some(vec![-50.0, -150.0]);
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("-150 bps"));

        config.ladder.deltas_bps = Some(vec![-100.0, -50.0, 25.0]);
        config.validate().unwrap();
    }
}

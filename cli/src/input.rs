//! Hand-entered figures: accounting-style numbers and `key=value` overrides.

use std::str::FromStr;

use proforma::{BaselineField, BaselineMetrics, VolumeBasis};
use rustc_hash::FxHashSet;

use crate::error::{Error, Result};

/// Tokens statements use for "nil".
const EMPTY_TOKENS: [&str; 3] = ["na", "n/a", "nil"];

/// Parse a number as printed in financial statements.
///
/// Thousands separators and spaces are ignored, `(1,234)` is negative and a
/// bare dash means nil (`None`).
///
/// ```
/// use proforma_cli::input::parse_amount;
///
/// assert_eq!(parse_amount("(1,234)").unwrap(), Some(-1234.0));
/// assert_eq!(parse_amount("1 234.5").unwrap(), Some(1234.5));
/// assert_eq!(parse_amount("–").unwrap(), None);
/// ```
pub fn parse_amount(text: &str) -> Result<Option<f64>> {
    let trimmed = text.trim();
    if EMPTY_TOKENS.contains(&trimmed.to_ascii_lowercase().as_str()) {
        return Ok(None);
    }
    let compact: String = trimmed
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if compact.chars().all(|c| matches!(c, '(' | ')' | '-' | '–' | '—')) {
        return Ok(None);
    }

    let (negative, body) = match compact.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, compact.as_str()),
    };
    let body = body.replace(['–', '—'], "-");
    let value: f64 = body
        .parse()
        .map_err(|_| Error::Input(format!("'{text}' is not a number")))?;
    if !value.is_finite() {
        return Err(Error::Input(format!("'{text}' is not a finite number")));
    }
    Ok(Some(if negative { -value.abs() } else { value }))
}

/// One `--set key=value` baseline override.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Override {
    pub field: BaselineField,
    pub value: f64,
}

impl FromStr for Override {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (key, raw) = s
            .split_once('=')
            .ok_or_else(|| Error::Input(format!("expected KEY=VALUE, got '{s}'")))?;
        let field = key
            .trim()
            .parse::<BaselineField>()
            .map_err(|e| Error::Input(e.to_string()))?;
        // A dash is a reported nil
        let value = parse_amount(raw)?.unwrap_or(0.0);
        Ok(Override { field, value })
    }
}

/// Apply overrides in order, each producing a new validated baseline.
/// The same field may not be set twice.
pub fn apply_overrides(baseline: &BaselineMetrics, overrides: &[Override]) -> Result<BaselineMetrics> {
    let mut seen = FxHashSet::default();
    let mut current = baseline.clone();
    for o in overrides {
        if !seen.insert(o.field) {
            return Err(Error::Input(format!("{} overridden more than once", o.field)));
        }
        current = current
            .with_override(o.field, o.value)
            .map_err(|e| Error::Input(format!("override {}={}: {e}", o.field, o.value)))?;
    }
    Ok(current)
}

/// Parse a `--basis` value: `total` or `adtv`. ADTV is always annualized
/// over the baseline's `trading_days`.
pub fn parse_basis(s: &str) -> std::result::Result<VolumeBasis, String> {
    match s.trim() {
        "total" => Ok(VolumeBasis::TotalAnnualValue),
        "adtv" => Ok(VolumeBasis::Adtv),
        _ => Err(format!("unknown basis '{s}' (expected total or adtv)")),
    }
}

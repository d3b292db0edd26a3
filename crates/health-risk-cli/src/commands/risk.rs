use std::collections::BTreeMap;
use std::time::Instant;

use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use health_risk_core::config::ReferenceData;
use health_risk_core::indicators::Ratio;
use health_risk_core::risk::{assess_with, RiskTier};
use health_risk_core::with_metadata;

use crate::input;

/// Arguments for scoring a single ratio set
#[derive(Args)]
pub struct RiskArgs {
    /// Path to JSON input file with the seven ratios (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Current ratio (current assets / current liabilities)
    #[arg(long)]
    pub current_ratio: Option<Decimal>,

    /// Quick ratio ((current assets - inventories) / current liabilities)
    #[arg(long)]
    pub quick_ratio: Option<Decimal>,

    /// Debt ratio (total liabilities / total assets)
    #[arg(long)]
    pub debt_ratio: Option<Decimal>,

    /// Financial leverage (total liabilities / equity)
    #[arg(long)]
    pub financial_leverage: Option<Decimal>,

    /// Return on assets
    #[arg(long, alias = "roa", allow_hyphen_values = true)]
    pub return_on_assets: Option<Decimal>,

    /// Return on equity
    #[arg(long, alias = "roe", allow_hyphen_values = true)]
    pub return_on_equity: Option<Decimal>,

    /// Net margin (net income / revenue)
    #[arg(long, allow_hyphen_values = true)]
    pub net_margin: Option<Decimal>,
}

impl RiskArgs {
    fn flag(&self, ratio: Ratio) -> Option<Decimal> {
        match ratio {
            Ratio::CurrentRatio => self.current_ratio,
            Ratio::QuickRatio => self.quick_ratio,
            Ratio::DebtRatio => self.debt_ratio,
            Ratio::FinancialLeverage => self.financial_leverage,
            Ratio::ReturnOnAssets => self.return_on_assets,
            Ratio::ReturnOnEquity => self.return_on_equity,
            Ratio::NetMargin => self.net_margin,
        }
    }

    fn ratio_map(&self) -> BTreeMap<String, Value> {
        Ratio::ALL
            .into_iter()
            .filter_map(|r| {
                self.flag(r)
                    .map(|v| (r.name().to_string(), Value::String(v.to_string())))
            })
            .collect()
    }
}

pub fn run_risk(
    args: RiskArgs,
    data: &ReferenceData,
) -> Result<Value, Box<dyn std::error::Error>> {
    let raw: BTreeMap<String, Value> = if let Some(ref path) = args.input {
        serde_json::from_value(input::file::read_json_value(path)?)?
    } else if let Some(value) = input::stdin::read_stdin_json()? {
        serde_json::from_value(value)?
    } else {
        args.ratio_map()
    };

    let start = Instant::now();
    let verdict = assess_with(&data.scorer(), &raw);

    let mut warnings = Vec::new();
    if verdict.tier == RiskTier::Uncomputable {
        let missing: Vec<&str> = Ratio::ALL
            .iter()
            .map(|r| r.name())
            .filter(|name| !raw.contains_key(*name))
            .collect();
        if missing.is_empty() {
            warnings.push("Some ratios are not numeric; the set cannot be scored.".into());
        } else {
            warnings.push(format!("Missing ratios: {}.", missing.join(", ")));
        }
    }

    let output = with_metadata(
        "Rule-based risk scoring (liquidity, leverage, profitability)",
        &data.thresholds,
        warnings,
        start.elapsed().as_micros() as u64,
        verdict,
    );
    Ok(serde_json::to_value(output)?)
}

//! Rule-based risk scoring from a single entity's ratios.
//!
//! Three independent dimensions each contribute at most one band:
//! 1. **Liquidity** -- current ratio below the critical / moderate floor.
//! 2. **Leverage** -- debt ratio above the high / moderate ceiling.
//! 3. **Profitability** -- net margin below the loss / low-margin floor.
//!
//! The summed points map onto a tier and a capped probability.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::HealthRiskError;
use crate::indicators::{Ratio, RatioSet};
use crate::types::{Multiple, Rate};
use crate::CoreResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskTier {
    High,
    Medium,
    Low,
    Uncomputable,
}

impl RiskTier {
    pub const ALL: [RiskTier; 4] = [
        RiskTier::High,
        RiskTier::Medium,
        RiskTier::Low,
        RiskTier::Uncomputable,
    ];
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskTier::High => write!(f, "HIGH"),
            RiskTier::Medium => write!(f, "MEDIUM"),
            RiskTier::Low => write!(f, "LOW"),
            RiskTier::Uncomputable => write!(f, "UNCOMPUTABLE"),
        }
    }
}

/// One contributing factor and its weight in [0, 1].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub name: String,
    pub weight: Rate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskVerdict {
    pub tier: RiskTier,
    pub probability: Rate,
    pub points: u32,
    /// Ordered liquidity, leverage, profitability.
    pub factors: Vec<RiskFactor>,
}

/// Band limits for the three dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    /// Current ratio strictly below this is critical.
    pub liquidity_critical: Multiple,
    /// Current ratio strictly below this is moderate.
    pub liquidity_moderate: Multiple,
    /// Debt ratio strictly above this is high.
    pub leverage_high: Rate,
    /// Debt ratio strictly above this is moderate.
    pub leverage_moderate: Rate,
    /// Net margin strictly below this is a loss.
    pub margin_loss: Rate,
    /// Net margin strictly below this is low.
    pub margin_low: Rate,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        RiskThresholds {
            liquidity_critical: dec!(1.0),
            liquidity_moderate: dec!(1.5),
            leverage_high: dec!(0.7),
            leverage_moderate: dec!(0.5),
            margin_loss: dec!(0.0),
            margin_low: dec!(0.05),
        }
    }
}

/// Scores complete ratio sets against a fixed set of thresholds.
#[derive(Debug, Clone, Default)]
pub struct RiskScorer {
    thresholds: RiskThresholds,
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const HIGH_TIER_POINTS: u32 = 6;
const MEDIUM_TIER_POINTS: u32 = 3;

pub const INSUFFICIENT_DATA_FACTOR: &str = "Insufficient data";

/// Ratios the scorer reads.
pub const SCORED_RATIOS: [Ratio; 3] = [Ratio::CurrentRatio, Ratio::DebtRatio, Ratio::NetMargin];

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

impl RiskVerdict {
    /// Verdict reported when the inputs cannot be scored.
    pub fn uncomputable() -> Self {
        RiskVerdict {
            tier: RiskTier::Uncomputable,
            probability: Decimal::ZERO,
            points: 0,
            factors: vec![RiskFactor {
                name: INSUFFICIENT_DATA_FACTOR.to_string(),
                weight: dec!(1.0),
            }],
        }
    }

    /// Factors rendered for export, e.g. `"Critical liquidity (90%)"`.
    pub fn factor_summary(&self) -> String {
        self.factors
            .iter()
            .map(|f| format!("{} ({}%)", f.name, (f.weight * dec!(100)).round()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl RiskScorer {
    pub fn new(thresholds: RiskThresholds) -> Self {
        RiskScorer { thresholds }
    }

    pub fn thresholds(&self) -> &RiskThresholds {
        &self.thresholds
    }

    /// Score one entity. Every ratio in [`SCORED_RATIOS`] must be present.
    pub fn score(&self, ratios: &RatioSet) -> CoreResult<RiskVerdict> {
        let get = |r: Ratio| {
            ratios.get(&r).copied().ok_or_else(|| {
                HealthRiskError::InsufficientData(format!("ratio '{r}' is required for scoring"))
            })
        };
        let current_ratio = get(Ratio::CurrentRatio)?;
        let debt_ratio = get(Ratio::DebtRatio)?;
        let net_margin = get(Ratio::NetMargin)?;

        let t = &self.thresholds;
        let mut points = 0u32;
        let mut factors = Vec::new();

        // -- Liquidity ------------------------------------------------------
        if current_ratio < t.liquidity_critical {
            points += 3;
            factors.push(factor("Critical liquidity", dec!(0.9)));
        } else if current_ratio < t.liquidity_moderate {
            points += 1;
            factors.push(factor("Moderate liquidity", dec!(0.6)));
        }

        // -- Leverage -------------------------------------------------------
        if debt_ratio > t.leverage_high {
            points += 3;
            factors.push(factor("High leverage", dec!(0.9)));
        } else if debt_ratio > t.leverage_moderate {
            points += 1;
            factors.push(factor("Moderate leverage", dec!(0.6)));
        }

        // -- Profitability --------------------------------------------------
        if net_margin < t.margin_loss {
            points += 2;
            factors.push(factor("Operating losses", dec!(0.8)));
        } else if net_margin < t.margin_low {
            points += 1;
            factors.push(factor("Low profitability", dec!(0.5)));
        }

        let (tier, probability) = tier_for_points(points);
        Ok(RiskVerdict {
            tier,
            probability,
            points,
            factors,
        })
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn factor(name: &str, weight: Decimal) -> RiskFactor {
    RiskFactor {
        name: name.to_string(),
        weight,
    }
}

fn tier_for_points(points: u32) -> (RiskTier, Rate) {
    let p = Decimal::from(points);
    if points >= HIGH_TIER_POINTS {
        (RiskTier::High, (dec!(0.6) + dec!(0.05) * p).min(dec!(0.95)))
    } else if points >= MEDIUM_TIER_POINTS {
        (RiskTier::Medium, (dec!(0.30) + dec!(0.10) * p).min(dec!(0.80)))
    } else {
        (RiskTier::Low, (dec!(0.10) + dec!(0.05) * p).max(dec!(0.10)))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

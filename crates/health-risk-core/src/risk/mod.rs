pub mod assess;
pub mod scorer;

pub use assess::{assess, assess_with, parse_ratio_set};
pub use scorer::{
    RiskFactor, RiskScorer, RiskThresholds, RiskTier, RiskVerdict, INSUFFICIENT_DATA_FACTOR,
    SCORED_RATIOS,
};

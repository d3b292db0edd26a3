pub mod engine;
pub mod ledger;
pub mod ratios;

pub use engine::{IndicatorEngine, MISSING_ENTITY_LABEL};
pub use ledger::{classify_rows, AccountLine, LedgerRow};
pub use ratios::{CategoryTotals, EntityIndicatorSet, Ratio, RatioSet};

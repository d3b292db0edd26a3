use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::classification::Category;
use crate::entity::EntityKind;
use crate::types::{safe_divide, Money, Multiple, Rate};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The named ratios computed for every entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ratio {
    CurrentRatio,
    QuickRatio,
    DebtRatio,
    FinancialLeverage,
    ReturnOnAssets,
    ReturnOnEquity,
    NetMargin,
}

/// Complete set of ratio values keyed by name.
pub type RatioSet = BTreeMap<Ratio, Decimal>;

/// Summed amounts per category for one entity.
pub type CategoryTotals = BTreeMap<Category, Money>;

/// Financial indicators for one entity over a single period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityIndicatorSet {
    pub identifier: String,
    pub entity_label: String,
    pub entity_kind: EntityKind,
    // Liquidity
    pub current_ratio: Multiple,
    pub quick_ratio: Multiple,
    // Leverage
    pub debt_ratio: Rate,
    pub financial_leverage: Multiple,
    // Profitability
    pub return_on_assets: Rate,
    pub return_on_equity: Rate,
    pub net_margin: Rate,
    // Absolute totals
    pub current_assets: Money,
    pub current_liabilities: Money,
    pub total_assets: Money,
    pub total_liabilities: Money,
    pub equity: Money,
    pub net_income: Money,
    pub revenue: Money,
    pub category_totals: CategoryTotals,
}

// ---------------------------------------------------------------------------
// Ratio names
// ---------------------------------------------------------------------------

impl Ratio {
    pub const ALL: [Ratio; 7] = [
        Ratio::CurrentRatio,
        Ratio::QuickRatio,
        Ratio::DebtRatio,
        Ratio::FinancialLeverage,
        Ratio::ReturnOnAssets,
        Ratio::ReturnOnEquity,
        Ratio::NetMargin,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Ratio::CurrentRatio => "current_ratio",
            Ratio::QuickRatio => "quick_ratio",
            Ratio::DebtRatio => "debt_ratio",
            Ratio::FinancialLeverage => "financial_leverage",
            Ratio::ReturnOnAssets => "return_on_assets",
            Ratio::ReturnOnEquity => "return_on_equity",
            Ratio::NetMargin => "net_margin",
        }
    }
}

impl std::fmt::Display for Ratio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Ratio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ratio::ALL
            .into_iter()
            .find(|r| r.name() == s)
            .ok_or_else(|| format!("unknown ratio '{s}'"))
    }
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

impl EntityIndicatorSet {
    /// Derive every ratio from the category totals. Any ratio whose
    /// denominator is zero is reported as zero. Sums that leave the
    /// representable range saturate.
    pub fn from_totals(
        identifier: String,
        entity_label: String,
        entity_kind: EntityKind,
        totals: CategoryTotals,
    ) -> Self {
        let total_of = |c: Category| totals.get(&c).copied().unwrap_or(Decimal::ZERO);

        let current_assets = total_of(Category::CurrentAssets);
        let current_liabilities = total_of(Category::CurrentLiabilities);
        let total_liabilities =
            current_liabilities.saturating_add(total_of(Category::NonCurrentLiabilities));
        let total_assets: Money = totals
            .iter()
            .filter(|(c, _)| c.is_asset())
            .fold(Decimal::ZERO, |acc, (_, v)| acc.saturating_add(*v));
        let equity = total_of(Category::Equity);
        let net_income = total_of(Category::NetIncome);
        let revenue = total_of(Category::Revenue);
        let inventories = total_of(Category::Inventories);

        EntityIndicatorSet {
            identifier,
            entity_label,
            entity_kind,
            current_ratio: safe_divide(current_assets, current_liabilities),
            quick_ratio: safe_divide(
                current_assets.saturating_sub(inventories),
                current_liabilities,
            ),
            debt_ratio: safe_divide(total_liabilities, total_assets),
            financial_leverage: safe_divide(total_liabilities, equity),
            return_on_assets: safe_divide(net_income, total_assets),
            return_on_equity: safe_divide(net_income, equity),
            net_margin: safe_divide(net_income, revenue),
            current_assets,
            current_liabilities,
            total_assets,
            total_liabilities,
            equity,
            net_income,
            revenue,
            category_totals: totals,
        }
    }

    pub fn ratio(&self, ratio: Ratio) -> Decimal {
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

    /// All seven ratios as a complete set.
    pub fn ratios(&self) -> RatioSet {
        Ratio::ALL.into_iter().map(|r| (r, self.ratio(r))).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn totals(pairs: &[(Category, Decimal)]) -> CategoryTotals {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_ratios_from_totals() {
        let set = EntityIndicatorSet::from_totals(
            "900000001".into(),
            "IPS NORTE".into(),
            EntityKind::Ips,
            totals(&[
                (Category::CurrentAssets, dec!(300_000)),
                (Category::Inventories, dec!(60_000)),
                (Category::CurrentLiabilities, dec!(150_000)),
                (Category::NonCurrentLiabilities, dec!(50_000)),
                (Category::Equity, dec!(400_000)),
                (Category::NetIncome, dec!(40_000)),
                (Category::Revenue, dec!(500_000)),
            ]),
        );

        // Current ratio = 300k / 150k = 2
        assert_eq!(set.current_ratio, dec!(2));
        // Quick ratio = (300k - 60k) / 150k = 1.6
        assert_eq!(set.quick_ratio, dec!(1.6));
        // Total liabilities = 150k + 50k = 200k
        assert_eq!(set.total_liabilities, dec!(200_000));
        // Total assets only counts "Activo" categories = 300k
        assert_eq!(set.total_assets, dec!(300_000));
        // Debt ratio = 200k / 300k
        assert_eq!(set.debt_ratio, dec!(200_000) / dec!(300_000));
        // Leverage = 200k / 400k = 0.5
        assert_eq!(set.financial_leverage, dec!(0.5));
        // ROE = 40k / 400k = 0.1
        assert_eq!(set.return_on_equity, dec!(0.1));
        // Net margin = 40k / 500k = 0.08
        assert_eq!(set.net_margin, dec!(0.08));
    }

    #[test]
    fn test_zero_denominators_yield_zero() {
        let set = EntityIndicatorSet::from_totals(
            "1".into(),
            "X".into(),
            EntityKind::Undetermined,
            totals(&[(Category::Costs, dec!(1_000))]),
        );
        for ratio in Ratio::ALL {
            assert_eq!(set.ratio(ratio), Decimal::ZERO, "{ratio}");
        }
    }

    #[test]
    fn test_cash_on_hand_not_in_total_assets() {
        let set = EntityIndicatorSet::from_totals(
            "1".into(),
            "X".into(),
            EntityKind::Undetermined,
            totals(&[
                (Category::CurrentAssets, dec!(100)),
                (Category::CashOnHand, dec!(900)),
            ]),
        );
        assert_eq!(set.total_assets, dec!(100));
    }

    #[test]
    fn test_totals_near_decimal_limit_saturate() {
        let big = Decimal::from_scientific("5e28").unwrap();
        let set = EntityIndicatorSet::from_totals(
            "1".into(),
            "X".into(),
            EntityKind::Ips,
            totals(&[
                (Category::CurrentAssets, big),
                (Category::Inventories, -big),
                (Category::CurrentLiabilities, big),
                (Category::NonCurrentLiabilities, big),
            ]),
        );
        assert_eq!(set.total_liabilities, Decimal::MAX);
        assert_eq!(set.current_ratio, dec!(1));
        assert_eq!(set.quick_ratio, Decimal::MAX / big);
    }

    #[test]
    fn test_ratio_names_round_trip_through_from_str() {
        for ratio in Ratio::ALL {
            assert_eq!(ratio.name().parse::<Ratio>().unwrap(), ratio);
        }
        assert!("ebitda_margin".parse::<Ratio>().is_err());
    }

    #[test]
    fn test_ratios_complete() {
        let set = EntityIndicatorSet::from_totals(
            "1".into(),
            "X".into(),
            EntityKind::Eps,
            totals(&[(Category::CurrentAssets, dec!(1))]),
        );
        assert_eq!(set.ratios().len(), 7);
    }
}

//! Reference data and thresholds the engine runs against.
//!
//! Every section defaults to the built-in tables, so a configuration file
//! only needs to carry the sections it replaces.

use serde::{Deserialize, Serialize};

use crate::classification::{self, AccountClassifier, Taxonomy, TaxonomyEntry};
use crate::error::HealthRiskError;
use crate::registry::{self, IdentityResolver, RegistryEntry, StaticRegistry};
use crate::risk::{RiskScorer, RiskThresholds};
use crate::CoreResult;

/// Serializable engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub registry: Vec<RegistryEntry>,
    pub taxonomy: Vec<TaxonomyEntry>,
    pub thresholds: RiskThresholds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            registry: registry::builtin_entries(),
            taxonomy: classification::builtin_entries(),
            thresholds: RiskThresholds::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> CoreResult<Self> {
        serde_json::from_str(json).map_err(|e| HealthRiskError::Config(e.to_string()))
    }
}

/// Validated, immutable reference data built once and shared by reference.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    pub registry: StaticRegistry,
    pub taxonomy: Taxonomy,
    pub thresholds: RiskThresholds,
}

impl ReferenceData {
    pub fn builtin() -> Self {
        ReferenceData {
            registry: StaticRegistry::builtin(),
            taxonomy: Taxonomy::builtin(),
            thresholds: RiskThresholds::default(),
        }
    }

    pub fn from_config(config: EngineConfig) -> CoreResult<Self> {
        validate_thresholds(&config.thresholds)?;
        let registry = StaticRegistry::from_entries(config.registry)?;
        let taxonomy = Taxonomy::from_entries(config.taxonomy)?;
        log::debug!(
            "reference data loaded: {} registry entries, {} taxonomy codes",
            registry.len(),
            taxonomy.entries().len()
        );
        Ok(ReferenceData {
            registry,
            taxonomy,
            thresholds: config.thresholds,
        })
    }

    pub fn resolver(&self) -> IdentityResolver<'_> {
        IdentityResolver::new(&self.registry)
    }

    pub fn classifier(&self) -> AccountClassifier<'_> {
        AccountClassifier::new(&self.taxonomy)
    }

    pub fn scorer(&self) -> RiskScorer {
        RiskScorer::new(self.thresholds.clone())
    }
}

impl Default for ReferenceData {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Each dimension's critical band must sit outside its moderate band.
fn validate_thresholds(t: &RiskThresholds) -> CoreResult<()> {
    if t.liquidity_critical > t.liquidity_moderate {
        return Err(HealthRiskError::Config(
            "liquidity_critical must not exceed liquidity_moderate".into(),
        ));
    }
    if t.leverage_high < t.leverage_moderate {
        return Err(HealthRiskError::Config(
            "leverage_high must not be below leverage_moderate".into(),
        ));
    }
    if t.margin_loss > t.margin_low {
        return Err(HealthRiskError::Config(
            "margin_loss must not exceed margin_low".into(),
        ));
    }
    Ok(())
}

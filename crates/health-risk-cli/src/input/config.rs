use health_risk_core::config::{EngineConfig, ReferenceData};

use crate::input;

/// Build reference data from an optional JSON or YAML override file.
pub fn load_reference_data(
    path: Option<&str>,
) -> Result<ReferenceData, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(ReferenceData::builtin());
    };

    let text = input::file::read_text(path)?;
    let config: EngineConfig = if input::file::is_yaml(path) {
        serde_yaml::from_str(&text).map_err(|e| format!("Failed to parse '{}': {}", path, e))?
    } else {
        EngineConfig::from_json_str(&text)?
    };
    log::info!("reference data loaded from {path}");
    Ok(ReferenceData::from_config(config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use health_risk_core::registry::EntityRegistry;

    #[test]
    fn test_yaml_config_parses() {
        let yaml = "registry:\n  - identifier: \"901000001\"\n    name: IPS NORTE\n    \
                    kind: IPS\n    status: ACTIVE\n";
        let config: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        let data = ReferenceData::from_config(config).unwrap();
        assert!(data.registry.lookup("901000001").unwrap().is_some());
        assert_eq!(data.taxonomy.entries().len(), 18);
    }

    #[test]
    fn test_no_path_is_builtin() {
        let data = load_reference_data(None).unwrap();
        assert_eq!(data.registry.len(), 7);
    }
}

// lumen/core/execution/src/config.rs

use crate::gas::GasSchedule;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Engine configuration
///
/// ```toml
/// [gas]
/// gas_per_fee_unit = 100
/// contract_register_fee = 10
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fee schedule
    #[serde(default)]
    pub gas: GasSchedule,
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let config: EngineConfig = toml::from_str(s).context("invalid engine config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("failed to write config {}", path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.gas.gas_per_fee_unit == 0 {
            anyhow::bail!("gas.gas_per_fee_unit must be positive");
        }
        if self.gas.contract_register_fee < 0 {
            anyhow::bail!(
                "gas.contract_register_fee must not be negative, got {}",
                self.gas.contract_register_fee
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_section_missing() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.gas.gas_per_fee_unit, 100);
        assert_eq!(config.gas.contract_register_fee, 10);
    }

    #[test]
    fn test_partial_override() {
        let config = EngineConfig::from_toml_str("[gas]\ncontract_register_fee = 25\n").unwrap();
        assert_eq!(config.gas.contract_register_fee, 25);
        assert_eq!(config.gas.gas_per_fee_unit, 100);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(EngineConfig::from_toml_str("[gas]\ngas_per_fee_unit = 0\n").is_err());
        assert!(EngineConfig::from_toml_str("[gas]\ncontract_register_fee = -1\n").is_err());
        assert!(EngineConfig::from_toml_str("[gas\n").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        let mut config = EngineConfig::default();
        config.gas.gas_per_fee_unit = 250;

        config.save(&path).unwrap();
        assert_eq!(EngineConfig::load(&path).unwrap(), config);
    }
}

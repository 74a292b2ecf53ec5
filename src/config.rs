use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    #[serde(default = "BridgeConfig::default_scripts_dir")]
    pub scripts_dir: String,
    #[serde(default = "BridgeConfig::default_entry_module")]
    pub entry_module: String,
    #[serde(default = "BridgeConfig::default_operation_budget")]
    pub operation_budget: u64,
    #[serde(default = "BridgeConfig::default_ticks_per_second")]
    pub ticks_per_second: u32,
}

impl BridgeConfig {
    fn default_scripts_dir() -> String {
        "assets/scripts".to_string()
    }
    fn default_entry_module() -> String {
        "main".to_string()
    }
    fn default_operation_budget() -> u64 {
        100_000
    }
    fn default_ticks_per_second() -> u32 {
        20
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!(error = ?err, "config load failed; falling back to defaults");
                Self::default()
            }
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            scripts_dir: Self::default_scripts_dir(),
            entry_module: Self::default_entry_module(),
            operation_budget: Self::default_operation_budget(),
            ticks_per_second: Self::default_ticks_per_second(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_config_files_fill_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{ "entry_module": "boot" }}"#).expect("write config");
        let cfg = BridgeConfig::load(file.path()).expect("parse config");
        assert_eq!(cfg.entry_module, "boot");
        assert_eq!(cfg.scripts_dir, "assets/scripts");
        assert_eq!(cfg.operation_budget, 100_000);
        assert_eq!(cfg.ticks_per_second, 20);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = BridgeConfig::load_or_default("no_such_config.json");
        assert_eq!(cfg.entry_module, "main");
    }
}

//! Configuration types and layered loading.

use anyhow::{Context, Result};
use imp_core::ProcessIdentity;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Property consulted once at attach time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    #[serde(default = "default_gate_property")]
    pub property: String,
    /// Value that signals "feature enabled"; anything else closes the gate.
    #[serde(default = "default_enabled_value")]
    pub enabled_value: String,
    /// Value assumed when the property is unset.
    #[serde(default = "default_default_value")]
    pub default_value: String,
}

fn default_gate_property() -> String {
    "ro.miui.support_miui_ime_bottom".to_string()
}
fn default_enabled_value() -> String {
    "1".to_string()
}
fn default_default_value() -> String {
    "0".to_string()
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            property: default_gate_property(),
            enabled_value: default_enabled_value(),
            default_value: default_default_value(),
        }
    }
}

impl GateConfig {
    pub fn is_open(&self, value: &str) -> bool {
        value == self.enabled_value
    }
}

/// Processes that ship native support and must not get the direct patches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default = "default_excluded")]
    pub excluded: Vec<String>,
}

fn default_excluded() -> Vec<String> {
    [
        "com.iflytek.inputmethod.miui",
        "com.sohu.inputmethod.sogou.xiaomi",
        "com.baidu.input_mi",
        "com.miui.catcherpatch",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            excluded: default_excluded(),
        }
    }
}

impl IdentityConfig {
    pub fn is_excluded(&self, process: &ProcessIdentity) -> bool {
        self.excluded.iter().any(|p| p == process.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

/// Fully resolved configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatcherConfig {
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// One configuration tier. `None` sections inherit from lower tiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate: Option<GateConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<IdentityConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

impl PartialConfig {
    /// Read one tier. A missing file is an empty tier, not an error.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read patcher config: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse patcher config: {}", path.display()))
    }

    /// Merge another tier into self, with other taking priority per section.
    fn merge_with(&mut self, other: Self) {
        if other.gate.is_some() {
            self.gate = other.gate;
        }
        if other.identity.is_some() {
            self.identity = other.identity;
        }
        if other.logging.is_some() {
            self.logging = other.logging;
        }
    }

    fn resolve(self) -> PatcherConfig {
        PatcherConfig {
            gate: self.gate.unwrap_or_default(),
            identity: self.identity.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
        }
    }
}

fn load_tier(path: &Path) -> PartialConfig {
    match PartialConfig::load_from_file(path) {
        Ok(tier) => tier,
        Err(e) => {
            tracing::warn!("Ignoring patcher config tier: {e:#}");
            PartialConfig::default()
        }
    }
}

/// Load patcher config with 3-tier priority:
/// 1. runtime_overrides (highest)
/// 2. project config
/// 3. global config (~/.config/imp/patcher.toml)
///
/// Sections missing from every tier fall back to built-in defaults. Broken
/// files are warned about and skipped; loading itself never fails.
pub fn load_config(
    project_path: Option<&Path>,
    global_path: Option<&Path>,
    runtime_overrides: Option<&PartialConfig>,
) -> PatcherConfig {
    let mut merged = PartialConfig::default();

    if let Some(path) = global_path {
        merged.merge_with(load_tier(path));
    }

    if let Some(path) = project_path {
        merged.merge_with(load_tier(path));
    }

    if let Some(overrides) = runtime_overrides {
        merged.merge_with(overrides.clone());
    }

    merged.resolve()
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

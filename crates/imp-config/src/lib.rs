//! Patcher configuration (`patcher.toml`).
//!
//! Loaded with 3-tier priority, section by section:
//! 1. Runtime overrides (highest)
//! 2. Project file (explicit path)
//! 3. Global file (`~/.config/imp/patcher.toml`)
//!
//! Built-in defaults fill every section no tier provides.
//!
//! ```toml
//! [gate]
//! property = "ro.miui.support_miui_ime_bottom"
//! enabled_value = "1"
//! default_value = "0"
//!
//! [identity]
//! excluded = ["com.baidu.input_mi"]
//!
//! [logging]
//! filter = "debug"
//! ```

pub mod config;
pub mod paths;

pub use config::{
    GateConfig, IdentityConfig, LoggingConfig, PartialConfig, PatcherConfig, load_config,
};
pub use paths::{APP_NAME, CONFIG_FILE_NAME, config_dir, global_config_path};

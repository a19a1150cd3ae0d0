use std::path::PathBuf;

/// XDG app name used for the config directory.
pub const APP_NAME: &str = "imp";
pub const CONFIG_FILE_NAME: &str = "patcher.toml";

/// `~/.config/imp` on Linux; `None` when no home directory can be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Resolve the global config path
pub fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

//! XDG locations for awsnet files.

use directories::ProjectDirs;
use std::path::PathBuf;

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "awsnet")
}

/// `$XDG_CONFIG_HOME/awsnet` (usually `~/.config/awsnet`).
pub fn config_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
}

/// `$XDG_DATA_HOME/awsnet`, home of the log file.
pub fn data_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
}

/// `$XDG_CACHE_HOME/awsnet`, home of the persistent cache.
pub fn cache_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.cache_dir().to_path_buf())
}

pub fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

pub fn default_cache_path() -> Option<PathBuf> {
    cache_dir().map(|dir| dir.join("cache.sled"))
}

/// Readline history file.
pub fn history_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("history"))
}

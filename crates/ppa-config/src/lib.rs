pub mod config;
pub mod manager;

pub use config::{ConfigError, ConfigResult, LlmConfig, LogLevel, LoggingSettings, PpaConfig};
pub use manager::ConfigManager;

use std::path::PathBuf;

/// 获取 Copilot PPA 配置目录路径
pub fn ppa_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".copilot-ppa"))
}

/// 获取默认配置文件路径
pub fn default_config_path() -> Option<PathBuf> {
    ppa_dir().map(|dir| dir.join("config.json"))
}

/// 展开路径中的 ~ 为用户主目录
pub fn expand_tilde(path: &str) -> Option<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None => Some(PathBuf::from(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ppa_dir() {
        let dir = ppa_dir();
        assert!(dir.is_some());
        assert!(dir.unwrap().to_string_lossy().contains(".copilot-ppa"));
    }

    #[test]
    fn test_expand_tilde() {
        let expanded = expand_tilde("~/.copilot-ppa/config.json");
        assert!(expanded.is_some());
        assert!(!expanded.unwrap().to_string_lossy().starts_with('~'));
        assert_eq!(expand_tilde("/etc/ppa.json"), Some(PathBuf::from("/etc/ppa.json")));
    }
}

use serde::Deserialize;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "touch-guard.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub block_duration_ms: Option<u64>,
    pub warning_throttle_ms: Option<u64>,
    pub api_level: Option<u32>,
    pub warning_message: Option<String>,
}

pub fn parse(content: &str) -> Result<FileConfig, toml::de::Error> {
    toml::from_str(content)
}

pub fn load_from_path(path: &Path) -> Option<FileConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match parse(&content) {
        Ok(config) => {
            log::debug!("Loaded config from {}", path.display());
            Some(config)
        }
        Err(e) => {
            log::warn!("Failed to parse {}: {}", path.display(), e);
            None
        }
    }
}

pub fn load_from_default_paths() -> Option<FileConfig> {
    for path in default_config_paths() {
        if path.exists() {
            if let Some(config) = load_from_path(&path) {
                return Some(config);
            }
        }
    }
    None
}

fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];

    if let Ok(home) = std::env::var("HOME") {
        paths.push(PathBuf::from(home).join(".config").join(CONFIG_FILE_NAME));
    }

    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_file() {
        let config = parse("block_duration_ms = 900\napi_level = 28\n").unwrap();
        assert_eq!(config.block_duration_ms, Some(900));
        assert_eq!(config.warning_throttle_ms, None);
        assert_eq!(config.api_level, Some(28));
        assert_eq!(config.warning_message, None);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(parse("block_ms = 900\n").is_err());
    }

    #[test]
    fn test_missing_file_is_none() {
        assert!(load_from_path(Path::new("/nonexistent/touch-guard.toml")).is_none());
    }
}

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::store::SortKey;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Seconds to wait before retrying a rate-limited fetch step.
    #[serde(default = "default_backoff_secs")]
    pub rate_limit_backoff_secs: u64,
    #[serde(default)]
    pub default_sort: DefaultSort,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultSort {
    #[default]
    Username,
    LastTweet,
}

impl From<DefaultSort> for SortKey {
    fn from(sort: DefaultSort) -> Self {
        match sort {
            DefaultSort::Username => SortKey::Username,
            DefaultSort::LastTweet => SortKey::LastTweet,
        }
    }
}

fn default_backoff_secs() -> u64 {
    60
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rate_limit_backoff_secs: default_backoff_secs(),
            default_sort: DefaultSort::default(),
        }
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config/unfriendly/config.toml"))
}

pub fn load_config() -> AppConfig {
    let Some(path) = config_path() else {
        return AppConfig::default();
    };

    let Ok(contents) = fs::read_to_string(&path) else {
        return AppConfig::default();
    };

    toml::from_str(&contents).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_for_empty_config() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.rate_limit_backoff_secs, 60);
        assert!(matches!(config.default_sort, DefaultSort::Username));
    }

    #[test]
    fn parses_overrides() {
        let config: AppConfig = toml::from_str(
            r#"
            rate_limit_backoff_secs = 5
            default_sort = "lasttweet"
            "#,
        )
        .unwrap();
        assert_eq!(config.rate_limit_backoff_secs, 5);
        assert!(matches!(config.default_sort, DefaultSort::LastTweet));
    }
}

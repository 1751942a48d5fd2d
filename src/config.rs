//! 配置文件 - ~/.config/govwatch/config.json

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::notification::channels::{
    DiscordConfig, LocalFileConfig, PagerDutyConfig, TelegramConfig,
};

const CONFIG_DIR: &str = ".config/govwatch";
const CONFIG_FILE: &str = "config.json";

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 静音规则等数据的存放目录
    pub data_dir: PathBuf,
    /// watch 模式的周期（秒）
    pub interval_secs: u64,
    /// HTTP 渠道超时上限（秒）
    pub http_timeout_secs: u64,
    pub dry_run: bool,
    pub telegram: Option<TelegramConfig>,
    pub discord: Option<DiscordConfig>,
    pub pagerduty: Option<PagerDutyConfig>,
    pub local_file: Option<LocalFileConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_config_dir(),
            interval_secs: 300,
            http_timeout_secs: 10,
            dry_run: false,
            telegram: None,
            discord: None,
            pagerduty: None,
            local_file: None,
        }
    }
}

fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
}

impl AppConfig {
    /// 默认配置文件路径
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| anyhow!("Cannot find home directory"))?;
        Ok(home.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// 加载配置；未指定路径且默认文件不存在时使用默认值
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = Self::default_path()?;
                if !default.exists() {
                    debug!(path = %default.display(), "Config file not found, using defaults");
                    return Ok(Self::default());
                }
                default
            }
        };

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// 校验配置，返回警告列表；致命问题直接返回错误
    pub fn validate(&self) -> Result<Vec<String>> {
        if self.interval_secs == 0 {
            return Err(anyhow!("interval_secs must be greater than 0"));
        }
        if self.http_timeout_secs == 0 {
            return Err(anyhow!("http_timeout_secs must be greater than 0"));
        }

        let mut warnings = Vec::new();
        if self.reporter_count() == 0 {
            warnings.push(
                "No reporters configured; notifications will only be filtered and logged"
                    .to_string(),
            );
        }
        if let Some(t) = &self.telegram {
            if t.token.trim().is_empty() || t.chat_id.trim().is_empty() {
                warnings.push("telegram: token and chat_id are required".to_string());
            }
        }
        if let Some(d) = &self.discord {
            if d.webhook_url.trim().is_empty() {
                warnings.push("discord: webhook_url is empty".to_string());
            }
        }
        if let Some(p) = &self.pagerduty {
            if p.routing_key.trim().is_empty() {
                warnings.push("pagerduty: routing_key is empty".to_string());
            }
        }
        Ok(warnings)
    }

    /// 已配置的渠道数
    pub fn reporter_count(&self) -> usize {
        [
            self.telegram.is_some(),
            self.discord.is_some(),
            self.pagerduty.is_some(),
            self.local_file.is_some(),
        ]
        .iter()
        .filter(|configured| **configured)
        .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_partial_config() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.json");
        fs::write(
            &path,
            r#"{
                "interval_secs": 60,
                "discord": {"webhook_url": "https://discord.com/api/webhooks/1/x"}
            }"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.interval_secs, 60);
        assert_eq!(config.http_timeout_secs, 10);
        assert!(!config.dry_run);
        assert_eq!(config.reporter_count(), 1);
        assert_eq!(config.discord.unwrap().timeout_secs, 10);
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let temp = tempdir().unwrap();
        assert!(AppConfig::load(Some(&temp.path().join("nope.json"))).is_err());
    }

    #[test]
    fn test_load_invalid_json() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        let err = AppConfig::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Invalid config"));
    }

    #[test]
    fn test_validate() {
        let config = AppConfig::default();
        let warnings = config.validate().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("No reporters"));

        let zero_interval = AppConfig {
            interval_secs: 0,
            ..AppConfig::default()
        };
        assert!(zero_interval.validate().is_err());

        let zero_timeout = AppConfig {
            http_timeout_secs: 0,
            ..AppConfig::default()
        };
        assert!(zero_timeout.validate().is_err());
    }

    #[test]
    fn test_validate_incomplete_reporter() {
        let config = AppConfig {
            pagerduty: Some(PagerDutyConfig {
                routing_key: " ".to_string(),
                api_url: "https://events.pagerduty.com/v2/enqueue".to_string(),
                timeout_secs: 10,
            }),
            ..AppConfig::default()
        };
        let warnings = config.validate().unwrap();
        assert_eq!(warnings, vec!["pagerduty: routing_key is empty".to_string()]);
    }
}

//! 具体渠道实现

use anyhow::{anyhow, Result};
use reqwest::blocking::Client;
use std::time::Duration;

pub mod discord;
pub mod local_file;
pub mod pagerduty;
pub mod telegram;

pub use discord::{DiscordConfig, DiscordReporter};
pub use local_file::{LocalFileConfig, LocalFileReporter};
pub use pagerduty::{PagerDutyConfig, PagerDutyReporter};
pub use telegram::{TelegramConfig, TelegramReporter};

/// 默认 HTTP 超时（秒）
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// 创建带超时的 HTTP 客户端，保证单次发送不会无限阻塞
pub(crate) fn build_http_client(timeout_secs: u64) -> Result<Client> {
    if timeout_secs == 0 {
        return Err(anyhow!("timeout must be greater than 0"));
    }
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))
}

/// 渠道尚未初始化时的错误
pub(crate) fn not_initialized(name: &str) -> anyhow::Error {
    anyhow!("reporter {} is not initialized", name)
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

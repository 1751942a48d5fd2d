//! Telegram 渠道（Bot API sendMessage）

use anyhow::{anyhow, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{build_http_client, default_timeout_secs, not_initialized};
use crate::notification::formatter::{format_item, truncate};
use crate::notification::reporter::{Reporter, SendResult};
use crate::report::NotificationItem;

/// Telegram 单条消息长度上限
const MAX_MESSAGE_CHARS: usize = 4096;

/// Telegram 渠道配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token
    pub token: String,
    /// Chat ID
    pub chat_id: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://api.telegram.org".to_string()
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: String,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram 渠道
pub struct TelegramReporter {
    config: TelegramConfig,
    client: Option<Client>,
}

impl TelegramReporter {
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            config,
            client: None,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.config.api_url.trim_end_matches('/'),
            self.config.token
        )
    }

    fn build_request<'a>(&'a self, item: &NotificationItem) -> SendMessageRequest<'a> {
        SendMessageRequest {
            chat_id: &self.config.chat_id,
            text: truncate(&format_item(item), MAX_MESSAGE_CHARS),
            disable_web_page_preview: true,
        }
    }
}

impl Reporter for TelegramReporter {
    fn name(&self) -> &str {
        "telegram"
    }

    fn init(&mut self) -> Result<()> {
        if self.config.token.trim().is_empty() {
            return Err(anyhow!("telegram token is required"));
        }
        if self.config.chat_id.trim().is_empty() {
            return Err(anyhow!("telegram chat_id is required"));
        }
        self.client = Some(build_http_client(self.config.timeout_secs)?);
        Ok(())
    }

    fn send(&self, item: &NotificationItem) -> Result<SendResult> {
        let client = self.client.as_ref().ok_or_else(|| not_initialized(self.name()))?;

        let response = client
            .post(self.endpoint())
            .json(&self.build_request(item))
            .send()
            .map_err(|e| anyhow!("HTTP request failed: {}", e))?;

        let status = response.status();
        let body: TelegramResponse = response
            .json()
            .map_err(|e| anyhow!("Failed to parse response (HTTP {}): {}", status, e))?;

        if body.ok {
            debug!(channel = "telegram", item = %item.key(), "Message sent");
            Ok(SendResult::Sent)
        } else {
            let description = body
                .description
                .unwrap_or_else(|| format!("HTTP {}", status));
            error!(channel = "telegram", error = %description, "Failed to send message");
            Ok(SendResult::Failed(description))
        }
    }
}

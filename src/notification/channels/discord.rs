//! Discord 渠道（Webhook）

use anyhow::{anyhow, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{build_http_client, default_timeout_secs, not_initialized};
use crate::notification::formatter::{format_item, truncate};
use crate::notification::reporter::{Reporter, SendResult};
use crate::report::NotificationItem;

/// Discord content 字段长度上限
const MAX_CONTENT_CHARS: usize = 2000;

/// Discord 渠道配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    pub webhook_url: String,
    /// 展示的机器人名
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
}

/// Discord 渠道
pub struct DiscordReporter {
    config: DiscordConfig,
    client: Option<Client>,
}

impl DiscordReporter {
    pub fn new(config: DiscordConfig) -> Self {
        Self {
            config,
            client: None,
        }
    }

    fn build_payload<'a>(&'a self, item: &NotificationItem) -> WebhookPayload<'a> {
        WebhookPayload {
            content: truncate(&format_item(item), MAX_CONTENT_CHARS),
            username: self.config.username.as_deref(),
        }
    }
}

impl Reporter for DiscordReporter {
    fn name(&self) -> &str {
        "discord"
    }

    fn init(&mut self) -> Result<()> {
        let url = self.config.webhook_url.trim();
        if url.is_empty() {
            return Err(anyhow!("discord webhook_url is required"));
        }
        if !url.starts_with("https://") && !url.starts_with("http://") {
            return Err(anyhow!("discord webhook_url must be an http(s) URL"));
        }
        self.client = Some(build_http_client(self.config.timeout_secs)?);
        Ok(())
    }

    fn send(&self, item: &NotificationItem) -> Result<SendResult> {
        let client = self.client.as_ref().ok_or_else(|| not_initialized(self.name()))?;

        let response = client
            .post(self.config.webhook_url.trim())
            .json(&self.build_payload(item))
            .send()
            .map_err(|e| anyhow!("HTTP request failed: {}", e))?;

        let status = response.status();
        if status.is_success() {
            debug!(channel = "discord", item = %item.key(), "Webhook delivered");
            Ok(SendResult::Sent)
        } else {
            let body = response.text().unwrap_or_default();
            error!(channel = "discord", status = %status, "Webhook rejected");
            Ok(SendResult::Failed(format!("HTTP {}: {}", status, body.trim())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> DiscordConfig {
        DiscordConfig {
            webhook_url: url.to_string(),
            username: Some("govwatch".to_string()),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_init_validates_url() {
        assert!(DiscordReporter::new(config("")).init().is_err());
        assert!(DiscordReporter::new(config("discord.com/api/webhooks/1")).init().is_err());
        assert!(DiscordReporter::new(config("https://discord.com/api/webhooks/1/x"))
            .init()
            .is_ok());
    }

    #[test]
    fn test_payload() {
        let reporter = DiscordReporter::new(config("https://discord.com/api/webhooks/1/x"));
        let payload = reporter.build_payload(&NotificationItem::new("osmosis", "10"));
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["content"], "🔴 Not voted yet: osmosis #10");
        assert_eq!(json["username"], "govwatch");
    }

    #[test]
    fn test_payload_truncated() {
        let reporter = DiscordReporter::new(config("https://discord.com/api/webhooks/1/x"));
        let item = NotificationItem::new("osmosis", "10").with_payload("x".repeat(5000));
        let payload = reporter.build_payload(&item);
        assert_eq!(payload.content.chars().count(), MAX_CONTENT_CHARS);
    }

    #[test]
    fn test_send_before_init_fails() {
        let reporter = DiscordReporter::new(config("https://discord.com/api/webhooks/1/x"));
        assert!(reporter.send(&NotificationItem::new("x", "1")).is_err());
    }
}

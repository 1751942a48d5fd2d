//! PagerDuty 渠道（Events API v2）
//!
//! 只对需要处理的条目（未投票、查询失败）触发告警；
//! dedup_key 按 chain + proposal 生成，重复周期不会产生重复 incident。

use anyhow::{anyhow, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{build_http_client, default_timeout_secs, not_initialized};
use crate::notification::formatter::{format_title, truncate};
use crate::notification::reporter::{Reporter, SendResult};
use crate::report::{ItemKind, NotificationItem};

/// summary 字段长度上限
const MAX_SUMMARY_CHARS: usize = 1024;

/// PagerDuty 渠道配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagerDutyConfig {
    /// Integration routing key
    pub routing_key: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://events.pagerduty.com/v2/enqueue".to_string()
}

#[derive(Debug, Serialize)]
struct EventPayload {
    summary: String,
    source: String,
    severity: &'static str,
    custom_details: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct Event<'a> {
    routing_key: &'a str,
    event_action: &'static str,
    dedup_key: String,
    payload: EventPayload,
}

/// PagerDuty 渠道
pub struct PagerDutyReporter {
    config: PagerDutyConfig,
    client: Option<Client>,
}

impl PagerDutyReporter {
    pub fn new(config: PagerDutyConfig) -> Self {
        Self {
            config,
            client: None,
        }
    }

    fn dedup_key(item: &NotificationItem) -> String {
        format!("govwatch-{}-{}", item.domain_key, item.subject_id)
    }

    fn build_event<'a>(&'a self, item: &NotificationItem) -> Event<'a> {
        let severity = match item.kind {
            ItemKind::QueryError => "error",
            _ => "warning",
        };
        Event {
            routing_key: &self.config.routing_key,
            event_action: "trigger",
            dedup_key: Self::dedup_key(item),
            payload: EventPayload {
                summary: truncate(&format_title(item), MAX_SUMMARY_CHARS),
                source: item.domain_key.clone(),
                severity,
                custom_details: serde_json::json!({
                    "chain": item.domain_key,
                    "proposal": item.subject_id,
                    "author": item.author,
                    "details": item.payload,
                }),
            },
        }
    }
}

impl Reporter for PagerDutyReporter {
    fn name(&self) -> &str {
        "pagerduty"
    }

    fn init(&mut self) -> Result<()> {
        if self.config.routing_key.trim().is_empty() {
            return Err(anyhow!("pagerduty routing_key is required"));
        }
        self.client = Some(build_http_client(self.config.timeout_secs)?);
        Ok(())
    }

    fn should_send(&self, item: &NotificationItem) -> bool {
        matches!(item.kind, ItemKind::NotVoted | ItemKind::QueryError)
    }

    fn send(&self, item: &NotificationItem) -> Result<SendResult> {
        if !self.should_send(item) {
            return Ok(SendResult::Skipped(format!("kind {} is not alertable", item.kind)));
        }
        let client = self.client.as_ref().ok_or_else(|| not_initialized(self.name()))?;

        let response = client
            .post(&self.config.api_url)
            .json(&self.build_event(item))
            .send()
            .map_err(|e| anyhow!("HTTP request failed: {}", e))?;

        let status = response.status();
        if status.is_success() {
            debug!(channel = "pagerduty", dedup_key = %Self::dedup_key(item), "Event enqueued");
            Ok(SendResult::Sent)
        } else {
            let body = response.text().unwrap_or_default();
            error!(channel = "pagerduty", status = %status, "Event rejected");
            Ok(SendResult::Failed(format!("HTTP {}: {}", status, body.trim())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reporter() -> PagerDutyReporter {
        PagerDutyReporter::new(PagerDutyConfig {
            routing_key: "R0UT1NG".to_string(),
            api_url: default_api_url(),
            timeout_secs: 5,
        })
    }

    #[test]
    fn test_init_requires_routing_key() {
        let mut reporter = PagerDutyReporter::new(PagerDutyConfig {
            routing_key: String::new(),
            api_url: default_api_url(),
            timeout_secs: 5,
        });
        assert!(reporter.init().is_err());
    }

    #[test]
    fn test_only_actionable_kinds() {
        let reporter = reporter();
        assert!(reporter.should_send(&NotificationItem::new("x", "1")));
        assert!(reporter.should_send(&NotificationItem::new("x", "1").with_kind(ItemKind::QueryError)));
        assert!(!reporter.should_send(&NotificationItem::new("x", "1").with_kind(ItemKind::Voted)));

        // 跳过的条目不需要客户端
        let result = reporter
            .send(&NotificationItem::new("x", "1").with_kind(ItemKind::Revoted))
            .unwrap();
        assert!(matches!(result, SendResult::Skipped(_)));
    }

    #[test]
    fn test_event_payload() {
        let reporter = reporter();
        let item = NotificationItem::new("cosmoshub", "55").with_author("cosmos1abc");
        let json = serde_json::to_value(reporter.build_event(&item)).unwrap();

        assert_eq!(json["routing_key"], "R0UT1NG");
        assert_eq!(json["event_action"], "trigger");
        assert_eq!(json["dedup_key"], "govwatch-cosmoshub-55");
        assert_eq!(json["payload"]["severity"], "warning");
        assert_eq!(json["payload"]["source"], "cosmoshub");
        assert_eq!(json["payload"]["custom_details"]["author"], "cosmos1abc");
    }

    #[test]
    fn test_query_error_severity() {
        let reporter = reporter();
        let item = NotificationItem::new("juno", "3").with_kind(ItemKind::QueryError);
        let json = serde_json::to_value(reporter.build_event(&item)).unwrap();
        assert_eq!(json["payload"]["severity"], "error");
    }
}

//! 本地文件渠道 - 将所有通知写入 JSONL 文件

use anyhow::{anyhow, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::notification::formatter::{format_title, truncate};
use crate::notification::reporter::{Reporter, SendResult};
use crate::notification::store::{DeliveryLog, DeliveryRecord};
use crate::report::NotificationItem;

/// 本地文件渠道配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalFileConfig {
    pub path: PathBuf,
}

/// 本地文件渠道 - 记录所有通知到本地文件
pub struct LocalFileReporter {
    log: DeliveryLog,
}

impl LocalFileReporter {
    pub fn new(config: LocalFileConfig) -> Self {
        Self {
            log: DeliveryLog::new(config.path),
        }
    }

    pub fn log(&self) -> &DeliveryLog {
        &self.log
    }
}

impl Reporter for LocalFileReporter {
    fn name(&self) -> &str {
        "local_file"
    }

    fn init(&mut self) -> Result<()> {
        let path = self.log.path();
        if path.as_os_str().is_empty() {
            return Err(anyhow!("local_file path is required"));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    fn send(&self, item: &NotificationItem) -> Result<SendResult> {
        let record = DeliveryRecord {
            ts: Utc::now(),
            chain: item.domain_key.clone(),
            proposal: item.subject_id.clone(),
            kind: item.kind,
            summary: truncate(&format_title(item), 100),
            author: item.author.clone(),
        };

        match self.log.append(&record) {
            Ok(()) => {
                debug!(channel = "local_file", item = %item.key(), "Notification recorded to local file");
                Ok(SendResult::Sent)
            }
            Err(e) => {
                warn!(
                    channel = "local_file",
                    error = %e,
                    "Failed to write notification to local file"
                );
                Ok(SendResult::Failed(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_local_file_records_items() {
        let temp = tempdir().unwrap();
        let mut reporter = LocalFileReporter::new(LocalFileConfig {
            path: temp.path().join("logs/deliveries.jsonl"),
        });
        reporter.init().unwrap();

        let item = NotificationItem::new("cosmoshub", "55").with_author("cosmos1abc");
        assert_eq!(reporter.send(&item).unwrap(), SendResult::Sent);

        let records = reporter.log().read_recent(10);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].chain, "cosmoshub");
        assert_eq!(records[0].proposal, "55");
        assert_eq!(records[0].author.as_deref(), Some("cosmos1abc"));
    }

    #[test]
    fn test_init_rejects_empty_path() {
        let mut reporter = LocalFileReporter::new(LocalFileConfig {
            path: PathBuf::new(),
        });
        assert!(reporter.init().is_err());
    }

    #[test]
    fn test_write_failure_is_reported_not_raised() {
        let temp = tempdir().unwrap();
        // 路径指向目录，写入必然失败
        let reporter = LocalFileReporter::new(LocalFileConfig {
            path: temp.path().to_path_buf(),
        });
        let result = reporter.send(&NotificationItem::new("x", "1")).unwrap();
        assert!(result.is_failure());
    }
}

//! 投递记录 - 本地 JSONL 文件读写

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::warn;

use crate::report::ItemKind;

/// 投递记录（JSONL 格式）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRecord {
    /// ISO8601 时间戳
    pub ts: DateTime<Utc>,
    pub chain: String,
    pub proposal: String,
    #[serde(default)]
    pub kind: ItemKind,
    /// 简短摘要
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// 投递记录文件
#[derive(Debug, Clone)]
pub struct DeliveryLog {
    path: PathBuf,
    max_records: usize,
    keep_after_cleanup: usize,
    /// 每写入 N 条检查一次是否需要清理
    cleanup_interval: usize,
    write_count: Arc<AtomicUsize>,
}

const MAX_RECORDS: usize = 1000;
const KEEP_AFTER_CLEANUP: usize = 500;
const CLEANUP_CHECK_INTERVAL: usize = 10;

impl DeliveryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_records: MAX_RECORDS,
            keep_after_cleanup: KEEP_AFTER_CLEANUP,
            cleanup_interval: CLEANUP_CHECK_INTERVAL,
            write_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// 设置保留上限
    pub fn with_limits(mut self, max_records: usize, keep_after_cleanup: usize) -> Self {
        self.max_records = max_records;
        self.keep_after_cleanup = keep_after_cleanup.min(max_records);
        self
    }

    /// 设置清理检查间隔（写入条数）
    pub fn with_cleanup_interval(mut self, interval: usize) -> Self {
        self.cleanup_interval = interval.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 追加记录（带文件锁）
    pub fn append(&self, record: &DeliveryRecord) -> Result<()> {
        use fs2::FileExt;

        // 确保目录存在
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;

        file.lock_exclusive()?;
        let mut file = file;
        let written = writeln!(file, "{}", serde_json::to_string(record)?);
        file.unlock()?;
        written?;

        // 记录已写入，清理失败只记日志
        let count = self.write_count.fetch_add(1, Ordering::Relaxed) + 1;
        if count % self.cleanup_interval == 0 {
            if let Err(e) = self.maybe_cleanup() {
                warn!(path = %self.path.display(), error = %e, "Failed to clean up delivery log");
            }
        }
        Ok(())
    }

    /// 读取最近 N 条记录（按时间排序）
    pub fn read_recent(&self, n: usize) -> Vec<DeliveryRecord> {
        let records = match self.read_all() {
            Ok(records) => records,
            Err(_) => return Vec::new(),
        };

        let start = records.len().saturating_sub(n);
        let mut recent = records[start..].to_vec();
        recent.sort_by_key(|r| r.ts);
        recent
    }

    fn read_all(&self) -> Result<Vec<DeliveryRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(File::open(&self.path)?);
        // 跳过损坏的行
        Ok(reader
            .lines()
            .map_while(|line| line.ok())
            .filter_map(|line| serde_json::from_str(&line).ok())
            .collect())
    }

    /// 超过上限时保留最近的记录
    fn maybe_cleanup(&self) -> Result<()> {
        use fs2::FileExt;

        let file = File::open(&self.path)?;
        file.lock_exclusive()?;

        let result = (|| -> Result<()> {
            let records = self.read_all()?;
            if records.len() <= self.max_records {
                return Ok(());
            }

            let start = records.len().saturating_sub(self.keep_after_cleanup);
            let temp_path = self.path.with_extension("tmp");
            {
                let mut temp_file = File::create(&temp_path)?;
                for record in &records[start..] {
                    writeln!(temp_file, "{}", serde_json::to_string(record)?)?;
                }
            }
            // 原子替换
            fs::rename(&temp_path, &self.path)?;
            Ok(())
        })();

        let _ = file.unlock();
        result
    }
}

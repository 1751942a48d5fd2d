//! 报告模型 - 外部报告生成器产出的数据结构
//!
//! 报告内容如何计算不在本 crate 内；这里只定义分发器需要的最小结构：
//! 一个 `Report` 可以拆分为零个或多个 `NotificationItem`。

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 条目类型（仅用于渲染，不参与静音匹配）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// 提案进行中，尚未投票
    #[default]
    NotVoted,
    /// 已投票
    Voted,
    /// 修改了投票
    Revoted,
    /// 查询提案失败
    QueryError,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemKind::NotVoted => write!(f, "not_voted"),
            ItemKind::Voted => write!(f, "voted"),
            ItemKind::Revoted => write!(f, "revoted"),
            ItemKind::QueryError => write!(f, "query_error"),
        }
    }
}

/// 单条待发送通知
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationItem {
    /// 所属链（监控域）
    #[serde(rename = "chain")]
    pub domain_key: String,
    /// 提案 ID
    #[serde(rename = "proposal")]
    pub subject_id: String,
    /// 提案发起人（可选）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub kind: ItemKind,
    /// 上游已渲染好的内容，本 crate 不解析
    #[serde(default)]
    pub payload: String,
}

impl NotificationItem {
    pub fn new(domain_key: impl Into<String>, subject_id: impl Into<String>) -> Self {
        Self {
            domain_key: domain_key.into(),
            subject_id: subject_id.into(),
            author: None,
            kind: ItemKind::default(),
            payload: String::new(),
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_kind(mut self, kind: ItemKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = payload.into();
        self
    }

    /// `chain/proposal` 形式的短标识，用于日志和去重键
    pub fn key(&self) -> String {
        format!("{}/{}", self.domain_key, self.subject_id)
    }
}

/// 一个报告周期的产出
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Report {
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub items: Vec<NotificationItem>,
}

impl Report {
    pub fn new(items: Vec<NotificationItem>) -> Self {
        Self {
            generated_at: Some(Utc::now()),
            items,
        }
    }

    /// 拆分为通知条目
    pub fn into_items(self) -> Vec<NotificationItem> {
        self.items
    }

    /// 从 JSON 文件读取报告（外部生成器的输出）
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read report {}", path.display()))?;
        let report = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse report {}", path.display()))?;
        Ok(report)
    }
}

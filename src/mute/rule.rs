//! 静音规则 - 结构化的通知抑制条件

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::report::NotificationItem;

/// 规则的匹配字段，`None` 表示该字段匹配任意值
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MuteScope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl MuteScope {
    /// 所有字段均未设置（全局静音）
    pub fn is_global(&self) -> bool {
        self.chain.is_none() && self.proposal.is_none() && self.author.is_none()
    }

    /// 各字段统一为规范形式
    pub fn normalized(self) -> Self {
        Self {
            chain: self.chain.map(|v| normalize_identifier(&v)),
            proposal: self.proposal.map(|v| normalize_identifier(&v)),
            author: self.author.map(|v| normalize_identifier(&v)),
        }
    }

    /// 规则中每个已设置的字段都必须在条目上存在且相等
    pub fn matches(&self, item: &NotificationItem) -> bool {
        field_matches(self.chain.as_deref(), Some(&item.domain_key))
            && field_matches(self.proposal.as_deref(), Some(&item.subject_id))
            && field_matches(self.author.as_deref(), item.author.as_deref())
    }
}

fn field_matches(rule_value: Option<&str>, item_value: Option<&str>) -> bool {
    match (rule_value, item_value) {
        (None, _) => true,
        (Some(_), None) => false,
        // 两侧都规范化：手工写入存储的规则可能保留原始大小写
        (Some(expected), Some(actual)) => {
            normalize_identifier(expected) == normalize_identifier(actual)
        }
    }
}

/// 标识符统一为去空白的小写形式
pub fn normalize_identifier(value: &str) -> String {
    value.trim().to_lowercase()
}

/// 静音规则
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MuteRule {
    /// 由存储层在创建时分配
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub scope: MuteScope,
    /// 备注，原样保留，不参与匹配
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    /// `None` 表示永久
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub creator: String,
}

impl MuteRule {
    pub fn new(scope: MuteScope, creator: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: String::new(),
            scope,
            reason: None,
            created_at,
            expires_at: None,
            creator: creator.into(),
        }
    }

    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// `expires_at` 为空或晚于 `as_of` 时有效
    pub fn is_active(&self, as_of: DateTime<Utc>) -> bool {
        match self.expires_at {
            None => true,
            Some(expires_at) => expires_at > as_of,
        }
    }

    pub fn is_permanent(&self) -> bool {
        self.expires_at.is_none()
    }

    pub fn matches(&self, item: &NotificationItem) -> bool {
        self.scope.matches(item)
    }
}

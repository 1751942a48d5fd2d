//! 静音规则仓库 - 在持久化后端之上提供 AddMute / ActiveMutes / RemoveMute

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use super::rule::MuteRule;
use super::storage::MuteStorage;

/// 全局计数器，确保同一毫秒内生成的 id 也唯一
static MUTE_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// 静音规则仓库
///
/// 命令处理路径和分发路径共享同一个实例；并发安全由后端保证。
#[derive(Clone)]
pub struct MuteStore {
    storage: Arc<dyn MuteStorage>,
}

impl MuteStore {
    pub fn new(storage: Arc<dyn MuteStorage>) -> Self {
        Self { storage }
    }

    /// 持久化规则，必要时分配 id 与 created_at，返回最终写入的规则
    pub fn add_mute(&self, mut rule: MuteRule) -> Result<MuteRule> {
        if rule.id.is_empty() {
            rule.id = Self::generate_mute_id();
        }
        // 解析器总会设置 created_at；这里兜底处理手工构造的零值
        if rule.created_at.timestamp() == 0 {
            rule.created_at = Utc::now();
        }
        rule.scope = rule.scope.normalized();

        self.storage.create(&rule)?;
        info!(
            id = %rule.id,
            creator = %rule.creator,
            chain = ?rule.scope.chain,
            proposal = ?rule.scope.proposal,
            author = ?rule.scope.author,
            expires_at = ?rule.expires_at,
            "Mute added"
        );
        Ok(rule)
    }

    /// 返回在 `as_of` 时刻仍然有效的规则，顺序不保证
    pub fn active_mutes(&self, as_of: DateTime<Utc>) -> Result<Vec<MuteRule>> {
        let all = self.storage.list()?;
        let total = all.len();
        let active: Vec<MuteRule> = all.into_iter().filter(|m| m.is_active(as_of)).collect();
        debug!(total, active = active.len(), "Loaded active mutes");
        Ok(active)
    }

    /// 全部规则（含已过期），用于列表展示
    pub fn all_mutes(&self) -> Result<Vec<MuteRule>> {
        self.storage.list()
    }

    /// 删除规则，返回是否存在
    pub fn remove_mute(&self, id: &str) -> Result<bool> {
        let removed = self.storage.delete(id)?;
        if removed {
            info!(id, "Mute removed");
        }
        Ok(removed)
    }

    /// 物理删除已过期的规则
    pub fn purge_expired(&self, as_of: DateTime<Utc>) -> Result<usize> {
        let removed = self.storage.delete_where(&|m| !m.is_active(as_of))?;
        if removed > 0 {
            info!(removed, "Purged expired mutes");
        }
        Ok(removed)
    }

    fn generate_mute_id() -> String {
        let timestamp = Utc::now().timestamp_millis();
        let counter = MUTE_ID_COUNTER.fetch_add(1, Ordering::SeqCst);
        format!("mute-{}-{}", timestamp, counter)
    }
}

//! 静音规则持久化后端
//!
//! `MuteStore` 只通过 create / list / delete 三个操作访问存储，
//! 具体后端决定隔离级别：读者永远不能看到写了一半的规则。

use anyhow::Result;

use super::rule::MuteRule;

pub mod file;
pub mod memory;

pub use file::FileMuteStorage;
pub use memory::MemoryMuteStorage;

/// 持久化协作者
pub trait MuteStorage: Send + Sync {
    /// 写入一条完整规则（`id` 已分配）
    fn create(&self, rule: &MuteRule) -> Result<()>;

    /// 读取全部规则，不做过期过滤
    fn list(&self) -> Result<Vec<MuteRule>>;

    /// 删除规则，返回是否存在
    fn delete(&self, id: &str) -> Result<bool>;

    /// 按条件批量删除，返回删除数量
    fn delete_where(&self, predicate: &dyn Fn(&MuteRule) -> bool) -> Result<usize> {
        let mut removed = 0;
        for rule in self.list()?.iter().filter(|r| predicate(r)) {
            if self.delete(&rule.id)? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

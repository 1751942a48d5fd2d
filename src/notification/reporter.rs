//! 通知渠道 trait 定义

use anyhow::Result;

use crate::report::NotificationItem;

/// 单次发送结果
#[derive(Debug, Clone, PartialEq)]
pub enum SendResult {
    /// 发送成功
    Sent,
    /// 跳过（渠道不接收此类条目，或 dry-run）
    Skipped(String),
    /// 发送失败
    Failed(String),
}

impl SendResult {
    pub fn is_failure(&self) -> bool {
        matches!(self, SendResult::Failed(_))
    }
}

/// 通知渠道
///
/// 约定：
/// - `init` 在启动时调用一次，先于任何 `send`；失败的渠道在进程生命周期内被排除
/// - `send` 可重复调用；传输失败返回 `Err` 或 `SendResult::Failed`，不得 panic
/// - 渠道自行限制传输耗时（如 HTTP 超时），不能无限阻塞整个周期
pub trait Reporter: Send + Sync {
    /// 渠道名称（用于日志和结果汇总）
    fn name(&self) -> &str;

    /// 初始化（校验配置、创建客户端）
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    /// 是否接收此条目（默认全部接收）
    fn should_send(&self, _item: &NotificationItem) -> bool {
        true
    }

    /// 发送单条通知
    fn send(&self, item: &NotificationItem) -> Result<SendResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoReporter;

    impl Reporter for EchoReporter {
        fn name(&self) -> &str {
            "echo"
        }

        fn send(&self, _item: &NotificationItem) -> Result<SendResult> {
            Ok(SendResult::Sent)
        }
    }

    #[test]
    fn test_default_init_succeeds() {
        let mut reporter = EchoReporter;
        assert!(reporter.init().is_ok());
        assert!(reporter.should_send(&NotificationItem::new("x", "1")));
        assert_eq!(
            reporter.send(&NotificationItem::new("x", "1")).unwrap(),
            SendResult::Sent
        );
    }

    #[test]
    fn test_send_result_is_failure() {
        assert!(SendResult::Failed("boom".to_string()).is_failure());
        assert!(!SendResult::Sent.is_failure());
        assert!(!SendResult::Skipped("dry-run".to_string()).is_failure());
    }
}

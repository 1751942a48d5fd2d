//! 通知分发器 - 过滤静音后并行发送到所有渠道

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::thread;
use tracing::{error, info, warn};

use super::registry::ReporterRegistry;
use super::reporter::{Reporter, SendResult};
use crate::mute::{filter, MuteStore};
use crate::report::{NotificationItem, Report};

/// 单条发送失败
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryFailure {
    /// 条目标识（chain/proposal）
    pub item: String,
    pub error: String,
}

/// 单个渠道在一个周期内的结果
#[derive(Debug, Clone, PartialEq)]
pub struct ReporterOutcome {
    pub reporter: String,
    pub delivered: usize,
    pub skipped: usize,
    pub failures: Vec<DeliveryFailure>,
}

impl ReporterOutcome {
    fn new(reporter: impl Into<String>) -> Self {
        Self {
            reporter: reporter.into(),
            delivered: 0,
            skipped: 0,
            failures: Vec::new(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// 一个周期的汇总结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    /// 报告中的条目总数
    pub total_items: usize,
    /// 被静音抑制的条目数
    pub suppressed: usize,
    /// 按注册顺序排列的渠道结果
    pub reporters: Vec<ReporterOutcome>,
}

impl BatchOutcome {
    /// 通过过滤、交给渠道的条目数
    pub fn to_send(&self) -> usize {
        self.total_items - self.suppressed
    }

    pub fn outcome_for(&self, reporter: &str) -> Option<&ReporterOutcome> {
        self.reporters.iter().find(|o| o.reporter == reporter)
    }

    pub fn failed_reporters(&self) -> Vec<&str> {
        self.reporters
            .iter()
            .filter(|o| !o.succeeded())
            .map(|o| o.reporter.as_str())
            .collect()
    }

    pub fn all_succeeded(&self) -> bool {
        self.reporters.iter().all(ReporterOutcome::succeeded)
    }
}

/// 通知分发器
///
/// 周期之间无状态：每次分发都重新读取静音规则。
pub struct NotificationDispatcher {
    store: MuteStore,
    reporters: Vec<Arc<dyn Reporter>>,
    /// 是否为 dry-run 模式
    dry_run: bool,
}

impl NotificationDispatcher {
    pub fn new(store: MuteStore, reporters: Vec<Arc<dyn Reporter>>) -> Self {
        for reporter in &reporters {
            info!(reporter = reporter.name(), "Registering reporter");
        }
        Self {
            store,
            reporters,
            dry_run: false,
        }
    }

    pub fn from_registry(store: MuteStore, registry: ReporterRegistry) -> Self {
        Self::new(store, registry.into_reporters())
    }

    /// 设置 dry-run 模式
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn reporter_count(&self) -> usize {
        self.reporters.len()
    }

    pub fn reporter_names(&self) -> Vec<&str> {
        self.reporters.iter().map(|r| r.name()).collect()
    }

    /// 分发一个周期的报告
    ///
    /// 读取静音规则失败时直接返回错误，不调用任何渠道。
    /// 渠道错误只记录在 `BatchOutcome` 中，不会作为周期失败返回。
    pub fn dispatch(&self, report: Report) -> Result<BatchOutcome> {
        self.dispatch_at(report, Utc::now())
    }

    pub fn dispatch_at(&self, report: Report, now: DateTime<Utc>) -> Result<BatchOutcome> {
        let items = report.into_items();
        let total_items = items.len();

        let active_mutes = match self.store.active_mutes(now) {
            Ok(mutes) => mutes,
            Err(e) => {
                error!(error = %e, items = total_items, "Failed to load mutes, skipping dispatch");
                return Err(e.context("failed to load active mutes, dispatch skipped"));
            }
        };

        let filtered = filter(items, &active_mutes);
        let suppressed = filtered.suppressed_count();
        let to_send = filtered.to_send;

        let reporters = if self.dry_run {
            self.reporters
                .iter()
                .map(|r| {
                    eprintln!("[DRY-RUN] Would send {} item(s) to {}", to_send.len(), r.name());
                    let mut outcome = ReporterOutcome::new(r.name());
                    outcome.skipped = to_send.len();
                    outcome
                })
                .collect()
        } else {
            self.fan_out(&to_send)
        };

        let outcome = BatchOutcome {
            total_items,
            suppressed,
            reporters,
        };
        Self::log_outcome(&outcome);
        Ok(outcome)
    }

    /// 每个渠道一个线程，渠道内按顺序发送所有条目
    fn fan_out(&self, items: &[NotificationItem]) -> Vec<ReporterOutcome> {
        if items.is_empty() {
            return self
                .reporters
                .iter()
                .map(|r| ReporterOutcome::new(r.name()))
                .collect();
        }

        thread::scope(|scope| {
            let handles: Vec<_> = self
                .reporters
                .iter()
                .map(|reporter| {
                    let name = reporter.name().to_string();
                    let handle = scope.spawn(move || Self::deliver(reporter.as_ref(), items));
                    (name, handle)
                })
                .collect();

            handles
                .into_iter()
                .map(|(name, handle)| {
                    handle.join().unwrap_or_else(|_| {
                        error!(reporter = %name, "Reporter panicked during send");
                        let mut outcome = ReporterOutcome::new(name);
                        outcome.failures = items
                            .iter()
                            .map(|item| DeliveryFailure {
                                item: item.key(),
                                error: "reporter panicked".to_string(),
                            })
                            .collect();
                        outcome
                    })
                })
                .collect()
        })
    }

    /// 单个渠道的发送循环：某条失败不影响后续条目
    fn deliver(reporter: &dyn Reporter, items: &[NotificationItem]) -> ReporterOutcome {
        let mut outcome = ReporterOutcome::new(reporter.name());

        for item in items {
            if !reporter.should_send(item) {
                outcome.skipped += 1;
                continue;
            }

            let result = match reporter.send(item) {
                Ok(r) => r,
                Err(e) => SendResult::Failed(e.to_string()),
            };

            match result {
                SendResult::Sent => outcome.delivered += 1,
                SendResult::Skipped(_) => outcome.skipped += 1,
                SendResult::Failed(error) => {
                    warn!(reporter = reporter.name(), item = %item.key(), error = %error, "Reporter send failed");
                    outcome.failures.push(DeliveryFailure {
                        item: item.key(),
                        error,
                    });
                }
            }
        }

        outcome
    }

    fn log_outcome(outcome: &BatchOutcome) {
        for r in &outcome.reporters {
            if r.succeeded() {
                info!(
                    reporter = %r.reporter,
                    delivered = r.delivered,
                    skipped = r.skipped,
                    "Reporter finished"
                );
            } else {
                warn!(
                    reporter = %r.reporter,
                    delivered = r.delivered,
                    failed = r.failures.len(),
                    "Reporter finished with failures"
                );
            }
        }
        info!(
            total = outcome.total_items,
            suppressed = outcome.suppressed,
            sent = outcome.to_send(),
            "Report dispatched"
        );
    }
}

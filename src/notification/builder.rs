//! 通知系统构建器 - 根据配置创建渠道并初始化

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use super::channels::{DiscordReporter, LocalFileReporter, PagerDutyReporter, TelegramReporter};
use super::dispatcher::NotificationDispatcher;
use super::registry::ReporterRegistry;
use super::reporter::Reporter;
use crate::config::AppConfig;
use crate::mute::{FileMuteStorage, MuteStore};

/// 通知系统构建器
pub struct NotificationBuilder {
    config: AppConfig,
    dry_run: bool,
}

impl NotificationBuilder {
    pub fn new(config: AppConfig) -> Self {
        let dry_run = config.dry_run;
        Self { config, dry_run }
    }

    /// 设置 dry-run 模式（覆盖配置文件）
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = self.dry_run || dry_run;
        self
    }

    /// 按固定顺序创建已配置的渠道（尚未初始化）
    pub fn reporters(&self) -> Vec<Box<dyn Reporter>> {
        let ceiling = self.config.http_timeout_secs;
        let mut reporters: Vec<Box<dyn Reporter>> = Vec::new();

        if let Some(mut config) = self.config.telegram.clone() {
            config.timeout_secs = config.timeout_secs.min(ceiling);
            reporters.push(Box::new(TelegramReporter::new(config)));
        }
        if let Some(mut config) = self.config.discord.clone() {
            config.timeout_secs = config.timeout_secs.min(ceiling);
            reporters.push(Box::new(DiscordReporter::new(config)));
        }
        if let Some(mut config) = self.config.pagerduty.clone() {
            config.timeout_secs = config.timeout_secs.min(ceiling);
            reporters.push(Box::new(PagerDutyReporter::new(config)));
        }
        if let Some(config) = self.config.local_file.clone() {
            reporters.push(Box::new(LocalFileReporter::new(config)));
        }

        reporters
    }

    /// 基于配置目录下的静音规则文件创建仓库
    pub fn mute_store(&self) -> Result<MuteStore> {
        let storage = FileMuteStorage::new(&self.config.data_dir)?;
        Ok(MuteStore::new(Arc::new(storage)))
    }

    /// 初始化所有渠道并构建分发器
    pub fn build(self) -> Result<NotificationDispatcher> {
        let store = self.mute_store()?;
        self.build_with_store(store)
    }

    pub fn build_with_store(self, store: MuteStore) -> Result<NotificationDispatcher> {
        // 非法配置直接拒绝，警告只记日志
        for warning in self.config.validate()? {
            warn!("{}", warning);
        }

        let registry = ReporterRegistry::initialize(self.reporters());
        for (name, error) in registry.failed() {
            warn!(reporter = %name, error = %error, "Reporter excluded for this run");
        }
        if registry.is_empty() {
            warn!("No active reporters");
        } else {
            info!(reporters = ?registry.names(), "Reporters ready");
        }

        Ok(NotificationDispatcher::from_registry(store, registry).with_dry_run(self.dry_run))
    }
}

//! 渠道注册表 - 启动时初始化所有渠道，排除初始化失败的渠道

use std::sync::Arc;
use tracing::{info, warn};

use super::reporter::Reporter;

/// 初始化完成后的渠道集合，启动后不再变化
pub struct ReporterRegistry {
    active: Vec<Arc<dyn Reporter>>,
    /// 初始化失败的渠道: (name, error)
    failed: Vec<(String, String)>,
}

impl ReporterRegistry {
    /// 依次初始化所有渠道；失败的渠道被排除，不会在后续周期重试
    pub fn initialize(reporters: Vec<Box<dyn Reporter>>) -> Self {
        let mut active: Vec<Arc<dyn Reporter>> = Vec::new();
        let mut failed = Vec::new();

        for mut reporter in reporters {
            let name = reporter.name().to_string();
            match reporter.init() {
                Ok(()) => {
                    info!(reporter = %name, "Reporter initialized");
                    active.push(Arc::from(reporter));
                }
                Err(e) => {
                    warn!(reporter = %name, error = %e, "Reporter init failed, disabling it");
                    failed.push((name, e.to_string()));
                }
            }
        }

        Self { active, failed }
    }

    pub fn into_reporters(self) -> Vec<Arc<dyn Reporter>> {
        self.active
    }

    pub fn failed(&self) -> &[(String, String)] {
        &self.failed
    }

    pub fn names(&self) -> Vec<&str> {
        self.active.iter().map(|r| r.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

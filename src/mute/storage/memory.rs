use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use anyhow::Result;

use super::MuteStorage;
use crate::mute::rule::MuteRule;

type MuteMap = Arc<RwLock<HashMap<String, MuteRule>>>;

/// 进程内存储，用于测试和不需要持久化的部署
#[derive(Clone, Debug, Default)]
pub struct MemoryMuteStorage {
    mutes: MuteMap,
}

impl MemoryMuteStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MuteStorage for MemoryMuteStorage {
    fn create(&self, rule: &MuteRule) -> Result<()> {
        tracing::debug!(id = %rule.id, "inserting mute into memory");
        if let Ok(mut mutes) = self.mutes.write() {
            mutes.insert(rule.id.clone(), rule.clone());
            Ok(())
        } else {
            Err(anyhow::anyhow!("failed to acquire write lock"))
        }
    }

    fn list(&self) -> Result<Vec<MuteRule>> {
        tracing::trace!("listing all mutes");
        if let Ok(mutes) = self.mutes.read() {
            Ok(mutes.values().cloned().collect())
        } else {
            Err(anyhow::anyhow!("failed to acquire read lock"))
        }
    }

    fn delete(&self, id: &str) -> Result<bool> {
        tracing::debug!(id, "removing mute from memory");
        if let Ok(mut mutes) = self.mutes.write() {
            Ok(mutes.remove(id).is_some())
        } else {
            Err(anyhow::anyhow!("failed to acquire write lock"))
        }
    }
}

//! 文件存储 - `mutes.json` + 独立锁文件
//!
//! 写操作在排他锁下完成读-改-写，并先写临时文件再原子替换，
//! 读操作持有共享锁，因此读者只会看到完整的快照。

use anyhow::{Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::MuteStorage;
use crate::mute::rule::MuteRule;

/// mutes.json 结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MutesFile {
    #[serde(default)]
    mutes: Vec<MuteRule>,
}

/// 基于 JSON 文件的静音存储
#[derive(Debug, Clone)]
pub struct FileMuteStorage {
    data_dir: PathBuf,
}

impl FileMuteStorage {
    /// 使用指定数据目录（不存在时创建）
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data dir {}", data_dir.display()))?;
        Ok(Self { data_dir })
    }

    /// mutes.json 路径
    pub fn path(&self) -> PathBuf {
        self.data_dir.join("mutes.json")
    }

    fn lock_file_path(&self) -> PathBuf {
        self.data_dir.join("mutes.json.lock")
    }

    fn open_lock_file(&self) -> Result<File> {
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(self.lock_file_path())?;
        Ok(lock_file)
    }

    /// 读取 mutes.json（内部使用，不加锁）
    fn read_internal(path: &Path) -> Result<MutesFile> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            if content.trim().is_empty() {
                return Ok(MutesFile::default());
            }
            serde_json::from_str(&content)
                .with_context(|| format!("Corrupted mutes file {}", path.display()))
        } else {
            Ok(MutesFile::default())
        }
    }

    /// 写入 mutes.json（内部使用，不加锁）：先写临时文件再 rename
    fn write_internal(path: &Path, file: &MutesFile) -> Result<()> {
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, serde_json::to_string_pretty(file)?)?;
        fs::rename(&temp_path, path)?;
        Ok(())
    }

    /// 在排他锁下执行读-改-写
    fn with_locked_file<F, T>(&self, operation: F) -> Result<T>
    where
        F: FnOnce(&mut MutesFile) -> Result<T>,
    {
        let lock_file = self.open_lock_file()?;
        lock_file.lock_exclusive()?;

        let path = self.path();
        let result = (|| -> Result<T> {
            let mut file = Self::read_internal(&path)?;
            let result = operation(&mut file)?;
            Self::write_internal(&path, &file)?;
            Ok(result)
        })();

        let _ = lock_file.unlock();
        result
    }

    /// 在共享锁下只读
    fn with_locked_file_read<F, T>(&self, operation: F) -> Result<T>
    where
        F: FnOnce(&MutesFile) -> Result<T>,
    {
        let lock_file = self.open_lock_file()?;
        lock_file.lock_shared()?;

        let result = Self::read_internal(&self.path()).and_then(|file| operation(&file));

        let _ = lock_file.unlock();
        result
    }
}

impl MuteStorage for FileMuteStorage {
    fn create(&self, rule: &MuteRule) -> Result<()> {
        self.with_locked_file(|file| {
            file.mutes.push(rule.clone());
            Ok(())
        })?;
        debug!(id = %rule.id, path = %self.path().display(), "Mute written to file");
        Ok(())
    }

    fn list(&self) -> Result<Vec<MuteRule>> {
        self.with_locked_file_read(|file| Ok(file.mutes.clone()))
    }

    fn delete(&self, id: &str) -> Result<bool> {
        self.with_locked_file(|file| {
            let before = file.mutes.len();
            file.mutes.retain(|m| m.id != id);
            Ok(file.mutes.len() != before)
        })
    }

    fn delete_where(&self, predicate: &dyn Fn(&MuteRule) -> bool) -> Result<usize> {
        // 单次加锁完成，避免逐条 rename
        self.with_locked_file(|file| {
            let before = file.mutes.len();
            file.mutes.retain(|m| !predicate(m));
            Ok(before - file.mutes.len())
        })
    }
}

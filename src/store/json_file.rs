//! 带锁的 JSON 文件读写
//!
//! 每个数据文件配一个 sidecar `.lock` 文件做建议性互斥（fs2 排它锁，有限等待），
//! 写入采用临时文件 + 原子替换。锁的作用域是单个文件，不提供跨文件事务。

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::store::StoreError;

/// 锁等待的轮询间隔
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// 一个受锁保护的 JSON 数组文件
pub struct LockedJsonFile {
    path: PathBuf,
    lock_timeout: Duration,
}

impl LockedJsonFile {
    pub fn new(path: impl Into<PathBuf>, lock_timeout: Duration) -> Self {
        Self {
            path: path.into(),
            lock_timeout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut p = self.path.as_os_str().to_owned();
        p.push(".lock");
        PathBuf::from(p)
    }

    /// 在有限等待内获取排它锁；返回的句柄 drop 时释放
    fn acquire_lock(&self) -> Result<File, StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(self.lock_path())?;

        let deadline = Instant::now() + self.lock_timeout;
        loop {
            match lock_file.try_lock_exclusive() {
                Ok(()) => return Ok(lock_file),
                Err(_) if Instant::now() < deadline => std::thread::sleep(LOCK_POLL_INTERVAL),
                Err(_) => {
                    return Err(StoreError::LockTimeout(
                        self.path.display().to_string(),
                    ))
                }
            }
        }
    }

    /// 读出整个数组；文件不存在时返回空
    pub fn load<T: DeserializeOwned>(&self) -> Result<Vec<T>, StoreError> {
        let _lock = self.acquire_lock()?;
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// 整体写回：写入 .tmp 后原子替换
    pub fn save<T: Serialize>(&self, items: &[T]) -> Result<(), StoreError> {
        let _lock = self.acquire_lock()?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(items)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file = LockedJsonFile::new(dir.path().join("plans.json"), Duration::from_secs(1));
        let items: Vec<serde_json::Value> = file.load().unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let file = LockedJsonFile::new(dir.path().join("tasks.json"), Duration::from_secs(1));
        file.save(&[serde_json::json!({"id": "a"}), serde_json::json!({"id": "b"})])
            .unwrap();
        let items: Vec<serde_json::Value> = file.load().unwrap();
        assert_eq!(items.len(), 2);
        // 无残留临时文件
        assert!(!dir.path().join("tasks.json.tmp").exists());
    }
}

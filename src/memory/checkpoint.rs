//! 对话检查点持久化
//!
//! 按 thread_id 保存 / 恢复 ConversationState（JSON blob），支持跨进程恢复多轮对话。
//! 持久后端为 SQLite；打开失败不阻塞启动，降级为同接口的内存实现（放弃持久性）。

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::core::{AgentError, ConversationState};

/// 检查点存储契约：load(thread_id) -> 状态或空，save(thread_id, state)
pub trait CheckpointStore: Send + Sync {
    fn load(&self, thread_id: &str) -> Result<Option<ConversationState>, AgentError>;
    fn save(&self, thread_id: &str, state: &ConversationState) -> Result<(), AgentError>;
}

/// SQLite 持久实现：单表 checkpoints(thread_id PRIMARY KEY, state, updated_at)
pub struct SqliteCheckpointStore {
    conn: Mutex<Connection>,
}

impl SqliteCheckpointStore {
    /// 打开（或创建）数据库文件并建表；父目录不存在时自动创建
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS checkpoints (
                thread_id  TEXT PRIMARY KEY,
                state      TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl CheckpointStore for SqliteCheckpointStore {
    fn load(&self, thread_id: &str) -> Result<Option<ConversationState>, AgentError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT state FROM checkpoints WHERE thread_id = ?1")
            .map_err(|e| AgentError::CheckpointError(e.to_string()))?;
        let blob: Option<String> = stmt
            .query_row([thread_id], |row| row.get(0))
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })
            .map_err(|e| AgentError::CheckpointError(e.to_string()))?;

        match blob {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| AgentError::CheckpointError(e.to_string())),
            None => Ok(None),
        }
    }

    fn save(&self, thread_id: &str, state: &ConversationState) -> Result<(), AgentError> {
        let json = serde_json::to_string(state)
            .map_err(|e| AgentError::CheckpointError(e.to_string()))?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO checkpoints (thread_id, state, updated_at)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![thread_id, json, chrono::Utc::now().to_rfc3339()],
        )
        .map_err(|e| AgentError::CheckpointError(e.to_string()))?;
        Ok(())
    }
}

/// 内存降级实现：进程生命周期内有效，接口与持久实现一致
#[derive(Default)]
pub struct MemoryCheckpointStore {
    states: Mutex<HashMap<String, String>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn load(&self, thread_id: &str) -> Result<Option<ConversationState>, AgentError> {
        let states = self.states.lock().unwrap();
        match states.get(thread_id) {
            Some(json) => serde_json::from_str(json)
                .map(Some)
                .map_err(|e| AgentError::CheckpointError(e.to_string())),
            None => Ok(None),
        }
    }

    fn save(&self, thread_id: &str, state: &ConversationState) -> Result<(), AgentError> {
        let json = serde_json::to_string(state)
            .map_err(|e| AgentError::CheckpointError(e.to_string()))?;
        self.states
            .lock()
            .unwrap()
            .insert(thread_id.to_string(), json);
        Ok(())
    }
}

/// 打开检查点存储：优先 SQLite，失败时告警并降级为内存实现
pub fn open_checkpoint_store(path: impl AsRef<Path>) -> Arc<dyn CheckpointStore> {
    match SqliteCheckpointStore::open(path.as_ref()) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::warn!(
                path = %path.as_ref().display(),
                error = %e,
                "checkpoint db unavailable, falling back to in-memory store"
            );
            Arc::new(MemoryCheckpointStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Turn;

    #[test]
    fn test_sqlite_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteCheckpointStore::open(dir.path().join("focus.db")).unwrap();

        assert!(store.load("t1").unwrap().is_none());

        let mut state = ConversationState::new("t1");
        state.turns.push(Turn::user("hello"));
        state.turns.push(Turn::assistant("hi"));
        store.save("t1", &state).unwrap();

        let loaded = store.load("t1").unwrap().unwrap();
        assert_eq!(loaded.thread_id, "t1");
        assert_eq!(loaded.turns.len(), 2);

        // 同键覆盖
        state.turns.push(Turn::user("more"));
        store.save("t1", &state).unwrap();
        assert_eq!(store.load("t1").unwrap().unwrap().turns.len(), 3);
    }

    #[test]
    fn test_fallback_on_unopenable_path() {
        let dir = tempfile::tempdir().unwrap();
        // 路径指向目录本身，SQLite 打不开 → 内存降级，接口仍可用
        let store = open_checkpoint_store(dir.path());
        let state = ConversationState::new("t2");
        store.save("t2", &state).unwrap();
        assert!(store.load("t2").unwrap().is_some());
    }
}

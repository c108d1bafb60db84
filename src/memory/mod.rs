//! 记忆层：按线程的对话检查点（SQLite 持久 / 内存降级）

pub mod checkpoint;

pub use checkpoint::{
    open_checkpoint_store, CheckpointStore, MemoryCheckpointStore, SqliteCheckpointStore,
};

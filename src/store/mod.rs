//! 存储层：JSON 文件上的计划 / 任务持久化

pub mod json_file;
pub mod planner;
pub mod records;

pub use json_file::LockedJsonFile;
pub use planner::{string_similarity, PlannerStore, ScheduleSlot, DEFAULT_SIMILARITY_THRESHOLD};
pub use records::{MilestoneRecord, PlanRecord, TaskRecord};

use thiserror::Error;

/// 存储层错误：IO / JSON / Schema / 未找到 / 锁超时
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// 建议性文件锁在有限等待内未获取到
    #[error("Lock timeout on {0}")]
    LockTimeout(String),
}
